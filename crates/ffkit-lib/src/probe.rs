//! Capability probing.
//!
//! A node is accepted only when it reports at least one force-feedback
//! bit and a positive effect capacity. Rejection is an ordinary outcome,
//! not an error: most input nodes (keyboards, mice) simply have no
//! force feedback.

use std::fmt;
use std::path::Path;

use log::{debug, warn};

use crate::device::DeviceError;
use crate::features::FeatureSet;
use crate::protocol::NAME_PLACEHOLDER;
use crate::transport::{Backend, FfHandle};

/// What an accepted node reported.
#[derive(Debug, Clone, PartialEq)]
pub struct Capabilities {
    pub features: FeatureSet,
    pub capacity: i32,
    pub name: String,
}

/// Why a node was not accepted.
#[derive(Debug)]
pub enum Rejection {
    /// The node could not be opened read-write.
    Open(DeviceError),
    /// The feature-bits request failed.
    FeatureQuery(DeviceError),
    /// No force-feedback bit is set.
    NoFeatures,
    /// The capacity request failed.
    CapacityQuery(DeviceError),
    /// Capacity is zero or negative.
    NoCapacity(i32),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Open(e) => write!(f, "cannot open: {e}"),
            Rejection::FeatureQuery(e) => write!(f, "feature query failed: {e}"),
            Rejection::NoFeatures => write!(f, "no force-feedback features"),
            Rejection::CapacityQuery(e) => write!(f, "capacity query failed: {e}"),
            Rejection::NoCapacity(n) => write!(f, "no effect slots (capacity {n})"),
        }
    }
}

/// Query an already open handle.
///
/// The name is best effort: a failed or empty name request yields
/// `"Unknown"`.
pub fn query<H: FfHandle>(handle: &H) -> Result<Capabilities, Rejection> {
    let features = handle.query_features().map_err(Rejection::FeatureQuery)?;
    if features.is_blank() {
        return Err(Rejection::NoFeatures);
    }

    let capacity = handle.query_capacity().map_err(Rejection::CapacityQuery)?;
    if capacity <= 0 {
        return Err(Rejection::NoCapacity(capacity));
    }

    let name = match handle.query_name() {
        Ok(name) if !name.is_empty() => name,
        Ok(_) => NAME_PLACEHOLDER.to_string(),
        Err(e) => {
            warn!("{e}; using \"{NAME_PLACEHOLDER}\"");
            NAME_PLACEHOLDER.to_string()
        }
    };

    Ok(Capabilities {
        features,
        capacity,
        name,
    })
}

/// Open `path` transiently and query it. The handle is closed before
/// returning, whatever the outcome.
pub fn probe<B: Backend>(backend: &B, path: &Path) -> Result<Capabilities, Rejection> {
    let handle = backend.open(path).map_err(Rejection::Open)?;
    let result = query(&handle);
    drop(handle);
    if let Err(reason) = &result {
        debug!("{}: rejected, {reason}", path.display());
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::{Call, MockBackend, MockNode};

    fn backend(node: MockNode) -> MockBackend {
        MockBackend::new("/d").with_node("event0", node)
    }

    fn path() -> &'static Path {
        Path::new("/d/event0")
    }

    #[test]
    fn accepts_force_feedback_node() {
        let b = backend(MockNode::gamepad("Pad"));
        let caps = probe(&b, path()).unwrap();
        assert_eq!(caps.name, "Pad");
        assert_eq!(caps.capacity, 16);
        assert!(caps.features.rumble());
        assert_eq!(b.open_handles(), 0);
    }

    #[test]
    fn rejects_blank_features() {
        let b = backend(MockNode::plain("Keyboard"));
        assert!(matches!(probe(&b, path()), Err(Rejection::NoFeatures)));
        // capacity is never asked for
        assert!(!b.calls().contains(&Call::QueryCapacity));
        assert_eq!(b.open_handles(), 0);
    }

    #[test]
    fn unnamed_bit_counts_as_feature() {
        let node = MockNode {
            features: Some(FeatureSet::from_bits_retain(1 << 0x70)),
            ..MockNode::gamepad("Odd")
        };
        assert!(probe(&backend(node), path()).is_ok());
    }

    #[test]
    fn rejects_zero_capacity() {
        let node = MockNode {
            capacity: Some(0),
            ..MockNode::gamepad("Pad")
        };
        assert!(matches!(
            probe(&backend(node), path()),
            Err(Rejection::NoCapacity(0))
        ));
    }

    #[test]
    fn rejects_negative_capacity() {
        let node = MockNode {
            capacity: Some(-3),
            ..MockNode::gamepad("Pad")
        };
        assert!(matches!(
            probe(&backend(node), path()),
            Err(Rejection::NoCapacity(-3))
        ));
    }

    #[test]
    fn rejects_failed_feature_query() {
        let node = MockNode {
            features: None,
            ..MockNode::gamepad("Pad")
        };
        let b = backend(node);
        assert!(matches!(
            probe(&b, path()),
            Err(Rejection::FeatureQuery(DeviceError::QueryFailed(_)))
        ));
        assert_eq!(b.open_handles(), 0);
    }

    #[test]
    fn rejects_failed_capacity_query() {
        let node = MockNode {
            capacity: None,
            ..MockNode::gamepad("Pad")
        };
        assert!(matches!(
            probe(&backend(node), path()),
            Err(Rejection::CapacityQuery(_))
        ));
    }

    #[test]
    fn rejects_unopenable_node() {
        let node = MockNode {
            fail_open: true,
            ..MockNode::gamepad("Pad")
        };
        let b = backend(node);
        assert!(matches!(
            probe(&b, path()),
            Err(Rejection::Open(DeviceError::OpenFailed(_)))
        ));
        assert!(b.calls().is_empty());
    }

    #[test]
    fn missing_name_falls_back() {
        let node = MockNode {
            name: None,
            ..MockNode::gamepad("Pad")
        };
        assert_eq!(probe(&backend(node), path()).unwrap().name, "Unknown");
    }

    #[test]
    fn empty_name_falls_back() {
        let node = MockNode {
            name: Some(String::new()),
            ..MockNode::gamepad("Pad")
        };
        assert_eq!(probe(&backend(node), path()).unwrap().name, "Unknown");
    }

    #[test]
    fn query_order() {
        let b = backend(MockNode::gamepad("Pad"));
        probe(&b, path()).unwrap();
        assert_eq!(
            b.requests(),
            [Call::QueryFeatures, Call::QueryCapacity, Call::QueryName]
        );
    }

    #[test]
    fn rejection_display() {
        assert_eq!(Rejection::NoFeatures.to_string(), "no force-feedback features");
        assert_eq!(
            Rejection::NoCapacity(0).to_string(),
            "no effect slots (capacity 0)"
        );
    }
}
