//! Device registry — enumeration of force-feedback nodes.
//!
//! [`Registry::init`] lists `/dev/input/event*`, probes every node and keeps
//! the accepted ones in discovery order. Ids are dense, zero-based and
//! stable until [`Registry::quit`]. Enumeration fails closed: if the
//! directory cannot be listed no registry is returned at all.

use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::device::{self, DeviceError, DeviceInfo, OpenDevice};
use crate::error::{FfkitError, Result};
use crate::probe;
use crate::protocol::{DEVICE_DIR, NODE_PREFIX};
use crate::transport::{Backend, PlatformBackend};

/// Every accepted force-feedback device, indexed by id.
pub struct Registry<B: Backend = PlatformBackend> {
    backend: B,
    dir: PathBuf,
    devices: Vec<DeviceInfo>,
}

impl Registry<PlatformBackend> {
    /// Enumerate `/dev/input` with the platform backend.
    pub fn init() -> Result<Self> {
        Self::init_with(PlatformBackend::default(), DEVICE_DIR)
    }
}

impl<B: Backend> Registry<B> {
    /// Enumerate `dir` with `backend`.
    pub fn init_with(backend: B, dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let nodes = backend
            .list_nodes(dir, NODE_PREFIX)
            .map_err(|e| FfkitError::Enumeration(format!("{}: {e}", dir.display())))?;

        let mut devices = Vec::new();
        for path in nodes {
            let Ok(caps) = probe::probe(&backend, &path) else {
                continue;
            };
            let id = devices.len();
            info!(
                "device {id}: {} ({}, {} effect slots)",
                caps.name,
                path.display(),
                caps.capacity
            );
            devices.push(DeviceInfo::new(id, path, caps));
        }
        debug!(
            "{}: {} force-feedback device(s)",
            dir.display(),
            devices.len()
        );

        Ok(Registry {
            backend,
            dir: dir.to_path_buf(),
            devices,
        })
    }

    /// Release every registered device. Calling it again is a no-op.
    pub fn quit(&mut self) {
        if !self.devices.is_empty() {
            debug!("releasing {} device(s)", self.devices.len());
        }
        self.devices.clear();
    }

    /// Number of accepted devices.
    pub fn count(&self) -> usize {
        self.devices.len()
    }

    /// The directory that was enumerated.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn device(&self, id: usize) -> Option<&DeviceInfo> {
        self.devices.get(id)
    }

    /// All devices in id order.
    pub fn devices(&self) -> impl Iterator<Item = &DeviceInfo> {
        self.devices.iter()
    }

    /// First device whose name contains `needle` (case-insensitive).
    pub fn find_by_name(&self, needle: &str) -> Option<&DeviceInfo> {
        let needle = needle.to_lowercase();
        self.devices
            .iter()
            .find(|d| d.name().to_lowercase().contains(&needle))
    }

    /// Resolve a user-supplied device selector.
    ///
    /// Empty selects device 0; a number selects by id; anything else is
    /// matched against device names.
    pub fn select(&self, selector: &str) -> Option<&DeviceInfo> {
        let selector = selector.trim();
        if selector.is_empty() {
            return self.device(0);
        }
        match selector.parse::<usize>() {
            Ok(id) => self.device(id),
            Err(_) => self.find_by_name(selector),
        }
    }

    /// Open a fresh session on device `id`.
    ///
    /// Every call opens a new, independent handle.
    pub fn open(&self, id: usize) -> device::Result<OpenDevice<'_, B::Handle>> {
        let info = self.devices.get(id).ok_or(DeviceError::NotFound)?;
        let handle = self.backend.open(info.path())?;
        debug!("opened {}", info.path().display());
        Ok(OpenDevice::new(info, handle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::EffectType;
    use crate::transport::mock::{Call, MockBackend, MockNode};

    const DIR: &str = "/dev/input";

    fn mixed_backend() -> MockBackend {
        MockBackend::new(DIR)
            .with_node("event3", MockNode::gamepad("Racing Wheel"))
            .with_node("event0", MockNode::plain("AT Keyboard"))
            .with_node("event1", MockNode::gamepad("Xbox Controller"))
            .with_node("mouse0", MockNode::gamepad("not an event node"))
            .with_node(
                "event2",
                MockNode {
                    capacity: Some(0),
                    ..MockNode::gamepad("Zero Slots")
                },
            )
    }

    #[test]
    fn empty_dir_yields_no_devices() {
        let reg = Registry::init_with(MockBackend::new(DIR), DIR).unwrap();
        assert_eq!(reg.count(), 0);
        assert!(reg.device(0).is_none());
    }

    #[test]
    fn unlistable_dir_fails_closed() {
        let err = Registry::init_with(MockBackend::new(DIR), "/elsewhere")
            .err()
            .expect("listing a missing dir must fail");
        assert!(matches!(err, FfkitError::Enumeration(_)));
    }

    #[test]
    fn only_capable_nodes_are_registered() {
        let reg = Registry::init_with(mixed_backend(), DIR).unwrap();
        assert_eq!(reg.count(), 2);
        let names: Vec<_> = reg.devices().map(|d| d.name()).collect();
        assert_eq!(names, ["Xbox Controller", "Racing Wheel"]);
    }

    #[test]
    fn ids_are_dense_in_discovery_order() {
        let reg = Registry::init_with(mixed_backend(), DIR).unwrap();
        for (i, d) in reg.devices().enumerate() {
            assert_eq!(d.id(), i);
        }
        assert_eq!(
            reg.device(0).unwrap().path(),
            Path::new("/dev/input/event1")
        );
        assert_eq!(
            reg.device(1).unwrap().path(),
            Path::new("/dev/input/event3")
        );
    }

    #[test]
    fn probes_leave_no_open_handles() {
        let reg = Registry::init_with(mixed_backend(), DIR).unwrap();
        assert_eq!(reg.backend().open_handles(), 0);
    }

    #[test]
    fn open_out_of_range_does_no_io() {
        let reg = Registry::init_with(mixed_backend(), DIR).unwrap();
        reg.backend().clear_calls();
        assert!(matches!(reg.open(2), Err(DeviceError::NotFound)));
        assert!(matches!(reg.open(usize::MAX), Err(DeviceError::NotFound)));
        assert!(reg.backend().calls().is_empty());
    }

    #[test]
    fn open_opens_registered_path() {
        let reg = Registry::init_with(mixed_backend(), DIR).unwrap();
        reg.backend().clear_calls();
        let dev = reg.open(1).unwrap();
        assert_eq!(dev.info().name(), "Racing Wheel");
        assert!(dev.info().supports_effect(EffectType::Rumble));
        assert_eq!(
            reg.backend().calls(),
            [Call::Open("/dev/input/event3".into())]
        );
    }

    #[test]
    fn repeated_open_gives_independent_sessions() {
        let reg = Registry::init_with(mixed_backend(), DIR).unwrap();
        let mut a = reg.open(0).unwrap();
        let b = reg.open(0).unwrap();
        assert_eq!(reg.backend().open_handles(), 2);
        a.close();
        assert!(b.is_open());
        assert_eq!(reg.backend().open_handles(), 1);
    }

    #[test]
    fn open_failure_is_reported() {
        let backend = MockBackend::new(DIR).with_node("event0", MockNode::gamepad("Pad"));
        let mut reg = Registry::init_with(backend, DIR).unwrap();
        // swap in a backend whose node refuses a second open
        reg.backend = MockBackend::new(DIR).with_node(
            "event0",
            MockNode {
                fail_open: true,
                ..MockNode::gamepad("Pad")
            },
        );
        assert!(matches!(reg.open(0), Err(DeviceError::OpenFailed(_))));
    }

    #[test]
    fn quit_twice_is_harmless() {
        let mut reg = Registry::init_with(mixed_backend(), DIR).unwrap();
        reg.quit();
        assert_eq!(reg.count(), 0);
        reg.quit();
        assert_eq!(reg.count(), 0);
        assert!(matches!(reg.open(0), Err(DeviceError::NotFound)));
    }

    #[test]
    fn find_by_name_is_case_insensitive() {
        let reg = Registry::init_with(mixed_backend(), DIR).unwrap();
        assert_eq!(reg.find_by_name("wheel").unwrap().id(), 1);
        assert_eq!(reg.find_by_name("XBOX").unwrap().id(), 0);
        assert!(reg.find_by_name("keyboard").is_none());
    }

    #[test]
    fn select_by_id_name_or_default() {
        let reg = Registry::init_with(mixed_backend(), DIR).unwrap();
        assert_eq!(reg.select("").unwrap().id(), 0);
        assert_eq!(reg.select(" 1 ").unwrap().id(), 1);
        assert_eq!(reg.select("racing").unwrap().id(), 1);
        assert!(reg.select("7").is_none());
        assert!(reg.select("joystick").is_none());
    }
}
