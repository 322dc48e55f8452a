//! Device handles — registered device info + open sessions.
//!
//! A [`DeviceInfo`] is the static record the registry keeps for every
//! accepted node. An [`OpenDevice`] borrows one of those records and owns
//! the transport handle used for uploads and playback (see `playback`).

use std::fmt;
use std::path::{Path, PathBuf};

use log::debug;
use serde::Serialize;

use crate::effect::{EffectType, Waveform};
use crate::features::FeatureSet;
use crate::probe::Capabilities;
use crate::transport::FfHandle;

// ── Error type ──

/// Device communication errors.
///
/// String payloads follow the convention **"context: details"** where *context*
/// identifies the operation or request (e.g. `"EVIOCSFF"`, a node path) and
/// *details* describes what went wrong.
#[derive(Debug)]
pub enum DeviceError {
    /// Device id outside the registry.
    NotFound,
    OpenFailed(String),
    QueryFailed(String),
    TransactFailed(String),
    /// Session already closed.
    Closed,
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::NotFound => write!(f, "Force-feedback device not found"),
            DeviceError::OpenFailed(e) => write!(f, "Failed to open device: {e}"),
            DeviceError::QueryFailed(e) => write!(f, "Device query failed: {e}"),
            DeviceError::TransactFailed(e) => write!(f, "Transaction failed: {e}"),
            DeviceError::Closed => write!(f, "Device is closed"),
        }
    }
}

impl std::error::Error for DeviceError {}

pub type Result<T> = std::result::Result<T, DeviceError>;

/// Parse a null-terminated device name from a raw name buffer.
pub fn parse_device_name(name_bytes: &[u8]) -> String {
    let end = name_bytes
        .iter()
        .position(|&b| b == 0)
        .unwrap_or(name_bytes.len());
    String::from_utf8_lossy(&name_bytes[..end]).to_string()
}

// ── Device info ──

/// A registered force-feedback device.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceInfo {
    id: usize,
    path: PathBuf,
    features: FeatureSet,
    capacity: i32,
    name: String,
}

impl DeviceInfo {
    pub(crate) fn new(id: usize, path: PathBuf, caps: Capabilities) -> Self {
        DeviceInfo {
            id,
            path,
            features: caps.features,
            capacity: caps.capacity,
            name: caps.name,
        }
    }

    /// Zero-based id, stable for the registry's lifetime.
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of effects the device can hold at once.
    pub fn capacity(&self) -> i32 {
        self.capacity
    }

    pub fn features(&self) -> FeatureSet {
        self.features
    }

    pub fn supports_effect(&self, kind: EffectType) -> bool {
        self.features.supports_effect(kind)
    }

    pub fn supports_waveform(&self, waveform: Waveform) -> bool {
        self.features.supports_waveform(waveform)
    }

    pub fn supports_gain(&self) -> bool {
        self.features.gain()
    }

    pub fn supports_autocenter(&self) -> bool {
        self.features.autocenter()
    }
}

// ── Open session ──

/// An open device. Closes its handle on [`close`](Self::close) or drop.
pub struct OpenDevice<'a, H: FfHandle> {
    info: &'a DeviceInfo,
    handle: Option<H>,
}

impl<'a, H: FfHandle> OpenDevice<'a, H> {
    pub(crate) fn new(info: &'a DeviceInfo, handle: H) -> Self {
        OpenDevice {
            info,
            handle: Some(handle),
        }
    }

    pub fn info(&self) -> &'a DeviceInfo {
        self.info
    }

    pub fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    /// Release the transport handle. Closing twice is a no-op.
    pub fn close(&mut self) {
        if self.handle.take().is_some() {
            debug!("closed {}", self.info.path.display());
        }
    }

    /// The live handle, or [`DeviceError::Closed`].
    pub(crate) fn handle(&self) -> Result<&H> {
        self.handle.as_ref().ok_or(DeviceError::Closed)
    }
}

impl<H: FfHandle> fmt::Debug for OpenDevice<'_, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenDevice")
            .field("id", &self.info.id)
            .field("path", &self.info.path)
            .field("open", &self.is_open())
            .finish()
    }
}
