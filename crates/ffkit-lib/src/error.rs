//! Unified error type for the ffkit-lib crate.
//!
//! [`FfkitError`] wraps module-specific errors (`DeviceError`, `EffectError`)
//! and domain-specific error kinds (`Enumeration`, `Config`).
//! `From` impls allow `?` to propagate across module boundaries seamlessly.

use std::fmt;

use crate::device::DeviceError;
use crate::effect::EffectError;

/// Unified error type for ffkit-lib operations.
#[derive(Debug)]
pub enum FfkitError {
    /// Device communication error (open, query, effect transfer).
    Device(DeviceError),
    /// Effect rejected before reaching the device.
    Effect(EffectError),
    /// Standard I/O error (config persistence).
    Io(std::io::Error),
    /// The device directory could not be listed.
    Enumeration(String),
    /// Configuration validation error.
    Config(String),
}

impl fmt::Display for FfkitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FfkitError::Device(e) => write!(f, "{e}"),
            FfkitError::Effect(e) => write!(f, "{e}"),
            FfkitError::Io(e) => write!(f, "I/O error: {e}"),
            FfkitError::Enumeration(e) => write!(f, "Enumeration failed: {e}"),
            FfkitError::Config(e) => write!(f, "Config error: {e}"),
        }
    }
}

impl std::error::Error for FfkitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FfkitError::Device(e) => Some(e),
            FfkitError::Effect(e) => Some(e),
            FfkitError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DeviceError> for FfkitError {
    fn from(e: DeviceError) -> Self {
        FfkitError::Device(e)
    }
}

impl From<EffectError> for FfkitError {
    fn from(e: EffectError) -> Self {
        FfkitError::Effect(e)
    }
}

impl From<std::io::Error> for FfkitError {
    fn from(e: std::io::Error) -> Self {
        FfkitError::Io(e)
    }
}

/// Crate-level Result alias using [`FfkitError`].
pub type Result<T> = std::result::Result<T, FfkitError>;
