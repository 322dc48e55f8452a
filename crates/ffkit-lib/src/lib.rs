//! ffkit — force-feedback effects for Linux evdev devices.

pub mod codec;
pub mod config;
pub mod device;
pub mod effect;
pub mod error;
pub mod features;
pub mod playback;
pub mod probe;
pub mod protocol;
pub mod registry;
pub mod transport;

pub use device::{DeviceInfo, OpenDevice};
pub use effect::{Effect, EffectPayload, EffectType, Envelope, Waveform};
pub use error::FfkitError;
pub use features::FeatureSet;
pub use registry::Registry;
