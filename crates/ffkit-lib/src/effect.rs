//! Caller-facing effect description.
//!
//! An [`Effect`] is a plain value owned by the caller. It starts out with
//! `id == -1` ("not uploaded"); a successful upload stores the slot the
//! kernel assigned, which then addresses the effect for play/stop/erase.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::protocol::*;

/// Slot id meaning "not uploaded yet, allocate a new slot".
pub const NEW_EFFECT_ID: i16 = -1;

// ── Error type ──

/// Effect validation and decoding errors.
#[derive(Debug, Clone, PartialEq)]
pub enum EffectError {
    /// Effect id below -1.
    InvalidId(i16),
    /// Negative slot passed to play/stop/erase.
    InvalidSlot(i16),
    /// Kernel effect type this library does not model.
    UnknownType(u16),
    /// Kernel waveform code outside `FF_SQUARE..=FF_CUSTOM`.
    UnknownWaveform(u16),
}

impl fmt::Display for EffectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EffectError::InvalidId(id) => {
                write!(f, "Invalid effect id {id} (must be -1 or a slot >= 0)")
            }
            EffectError::InvalidSlot(id) => write!(f, "Invalid effect slot {id}"),
            EffectError::UnknownType(code) => write!(f, "Unsupported effect type 0x{code:02x}"),
            EffectError::UnknownWaveform(code) => {
                write!(f, "Unsupported periodic waveform 0x{code:02x}")
            }
        }
    }
}

impl std::error::Error for EffectError {}

pub type Result<T> = std::result::Result<T, EffectError>;

// ── Enumerations ──

/// The effect types the codec can upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectType {
    Rumble,
    Periodic,
    Constant,
    Ramp,
}

impl EffectType {
    pub const ALL: [EffectType; 4] = [
        EffectType::Rumble,
        EffectType::Periodic,
        EffectType::Constant,
        EffectType::Ramp,
    ];

    /// Kernel effect-type code (`FF_RUMBLE` ...).
    pub fn code(self) -> u16 {
        match self {
            EffectType::Rumble => FF_RUMBLE,
            EffectType::Periodic => FF_PERIODIC,
            EffectType::Constant => FF_CONSTANT,
            EffectType::Ramp => FF_RAMP,
        }
    }

    pub fn from_code(code: u16) -> Result<Self> {
        match code {
            FF_RUMBLE => Ok(EffectType::Rumble),
            FF_PERIODIC => Ok(EffectType::Periodic),
            FF_CONSTANT => Ok(EffectType::Constant),
            FF_RAMP => Ok(EffectType::Ramp),
            other => Err(EffectError::UnknownType(other)),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            EffectType::Rumble => "rumble",
            EffectType::Periodic => "periodic",
            EffectType::Constant => "constant",
            EffectType::Ramp => "ramp",
        }
    }
}

impl fmt::Display for EffectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Periodic waveform, zero-based. The kernel code is `FF_SQUARE + index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u16)]
pub enum Waveform {
    #[default]
    Square = 0,
    Triangle = 1,
    Sine = 2,
    SawUp = 3,
    SawDown = 4,
    Custom = 5,
}

impl Waveform {
    pub const ALL: [Waveform; 6] = [
        Waveform::Square,
        Waveform::Triangle,
        Waveform::Sine,
        Waveform::SawUp,
        Waveform::SawDown,
        Waveform::Custom,
    ];

    /// Kernel waveform code.
    pub fn code(self) -> u16 {
        FF_SQUARE + self as u16
    }

    pub fn from_code(code: u16) -> Result<Self> {
        code.checked_sub(FF_SQUARE)
            .and_then(|index| Self::ALL.get(index as usize).copied())
            .ok_or(EffectError::UnknownWaveform(code))
    }

    pub fn name(self) -> &'static str {
        match self {
            Waveform::Square => "square",
            Waveform::Triangle => "triangle",
            Waveform::Sine => "sine",
            Waveform::SawUp => "saw_up",
            Waveform::SawDown => "saw_down",
            Waveform::Custom => "custom",
        }
    }
}

impl fmt::Display for Waveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── Effect value ──

/// Attack/fade shaping applied to an effect's level over time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Envelope {
    /// Duration of the attack, in milliseconds.
    pub attack_length: u16,
    /// Level at the start of the attack.
    pub attack_level: u16,
    /// Duration of the fade, in milliseconds.
    pub fade_length: u16,
    /// Level at the end of the fade.
    pub fade_level: u16,
}

/// Type-specific effect parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EffectPayload {
    Rumble {
        #[serde(default)]
        strong_magnitude: u16,
        #[serde(default)]
        weak_magnitude: u16,
    },
    Periodic {
        #[serde(default)]
        waveform: Waveform,
        #[serde(default)]
        period: u16,
        #[serde(default)]
        magnitude: i16,
        #[serde(default)]
        offset: i16,
        #[serde(default)]
        phase: u16,
        #[serde(default)]
        envelope: Envelope,
        /// Direction of the force, 0x0000..=0xFFFF covering a full turn.
        #[serde(default)]
        direction: u16,
    },
    Constant {
        #[serde(default)]
        level: i16,
        #[serde(default)]
        envelope: Envelope,
    },
    Ramp {
        #[serde(default)]
        start_level: i16,
        #[serde(default)]
        end_level: i16,
        #[serde(default)]
        envelope: Envelope,
    },
}

impl EffectPayload {
    /// Zero-initialized parameters for the given type.
    pub fn zeroed(kind: EffectType) -> Self {
        match kind {
            EffectType::Rumble => EffectPayload::Rumble {
                strong_magnitude: 0,
                weak_magnitude: 0,
            },
            EffectType::Periodic => EffectPayload::Periodic {
                waveform: Waveform::Square,
                period: 0,
                magnitude: 0,
                offset: 0,
                phase: 0,
                envelope: Envelope::default(),
                direction: 0,
            },
            EffectType::Constant => EffectPayload::Constant {
                level: 0,
                envelope: Envelope::default(),
            },
            EffectType::Ramp => EffectPayload::Ramp {
                start_level: 0,
                end_level: 0,
                envelope: Envelope::default(),
            },
        }
    }

    pub fn kind(&self) -> EffectType {
        match self {
            EffectPayload::Rumble { .. } => EffectType::Rumble,
            EffectPayload::Periodic { .. } => EffectType::Periodic,
            EffectPayload::Constant { .. } => EffectType::Constant,
            EffectPayload::Ramp { .. } => EffectType::Ramp,
        }
    }
}

/// A haptic effect plus its kernel slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Effect {
    /// Kernel slot, or [`NEW_EFFECT_ID`] before the first upload.
    #[serde(skip, default = "new_effect_id")]
    pub id: i16,
    /// Delay before the effect starts, in milliseconds.
    #[serde(default)]
    pub delay: u16,
    /// Effect duration in milliseconds; 0 means "until stopped".
    #[serde(default)]
    pub length: u16,
    #[serde(flatten)]
    pub payload: EffectPayload,
}

fn new_effect_id() -> i16 {
    NEW_EFFECT_ID
}

/// Scale a 0.0-1.0 fraction (clamped) onto `0..=max`.
fn scale_fraction(fraction: f32, max: u16) -> u16 {
    (fraction.clamp(0.0, 1.0) * max as f32).round() as u16
}

/// Convert seconds to the kernel's millisecond replay field (saturating).
fn seconds_to_ms(secs: f32) -> u16 {
    (secs.max(0.0) * 1000.0).round().min(u16::MAX as f32) as u16
}

impl Effect {
    /// A zero-initialized effect of `kind`, not yet uploaded.
    pub fn new(kind: EffectType) -> Self {
        Effect {
            id: NEW_EFFECT_ID,
            delay: 0,
            length: 0,
            payload: EffectPayload::zeroed(kind),
        }
    }

    pub fn kind(&self) -> EffectType {
        self.payload.kind()
    }

    /// True once the effect holds a kernel slot.
    pub fn is_uploaded(&self) -> bool {
        self.id >= 0
    }

    /// Rumble with raw 16-bit motor magnitudes.
    pub fn rumble(strong_magnitude: u16, weak_magnitude: u16, length_ms: u16) -> Self {
        Effect {
            length: length_ms,
            payload: EffectPayload::Rumble {
                strong_magnitude,
                weak_magnitude,
            },
            ..Effect::new(EffectType::Rumble)
        }
    }

    /// Rumble from motor fractions (0.0-1.0) and a duration in seconds.
    pub fn simple_rumble(strong: f32, weak: f32, secs: f32) -> Self {
        Effect::rumble(
            scale_fraction(strong, u16::MAX),
            scale_fraction(weak, u16::MAX),
            seconds_to_ms(secs),
        )
    }

    /// Periodic effect without envelope, offset or phase.
    ///
    /// `magnitude` is a 0.0-1.0 fraction of full force, `period_ms` the
    /// waveform period.
    pub fn simple_periodic(
        waveform: Waveform,
        magnitude: f32,
        period_ms: u16,
        secs: f32,
    ) -> Self {
        let length = seconds_to_ms(secs);
        Effect {
            length,
            payload: EffectPayload::Periodic {
                waveform,
                period: period_ms,
                magnitude: scale_fraction(magnitude, i16::MAX as u16) as i16,
                offset: 0,
                phase: 0,
                envelope: Envelope::default(),
                direction: 0,
            },
            ..Effect::new(EffectType::Periodic)
        }
    }

    /// Constant force at a signed level fraction (-1.0..=1.0).
    pub fn simple_constant(level: f32, secs: f32) -> Self {
        let level = (level.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16;
        Effect {
            length: seconds_to_ms(secs),
            payload: EffectPayload::Constant {
                level,
                envelope: Envelope::default(),
            },
            ..Effect::new(EffectType::Constant)
        }
    }

    /// Linear ramp between two signed level fractions (-1.0..=1.0).
    pub fn simple_ramp(start: f32, end: f32, secs: f32) -> Self {
        let level = |v: f32| (v.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16;
        Effect {
            length: seconds_to_ms(secs),
            payload: EffectPayload::Ramp {
                start_level: level(start),
                end_level: level(end),
                envelope: Envelope::default(),
            },
            ..Effect::new(EffectType::Ramp)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_effect_is_zeroed_and_unuploaded() {
        for kind in EffectType::ALL {
            let e = Effect::new(kind);
            assert_eq!(e.id, NEW_EFFECT_ID);
            assert_eq!(e.delay, 0);
            assert_eq!(e.length, 0);
            assert_eq!(e.kind(), kind);
            assert!(!e.is_uploaded());
        }
    }

    #[test]
    fn effect_type_codes() {
        assert_eq!(EffectType::Rumble.code(), FF_RUMBLE);
        assert_eq!(EffectType::Periodic.code(), FF_PERIODIC);
        assert_eq!(EffectType::Constant.code(), FF_CONSTANT);
        assert_eq!(EffectType::Ramp.code(), FF_RAMP);
    }

    #[test]
    fn effect_type_from_code_rejects_conditions() {
        assert_eq!(
            EffectType::from_code(FF_SPRING),
            Err(EffectError::UnknownType(FF_SPRING))
        );
        assert_eq!(EffectType::from_code(FF_RAMP), Ok(EffectType::Ramp));
    }

    #[test]
    fn waveform_code_is_base_plus_index() {
        for (k, w) in Waveform::ALL.iter().enumerate() {
            assert_eq!(w.code(), FF_SQUARE + k as u16);
            assert_eq!(Waveform::from_code(w.code()), Ok(*w));
        }
    }

    #[test]
    fn waveform_from_code_out_of_range() {
        assert_eq!(
            Waveform::from_code(FF_SQUARE - 1),
            Err(EffectError::UnknownWaveform(FF_SQUARE - 1))
        );
        assert_eq!(
            Waveform::from_code(FF_CUSTOM + 1),
            Err(EffectError::UnknownWaveform(FF_CUSTOM + 1))
        );
        assert!(Waveform::from_code(0).is_err());
    }

    #[test]
    fn simple_rumble_scales_fractions() {
        let e = Effect::simple_rumble(1.0, 0.5, 1.5);
        assert_eq!(e.length, 1500);
        assert_eq!(
            e.payload,
            EffectPayload::Rumble {
                strong_magnitude: 0xFFFF,
                weak_magnitude: 32768,
            }
        );
    }

    #[test]
    fn simple_rumble_clamps() {
        let e = Effect::simple_rumble(7.0, -1.0, 1000.0);
        assert_eq!(e.length, u16::MAX);
        assert_eq!(
            e.payload,
            EffectPayload::Rumble {
                strong_magnitude: 0xFFFF,
                weak_magnitude: 0,
            }
        );
    }

    #[test]
    fn simple_constant_signed_level() {
        let e = Effect::simple_constant(-1.0, 0.25);
        assert_eq!(e.length, 250);
        assert!(matches!(e.payload, EffectPayload::Constant { level: -32767, .. }));
    }

    #[test]
    fn simple_ramp_levels() {
        let e = Effect::simple_ramp(0.0, 1.0, 2.0);
        assert!(matches!(
            e.payload,
            EffectPayload::Ramp {
                start_level: 0,
                end_level: 32767,
                ..
            }
        ));
    }

    #[test]
    fn simple_periodic_sets_waveform() {
        let e = Effect::simple_periodic(Waveform::Sine, 1.0, 100, 1.0);
        assert_eq!(e.kind(), EffectType::Periodic);
        assert!(matches!(
            e.payload,
            EffectPayload::Periodic {
                waveform: Waveform::Sine,
                period: 100,
                magnitude: 32767,
                ..
            }
        ));
    }

    #[test]
    fn toml_preset_parses() {
        let toml_str = r#"
type = "periodic"
waveform = "saw_down"
period = 50
magnitude = 12000
length = 800

[envelope]
attack_length = 100
"#;
        let e: Effect = toml::from_str(toml_str).unwrap();
        assert_eq!(e.id, NEW_EFFECT_ID);
        assert_eq!(e.length, 800);
        match e.payload {
            EffectPayload::Periodic {
                waveform,
                period,
                magnitude,
                envelope,
                ..
            } => {
                assert_eq!(waveform, Waveform::SawDown);
                assert_eq!(period, 50);
                assert_eq!(magnitude, 12000);
                assert_eq!(envelope.attack_length, 100);
                assert_eq!(envelope.fade_length, 0);
            }
            other => panic!("expected periodic, got {other:?}"),
        }
    }

    #[test]
    fn toml_preset_unknown_type_fails() {
        let result: std::result::Result<Effect, _> = toml::from_str("type = \"spring\"");
        assert!(result.is_err());
    }

    #[test]
    fn id_is_not_serialized() {
        let mut e = Effect::rumble(1, 2, 3);
        e.id = 7;
        let s = toml::to_string(&e).unwrap();
        assert!(!s.contains("id"), "got {s}");
        assert!(s.contains("type = \"rumble\""), "got {s}");
    }

    #[test]
    fn error_display() {
        assert_eq!(
            EffectError::InvalidId(-2).to_string(),
            "Invalid effect id -2 (must be -1 or a slot >= 0)"
        );
        assert_eq!(
            EffectError::UnknownType(0x53).to_string(),
            "Unsupported effect type 0x53"
        );
    }
}
