//! Effect codec — library [`Effect`] ↔ kernel-native [`RawEffect`].
//!
//! [`RawEffect`] carries exactly the fields of `struct ff_effect` with the
//! kernel's numbering: magic type and waveform codes, trigger and replay
//! blocks, and the per-type parameter block. Memory layout is the
//! transport's concern; this module only translates values.

use crate::effect::{Effect, EffectError, EffectPayload, EffectType, Envelope, Result, Waveform};
use crate::protocol::*;

/// `struct ff_trigger`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawTrigger {
    pub button: u16,
    pub interval: u16,
}

/// `struct ff_replay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawReplay {
    pub length: u16,
    pub delay: u16,
}

/// `struct ff_envelope`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawEnvelope {
    pub attack_length: u16,
    pub attack_level: u16,
    pub fade_length: u16,
    pub fade_level: u16,
}

/// The `u` union of `struct ff_effect`, restricted to the uploadable types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawPayload {
    Rumble {
        strong_magnitude: u16,
        weak_magnitude: u16,
    },
    Periodic {
        waveform: u16,
        period: u16,
        magnitude: i16,
        offset: i16,
        phase: u16,
        envelope: RawEnvelope,
    },
    Constant {
        level: i16,
        envelope: RawEnvelope,
    },
    Ramp {
        start_level: i16,
        end_level: i16,
        envelope: RawEnvelope,
    },
}

/// Kernel-native effect record (`struct ff_effect`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawEffect {
    /// `FF_RUMBLE`, `FF_PERIODIC`, `FF_CONSTANT` or `FF_RAMP`.
    pub effect_type: u16,
    /// -1 asks the kernel for a new slot; on return holds the slot used.
    pub id: i16,
    pub direction: u16,
    pub trigger: RawTrigger,
    pub replay: RawReplay,
    pub payload: RawPayload,
}

impl From<Envelope> for RawEnvelope {
    fn from(e: Envelope) -> Self {
        RawEnvelope {
            attack_length: e.attack_length,
            attack_level: e.attack_level,
            fade_length: e.fade_length,
            fade_level: e.fade_level,
        }
    }
}

impl From<RawEnvelope> for Envelope {
    fn from(e: RawEnvelope) -> Self {
        Envelope {
            attack_length: e.attack_length,
            attack_level: e.attack_level,
            fade_length: e.fade_length,
            fade_level: e.fade_level,
        }
    }
}

/// Check an effect id before upload: -1 (new) or an existing slot.
pub fn validate_id(id: i16) -> Result<()> {
    if id < NEW_ID {
        return Err(EffectError::InvalidId(id));
    }
    Ok(())
}

/// Check a slot id before play/stop/erase.
pub fn validate_slot(id: i16) -> Result<()> {
    if id < 0 {
        return Err(EffectError::InvalidSlot(id));
    }
    Ok(())
}

const NEW_ID: i16 = crate::effect::NEW_EFFECT_ID;

fn replay(effect: &Effect) -> RawReplay {
    RawReplay {
        length: effect.length,
        delay: effect.delay,
    }
}

fn encode_rumble(effect: &Effect, strong_magnitude: u16, weak_magnitude: u16) -> RawEffect {
    // Rumble has no trigger or direction in this layer; both stay zero.
    RawEffect {
        effect_type: FF_RUMBLE,
        id: effect.id,
        direction: 0,
        trigger: RawTrigger::default(),
        replay: replay(effect),
        payload: RawPayload::Rumble {
            strong_magnitude,
            weak_magnitude,
        },
    }
}

#[allow(clippy::too_many_arguments)]
fn encode_periodic(
    effect: &Effect,
    waveform: Waveform,
    period: u16,
    magnitude: i16,
    offset: i16,
    phase: u16,
    envelope: Envelope,
    direction: u16,
) -> RawEffect {
    RawEffect {
        effect_type: FF_PERIODIC,
        id: effect.id,
        direction,
        trigger: RawTrigger::default(),
        replay: replay(effect),
        payload: RawPayload::Periodic {
            waveform: waveform.code(),
            period,
            magnitude,
            offset,
            phase,
            envelope: envelope.into(),
        },
    }
}

fn encode_constant(effect: &Effect, level: i16, envelope: Envelope) -> RawEffect {
    RawEffect {
        effect_type: FF_CONSTANT,
        id: effect.id,
        direction: 0,
        trigger: RawTrigger::default(),
        replay: replay(effect),
        payload: RawPayload::Constant {
            level,
            envelope: envelope.into(),
        },
    }
}

fn encode_ramp(effect: &Effect, start_level: i16, end_level: i16, envelope: Envelope) -> RawEffect {
    RawEffect {
        effect_type: FF_RAMP,
        id: effect.id,
        direction: 0,
        trigger: RawTrigger::default(),
        replay: replay(effect),
        payload: RawPayload::Ramp {
            start_level,
            end_level,
            envelope: envelope.into(),
        },
    }
}

/// Translate an effect into the kernel record submitted by `EVIOCSFF`.
///
/// Fails only on an invalid id; every [`EffectPayload`] variant has an
/// encoding.
pub fn encode(effect: &Effect) -> Result<RawEffect> {
    validate_id(effect.id)?;
    let raw = match effect.payload {
        EffectPayload::Rumble {
            strong_magnitude,
            weak_magnitude,
        } => encode_rumble(effect, strong_magnitude, weak_magnitude),
        EffectPayload::Periodic {
            waveform,
            period,
            magnitude,
            offset,
            phase,
            envelope,
            direction,
        } => encode_periodic(
            effect, waveform, period, magnitude, offset, phase, envelope, direction,
        ),
        EffectPayload::Constant { level, envelope } => encode_constant(effect, level, envelope),
        EffectPayload::Ramp {
            start_level,
            end_level,
            envelope,
        } => encode_ramp(effect, start_level, end_level, envelope),
    };
    Ok(raw)
}

/// Translate a kernel record back into an [`Effect`].
///
/// The record's type code must agree with its payload block.
pub fn decode(raw: &RawEffect) -> Result<Effect> {
    validate_id(raw.id)?;
    let kind = EffectType::from_code(raw.effect_type)?;
    let payload = match raw.payload {
        RawPayload::Rumble {
            strong_magnitude,
            weak_magnitude,
        } => EffectPayload::Rumble {
            strong_magnitude,
            weak_magnitude,
        },
        RawPayload::Periodic {
            waveform,
            period,
            magnitude,
            offset,
            phase,
            envelope,
        } => EffectPayload::Periodic {
            waveform: Waveform::from_code(waveform)?,
            period,
            magnitude,
            offset,
            phase,
            envelope: envelope.into(),
            direction: raw.direction,
        },
        RawPayload::Constant { level, envelope } => EffectPayload::Constant {
            level,
            envelope: envelope.into(),
        },
        RawPayload::Ramp {
            start_level,
            end_level,
            envelope,
        } => EffectPayload::Ramp {
            start_level,
            end_level,
            envelope: envelope.into(),
        },
    };
    if payload.kind() != kind {
        return Err(EffectError::UnknownType(raw.effect_type));
    }
    Ok(Effect {
        id: raw.id,
        delay: raw.replay.delay,
        length: raw.replay.length,
        payload,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope() -> Envelope {
        Envelope {
            attack_length: 100,
            attack_level: 0x1000,
            fade_length: 200,
            fade_level: 0x2000,
        }
    }

    #[test]
    fn rumble_preserves_magnitudes() {
        let mut e = Effect::rumble(0xBEEF, 0x1234, 750);
        e.delay = 20;
        let raw = encode(&e).unwrap();
        assert_eq!(raw.effect_type, FF_RUMBLE);
        assert_eq!(raw.id, -1);
        assert_eq!(
            raw.payload,
            RawPayload::Rumble {
                strong_magnitude: 0xBEEF,
                weak_magnitude: 0x1234,
            }
        );
        assert_eq!(raw.replay, RawReplay { length: 750, delay: 20 });
    }

    #[test]
    fn periodic_translates_waveform_and_zeroes_trigger() {
        let e = Effect {
            id: 3,
            delay: 5,
            length: 1000,
            payload: EffectPayload::Periodic {
                waveform: Waveform::Triangle,
                period: 40,
                magnitude: -200,
                offset: 17,
                phase: 90,
                envelope: envelope(),
                direction: 0x4000,
            },
        };
        let raw = encode(&e).unwrap();
        assert_eq!(raw.effect_type, FF_PERIODIC);
        assert_eq!(raw.id, 3);
        assert_eq!(raw.direction, 0x4000);
        assert_eq!(raw.trigger, RawTrigger { button: 0, interval: 0 });
        assert_eq!(
            raw.payload,
            RawPayload::Periodic {
                waveform: FF_TRIANGLE,
                period: 40,
                magnitude: -200,
                offset: 17,
                phase: 90,
                envelope: RawEnvelope {
                    attack_length: 100,
                    attack_level: 0x1000,
                    fade_length: 200,
                    fade_level: 0x2000,
                },
            }
        );
    }

    #[test]
    fn every_waveform_is_base_plus_index() {
        for (k, w) in Waveform::ALL.into_iter().enumerate() {
            let mut e = Effect::new(EffectType::Periodic);
            if let EffectPayload::Periodic { waveform, .. } = &mut e.payload {
                *waveform = w;
            }
            let raw = encode(&e).unwrap();
            match raw.payload {
                RawPayload::Periodic { waveform, .. } => {
                    assert_eq!(waveform, FF_SQUARE + k as u16)
                }
                other => panic!("expected periodic payload, got {other:?}"),
            }
        }
    }

    #[test]
    fn constant_copies_level_and_envelope() {
        let e = Effect {
            payload: EffectPayload::Constant {
                level: -12345,
                envelope: envelope(),
            },
            ..Effect::new(EffectType::Constant)
        };
        let raw = encode(&e).unwrap();
        assert_eq!(raw.effect_type, FF_CONSTANT);
        assert_eq!(raw.direction, 0);
        assert_eq!(
            raw.payload,
            RawPayload::Constant {
                level: -12345,
                envelope: envelope().into(),
            }
        );
    }

    #[test]
    fn ramp_copies_levels() {
        let e = Effect {
            length: 2000,
            payload: EffectPayload::Ramp {
                start_level: -100,
                end_level: 100,
                envelope: envelope(),
            },
            ..Effect::new(EffectType::Ramp)
        };
        let raw = encode(&e).unwrap();
        assert_eq!(raw.effect_type, FF_RAMP);
        assert_eq!(raw.replay.length, 2000);
        assert!(matches!(
            raw.payload,
            RawPayload::Ramp {
                start_level: -100,
                end_level: 100,
                ..
            }
        ));
    }

    #[test]
    fn encode_rejects_id_below_minus_one() {
        let mut e = Effect::new(EffectType::Rumble);
        e.id = -2;
        assert_eq!(encode(&e), Err(EffectError::InvalidId(-2)));
        e.id = i16::MIN;
        assert_eq!(encode(&e), Err(EffectError::InvalidId(i16::MIN)));
    }

    #[test]
    fn encode_keeps_existing_slot() {
        let mut e = Effect::rumble(1, 2, 3);
        e.id = 0;
        assert_eq!(encode(&e).unwrap().id, 0);
    }

    #[test]
    fn decode_inverts_encode() {
        let effects = [
            Effect::rumble(10, 20, 30),
            Effect::simple_periodic(Waveform::SawUp, 0.5, 25, 1.0),
            Effect::simple_constant(0.3, 0.2),
            Effect::simple_ramp(-1.0, 1.0, 3.0),
        ];
        for e in effects {
            let raw = encode(&e).unwrap();
            assert_eq!(decode(&raw).unwrap(), e);
        }
    }

    #[test]
    fn decode_rejects_mismatched_type() {
        let mut raw = encode(&Effect::rumble(1, 1, 1)).unwrap();
        raw.effect_type = FF_CONSTANT;
        assert_eq!(decode(&raw), Err(EffectError::UnknownType(FF_CONSTANT)));
    }

    #[test]
    fn decode_rejects_unknown_type() {
        let mut raw = encode(&Effect::rumble(1, 1, 1)).unwrap();
        raw.effect_type = FF_DAMPER;
        assert_eq!(decode(&raw), Err(EffectError::UnknownType(FF_DAMPER)));
    }

    #[test]
    fn decode_rejects_unknown_waveform() {
        let mut raw = encode(&Effect::new(EffectType::Periodic)).unwrap();
        if let RawPayload::Periodic { waveform, .. } = &mut raw.payload {
            *waveform = FF_GAIN;
        }
        assert_eq!(decode(&raw), Err(EffectError::UnknownWaveform(FF_GAIN)));
    }

    #[test]
    fn slot_validation() {
        assert!(validate_slot(0).is_ok());
        assert!(validate_slot(i16::MAX).is_ok());
        assert_eq!(validate_slot(-1), Err(EffectError::InvalidSlot(-1)));
    }
}
