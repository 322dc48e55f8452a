//! Force-feedback capability bitmask.
//!
//! [`FeatureSet`] mirrors the kernel's `EVIOCGBIT(EV_FF, ..)` bitmap: bit *n*
//! is set when the device supports force-feedback code *n*. The named flags
//! sit at exactly the kernel bit positions so a raw mask converts losslessly;
//! bits the library has no name for are retained as-is.

use bitflags::bitflags;

use crate::effect::{EffectType, Waveform};
use crate::protocol::*;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FeatureSet: u128 {
        const RUMBLE = 1 << FF_RUMBLE;
        const PERIODIC = 1 << FF_PERIODIC;
        const CONSTANT = 1 << FF_CONSTANT;
        const SPRING = 1 << FF_SPRING;
        const FRICTION = 1 << FF_FRICTION;
        const DAMPER = 1 << FF_DAMPER;
        const INERTIA = 1 << FF_INERTIA;
        const RAMP = 1 << FF_RAMP;

        const SQUARE = 1 << FF_SQUARE;
        const TRIANGLE = 1 << FF_TRIANGLE;
        const SINE = 1 << FF_SINE;
        const SAW_UP = 1 << FF_SAW_UP;
        const SAW_DOWN = 1 << FF_SAW_DOWN;
        const CUSTOM = 1 << FF_CUSTOM;

        const GAIN = 1 << FF_GAIN;
        const AUTOCENTER = 1 << FF_AUTOCENTER;
    }
}

impl serde::Serialize for FeatureSet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        bitflags::serde::serialize(self, serializer)
    }
}

impl FeatureSet {
    /// Build a set from the kernel's `unsigned long` bitmap words.
    ///
    /// Word *i* holds bits `i * bits_per_word ..`; words past the
    /// 128-bit mask are ignored.
    pub fn from_words(words: &[u64], bits_per_word: u32) -> Self {
        let mut bits = 0u128;
        for (i, &w) in words.iter().enumerate() {
            let shift = i as u32 * bits_per_word;
            if shift >= u128::BITS {
                break;
            }
            bits |= (w as u128) << shift;
        }
        Self::from_bits_retain(bits)
    }

    /// Test a raw force-feedback code.
    pub fn has_code(&self, code: u16) -> bool {
        (code as usize) < FF_CNT && self.bits() & (1u128 << code) != 0
    }

    /// True when no bit at all is set (named or not).
    pub fn is_blank(&self) -> bool {
        self.bits() == 0
    }

    pub fn rumble(&self) -> bool {
        self.contains(Self::RUMBLE)
    }

    pub fn periodic(&self) -> bool {
        self.contains(Self::PERIODIC)
    }

    pub fn constant(&self) -> bool {
        self.contains(Self::CONSTANT)
    }

    pub fn ramp(&self) -> bool {
        self.contains(Self::RAMP)
    }

    pub fn gain(&self) -> bool {
        self.contains(Self::GAIN)
    }

    pub fn autocenter(&self) -> bool {
        self.contains(Self::AUTOCENTER)
    }

    /// Whether the device accepts effects of the given type.
    pub fn supports_effect(&self, kind: EffectType) -> bool {
        self.has_code(kind.code())
    }

    /// Whether the device can play periodic effects with this waveform.
    pub fn supports_waveform(&self, waveform: Waveform) -> bool {
        self.has_code(waveform.code())
    }

    /// Names of all set flags, in bit order. Unnamed bits are skipped.
    pub fn names(&self) -> Vec<&'static str> {
        self.iter_names().map(|(name, _)| name).collect()
    }
}
