//! Protocol constants for the Linux evdev force-feedback interface.
//!
//! All values come from `<linux/input.h>` and `<linux/input-event-codes.h>`.
//! They are part of the kernel ABI: the effect-type and waveform codes are
//! contiguous ranges, and the library's zero-based enums are translated by
//! adding the first code of each range.

// ── Device discovery ──

/// Directory holding the evdev character devices.
pub const DEVICE_DIR: &str = "/dev/input";

/// Only nodes whose file name starts with this prefix are probed.
pub const NODE_PREFIX: &str = "event";

/// Buffer size for `EVIOCGNAME`; longer names are truncated by the kernel.
pub const NAME_MAX_LEN: usize = 128;

/// Display name used when the device does not report one.
pub const NAME_PLACEHOLDER: &str = "Unknown";

// ── Event types ──

/// Force-feedback event type (`EV_FF`).
pub const EV_FF: u16 = 0x15;

// ── Effect types (FF_RUMBLE ..= FF_RAMP) ──

pub const FF_RUMBLE: u16 = 0x50;
pub const FF_PERIODIC: u16 = 0x51;
pub const FF_CONSTANT: u16 = 0x52;
pub const FF_SPRING: u16 = 0x53;
pub const FF_FRICTION: u16 = 0x54;
pub const FF_DAMPER: u16 = 0x55;
pub const FF_INERTIA: u16 = 0x56;
pub const FF_RAMP: u16 = 0x57;

// ── Periodic waveforms (FF_SQUARE ..= FF_CUSTOM) ──

pub const FF_SQUARE: u16 = 0x58;
pub const FF_TRIANGLE: u16 = 0x59;
pub const FF_SINE: u16 = 0x5a;
pub const FF_SAW_UP: u16 = 0x5b;
pub const FF_SAW_DOWN: u16 = 0x5c;
pub const FF_CUSTOM: u16 = 0x5d;

// ── Global device properties ──

/// Event code for the device-wide output gain.
pub const FF_GAIN: u16 = 0x60;

/// Event code for the autocenter spring strength.
pub const FF_AUTOCENTER: u16 = 0x61;

/// Highest force-feedback code (`FF_MAX`).
pub const FF_MAX: u16 = 0x7f;

/// Width of the force-feedback bitmask in bits (`FF_CNT`).
pub const FF_CNT: usize = FF_MAX as usize + 1;

// ── Effect status values for EV_FF play events ──

pub const FF_STATUS_STOPPED: i32 = 0x00;
pub const FF_STATUS_PLAYING: i32 = 0x01;

/// Full-scale value for `FF_GAIN` / `FF_AUTOCENTER` events.
pub const FF_LEVEL_MAX: u32 = 0xFFFF;

// ── ioctl numbers (type 'E') ──

/// ioctl type byte shared by all evdev requests.
pub const EVDEV_IOC_MAGIC: u8 = b'E';

/// `EVIOCGNAME(len)` request number.
pub const EVIOCGNAME_NR: u8 = 0x06;

/// `EVIOCGBIT(ev, len)` request number base; the event type is added.
pub const EVIOCGBIT_NR: u8 = 0x20;

/// `EVIOCSFF` request number (upload effect).
pub const EVIOCSFF_NR: u8 = 0x80;

/// `EVIOCRMFF` request number (erase effect).
pub const EVIOCRMFF_NR: u8 = 0x81;

/// `EVIOCGEFFECTS` request number (number of effect slots).
pub const EVIOCGEFFECTS_NR: u8 = 0x84;

/// Convert a 0-100 percentage to the kernel's 16-bit full-scale range.
///
/// Inputs outside `[0, 100]` are clamped first; the result is rounded to
/// the nearest integer.
pub fn percent_to_level(percent: i32) -> i32 {
    let p = percent.clamp(0, 100) as u32;
    ((FF_LEVEL_MAX * p + 50) / 100) as i32
}
