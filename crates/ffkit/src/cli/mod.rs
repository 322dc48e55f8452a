//! CLI subcommands — device listing, capability queries, effect playback.

mod config_cmd;
mod devices;
mod gain;
mod info;
mod play;
mod probe;

use std::path::{Path, PathBuf};

use clap::Subcommand;
use serde::Serialize;

pub(super) use crate::RUNNING;
pub(super) use ffkit_lib::config::Config;
pub(super) use ffkit_lib::device::{DeviceError, DeviceInfo};
pub(super) use ffkit_lib::effect::{Effect, EffectType, Waveform};
pub(super) use ffkit_lib::error::{FfkitError, Result};
pub(super) use ffkit_lib::registry::Registry;
pub(super) use ffkit_lib::transport::PlatformBackend;

/// Global options shared by every subcommand.
pub struct Options {
    pub json: bool,
    pub config: Option<PathBuf>,
    pub device_dir: Option<PathBuf>,
}

/// Load the config from `custom_path` or the default location, logging
/// parse and validation problems.
pub(super) fn load_config(custom_path: Option<&Path>) -> Config {
    let (config, warnings) = match custom_path {
        Some(p) => Config::load_from(p),
        None => Config::load_with_warnings(),
    };
    for w in &warnings {
        log::warn!("{w}");
    }
    if let Err(errors) = config.validate() {
        for e in &errors {
            log::warn!("config: {e}");
        }
    }
    config
}

/// Directory to enumerate: `--device-dir`, else the config's `device_dir`.
pub(super) fn device_dir(opts: &Options, config: &Config) -> PathBuf {
    opts.device_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.device_dir))
}

pub(super) fn open_registry(opts: &Options, config: &Config) -> Result<Registry> {
    Registry::init_with(PlatformBackend::default(), device_dir(opts, config))
}

/// Resolve the `DEVICE` argument, falling back to the config's `device`.
pub(super) fn select_device<'r>(
    registry: &'r Registry,
    selector: Option<&str>,
    config: &Config,
) -> Result<&'r DeviceInfo> {
    let selector = selector.unwrap_or(&config.device);
    registry.select(selector).ok_or_else(|| {
        if selector.trim().is_empty() {
            log::warn!("no force-feedback devices in {}", registry.dir().display());
        } else {
            log::warn!("no device matches \"{selector}\"");
        }
        FfkitError::Device(DeviceError::NotFound)
    })
}

pub(super) fn yes_no(b: bool) -> &'static str {
    if b { "yes" } else { "no" }
}

const PADDING: usize = 2;

/// Compute alignment width for a command's key-value output.
/// Ensures at least PADDING spaces after the longest key in either level,
/// with top-level and indent values aligned to the same column.
pub(super) fn kv_width(top: &[&str], indent: &[&str]) -> usize {
    let top_max = top.iter().map(|k| k.len()).max().unwrap_or(0);
    let indent_max = indent.iter().map(|k| k.len()).max().unwrap_or(0);
    let top_need = if top.is_empty() { 0 } else { top_max + PADDING };
    // Indent keys lose 2 chars of inner width to the "  " prefix
    let indent_need = if indent.is_empty() {
        0
    } else {
        indent_max + PADDING + 2
    };
    top_need.max(indent_need)
}

pub(super) fn format_kv(key: &str, value: impl std::fmt::Display, w: usize) -> String {
    format!("{key:<width$}{value}", width = w)
}

pub(super) fn kv(key: &str, value: impl std::fmt::Display, w: usize) {
    println!("{}", format_kv(key, value, w));
}

pub(super) fn kv_indent(key: &str, value: impl std::fmt::Display, w: usize) {
    println!("  {key:<width$}{value}", width = w - 2);
}

/// Print a value as pretty JSON.
pub(super) fn print_json(value: &impl Serialize) -> Result<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| FfkitError::Io(std::io::Error::other(e)))?;
    println!("{text}");
    Ok(())
}

// ── JSON output structs ──

#[derive(Serialize)]
pub(super) struct DevicesOutput<'a> {
    pub device_dir: String,
    pub count: usize,
    pub devices: Vec<&'a DeviceInfo>,
}

#[derive(Serialize)]
pub(super) struct InfoOutput<'a> {
    pub device: &'a DeviceInfo,
    pub effects: Vec<&'static str>,
    pub waveforms: Vec<&'static str>,
    pub gain: bool,
    pub autocenter: bool,
}

#[derive(Serialize)]
pub(super) struct ProbeOutput {
    pub path: String,
    pub accepted: bool,
    pub name: Option<String>,
    pub capacity: Option<i32>,
    pub features: Vec<&'static str>,
    pub reason: Option<String>,
}

#[derive(Serialize)]
pub(super) struct PlayOutput {
    pub device: String,
    pub slot: i16,
    pub effect: Effect,
    pub interrupted: bool,
}

#[derive(Serialize)]
pub(super) struct ControlOutput {
    pub device: String,
    pub control: &'static str,
    pub percent: i32,
}

#[derive(Serialize)]
pub(super) struct ConfigOutput {
    pub config_file: Option<String>,
    pub config_file_exists: bool,
    pub settings: Config,
    pub problems: Vec<String>,
}

#[derive(Subcommand)]
pub enum Command {
    /// List force-feedback devices
    Devices,

    /// Show the capabilities of one device
    Info {
        /// Device id or name (default: configured device, then 0)
        device: Option<String>,
    },

    /// Probe a single event node and report whether it supports force feedback
    Probe {
        /// Path to an event node, e.g. /dev/input/event5
        path: PathBuf,
    },

    /// Upload and play an effect, then stop and erase it
    Play(play::PlayArgs),

    /// Set the device gain (0-100)
    Gain {
        /// Gain in percent; values outside 0-100 are clamped
        #[arg(allow_negative_numbers = true)]
        percent: i32,
        /// Device id or name (default: configured device, then 0)
        device: Option<String>,
    },

    /// Set the autocenter strength (0-100)
    Autocenter {
        /// Strength in percent; values outside 0-100 are clamped
        #[arg(allow_negative_numbers = true)]
        percent: i32,
        /// Device id or name (default: configured device, then 0)
        device: Option<String>,
    },

    /// Show current configuration and file path
    Config,
}

pub fn run(cmd: Command, opts: &Options) -> Result<()> {
    match cmd {
        Command::Devices => devices::cmd_devices(opts),
        Command::Info { device } => info::cmd_info(device.as_deref(), opts),
        Command::Probe { path } => probe::cmd_probe(&path, opts),
        Command::Play(args) => play::cmd_play(&args, opts),
        Command::Gain { percent, device } => {
            gain::cmd_control(gain::Control::Gain, percent, device.as_deref(), opts)
        }
        Command::Autocenter { percent, device } => {
            gain::cmd_control(gain::Control::Autocenter, percent, device.as_deref(), opts)
        }
        Command::Config => config_cmd::cmd_config(opts),
    }
}

#[cfg(test)]
mod format_tests {
    use super::*;

    #[test]
    fn kv_width_top_only() {
        let w = kv_width(&["Short:", "Longer key:"], &[]);
        // "Longer key:" = 11 + PADDING = 13
        assert_eq!(w, 13);
    }

    #[test]
    fn kv_width_indent_drives_width() {
        // Indent key needs +2 for the prefix
        let w = kv_width(&["A:"], &["Very long indent key:"]);
        // "Very long indent key:" = 21 + PADDING + 2 = 25
        assert_eq!(w, 25);
    }

    #[test]
    fn kv_width_top_drives_width() {
        let w = kv_width(&["Very long top key:"], &["Short:"]);
        // top: 18+2=20, indent: 6+2+2=10 → 20
        assert_eq!(w, 20);
    }

    #[test]
    fn values_align_across_levels() {
        let w = kv_width(&["Top:"], &["Indent:"]);
        let top = format_kv("Top:", "V", w);
        let indent = format!("  {:<width$}{}", "Indent:", "V", width = w - 2);
        assert_eq!(top.find('V'), indent.find('V'));
    }

    #[test]
    fn format_kv_basic() {
        assert_eq!(format_kv("Key:", "value", 10), "Key:      value");
    }

    #[test]
    fn format_kv_exact_width() {
        // "ExactWidth:" is 11 chars and exceeds width, no padding added
        assert_eq!(format_kv("ExactWidth:", "val", 10), "ExactWidth:val");
    }

    #[test]
    fn kv_width_empty_both() {
        assert_eq!(kv_width(&[], &[]), 0);
    }
}


#[cfg(test)]
mod json_output_tests {
    use super::*;

    #[test]
    fn probe_output_rejected_has_reason() {
        let output = ProbeOutput {
            path: "/dev/input/event0".into(),
            accepted: false,
            name: None,
            capacity: None,
            features: vec![],
            reason: Some("no force-feedback features".into()),
        };
        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["accepted"], false);
        assert!(json["name"].is_null());
        assert_eq!(json["reason"], "no force-feedback features");
    }

    #[test]
    fn play_output_omits_effect_id() {
        let output = PlayOutput {
            device: "Pad".into(),
            slot: 3,
            effect: Effect::rumble(100, 200, 300),
            interrupted: false,
        };
        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["slot"], 3);
        assert_eq!(json["effect"]["type"], "rumble");
        assert_eq!(json["effect"]["strong_magnitude"], 100);
        assert!(json["effect"].get("id").is_none());
    }

    #[test]
    fn config_output_complete() {
        let output = ConfigOutput {
            config_file: Some("/home/user/.config/ffkit/config.toml".into()),
            config_file_exists: true,
            settings: Config::default(),
            problems: vec![],
        };
        let json = serde_json::to_value(&output).unwrap();
        assert!(json["config_file"].is_string());
        assert_eq!(json["config_file_exists"], true);
        assert_eq!(json["settings"]["device_dir"], "/dev/input");
        assert!(json["settings"]["effects"].is_object());
        assert!(json["problems"].as_array().unwrap().is_empty());
    }

    #[test]
    fn control_output_fields() {
        let output = ControlOutput {
            device: "Wheel".into(),
            control: "gain",
            percent: 80,
        };
        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json.as_object().unwrap().len(), 3);
        assert_eq!(json["control"], "gain");
    }
}
