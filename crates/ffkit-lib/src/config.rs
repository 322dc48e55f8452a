//! Application configuration — TOML-based, platform-aware paths.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::effect::Effect;
use crate::protocol::DEVICE_DIR;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory scanned for `event*` nodes. Default: "/dev/input".
    #[serde(default = "default_device_dir")]
    pub device_dir: String,

    /// Preferred device: id or case-insensitive name substring. Empty = first device.
    #[serde(default)]
    pub device: String,

    /// Gain (0-100) applied before playing an effect. Unset = leave the device alone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gain: Option<i32>,

    /// Autocenter strength (0-100) applied before playing an effect.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autocenter: Option<i32>,

    /// Named effect presets.
    /// Example in TOML: `[effects.kick]` / `type = "rumble"` / `strong_magnitude = 40000`
    #[serde(default)]
    pub effects: BTreeMap<String, Effect>,
}

fn default_device_dir() -> String {
    DEVICE_DIR.into()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            device_dir: default_device_dir(),
            device: String::new(),
            gain: None,
            autocenter: None,
            effects: BTreeMap::new(),
        }
    }
}

const TOP_LEVEL_KEYS: &[&str] = &["device_dir", "device", "gain", "autocenter", "effects"];

/// Keys every `[effects.*]` table accepts, on top of its type's parameters.
const EFFECT_KEYS: &[&str] = &["type", "delay", "length"];

const ENVELOPE_KEYS: &[&str] = &["attack_length", "attack_level", "fade_length", "fade_level"];

/// Parameter keys for a preset's `type` value.
fn effect_param_keys(kind: &str) -> &'static [&'static str] {
    match kind {
        "rumble" => &["strong_magnitude", "weak_magnitude"],
        "periodic" => &[
            "waveform",
            "period",
            "magnitude",
            "offset",
            "phase",
            "envelope",
            "direction",
        ],
        "constant" => &["level", "envelope"],
        "ramp" => &["start_level", "end_level", "envelope"],
        _ => &[],
    }
}

/// Dotted paths of keys in `contents` that deserializing a [`Config`] ignores.
fn unknown_keys(contents: &str) -> Vec<String> {
    let Ok(table) = toml::from_str::<toml::Table>(contents) else {
        return vec![];
    };
    let mut unknown = Vec::new();
    for (key, value) in &table {
        if !TOP_LEVEL_KEYS.contains(&key.as_str()) {
            unknown.push(key.clone());
            continue;
        }
        let Some(effects) = value.as_table().filter(|_| key == "effects") else {
            continue;
        };
        for (name, preset) in effects {
            let Some(preset) = preset.as_table() else {
                continue;
            };
            let kind = preset.get("type").and_then(|v| v.as_str()).unwrap_or_default();
            let params = effect_param_keys(kind);
            for (field, value) in preset {
                let path = format!("effects.{name}.{field}");
                if field == "envelope"
                    && params.contains(&"envelope")
                    && let Some(envelope) = value.as_table()
                {
                    unknown.extend(
                        envelope
                            .keys()
                            .filter(|k| !ENVELOPE_KEYS.contains(&k.as_str()))
                            .map(|k| format!("{path}.{k}")),
                    );
                } else if !EFFECT_KEYS.contains(&field.as_str())
                    && !params.contains(&field.as_str())
                {
                    unknown.push(path);
                }
            }
        }
    }
    unknown
}

/// Validation errors that [`Config::validate`] can return.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// `device_dir` is empty or whitespace-only.
    EmptyDeviceDir,
    /// A percentage field is outside 0-100 (`field` is `"gain"` or `"autocenter"`).
    PercentOutOfRange { field: &'static str, value: i32 },
    /// An `effects` entry has an empty or whitespace-only name.
    EmptyPresetName,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyDeviceDir => write!(f, "Device directory cannot be empty"),
            ValidationError::PercentOutOfRange { field, value } => {
                write!(f, "Invalid {field}: {value} (must be 0-100)")
            }
            ValidationError::EmptyPresetName => write!(f, "Effect preset name cannot be empty"),
        }
    }
}

impl Config {
    /// Platform-specific config directory.
    pub fn dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("ffkit"))
    }

    /// Full path to config file.
    pub fn path() -> Option<PathBuf> {
        Self::dir().map(|d| d.join("config.toml"))
    }

    /// Load config from disk, or return defaults if not found.
    pub fn load() -> Self {
        let (config, warnings) = Self::load_with_warnings();
        for w in &warnings {
            log::warn!("{w}");
        }
        config
    }

    /// Load config from an arbitrary path, returning the config and any parse warnings.
    ///
    /// Returns `(defaults, [])` if the file doesn't exist.
    /// Returns `(defaults, [warning])` if the file exists but can't be parsed.
    /// Keys that would be silently dropped are reported as one warning each.
    pub fn load_from(path: &Path) -> (Self, Vec<String>) {
        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    let warnings = unknown_keys(&contents)
                        .into_iter()
                        .map(|key| {
                            format!("config: unknown key `{key}` ignored ({})", path.display())
                        })
                        .collect();
                    (config, warnings)
                }
                Err(e) => {
                    let warning = format!(
                        "config parse error ({}), using defaults: {e}",
                        path.display()
                    );
                    (Self::default(), vec![warning])
                }
            },
            Err(_) => (Self::default(), vec![]),
        }
    }

    /// Load config from the default path, returning the config and any parse warnings.
    pub fn load_with_warnings() -> (Self, Vec<String>) {
        let Some(path) = Self::path() else {
            return (Self::default(), vec![]);
        };
        Self::load_from(&path)
    }

    /// Look up a named preset. The returned effect is not uploaded (`id == -1`).
    pub fn preset(&self, name: &str) -> Option<Effect> {
        self.effects.get(name).copied()
    }

    /// Validate the entire config, collecting all errors.
    ///
    /// Returns `Ok(())` if valid, or `Err(Vec<ValidationError>)` with all problems found.
    pub fn validate(&self) -> std::result::Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.device_dir.trim().is_empty() {
            errors.push(ValidationError::EmptyDeviceDir);
        }

        for (field, value) in [("gain", self.gain), ("autocenter", self.autocenter)] {
            if let Some(v) = value
                && !(0..=100).contains(&v)
            {
                errors.push(ValidationError::PercentOutOfRange { field, value: v });
            }
        }

        if self.effects.keys().any(|k| k.trim().is_empty()) {
            errors.push(ValidationError::EmptyPresetName);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
