//! `config` subcommand — show current configuration and file path.

use super::{Config, ConfigOutput, Options, Result, kv, kv_indent, kv_width, print_json};

/// Render an optional percentage setting.
fn percent_label(value: Option<i32>) -> String {
    match value {
        Some(v) => format!("{v}%"),
        None => "(unchanged)".into(),
    }
}

pub(super) fn cmd_config(opts: &Options) -> Result<()> {
    let custom_path = opts.config.as_deref();
    let config = super::load_config(custom_path);
    let config_path = custom_path.map(|p| p.to_path_buf()).or_else(Config::path);
    let config_exists = config_path.as_ref().is_some_and(|p| p.exists());
    let problems: Vec<String> = match config.validate() {
        Ok(()) => vec![],
        Err(errors) => errors.iter().map(ToString::to_string).collect(),
    };

    if opts.json {
        return print_json(&ConfigOutput {
            config_file: config_path.as_ref().map(|p| p.display().to_string()),
            config_file_exists: config_exists,
            settings: config,
            problems,
        });
    }

    let w = kv_width(
        &["Config file:"],
        &["device_dir:", "device:", "gain:", "autocenter:", "effects:"],
    );

    match &config_path {
        Some(p) if config_exists => kv("Config file:", format_args!("{} (loaded)", p.display()), w),
        Some(p) => kv(
            "Config file:",
            format_args!("{} (not found, using defaults)", p.display()),
            w,
        ),
        None => kv("Config file:", "(no config directory)", w),
    }
    println!();

    println!("Settings:");
    kv_indent("device_dir:", &config.device_dir, w);
    let device = if config.device.is_empty() {
        "(first device)"
    } else {
        config.device.as_str()
    };
    kv_indent("device:", device, w);
    kv_indent("gain:", percent_label(config.gain), w);
    kv_indent("autocenter:", percent_label(config.autocenter), w);
    if config.effects.is_empty() {
        kv_indent("effects:", "(none)", w);
    } else {
        let names: Vec<&str> = config.effects.keys().map(String::as_str).collect();
        kv_indent("effects:", names.join(", "), w);
    }

    if !problems.is_empty() {
        println!();
        println!("Problems:");
        for p in &problems {
            println!("  {p}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_label_formats() {
        assert_eq!(percent_label(Some(75)), "75%");
        assert_eq!(percent_label(None), "(unchanged)");
    }
}
