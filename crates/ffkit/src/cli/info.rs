//! `info` subcommand — capability table for one device.

use super::{
    DeviceInfo, EffectType, InfoOutput, Options, Result, Waveform, kv, kv_indent, kv_width,
    load_config, open_registry, print_json, select_device, yes_no,
};

fn supported_effects(dev: &DeviceInfo) -> Vec<&'static str> {
    EffectType::ALL
        .into_iter()
        .filter(|&k| dev.supports_effect(k))
        .map(EffectType::name)
        .collect()
}

fn supported_waveforms(dev: &DeviceInfo) -> Vec<&'static str> {
    Waveform::ALL
        .into_iter()
        .filter(|&w| dev.supports_waveform(w))
        .map(Waveform::name)
        .collect()
}

fn list_or_none(items: &[&str]) -> String {
    if items.is_empty() {
        "(none)".into()
    } else {
        items.join(", ")
    }
}

pub(super) fn cmd_info(selector: Option<&str>, opts: &Options) -> Result<()> {
    let config = load_config(opts.config.as_deref());
    let registry = open_registry(opts, &config)?;
    let dev = select_device(&registry, selector, &config)?;

    let effects = supported_effects(dev);
    let waveforms = supported_waveforms(dev);

    if opts.json {
        return print_json(&InfoOutput {
            device: dev,
            effects,
            waveforms,
            gain: dev.supports_gain(),
            autocenter: dev.supports_autocenter(),
        });
    }

    let w = kv_width(
        &["Device:", "Path:", "Id:", "Effect slots:", "Capabilities:"],
        &["Effects:", "Waveforms:", "Gain:", "Autocenter:", "Raw flags:"],
    );

    kv("Device:", dev.name(), w);
    kv("Path:", dev.path().display(), w);
    kv("Id:", dev.id(), w);
    kv("Effect slots:", dev.capacity(), w);
    println!();

    println!("Capabilities:");
    kv_indent("Effects:", list_or_none(&effects), w);
    kv_indent("Waveforms:", list_or_none(&waveforms), w);
    kv_indent("Gain:", yes_no(dev.supports_gain()), w);
    kv_indent("Autocenter:", yes_no(dev.supports_autocenter()), w);
    kv_indent("Raw flags:", list_or_none(&dev.features().names()), w);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_or_none_formats() {
        assert_eq!(list_or_none(&[]), "(none)");
        assert_eq!(list_or_none(&["rumble", "ramp"]), "rumble, ramp");
    }
}
