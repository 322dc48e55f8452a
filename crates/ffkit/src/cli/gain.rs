//! `gain` and `autocenter` subcommands — global device controls.

use super::{
    ControlOutput, Options, Result, load_config, open_registry, print_json, select_device,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Control {
    Gain,
    Autocenter,
}

impl Control {
    fn name(self) -> &'static str {
        match self {
            Control::Gain => "gain",
            Control::Autocenter => "autocenter",
        }
    }
}

pub(super) fn cmd_control(
    control: Control,
    percent: i32,
    selector: Option<&str>,
    opts: &Options,
) -> Result<()> {
    let config = load_config(opts.config.as_deref());
    let registry = open_registry(opts, &config)?;
    let info = select_device(&registry, selector, &config)?;
    let device = registry.open(info.id())?;

    let clamped = percent.clamp(0, 100);
    if clamped != percent {
        log::warn!("{} {percent} out of range, using {clamped}", control.name());
    }
    match control {
        Control::Gain => device.set_gain(clamped)?,
        Control::Autocenter => device.set_autocenter(clamped)?,
    }

    if opts.json {
        return print_json(&ControlOutput {
            device: info.name().to_string(),
            control: control.name(),
            percent: clamped,
        });
    }
    println!("Set {} to {clamped}% on {}.", control.name(), info.name());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_names() {
        assert_eq!(Control::Gain.name(), "gain");
        assert_eq!(Control::Autocenter.name(), "autocenter");
    }
}
