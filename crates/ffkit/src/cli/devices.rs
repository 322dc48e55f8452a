//! `devices` subcommand — list force-feedback devices.

use super::{DevicesOutput, Options, Result, load_config, open_registry, print_json};

pub(super) fn cmd_devices(opts: &Options) -> Result<()> {
    let config = load_config(opts.config.as_deref());
    let registry = open_registry(opts, &config)?;

    if opts.json {
        return print_json(&DevicesOutput {
            device_dir: registry.dir().display().to_string(),
            count: registry.count(),
            devices: registry.devices().collect(),
        });
    }

    if registry.count() == 0 {
        println!(
            "No force-feedback devices found in {}.",
            registry.dir().display()
        );
        return Ok(());
    }

    println!(
        "Found {} force-feedback device{}:",
        registry.count(),
        if registry.count() == 1 { "" } else { "s" }
    );
    println!();

    for dev in registry.devices() {
        println!("  [{}] {}", dev.id(), dev.name());
        println!("      Path:  {}", dev.path().display());
        println!("      Slots: {}", dev.capacity());
    }

    Ok(())
}
