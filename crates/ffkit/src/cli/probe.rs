//! `probe` subcommand — check a single event node for force feedback.

use std::path::Path;

use ffkit_lib::probe;

use super::{Options, PlatformBackend, ProbeOutput, Result, kv, kv_width, print_json};

pub(super) fn cmd_probe(path: &Path, opts: &Options) -> Result<()> {
    let result = probe::probe(&PlatformBackend::default(), path);

    if opts.json {
        let output = match &result {
            Ok(caps) => ProbeOutput {
                path: path.display().to_string(),
                accepted: true,
                name: Some(caps.name.clone()),
                capacity: Some(caps.capacity),
                features: caps.features.names(),
                reason: None,
            },
            Err(reason) => ProbeOutput {
                path: path.display().to_string(),
                accepted: false,
                name: None,
                capacity: None,
                features: vec![],
                reason: Some(reason.to_string()),
            },
        };
        return print_json(&output);
    }

    let w = kv_width(&["Node:", "Result:", "Name:", "Effect slots:", "Features:"], &[]);
    kv("Node:", path.display(), w);
    match result {
        Ok(caps) => {
            kv("Result:", "accepted", w);
            kv("Name:", &caps.name, w);
            kv("Effect slots:", caps.capacity, w);
            kv("Features:", caps.features.names().join(", "), w);
        }
        Err(reason) => {
            kv("Result:", format_args!("rejected ({reason})"), w);
        }
    }
    Ok(())
}
