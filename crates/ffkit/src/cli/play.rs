//! `play` subcommand — upload an effect, play it, then stop and erase it.

use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use clap::{Args, ValueEnum};

use ffkit_lib::device::OpenDevice;
use ffkit_lib::transport::FfHandle;

use super::{
    Config, Effect, FfkitError, Options, PlayOutput, RUNNING, Result, Waveform, load_config,
    open_registry, print_json, select_device,
};

/// Flags that describe an effect; a preset already carries all of them.
const EFFECT_FLAGS: [&str; 11] = [
    "kind",
    "length",
    "delay",
    "strong",
    "weak",
    "waveform",
    "period",
    "magnitude",
    "level",
    "start",
    "end",
];

/// Poll interval while waiting for the effect to finish.
const WAIT_TICK: Duration = Duration::from_millis(20);

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(super) enum Kind {
    Rumble,
    Periodic,
    Constant,
    Ramp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(super) enum Wave {
    Square,
    Triangle,
    Sine,
    SawUp,
    SawDown,
}

impl From<Wave> for Waveform {
    fn from(w: Wave) -> Self {
        match w {
            Wave::Square => Waveform::Square,
            Wave::Triangle => Waveform::Triangle,
            Wave::Sine => Waveform::Sine,
            Wave::SawUp => Waveform::SawUp,
            Wave::SawDown => Waveform::SawDown,
        }
    }
}

#[derive(Debug, Args)]
pub struct PlayArgs {
    /// Device id or name (default: configured device, then 0)
    device: Option<String>,

    /// Play a named preset from the config's [effects] table
    #[arg(long, conflicts_with_all = EFFECT_FLAGS)]
    preset: Option<String>,

    /// Effect type
    #[arg(long = "type", value_enum, default_value_t = Kind::Rumble)]
    kind: Kind,

    /// Effect duration in milliseconds (0 = until Ctrl+C)
    #[arg(long, default_value_t = 1000)]
    length: u16,

    /// Delay before the effect starts, in milliseconds
    #[arg(long, default_value_t = 0)]
    delay: u16,

    /// Rumble: strong motor strength (0.0-1.0)
    #[arg(long, default_value_t = 0.75)]
    strong: f32,

    /// Rumble: weak motor strength (0.0-1.0)
    #[arg(long, default_value_t = 0.75)]
    weak: f32,

    /// Periodic: waveform
    #[arg(long, value_enum, default_value_t = Wave::Sine)]
    waveform: Wave,

    /// Periodic: waveform period in milliseconds
    #[arg(long, default_value_t = 100)]
    period: u16,

    /// Periodic: magnitude (0.0-1.0)
    #[arg(long, default_value_t = 0.5)]
    magnitude: f32,

    /// Constant: signed force level (-1.0-1.0)
    #[arg(long, default_value_t = 0.5, allow_negative_numbers = true)]
    level: f32,

    /// Ramp: signed start level (-1.0-1.0)
    #[arg(long, default_value_t = -0.5, allow_negative_numbers = true)]
    start: f32,

    /// Ramp: signed end level (-1.0-1.0)
    #[arg(long, default_value_t = 0.5, allow_negative_numbers = true)]
    end: f32,
}

/// Build the effect described by the per-type flags.
fn build_effect(args: &PlayArgs) -> Effect {
    let mut effect = match args.kind {
        Kind::Rumble => Effect::simple_rumble(args.strong, args.weak, 0.0),
        Kind::Periodic => {
            Effect::simple_periodic(args.waveform.into(), args.magnitude, args.period, 0.0)
        }
        Kind::Constant => Effect::simple_constant(args.level, 0.0),
        Kind::Ramp => Effect::simple_ramp(args.start, args.end, 0.0),
    };
    effect.length = args.length;
    effect.delay = args.delay;
    effect
}

/// Resolve the effect: a config preset if `--preset` was given, else the flags.
fn resolve_effect(args: &PlayArgs, presets: &Config) -> Result<Effect> {
    match &args.preset {
        Some(name) => presets
            .preset(name)
            .ok_or_else(|| FfkitError::Config(format!("no effect preset named \"{name}\""))),
        None => Ok(build_effect(args)),
    }
}

/// Block until `total` has elapsed or Ctrl+C. `None` waits for Ctrl+C only.
/// Returns true when interrupted.
fn wait(total: Option<Duration>) -> bool {
    let start = Instant::now();
    while RUNNING.load(Ordering::SeqCst) {
        if total.is_some_and(|t| start.elapsed() >= t) {
            return false;
        }
        std::thread::sleep(WAIT_TICK);
    }
    true
}

/// Upload `effect`, play it until it ends or Ctrl+C, then stop and erase it.
///
/// Once the upload succeeds, stop and erase always run and the first failure
/// is reported. Returns the slot and whether the wait was interrupted.
fn run_session<H: FfHandle>(
    device: &OpenDevice<'_, H>,
    effect: &mut Effect,
    announce: bool,
) -> Result<(i16, bool)> {
    let slot = device.upload(effect)?;
    let effect = &*effect;
    let name = device.info().name();

    let played = device.play(slot).map(|()| {
        log::info!("playing {} effect in slot {slot} on {name}", effect.kind());
        if announce {
            if effect.length == 0 {
                println!("Playing {} on {name} (Ctrl+C to stop)...", effect.kind());
            } else {
                println!(
                    "Playing {} on {name} for {} ms...",
                    effect.kind(),
                    effect.length
                );
            }
        }
        let total = (effect.length > 0)
            .then(|| Duration::from_millis(u64::from(effect.delay) + u64::from(effect.length)));
        wait(total)
    });

    let stopped = device.stop(slot);
    let erased = device.erase(slot);
    let interrupted = played?;
    stopped?;
    erased?;
    Ok((slot, interrupted))
}

pub(super) fn cmd_play(args: &PlayArgs, opts: &Options) -> Result<()> {
    let config = load_config(opts.config.as_deref());
    let mut effect = resolve_effect(args, &config)?;

    let registry = open_registry(opts, &config)?;
    let info = select_device(&registry, args.device.as_deref(), &config)?;
    let device = registry.open(info.id())?;

    if let Some(gain) = config.gain {
        device.set_gain(gain)?;
    }
    if let Some(autocenter) = config.autocenter {
        device.set_autocenter(autocenter)?;
    }

    let (slot, interrupted) = run_session(&device, &mut effect, !opts.json)?;

    if opts.json {
        return print_json(&PlayOutput {
            device: info.name().to_string(),
            slot,
            effect,
            interrupted,
        });
    }
    if interrupted {
        println!("Interrupted.");
    }
    Ok(())
}
