use std::path::PathBuf;

use clap::Parser;
use log::info;

use vip8_core::constants::TONE_HZ;
use vip8_core::{Config, Quirks, StackPolicy, CLOCK_SPEED_HZ};
use vip8_frontend::DEFAULT_SCALE;

mod run;

/// Runs a Chip-8 ROM in a window
///
/// Keypad: 1234 / QWER / ASDF / ZXCV. Escape quits.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the ROM file to run
    #[arg(default_value = "roms/PONG")]
    rom: PathBuf,

    /// Size multiplier for each pixel
    #[arg(long, default_value_t = DEFAULT_SCALE)]
    scale: u32,

    /// Instructions per second
    #[arg(long, default_value_t = CLOCK_SPEED_HZ)]
    cycle_hz: u32,

    /// Run instructions as fast as possible
    #[arg(long, conflicts_with = "cycle_hz")]
    unthrottled: bool,

    /// 8XY6/8XYE shift VY into VX
    #[arg(long)]
    shift_uses_vy: bool,

    /// BNNN jumps to XNN + VX
    #[arg(long)]
    jump_uses_vx: bool,

    /// FX55/FX65 leave I past the last register transferred
    #[arg(long)]
    load_store_increments_i: bool,

    /// 7XKK leaves VF alone
    #[arg(long)]
    no_add_flag: bool,

    /// Treat 0x0000 as padding instead of stopping
    #[arg(long)]
    no_halt_on_zero: bool,

    /// Clamp the call stack at 16 entries instead of failing
    #[arg(long)]
    clamp_stack: bool,

    /// Pitch of the buzzer in Hz
    #[arg(long, default_value_t = TONE_HZ)]
    tone_hz: u32,

    /// Seed for the random number generator
    #[arg(long)]
    seed: Option<u64>,
}

impl Args {
    fn config(&self) -> Config {
        Config {
            quirks: Quirks {
                shift_uses_vy: self.shift_uses_vy,
                jump_uses_vx: self.jump_uses_vx,
                load_store_increments_i: self.load_store_increments_i,
                add_immediate_sets_flag: !self.no_add_flag,
            },
            halt_on_zero: !self.no_halt_on_zero,
            stack_policy: if self.clamp_stack {
                StackPolicy::Clamp
            } else {
                StackPolicy::Strict
            },
            tone_hz: self.tone_hz,
            cycle_hz: if self.unthrottled {
                None
            } else {
                Some(self.cycle_hz)
            },
            seed: self.seed,
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    let reason = run::run(&args.rom, args.scale, args.config())?;
    info!("stopped: {:?}", reason);

    Ok(())
}
