use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use log::debug;

use vip8_core::{Chip8, Config, HaltReason};
use vip8_frontend::{SdlBeeper, SdlDisplay, SdlInput};

/// Opens a window for `rom` and runs it until it halts or the window is closed
pub fn run(rom: &Path, scale: u32, config: Config) -> Result<HaltReason> {
    // Get SDL2 context
    let sdl = sdl2::init()
        .map_err(anyhow::Error::msg)
        .context("unable to initialise SDL2")?;
    let video = sdl.video().map_err(anyhow::Error::msg)?;
    let audio = sdl.audio().map_err(anyhow::Error::msg)?;

    let title = format!("{} - vip8", rom_name(rom));
    let display = SdlDisplay::new(&video, &title, scale)
        .map_err(|e| anyhow!(e))
        .context("unable to open a window")?;
    let beeper = SdlBeeper::new(&audio)
        .map_err(|e| anyhow!(e))
        .context("unable to open an audio device")?;
    let input = SdlInput::new(&sdl).map_err(|e| anyhow!(e))?;

    debug!("starting with {:?}", config);
    let mut chip8 = Chip8::new(config, display, beeper, input);

    // Load ROM
    let file =
        File::open(rom).with_context(|| format!("unable to open ROM {}", rom.display()))?;
    let mut reader = BufReader::new(file);
    chip8
        .load_program(&mut reader)
        .with_context(|| format!("unable to load ROM {}", rom.display()))?;

    chip8
        .run()
        .with_context(|| format!("{} stopped on an error", rom_name(rom)))
}

fn rom_name(rom: &Path) -> String {
    rom.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| rom.display().to_string())
}
