//! SDL2 window, beeper and keyboard for the vip8 machine

pub use display::{SdlDisplay, DEFAULT_SCALE};
pub use input::SdlInput;
pub use keymap::keymap;
pub use sound::SdlBeeper;

mod display;
mod input;
mod keymap;
mod sound;
