use std::collections::VecDeque;
use std::time::Duration;

use crate::error::PortError;
use crate::framebuffer::Frame;

/// DisplayPort is used by the machine to put the frame buffer on a screen. It should
/// abstract the implementation details, so a variety of kinds of screen would work.
pub trait DisplayPort {
    /// Draw a complete frame; there are no partial updates
    fn render(&mut self, frame: &Frame) -> Result<(), PortError>;
}

/// Makes the buzzer sound while the sound timer runs
pub trait SoundPort {
    /// Start a continuous tone; starting an already playing port changes its pitch
    fn start(&mut self, frequency_hz: u32) -> Result<(), PortError>;
    fn stop(&mut self) -> Result<(), PortError>;
    fn is_playing(&self) -> bool;
}

/// Outcome of waiting for the next key press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyWait {
    /// A keypad key went down
    Pressed(u8),
    /// Nothing happened before the timeout
    Pending,
    /// The host asked to quit while we were waiting
    Cancelled,
}

/// Reads the 16-key hexadecimal keypad
pub trait InputPort {
    /// Whether keypad key `key` (0..=0xF) is held right now
    fn is_pressed(&mut self, key: u8) -> Result<bool, PortError>;

    /// Wait up to `timeout` for a key to go down.
    /// Keys already held when the wait starts don't count.
    fn wait_for_keydown(&mut self, timeout: Duration) -> Result<KeyWait, PortError>;

    /// Whether the host wants the machine to stop
    fn quit_requested(&mut self) -> Result<bool, PortError>;
}

/// Display that keeps the last frame it was given; useful when there is no screen
#[derive(Debug, Default)]
pub struct NullDisplay {
    frames: usize,
    last_frame: Option<Frame>,
}

impl NullDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many frames have been rendered
    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn last_frame(&self) -> Option<&Frame> {
        self.last_frame.as_ref()
    }
}

impl DisplayPort for NullDisplay {
    fn render(&mut self, frame: &Frame) -> Result<(), PortError> {
        self.frames += 1;
        self.last_frame = Some(*frame);
        Ok(())
    }
}

/// Silent sound port that still tracks whether it should be playing
#[derive(Debug, Default)]
pub struct Mute {
    playing: bool,
    starts: usize,
    frequency_hz: u32,
}

impl Mute {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many times the tone went from stopped to playing
    pub fn starts(&self) -> usize {
        self.starts
    }

    pub fn frequency_hz(&self) -> u32 {
        self.frequency_hz
    }
}

impl SoundPort for Mute {
    fn start(&mut self, frequency_hz: u32) -> Result<(), PortError> {
        if !self.playing {
            self.starts += 1;
        }
        self.playing = true;
        self.frequency_hz = frequency_hz;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), PortError> {
        self.playing = false;
        Ok(())
    }

    fn is_playing(&self) -> bool {
        self.playing
    }
}

/// Input port driven by a script rather than a keyboard
///
/// Held keys are set directly; each call to `wait_for_keydown` takes the next entry off the
/// queue, answering `Pending` once it is empty.
#[derive(Debug, Default)]
pub struct ScriptedInput {
    held: [bool; 16],
    key_waits: VecDeque<KeyWait>,
    quit: bool,
}

impl ScriptedInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hold(&mut self, key: u8) {
        self.held[usize::from(key & 0xF)] = true;
    }

    pub fn release(&mut self, key: u8) {
        self.held[usize::from(key & 0xF)] = false;
    }

    /// Queue the answer to a future `wait_for_keydown`
    pub fn queue(&mut self, wait: KeyWait) {
        self.key_waits.push_back(wait);
    }

    pub fn request_quit(&mut self) {
        self.quit = true;
    }
}

impl InputPort for ScriptedInput {
    fn is_pressed(&mut self, key: u8) -> Result<bool, PortError> {
        self.held
            .get(usize::from(key))
            .copied()
            .ok_or_else(|| format!("key {:#04X} is not on the keypad", key).into())
    }

    fn wait_for_keydown(&mut self, _timeout: Duration) -> Result<KeyWait, PortError> {
        Ok(self.key_waits.pop_front().unwrap_or(KeyWait::Pending))
    }

    fn quit_requested(&mut self) -> Result<bool, PortError> {
        Ok(self.quit)
    }
}

#[cfg(test)]
mod test_ports {
    use super::*;
    use crate::constants::{DISPLAY_HEIGHT, DISPLAY_WIDTH};

    #[test]
    fn test_null_display_keeps_last_frame() {
        let mut display = NullDisplay::new();
        let mut frame = [[false; DISPLAY_WIDTH]; DISPLAY_HEIGHT];
        frame[1][2] = true;
        display.render(&frame).unwrap();
        assert_eq!(display.frames(), 1);
        assert!(display.last_frame().unwrap()[1][2]);
    }

    #[test]
    fn test_mute_counts_starts() {
        let mut sound = Mute::new();
        sound.start(400).unwrap();
        sound.start(400).unwrap();
        assert!(sound.is_playing());
        sound.stop().unwrap();
        assert!(!sound.is_playing());
        assert_eq!(sound.starts(), 1);
        assert_eq!(sound.frequency_hz(), 400);
    }

    #[test]
    fn test_scripted_input() {
        let mut input = ScriptedInput::new();
        input.hold(0xE);
        assert!(input.is_pressed(0xE).unwrap());
        assert!(!input.is_pressed(0x1).unwrap());
        assert!(input.is_pressed(0x10).is_err());

        input.queue(KeyWait::Pressed(0x5));
        let timeout = Duration::from_millis(1);
        assert_eq!(input.wait_for_keydown(timeout).unwrap(), KeyWait::Pressed(0x5));
        assert_eq!(input.wait_for_keydown(timeout).unwrap(), KeyWait::Pending);

        assert!(!input.quit_requested().unwrap());
        input.request_quit();
        assert!(input.quit_requested().unwrap());
    }
}
