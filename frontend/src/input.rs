use std::time::Duration;

use log::debug;
use sdl2::event::Event;
use sdl2::keyboard::Keycode;
use sdl2::{EventPump, Sdl};

use vip8_core::{InputPort, KeyWait, PortError};

use crate::keymap::keymap;

/// # Input
/// Tracks the keypad from SDL2 keyboard events.
///
/// Closing the window or pressing Escape asks the machine to quit.
pub struct SdlInput {
    events: EventPump,
    pressed_keys: [bool; 16],
    quit: bool,
}

impl SdlInput {
    pub fn new(sdl: &Sdl) -> Result<Self, PortError> {
        Ok(SdlInput {
            events: sdl.event_pump()?,
            pressed_keys: [false; 16],
            quit: false,
        })
    }

    /// Applies an event, returning the keypad key it pressed down, if any
    fn handle(&mut self, event: Event) -> Option<u8> {
        match event {
            Event::Quit { .. }
            | Event::KeyDown {
                keycode: Some(Keycode::Escape),
                ..
            } => {
                if !self.quit {
                    debug!("quit requested");
                }
                self.quit = true;
                None
            }
            Event::KeyDown {
                keycode: Some(key),
                repeat,
                ..
            } => {
                let key = keymap(key)?;
                let was_pressed = self.pressed_keys[usize::from(key)];
                self.pressed_keys[usize::from(key)] = true;
                if was_pressed || repeat {
                    None
                } else {
                    Some(key)
                }
            }
            Event::KeyUp {
                keycode: Some(key), ..
            } => {
                if let Some(key) = keymap(key) {
                    self.pressed_keys[usize::from(key)] = false;
                }
                None
            }
            _ => None,
        }
    }

    /// Handles every queued event, returning the first key pressed down
    fn pump(&mut self) -> Option<u8> {
        let events: Vec<Event> = self.events.poll_iter().collect();
        let mut first = None;
        for event in events {
            let key = self.handle(event);
            first = first.or(key);
        }
        first
    }
}

impl InputPort for SdlInput {
    fn is_pressed(&mut self, key: u8) -> Result<bool, PortError> {
        self.pressed_keys
            .get(usize::from(key))
            .copied()
            .ok_or_else(|| format!("key {:#04X} is not on the keypad", key).into())
    }

    fn wait_for_keydown(&mut self, timeout: Duration) -> Result<KeyWait, PortError> {
        let mut pressed = self.pump();
        if pressed.is_none() && !self.quit {
            let timeout_ms = u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX);
            if let Some(event) = self.events.wait_event_timeout(timeout_ms) {
                pressed = self.handle(event);
            }
        }

        Ok(match (self.quit, pressed) {
            (true, _) => KeyWait::Cancelled,
            (false, Some(key)) => KeyWait::Pressed(key),
            (false, None) => KeyWait::Pending,
        })
    }

    fn quit_requested(&mut self) -> Result<bool, PortError> {
        self.pump();
        Ok(self.quit)
    }
}
