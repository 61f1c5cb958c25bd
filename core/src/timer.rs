use std::time::Duration;

use crate::constants::TIMER_PERIOD;
use crate::error::{MachineError, Result};
use crate::ports::SoundPort;
use crate::state::State;

/// # Timers
/// Counts the delay and sound timers down at 60Hz of wall-clock time.
///
/// Elapsed time is banked per timer and spent one `TIMER_PERIOD` at a time, so the decay rate
/// doesn't depend on how many instructions run in between. A timer sitting at 0 banks nothing;
/// setting it later starts a fresh period. Time is spent before the next instruction runs, so a
/// value written by FX15/FX18 is only charged for time that passes after the write.
#[derive(Debug, Default)]
pub struct TimerScheduler {
    delay: Duration,
    sound: Duration,
}

impl TimerScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spend `elapsed` on both timers, then bring the sound port in line with the sound timer
    ///
    /// # Arguments
    /// * `state` the machine owning DT and ST
    /// * `elapsed` wall-clock time since the previous tick
    /// * `sound` the port to start while ST > 0 and stop once it reaches 0
    /// * `tone_hz` the pitch to start the port with
    pub fn tick(
        &mut self,
        state: &mut State,
        elapsed: Duration,
        sound: &mut dyn SoundPort,
        tone_hz: u32,
    ) -> Result<()> {
        let delay = decay(&mut self.delay, state.delay_timer(), elapsed);
        state.set_delay_timer(delay);
        let remaining = decay(&mut self.sound, state.sound_timer(), elapsed);
        state.set_sound_timer(remaining);
        self.sync_sound(state, sound, tone_hz)
    }

    /// Start the sound port while ST > 0 and stop it once ST is 0
    pub fn sync_sound(&self, state: &State, sound: &mut dyn SoundPort, tone_hz: u32) -> Result<()> {
        let remaining = state.sound_timer();
        if remaining > 0 && !sound.is_playing() {
            sound.start(tone_hz).map_err(MachineError::SoundPort)?;
        } else if remaining == 0 && sound.is_playing() {
            sound.stop().map_err(MachineError::SoundPort)?;
        }
        Ok(())
    }
}

/// Returns the timer's new value after banking `elapsed`
fn decay(bank: &mut Duration, value: u8, elapsed: Duration) -> u8 {
    if value == 0 {
        *bank = Duration::ZERO;
        return 0;
    }

    *bank += elapsed;
    let periods = bank.as_nanos() / TIMER_PERIOD.as_nanos();
    let spent = periods.min(u128::from(value)) as u8;
    if spent == value {
        *bank = Duration::ZERO;
    } else {
        *bank -= TIMER_PERIOD * u32::from(spent);
    }
    value - spent
}

#[cfg(test)]
mod test_timer {
    use super::*;
    use crate::ports::Mute;

    fn tick_for(timers: &mut TimerScheduler, state: &mut State, sound: &mut Mute, elapsed: Duration) {
        timers.tick(state, elapsed, sound, 400).unwrap();
    }

    #[test]
    fn test_delay_decays_with_wall_clock() {
        let mut timers = TimerScheduler::new();
        let mut state = State::new();
        let mut sound = Mute::new();
        state.set_delay_timer(10);
        // ~166ms in 1ms slices
        for _ in 0..166 {
            tick_for(&mut timers, &mut state, &mut sound, Duration::from_millis(1));
        }
        assert!(state.delay_timer() <= 1, "DT = {}", state.delay_timer());
    }

    #[test]
    fn test_decay_independent_of_tick_count() {
        let mut coarse = (TimerScheduler::new(), State::new());
        let mut fine = (TimerScheduler::new(), State::new());
        let mut sound = Mute::new();
        coarse.1.set_delay_timer(200);
        fine.1.set_delay_timer(200);

        tick_for(&mut coarse.0, &mut coarse.1, &mut sound, Duration::from_millis(500));
        for _ in 0..5000 {
            tick_for(&mut fine.0, &mut fine.1, &mut sound, Duration::from_micros(100));
        }
        // 500ms is 30 periods
        assert_eq!(coarse.1.delay_timer(), 170);
        assert_eq!(fine.1.delay_timer(), 170);
    }

    #[test]
    fn test_partial_period_is_banked() {
        let mut timers = TimerScheduler::new();
        let mut state = State::new();
        let mut sound = Mute::new();
        state.set_delay_timer(5);
        tick_for(&mut timers, &mut state, &mut sound, TIMER_PERIOD / 2);
        assert_eq!(state.delay_timer(), 5);
        tick_for(&mut timers, &mut state, &mut sound, TIMER_PERIOD / 2);
        assert_eq!(state.delay_timer(), 4);
    }

    #[test]
    fn test_timer_stops_at_zero() {
        let mut timers = TimerScheduler::new();
        let mut state = State::new();
        let mut sound = Mute::new();
        state.set_delay_timer(2);
        tick_for(&mut timers, &mut state, &mut sound, Duration::from_secs(1));
        assert_eq!(state.delay_timer(), 0);

        // nothing carries over into the next countdown
        state.set_delay_timer(2);
        tick_for(&mut timers, &mut state, &mut sound, Duration::from_millis(1));
        assert_eq!(state.delay_timer(), 2);
    }

    #[test]
    fn test_sound_follows_sound_timer() {
        let mut timers = TimerScheduler::new();
        let mut state = State::new();
        let mut sound = Mute::new();
        state.set_sound_timer(2);

        tick_for(&mut timers, &mut state, &mut sound, Duration::ZERO);
        assert!(sound.is_playing());
        assert_eq!(sound.frequency_hz(), 400);

        tick_for(&mut timers, &mut state, &mut sound, TIMER_PERIOD);
        assert_eq!(state.sound_timer(), 1);
        assert!(sound.is_playing());

        tick_for(&mut timers, &mut state, &mut sound, TIMER_PERIOD);
        assert_eq!(state.sound_timer(), 0);
        assert!(!sound.is_playing());
        assert_eq!(sound.starts(), 1);
    }

    #[test]
    fn test_idle_sound_timer_stays_silent() {
        let mut timers = TimerScheduler::new();
        let mut state = State::new();
        let mut sound = Mute::new();
        tick_for(&mut timers, &mut state, &mut sound, Duration::from_secs(1));
        assert!(!sound.is_playing());
        assert_eq!(sound.starts(), 0);
    }

    #[test]
    fn test_sync_sound_starts_without_spending_time() {
        let timers = TimerScheduler::new();
        let mut state = State::new();
        let mut sound = Mute::new();
        state.set_sound_timer(1);
        timers.sync_sound(&state, &mut sound, 400).unwrap();
        assert!(sound.is_playing());
        assert_eq!(state.sound_timer(), 1);

        state.set_sound_timer(0);
        timers.sync_sound(&state, &mut sound, 400).unwrap();
        assert!(!sound.is_playing());
    }
}
