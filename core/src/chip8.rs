use std::io::Read;
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, error, trace};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::Config;
use crate::constants::TIMER_PERIOD;
use crate::error::{MachineError, Result};
use crate::framebuffer::FrameBuffer;
use crate::instruction::decode;
use crate::operations::{execute, Context, Flow};
use crate::ports::{DisplayPort, InputPort, KeyWait, SoundPort};
use crate::state::{Register, State};
use crate::timer::TimerScheduler;

/// Why a machine stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaltReason {
    /// Fetched the word 0x0000 with `Config::halt_on_zero` set
    ZeroOpcode,
    /// Moving the pc on would have run past 0xFFFF
    EndOfAddressSpace,
    /// The host asked to quit
    Cancelled,
    /// An earlier step failed; the machine is left as the error found it
    Fault,
}

/// Where the cycle loop is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    /// Suspended on FX0A; the key goes into the register once it arrives
    WaitingForKey(Register),
    /// Terminal
    Halted(HaltReason),
}

/// # Chip-8
/// Chip-8 is a virtual machine and corresponding interpreted language.
///
/// Tracks:
///  - current `state` and `frame_buffer`
///  - the `run_state` of the cycle loop
///  - wall-clock timer accounting
///
/// Supplies interfaces for:
/// - loading roms
/// - stepping or running the cycle loop
/// - inspecting the machine and the ports it drives
pub struct Chip8<D, S, I> {
    state: State,
    frame_buffer: FrameBuffer,
    timers: TimerScheduler,
    run_state: RunState,
    rng: StdRng,
    config: Config,
    display: D,
    sound: S,
    input: I,
    last_step: Option<Instant>,
}

impl<D, S, I> Chip8<D, S, I>
where
    D: DisplayPort,
    S: SoundPort,
    I: InputPort,
{
    pub fn new(config: Config, display: D, sound: S, input: I) -> Self {
        let rng = StdRng::seed_from_u64(config.seed.unwrap_or_else(rand::random));
        Chip8 {
            state: State::new(),
            frame_buffer: FrameBuffer::new(),
            timers: TimerScheduler::new(),
            run_state: RunState::Running,
            rng,
            config,
            display,
            sound,
            input,
            last_step: None,
        }
    }

    /// Load a rom from a source file
    ///
    /// # Arguments
    /// * `reader` a file reader that contains a ROM
    pub fn load_program(&mut self, reader: &mut dyn Read) -> Result<usize> {
        self.state.load_program(reader)
    }

    /// Advances the machine by a single iteration of the cycle loop, timed by the wall clock.
    ///
    /// Elapsed time is measured from the start of the previous call, so time spent in the ports
    /// still reaches the timers.
    pub fn step(&mut self) -> Result<RunState> {
        let now = Instant::now();
        let elapsed = self
            .last_step
            .map(|last| now.saturating_duration_since(last))
            .unwrap_or_default();
        self.last_step = Some(now);
        self.step_for(elapsed)
    }

    /// Advances the machine by a single iteration of the cycle loop
    /// - spends `elapsed` on the timers as they stood while it passed
    /// - executes one instruction, or polls for a key while waiting on FX0A
    ///
    /// Any error halts the machine with `HaltReason::Fault`; later steps do nothing.
    ///
    /// # Arguments
    /// * `elapsed` the time to count against DT and ST
    pub fn step_for(&mut self, elapsed: Duration) -> Result<RunState> {
        if let RunState::Halted(_) = self.run_state {
            return Ok(self.run_state);
        }
        match self.iterate(elapsed) {
            Ok(()) => Ok(self.run_state),
            Err(err) => {
                self.fault(&err);
                Err(err)
            }
        }
    }

    /// Steps until the machine halts, pacing instructions at `Config::cycle_hz`
    pub fn run(&mut self) -> Result<HaltReason> {
        let cycle_time = self
            .config
            .cycle_hz
            .filter(|hz| *hz > 0)
            .map(|hz| Duration::from_secs(1) / hz);

        loop {
            let started = Instant::now();
            match self.step()? {
                RunState::Halted(reason) => return Ok(reason),
                // the key wait blocks on its own
                RunState::WaitingForKey(_) => continue,
                RunState::Running => {}
            }

            if let Some(cycle_time) = cycle_time {
                let elapsed_cycle_time = started.elapsed();
                if cycle_time > elapsed_cycle_time {
                    thread::sleep(cycle_time - elapsed_cycle_time);
                }
            }
        }
    }

    fn iterate(&mut self, elapsed: Duration) -> Result<()> {
        let tone_hz = self.config.tone_hz;
        self.timers
            .tick(&mut self.state, elapsed, &mut self.sound, tone_hz)?;

        match self.run_state {
            RunState::Running => self.cycle()?,
            RunState::WaitingForKey(register) => self.await_key(register)?,
            RunState::Halted(_) => return Ok(()),
        }

        // FX18 may have just set ST
        if let RunState::Halted(_) = self.run_state {
            return Ok(());
        }
        self.timers.sync_sound(&self.state, &mut self.sound, tone_hz)
    }

    /// Fetch, decode, execute, then move the pc on unless the instruction already did
    fn cycle(&mut self) -> Result<()> {
        if self.input.quit_requested().map_err(MachineError::InputPort)? {
            self.halt(HaltReason::Cancelled)?;
            return Ok(());
        }

        let word = self.state.fetch()?;
        let instruction = decode(word);
        trace!(
            "{:#06X}: {:04X} {:<16} v{:02X?} i{:04X}",
            self.state.pc(),
            word,
            instruction.to_string(),
            self.state.registers(),
            self.state.i()
        );

        let flow = {
            let mut ctx = Context {
                state: &mut self.state,
                frame_buffer: &mut self.frame_buffer,
                display: &mut self.display,
                input: &mut self.input,
                rng: &mut self.rng,
                config: &self.config,
            };
            execute(&instruction, &mut ctx)?
        };

        match flow {
            Flow::Next => self.advance()?,
            Flow::Jumped => {}
            Flow::WaitForKey(register) => self.run_state = RunState::WaitingForKey(register),
            Flow::Halt(reason) => self.halt(reason)?,
        }
        Ok(())
    }

    /// One bounded wait for a key press; the pc stays on FX0A until one arrives
    fn await_key(&mut self, register: Register) -> Result<()> {
        let wait = self
            .input
            .wait_for_keydown(TIMER_PERIOD)
            .map_err(MachineError::InputPort)?;
        match wait {
            KeyWait::Pressed(key) if key > 0xF => return Err(MachineError::InvalidKey { key }),
            KeyWait::Pressed(key) => {
                self.state.set_v(register, key);
                self.run_state = RunState::Running;
                self.advance()?;
            }
            KeyWait::Pending => {}
            KeyWait::Cancelled => self.halt(HaltReason::Cancelled)?,
        }
        Ok(())
    }

    fn advance(&mut self) -> Result<()> {
        if !self.state.advance_pc() {
            self.halt(HaltReason::EndOfAddressSpace)?;
        }
        Ok(())
    }

    fn halt(&mut self, reason: HaltReason) -> Result<()> {
        debug!("halted at {:#06X}: {:?}", self.state.pc(), reason);
        self.run_state = RunState::Halted(reason);
        if self.sound.is_playing() {
            self.sound.stop().map_err(MachineError::SoundPort)?;
        }
        Ok(())
    }

    fn fault(&mut self, err: &MachineError) {
        error!("fault at {:#06X}: {}", self.state.pc(), err);
        self.run_state = RunState::Halted(HaltReason::Fault);
        if self.sound.is_playing() {
            if let Err(stop) = self.sound.stop() {
                error!("unable to silence sound after fault: {}", stop);
            }
        }
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn frame_buffer(&self) -> &FrameBuffer {
        &self.frame_buffer
    }

    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn sound(&self) -> &S {
        &self.sound
    }

    pub fn input(&self) -> &I {
        &self.input
    }

    /// Mutable access to the input port, for scripting keys between steps
    pub fn input_mut(&mut self) -> &mut I {
        &mut self.input
    }
}

#[cfg(test)]
mod test_chip8 {
    use super::*;
    use crate::error::PortError;
    use crate::framebuffer::Frame;
    use crate::ports::{Mute, NullDisplay, ScriptedInput};

    type Headless = Chip8<NullDisplay, Mute, ScriptedInput>;

    fn headless(rom: &[u8]) -> Headless {
        let config = Config {
            seed: Some(0x8),
            ..Config::default()
        };
        let mut chip8 = Chip8::new(config, NullDisplay::new(), Mute::new(), ScriptedInput::new());
        let mut reader = rom;
        chip8.load_program(&mut reader).unwrap();
        chip8
    }

    fn step(chip8: &mut Headless) -> RunState {
        chip8.step_for(Duration::ZERO).unwrap()
    }

    #[test]
    fn test_chip8_advances_pc() {
        let mut chip8 = headless(&[0x61, 0x22]);
        assert_eq!(step(&mut chip8), RunState::Running);
        assert_eq!(chip8.state().pc(), 0x202);
    }

    #[test]
    fn test_chip8_jump_doesnt_advance() {
        let mut chip8 = headless(&[0x12, 0x00]);
        step(&mut chip8);
        step(&mut chip8);
        assert_eq!(chip8.state().pc(), 0x200);
    }

    #[test]
    fn test_chip8_skip_moves_past_next_instruction() {
        let mut chip8 = headless(&[0x30, 0x00, 0x61, 0x01, 0x62, 0x02]);
        step(&mut chip8);
        assert_eq!(chip8.state().pc(), 0x204);
        step(&mut chip8);
        assert_eq!(chip8.state().v(Register::new(0x1).unwrap()), 0x0);
        assert_eq!(chip8.state().v(Register::new(0x2).unwrap()), 0x2);
    }

    #[test]
    fn test_chip8_call_and_return() {
        // 0x200: CALL 0x206; 0x202: LD V1, 1; 0x204: HALT; 0x206: RET
        let mut chip8 = headless(&[0x22, 0x06, 0x61, 0x01, 0x00, 0x00, 0x00, 0xEE]);
        step(&mut chip8);
        assert_eq!(chip8.state().pc(), 0x206);
        step(&mut chip8);
        assert_eq!(chip8.state().pc(), 0x202);
        step(&mut chip8);
        assert_eq!(
            step(&mut chip8),
            RunState::Halted(HaltReason::ZeroOpcode)
        );
        assert_eq!(chip8.state().v(Register::new(0x1).unwrap()), 0x1);
    }

    #[test]
    fn test_chip8_halted_is_terminal() {
        let mut chip8 = headless(&[0x00, 0x00, 0x61, 0x01]);
        assert_eq!(step(&mut chip8), RunState::Halted(HaltReason::ZeroOpcode));
        assert_eq!(step(&mut chip8), RunState::Halted(HaltReason::ZeroOpcode));
        assert_eq!(chip8.state().pc(), 0x200);
        assert_eq!(chip8.state().v(Register::new(0x1).unwrap()), 0x0);
    }

    #[test]
    fn test_chip8_quit_cancels() {
        let mut chip8 = headless(&[0x12, 0x00]);
        chip8.input_mut().request_quit();
        assert_eq!(step(&mut chip8), RunState::Halted(HaltReason::Cancelled));
    }

    #[test]
    fn test_chip8_waits_for_key() {
        let mut chip8 = headless(&[0xF3, 0x0A, 0x00, 0x00]);
        let v3 = Register::new(0x3).unwrap();
        assert_eq!(step(&mut chip8), RunState::WaitingForKey(v3));
        assert_eq!(step(&mut chip8), RunState::WaitingForKey(v3));
        assert_eq!(chip8.state().pc(), 0x200);

        chip8.input_mut().queue(KeyWait::Pressed(0xB));
        assert_eq!(step(&mut chip8), RunState::Running);
        assert_eq!(chip8.state().v(v3), 0xB);
        assert_eq!(chip8.state().pc(), 0x202);
    }

    #[test]
    fn test_chip8_key_wait_cancels() {
        let mut chip8 = headless(&[0xF0, 0x0A]);
        step(&mut chip8);
        chip8.input_mut().queue(KeyWait::Cancelled);
        assert_eq!(step(&mut chip8), RunState::Halted(HaltReason::Cancelled));
    }

    #[test]
    fn test_chip8_key_wait_rejects_bad_key() {
        let mut chip8 = headless(&[0xF0, 0x0A]);
        step(&mut chip8);
        chip8.input_mut().queue(KeyWait::Pressed(0x10));
        assert!(matches!(
            chip8.step_for(Duration::ZERO),
            Err(MachineError::InvalidKey { key: 0x10 })
        ));
    }

    #[test]
    fn test_chip8_timers_run_while_waiting() {
        // LD V0, 3; LD DT, V0; LD V1, K
        let mut chip8 = headless(&[0x60, 0x03, 0xF0, 0x15, 0xF1, 0x0A]);
        step(&mut chip8);
        step(&mut chip8);
        step(&mut chip8);
        for _ in 0..3 {
            chip8.step_for(TIMER_PERIOD).unwrap();
        }
        assert_eq!(chip8.state().delay_timer(), 0);
    }

    #[test]
    fn test_chip8_halt_silences_sound() {
        // LD V0, 0xFF; LD ST, V0; HALT
        let mut chip8 = headless(&[0x60, 0xFF, 0xF0, 0x18, 0x00, 0x00]);
        step(&mut chip8);
        step(&mut chip8);
        assert!(chip8.sound().is_playing());
        step(&mut chip8);
        assert!(!chip8.sound().is_playing());
    }

    #[test]
    fn test_chip8_unknown_instruction_is_skipped() {
        let mut chip8 = headless(&[0xF1, 0xFF, 0x61, 0x05]);
        step(&mut chip8);
        step(&mut chip8);
        assert_eq!(chip8.state().v(Register::new(0x1).unwrap()), 0x5);
    }

    #[test]
    fn test_chip8_zero_padding_without_halt_policy() {
        let config = Config {
            halt_on_zero: false,
            seed: Some(0x8),
            ..Config::default()
        };
        let mut chip8 = Chip8::new(config, NullDisplay::new(), Mute::new(), ScriptedInput::new());
        let mut rom: &[u8] = &[0x00, 0x00, 0x61, 0x05];
        chip8.load_program(&mut rom).unwrap();
        step(&mut chip8);
        assert_eq!(step(&mut chip8), RunState::Running);
        assert_eq!(chip8.state().v(Register::new(0x1).unwrap()), 0x5);
    }

    #[test]
    fn test_chip8_fetch_past_memory_is_fatal() {
        let mut chip8 = headless(&[0x1F, 0xFF]);
        step(&mut chip8);
        assert!(matches!(
            chip8.step_for(Duration::ZERO),
            Err(MachineError::AddressOutOfRange { address: 0x1000 })
        ));
    }

    #[test]
    fn test_chip8_run_returns_halt_reason() {
        let config = Config {
            cycle_hz: None,
            ..Config::default()
        };
        let mut chip8 = Chip8::new(config, NullDisplay::new(), Mute::new(), ScriptedInput::new());
        let mut rom: &[u8] = &[0x00, 0xE0, 0x00, 0x00];
        chip8.load_program(&mut rom).unwrap();
        assert_eq!(chip8.run().unwrap(), HaltReason::ZeroOpcode);
        assert_eq!(chip8.display().frames(), 1);
    }

    #[test]
    fn test_chip8_sound_set_after_slow_step_still_plays() {
        // LD V0, 1; LD ST, V0; loop: JP loop
        let mut chip8 = headless(&[0x60, 0x01, 0xF0, 0x18, 0x12, 0x04]);
        step(&mut chip8);
        assert_eq!(chip8.step_for(TIMER_PERIOD).unwrap(), RunState::Running);
        assert_eq!(chip8.state().sound_timer(), 1);
        assert!(chip8.sound().is_playing());
        assert_eq!(chip8.sound().starts(), 1);

        chip8.step_for(TIMER_PERIOD).unwrap();
        assert_eq!(chip8.state().sound_timer(), 0);
        assert!(!chip8.sound().is_playing());
    }

    #[test]
    fn test_chip8_delay_set_after_slow_step_gets_full_period() {
        // LD V0, 2; LD DT, V0; loop: JP loop
        let mut chip8 = headless(&[0x60, 0x02, 0xF0, 0x15, 0x12, 0x04]);
        step(&mut chip8);
        chip8.step_for(TIMER_PERIOD * 3).unwrap();
        assert_eq!(chip8.state().delay_timer(), 2);
        chip8.step_for(TIMER_PERIOD).unwrap();
        assert_eq!(chip8.state().delay_timer(), 1);
    }

    /// Fails the first render, then behaves
    #[derive(Default)]
    struct FlakyDisplay {
        failed: bool,
        frames: usize,
    }

    impl DisplayPort for FlakyDisplay {
        fn render(&mut self, _frame: &Frame) -> std::result::Result<(), PortError> {
            if !self.failed {
                self.failed = true;
                return Err("display lost".into());
            }
            self.frames += 1;
            Ok(())
        }
    }

    #[test]
    fn test_chip8_error_halts_for_good() {
        // LD I, 0; DRW V0, V0, 5; HALT
        let config = Config {
            seed: Some(0x8),
            ..Config::default()
        };
        let display = FlakyDisplay::default();
        let mut chip8 = Chip8::new(config, display, Mute::new(), ScriptedInput::new());
        let mut rom: &[u8] = &[0xA0, 0x00, 0xD0, 0x05, 0x00, 0x00];
        chip8.load_program(&mut rom).unwrap();
        chip8.step_for(Duration::ZERO).unwrap();

        assert!(matches!(
            chip8.step_for(Duration::ZERO),
            Err(MachineError::DisplayPort(_))
        ));
        assert_eq!(chip8.run_state(), RunState::Halted(HaltReason::Fault));

        // the half drawn sprite is left alone
        assert!(!chip8.frame_buffer().is_blank());
        assert_eq!(
            chip8.step_for(Duration::ZERO).unwrap(),
            RunState::Halted(HaltReason::Fault)
        );
        assert_eq!(chip8.run().unwrap(), HaltReason::Fault);
        assert!(!chip8.frame_buffer().is_blank());
        assert_eq!(chip8.state().pc(), 0x202);
        assert_eq!(chip8.display().frames, 0);
    }

    #[test]
    fn test_chip8_error_silences_sound() {
        // LD V0, 0xFF; LD ST, V0; RET
        let mut chip8 = headless(&[0x60, 0xFF, 0xF0, 0x18, 0x00, 0xEE]);
        step(&mut chip8);
        step(&mut chip8);
        assert!(chip8.sound().is_playing());
        assert!(chip8.step_for(Duration::ZERO).is_err());
        assert!(!chip8.sound().is_playing());
        assert_eq!(chip8.run_state(), RunState::Halted(HaltReason::Fault));
    }
}
