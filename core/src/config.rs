use crate::constants::{CLOCK_SPEED_HZ, TONE_HZ};

/// # Quirks
/// Instructions whose behavior differs between historical interpreters.
///
/// Each flag is read by exactly one group of handlers; none of them is "the" correct one.
/// The defaults reproduce the interpreter this emulator was modelled on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quirks {
    /// 8XY6/8XYE: shift Vy into Vx (COSMAC VIP) instead of shifting Vx in place
    pub shift_uses_vy: bool,
    /// BNNN: jump to XNN + VX (CHIP-48, SUPER-CHIP) instead of NNN + V0
    pub jump_uses_vx: bool,
    /// FX55/FX65: leave I pointing past the last register transferred (COSMAC VIP)
    pub load_store_increments_i: bool,
    /// 7XKK: write the carry out of the addition into VF
    pub add_immediate_sets_flag: bool,
}

impl Default for Quirks {
    fn default() -> Self {
        Quirks {
            shift_uses_vy: false,
            jump_uses_vx: false,
            load_store_increments_i: false,
            add_immediate_sets_flag: true,
        }
    }
}

/// What a call does when all stack slots are in use, and a return when none are
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackPolicy {
    /// Raise `StackOverflow` / `StackUnderflow`
    Strict,
    /// Keep writing slot 15 and clamp SP there, as the interpreter this is modelled on did.
    /// Returning from a clamped stack skips slot 14; programs relying on this are rare.
    Clamp,
}

impl Default for StackPolicy {
    fn default() -> Self {
        StackPolicy::Strict
    }
}

/// Machine configuration, fixed for the lifetime of a `Chip8`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub quirks: Quirks,
    /// Treat the word 0x0000 as a request to stop. This is not a real instruction,
    /// and some ROMs contain zero padding that should just be skipped.
    pub halt_on_zero: bool,
    pub stack_policy: StackPolicy,
    /// Pitch handed to the sound port while the sound timer is running
    pub tone_hz: u32,
    /// Instructions per second for `Chip8::run`; `None` runs as fast as possible
    pub cycle_hz: Option<u32>,
    /// Seed for CXKK; `None` seeds from entropy
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            quirks: Quirks::default(),
            halt_on_zero: true,
            stack_policy: StackPolicy::default(),
            tone_hz: TONE_HZ,
            cycle_hz: Some(CLOCK_SPEED_HZ),
            seed: None,
        }
    }
}
