use std::io;

/// Errors raised by the host side of a port (window, audio device, keyboard)
pub type PortError = Box<dyn std::error::Error + Send + Sync>;

pub type Result<T> = std::result::Result<T, MachineError>;

/// # Machine Errors
/// Everything that can stop the machine.
///
/// `InvalidInstruction` is the only non-fatal kind: the cycle loop logs it and carries on.
/// Every other variant means the machine state can no longer be trusted and the run ends.
#[derive(Debug, thiserror::Error)]
pub enum MachineError {
    #[error("unrecognized instruction {opcode:#06X}")]
    InvalidInstruction { opcode: u16 },

    #[error("stack overflow: call at {pc:#06X} with all 16 slots in use")]
    StackOverflow { pc: u16 },

    #[error("stack underflow: return at {pc:#06X} with an empty call stack")]
    StackUnderflow { pc: u16 },

    #[error("memory access out of bounds at address {address:#06X}")]
    AddressOutOfRange { address: usize },

    #[error("write to the reserved interpreter area at address {address:#06X}")]
    ReservedAddress { address: usize },

    #[error("register index {index:#X} does not exist")]
    InvalidRegister { index: u8 },

    #[error("key {key:#04X} is not on the keypad")]
    InvalidKey { key: u8 },

    #[error("ROM is too large ({size} bytes), max size is {max} bytes")]
    ProgramTooLarge { size: usize, max: usize },

    #[error("unable to read ROM")]
    ProgramLoad(#[from] io::Error),

    #[error("input port failure")]
    InputPort(#[source] PortError),

    #[error("display port failure")]
    DisplayPort(#[source] PortError),

    #[error("sound port failure")]
    SoundPort(#[source] PortError),
}
