pub use chip8::{Chip8, HaltReason, RunState};
pub use config::{Config, Quirks, StackPolicy};
pub use constants::CLOCK_SPEED_HZ;
pub use error::{MachineError, PortError, Result};
pub use framebuffer::{Frame, FrameBuffer};
pub use instruction::{decode, Instruction, Operation};
pub use opcode::Opcode;
pub use ports::{DisplayPort, InputPort, KeyWait, Mute, NullDisplay, ScriptedInput, SoundPort};
pub use state::{Register, State};
pub use timer::TimerScheduler;

mod chip8;
mod config;
pub mod constants;
mod error;
mod framebuffer;
mod instruction;
mod opcode;
mod operations;
mod ports;
pub mod state;
mod timer;
