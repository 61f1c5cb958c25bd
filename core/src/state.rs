use std::io::Read;

use log::debug;

use crate::config::StackPolicy;
use crate::constants::{
    FLAG, MAX_PROGRAM_SIZE, MEMORY_SIZE, PROGRAM_START, SPRITE_SHEET, STACK_DEPTH,
};
use crate::error::{MachineError, Result};

/// One of the sixteen 8-bit registers V0..VF.
///
/// A `Register` always names a register that exists, so reads and writes through it can't fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Register(u8);

impl Register {
    pub const V0: Register = Register(0x0);
    pub const VF: Register = Register(FLAG as u8);

    /// Checked constructor for indices that don't come from an opcode nibble
    pub fn new(index: u8) -> Result<Self> {
        if usize::from(index) <= FLAG {
            Ok(Register(index))
        } else {
            Err(MachineError::InvalidRegister { index })
        }
    }

    /// Opcode nibbles are 4 bits wide, so masking is enough to make them valid
    pub(crate) fn from_nibble(nibble: u8) -> Self {
        Register(nibble & 0xF)
    }

    pub fn index(self) -> usize {
        usize::from(self.0)
    }

    /// V0..=self, the range FX55/FX65 transfer
    pub fn range_from_v0(self) -> impl Iterator<Item = Register> {
        (0..=self.0).map(Register)
    }
}

/// # Machine State
///
/// ## CPU
/// Registers
/// - (v) 16 primary 8-bit registers (V0..VF)
///     - the first 15 (V0..VE) are general purpose registers
///     - the 16th (VF) doubles as the flag register for carry, borrow, shifted-out bits and
///       sprite collisions; the last write in an instruction wins
/// - (i) a 16-bit memory address register, of which only the low 12 bits address memory
///
/// Counter
/// - (pc) a 16-bit program counter
///
/// Pointer
/// - (sp) an 8-bit stack pointer; the next free slot on call, the last used one on return
///
/// Timers
/// - 2 8-bit timers (delay & sound) counting down to 0 at 60Hz
///
/// ## Memory
/// - 16 slot stack of return addresses
/// - 4096 bytes of addressable memory
///     - 0x000..0x200 holds the built-in digit sprites and is never written by a program
///     - ROMs are loaded from 0x200
#[derive(Clone)]
pub struct State {
    v: [u8; 16],
    i: u16,
    pc: u16,
    sp: u8,
    stack: [u16; STACK_DEPTH],
    memory: [u8; MEMORY_SIZE],
    delay_timer: u8,
    sound_timer: u8,
}

impl State {
    pub fn new() -> Self {
        // 0x000 - 0x050 is reserved for a sprite sheet
        let mut memory = [0; MEMORY_SIZE];
        memory[0..SPRITE_SHEET.len()].copy_from_slice(&SPRITE_SHEET);

        State {
            v: [0; 16],
            i: 0,
            pc: PROGRAM_START,
            sp: 0,
            stack: [0; STACK_DEPTH],
            memory,
            delay_timer: 0,
            sound_timer: 0,
        }
    }

    /// Load a ROM verbatim at 0x200
    ///
    /// Odd-length images are accepted; a trailing byte just never forms a whole instruction.
    ///
    /// # Arguments
    /// * `reader` a reader positioned at the start of the ROM
    pub fn load_program(&mut self, reader: &mut dyn Read) -> Result<usize> {
        let mut rom = Vec::with_capacity(MAX_PROGRAM_SIZE);
        reader.read_to_end(&mut rom)?;
        if rom.len() > MAX_PROGRAM_SIZE {
            return Err(MachineError::ProgramTooLarge {
                size: rom.len(),
                max: MAX_PROGRAM_SIZE,
            });
        }

        let start = usize::from(PROGRAM_START);
        self.memory[start..].fill(0);
        self.memory[start..start + rom.len()].copy_from_slice(&rom);
        debug!("loaded {} byte ROM at {:#06X}", rom.len(), PROGRAM_START);
        Ok(rom.len())
    }

    pub fn v(&self, register: Register) -> u8 {
        self.v[register.index()]
    }

    pub fn set_v(&mut self, register: Register, value: u8) {
        self.v[register.index()] = value;
    }

    /// VF written as a boolean flag
    pub fn set_flag(&mut self, set: bool) {
        self.v[FLAG] = u8::from(set);
    }

    pub fn registers(&self) -> &[u8; 16] {
        &self.v
    }

    pub fn i(&self) -> u16 {
        self.i
    }

    pub fn set_i(&mut self, i: u16) {
        self.i = i;
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn set_pc(&mut self, pc: u16) {
        self.pc = pc;
    }

    /// Moves the pc on by one instruction.
    /// Returns false, leaving the pc alone, when that would run off the 16-bit address space.
    pub fn advance_pc(&mut self) -> bool {
        match self.pc.checked_add(2) {
            Some(pc) => {
                self.pc = pc;
                true
            }
            None => false,
        }
    }

    pub fn sp(&self) -> u8 {
        self.sp
    }

    pub fn stack(&self) -> &[u16; STACK_DEPTH] {
        &self.stack
    }

    pub fn delay_timer(&self) -> u8 {
        self.delay_timer
    }

    pub fn set_delay_timer(&mut self, value: u8) {
        self.delay_timer = value;
    }

    pub fn sound_timer(&self) -> u8 {
        self.sound_timer
    }

    pub fn set_sound_timer(&mut self, value: u8) {
        self.sound_timer = value;
    }

    /// Read a single byte of memory
    pub fn read(&self, address: usize) -> Result<u8> {
        self.memory
            .get(address)
            .copied()
            .ok_or(MachineError::AddressOutOfRange { address })
    }

    /// Read `len` bytes of memory starting at `address`
    pub fn read_slice(&self, address: usize, len: usize) -> Result<&[u8]> {
        let end = address + len;
        if end > MEMORY_SIZE {
            return Err(MachineError::AddressOutOfRange {
                address: end.saturating_sub(1).max(address),
            });
        }
        Ok(&self.memory[address..end])
    }

    /// Write a single byte of memory; the interpreter area below 0x200 is off limits
    pub fn write(&mut self, address: usize, value: u8) -> Result<()> {
        self.write_slice(address, &[value])
    }

    /// Write `bytes` to memory starting at `address`
    pub fn write_slice(&mut self, address: usize, bytes: &[u8]) -> Result<()> {
        if address < usize::from(PROGRAM_START) {
            return Err(MachineError::ReservedAddress { address });
        }
        let end = address + bytes.len();
        if end > MEMORY_SIZE {
            return Err(MachineError::AddressOutOfRange {
                address: end.saturating_sub(1).max(address),
            });
        }
        self.memory[address..end].copy_from_slice(bytes);
        Ok(())
    }

    /// Gets the opcode currently pointed at by the pc.
    ///
    /// Memory is stored as bytes, but opcodes are 16 bits so we combine two subsequent bytes.
    pub fn fetch(&self) -> Result<u16> {
        let pc = usize::from(self.pc);
        let left = u16::from(self.read(pc)?);
        let right = u16::from(self.read(pc + 1)?);
        Ok(left << 8 | right)
    }

    /// STACK.push(return_address)
    pub fn push(&mut self, return_address: u16, policy: StackPolicy) -> Result<()> {
        let sp = usize::from(self.sp);
        match policy {
            StackPolicy::Strict => {
                if sp >= STACK_DEPTH {
                    return Err(MachineError::StackOverflow { pc: return_address });
                }
                self.stack[sp] = return_address;
                self.sp += 1;
            }
            StackPolicy::Clamp => {
                let sp = sp.min(STACK_DEPTH - 1);
                self.stack[sp] = return_address;
                if sp != STACK_DEPTH - 1 {
                    self.sp += 1;
                }
            }
        }
        Ok(())
    }

    /// STACK.pop()
    pub fn pop(&mut self, policy: StackPolicy) -> Result<u16> {
        let top = (STACK_DEPTH - 1) as u8;
        match policy {
            StackPolicy::Strict => {
                if self.sp == 0 {
                    return Err(MachineError::StackUnderflow { pc: self.pc });
                }
                self.sp -= 1;
                Ok(self.stack[usize::from(self.sp)])
            }
            StackPolicy::Clamp => {
                if self.sp != top {
                    if self.sp == 0 {
                        return Err(MachineError::StackUnderflow { pc: self.pc });
                    }
                    self.sp -= 1;
                }
                let address = self.stack[usize::from(self.sp)];
                if self.sp == top {
                    self.sp -= 1;
                }
                Ok(address)
            }
        }
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}
