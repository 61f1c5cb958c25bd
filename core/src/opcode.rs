use crate::state::Register;

/// # Opcodes
///
/// Chip-8 opcodes are 16 bits each. Their behavior is cased on some combination of:
/// - `(n, _, _, _)` broad categorization; applies to all opcodes
/// - `(_, _, _, n)` specific behavior within a category
/// - `(_, _, n, n)` more specific behavior within a category
/// - `(_, n, n, n)` some fixed function that doesn't require variables (e.g. CLS; clear screen)
///
/// Nibbles not used to determine the operation often (but not always) carry important data.
/// - `(_, n, n, n)` represent a 12-bit address
/// - `(_, _, n, n)` encodes some data that is assigned to and/or compared with Vx
/// - `(_, n, _, _)` refers either to the register Vx or a range of registers V0..Vx
/// - `(_, _, n, _)` refers to the the register Vy
///
/// Every operand form is split out once, up front; handlers only read them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opcode {
    word: u16,
    nibbles: (u8, u8, u8, u8),
    kk: u8,
    addr: u16,
}

impl Opcode {
    pub fn new(word: u16) -> Self {
        Opcode {
            word,
            nibbles: (
                ((word & 0xF000) >> 12) as u8,
                ((word & 0x0F00) >> 8) as u8,
                ((word & 0x00F0) >> 4) as u8,
                (word & 0x000F) as u8,
            ),
            kk: (word & 0x00FF) as u8,
            addr: word & 0x0FFF,
        }
    }

    /// The raw instruction word.
    pub fn word(&self) -> u16 {
        self.word
    }

    /// Returns the Opcode's component nibbles.
    pub fn nibbles(&self) -> (u8, u8, u8, u8) {
        self.nibbles
    }

    /// The Opcode's second nibble as a register.
    /// `[_x__]`
    pub fn x(&self) -> Register {
        Register::from_nibble(self.nibbles.1)
    }

    /// The Opcode's third nibble as a register.
    /// `[__y_]`
    pub fn y(&self) -> Register {
        Register::from_nibble(self.nibbles.2)
    }

    /// The Opcode's fourth nibble.
    /// `[___n]`
    pub fn n(&self) -> u8 {
        self.nibbles.3
    }

    /// The Opcode's least significant byte.
    /// `[__kk]`
    pub fn kk(&self) -> u8 {
        self.kk
    }

    /// The Opcode without its most significant nibble.
    /// `[_adr]`
    pub fn addr(&self) -> u16 {
        self.addr
    }
}

impl From<u16> for Opcode {
    fn from(word: u16) -> Self {
        Opcode::new(word)
    }
}
