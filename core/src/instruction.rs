use std::fmt;

use crate::opcode::Opcode;

/// Every operation the machine knows, named after its mnemonic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// 00E0
    Cls,
    /// 00EE
    Ret,
    /// 1nnn
    Jp,
    /// 2nnn
    Call,
    /// 3xkk
    SeByte,
    /// 4xkk
    SneByte,
    /// 5xy0
    SeReg,
    /// 6xkk
    LdByte,
    /// 7xkk
    AddByte,
    /// 8xy0
    LdReg,
    /// 8xy1
    Or,
    /// 8xy2
    And,
    /// 8xy3
    Xor,
    /// 8xy4
    AddReg,
    /// 8xy5
    Sub,
    /// 8xy6
    Shr,
    /// 8xy7
    Subn,
    /// 8xyE
    Shl,
    /// 9xy0
    SneReg,
    /// Annn
    LdI,
    /// Bnnn
    JpOffset,
    /// Cxkk
    Rnd,
    /// Dxyn
    Drw,
    /// Ex9E
    Skp,
    /// ExA1
    Sknp,
    /// Fx07
    LdVxDt,
    /// Fx0A
    LdVxKey,
    /// Fx15
    LdDtVx,
    /// Fx18
    LdStVx,
    /// Fx1E
    AddI,
    /// Fx29
    LdSprite,
    /// Fx33
    LdBcd,
    /// Fx55
    StoreRegs,
    /// Fx65
    LoadRegs,
    /// 0000; not a real instruction, see `Config::halt_on_zero`
    Halt,
    /// Anything else
    Unknown,
}

/// A decoded instruction word: what to do, and the operands to do it with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub operation: Operation,
    pub opcode: Opcode,
}

/// Selects the correct Operation for an instruction word.
///
/// Decoding never fails; unrecognized words become `Operation::Unknown`.
pub fn decode(word: u16) -> Instruction {
    let opcode = Opcode::new(word);
    let operation = match opcode.nibbles() {
        (0x0, 0x0, 0x0, 0x0) => Operation::Halt,
        (0x0, 0x0, 0xE, 0x0) => Operation::Cls,
        (0x0, 0x0, 0xE, 0xE) => Operation::Ret,
        (0x1, ..) => Operation::Jp,
        (0x2, ..) => Operation::Call,
        (0x3, ..) => Operation::SeByte,
        (0x4, ..) => Operation::SneByte,
        (0x5, .., 0x0) => Operation::SeReg,
        (0x6, ..) => Operation::LdByte,
        (0x7, ..) => Operation::AddByte,
        (0x8, .., 0x0) => Operation::LdReg,
        (0x8, .., 0x1) => Operation::Or,
        (0x8, .., 0x2) => Operation::And,
        (0x8, .., 0x3) => Operation::Xor,
        (0x8, .., 0x4) => Operation::AddReg,
        (0x8, .., 0x5) => Operation::Sub,
        (0x8, .., 0x6) => Operation::Shr,
        (0x8, .., 0x7) => Operation::Subn,
        (0x8, .., 0xE) => Operation::Shl,
        (0x9, .., 0x0) => Operation::SneReg,
        (0xA, ..) => Operation::LdI,
        (0xB, ..) => Operation::JpOffset,
        (0xC, ..) => Operation::Rnd,
        (0xD, ..) => Operation::Drw,
        (0xE, _, 0x9, 0xE) => Operation::Skp,
        (0xE, _, 0xA, 0x1) => Operation::Sknp,
        (0xF, _, 0x0, 0x7) => Operation::LdVxDt,
        (0xF, _, 0x0, 0xA) => Operation::LdVxKey,
        (0xF, _, 0x1, 0x5) => Operation::LdDtVx,
        (0xF, _, 0x1, 0x8) => Operation::LdStVx,
        (0xF, _, 0x1, 0xE) => Operation::AddI,
        (0xF, _, 0x2, 0x9) => Operation::LdSprite,
        (0xF, _, 0x3, 0x3) => Operation::LdBcd,
        (0xF, _, 0x5, 0x5) => Operation::StoreRegs,
        (0xF, _, 0x6, 0x5) => Operation::LoadRegs,
        _ => Operation::Unknown,
    };
    Instruction { operation, opcode }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let op = &self.opcode;
        let (x, y) = (op.x().index(), op.y().index());
        match self.operation {
            Operation::Cls => write!(f, "CLS"),
            Operation::Ret => write!(f, "RET"),
            Operation::Jp => write!(f, "JP {:#05X}", op.addr()),
            Operation::Call => write!(f, "CALL {:#05X}", op.addr()),
            Operation::SeByte => write!(f, "SE V{:X}, {:#04X}", x, op.kk()),
            Operation::SneByte => write!(f, "SNE V{:X}, {:#04X}", x, op.kk()),
            Operation::SeReg => write!(f, "SE V{:X}, V{:X}", x, y),
            Operation::LdByte => write!(f, "LD V{:X}, {:#04X}", x, op.kk()),
            Operation::AddByte => write!(f, "ADD V{:X}, {:#04X}", x, op.kk()),
            Operation::LdReg => write!(f, "LD V{:X}, V{:X}", x, y),
            Operation::Or => write!(f, "OR V{:X}, V{:X}", x, y),
            Operation::And => write!(f, "AND V{:X}, V{:X}", x, y),
            Operation::Xor => write!(f, "XOR V{:X}, V{:X}", x, y),
            Operation::AddReg => write!(f, "ADD V{:X}, V{:X}", x, y),
            Operation::Sub => write!(f, "SUB V{:X}, V{:X}", x, y),
            Operation::Shr => write!(f, "SHR V{:X}, V{:X}", x, y),
            Operation::Subn => write!(f, "SUBN V{:X}, V{:X}", x, y),
            Operation::Shl => write!(f, "SHL V{:X}, V{:X}", x, y),
            Operation::SneReg => write!(f, "SNE V{:X}, V{:X}", x, y),
            Operation::LdI => write!(f, "LD I, {:#05X}", op.addr()),
            Operation::JpOffset => write!(f, "JP V0, {:#05X}", op.addr()),
            Operation::Rnd => write!(f, "RND V{:X}, {:#04X}", x, op.kk()),
            Operation::Drw => write!(f, "DRW V{:X}, V{:X}, {}", x, y, op.n()),
            Operation::Skp => write!(f, "SKP V{:X}", x),
            Operation::Sknp => write!(f, "SKNP V{:X}", x),
            Operation::LdVxDt => write!(f, "LD V{:X}, DT", x),
            Operation::LdVxKey => write!(f, "LD V{:X}, K", x),
            Operation::LdDtVx => write!(f, "LD DT, V{:X}", x),
            Operation::LdStVx => write!(f, "LD ST, V{:X}", x),
            Operation::AddI => write!(f, "ADD I, V{:X}", x),
            Operation::LdSprite => write!(f, "LD F, V{:X}", x),
            Operation::LdBcd => write!(f, "LD B, V{:X}", x),
            Operation::StoreRegs => write!(f, "LD [I], V{:X}", x),
            Operation::LoadRegs => write!(f, "LD V{:X}, [I]", x),
            Operation::Halt => write!(f, "HALT"),
            Operation::Unknown => write!(f, "??? {:#06X}", op.word()),
        }
    }
}
