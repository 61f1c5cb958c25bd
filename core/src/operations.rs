use log::warn;
use rand::rngs::StdRng;
use rand::RngCore;

use crate::chip8::HaltReason;
use crate::config::Config;
use crate::constants::SPRITE_HEIGHT;
use crate::error::{MachineError, Result};
use crate::framebuffer::FrameBuffer;
use crate::instruction::{Instruction, Operation};
use crate::opcode::Opcode;
use crate::ports::{DisplayPort, InputPort};
use crate::state::{Register, State};

/// Everything a handler may touch while executing one instruction
pub(crate) struct Context<'a> {
    pub state: &'a mut State,
    pub frame_buffer: &'a mut FrameBuffer,
    pub display: &'a mut dyn DisplayPort,
    pub input: &'a mut dyn InputPort,
    pub rng: &'a mut StdRng,
    pub config: &'a Config,
}

/// What the cycle loop should do with the pc once a handler returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flow {
    /// Move on to the following instruction
    Next,
    /// The handler set the pc itself
    Jumped,
    /// Park on this instruction until a key goes down, then store it in the register
    WaitForKey(Register),
    Halt(HaltReason),
}

type Handler = fn(op: &Opcode, ctx: &mut Context) -> Result<Flow>;

/// Runs a decoded instruction against the machine
pub(crate) fn execute(instruction: &Instruction, ctx: &mut Context) -> Result<Flow> {
    handler(instruction.operation)(&instruction.opcode, ctx)
}

/// Selects the handler for an Operation
fn handler(operation: Operation) -> Handler {
    match operation {
        Operation::Cls => clr,
        Operation::Ret => rts,
        Operation::Jp => jump,
        Operation::Call => call,
        Operation::SeByte => ske,
        Operation::SneByte => skne,
        Operation::SeReg => skre,
        Operation::LdByte => load,
        Operation::AddByte => add,
        Operation::LdReg => mv,
        Operation::Or => or,
        Operation::And => and,
        Operation::Xor => xor,
        Operation::AddReg => addr,
        Operation::Sub => sub,
        Operation::Shr => shr,
        Operation::Subn => subn,
        Operation::Shl => shl,
        Operation::SneReg => skrne,
        Operation::LdI => loadi,
        Operation::JpOffset => jumpi,
        Operation::Rnd => rand,
        Operation::Drw => draw,
        Operation::Skp => skpr,
        Operation::Sknp => skup,
        Operation::LdVxDt => moved,
        Operation::LdVxKey => keyd,
        Operation::LdDtVx => loads,
        Operation::LdStVx => ld,
        Operation::AddI => addi,
        Operation::LdSprite => ldspr,
        Operation::LdBcd => bcd,
        Operation::StoreRegs => stor,
        Operation::LoadRegs => read,
        Operation::Halt => halt,
        Operation::Unknown => unknown,
    }
}

/// Skips the next instruction when `condition` holds.
/// A skip that would leave the address space ends the program instead of wrapping.
fn skip_if(condition: bool, state: &mut State) -> Flow {
    if condition && !state.advance_pc() {
        Flow::Halt(HaltReason::EndOfAddressSpace)
    } else {
        Flow::Next
    }
}

/// The keypad key named by Vx
fn key_in(register: Register, state: &State) -> Result<u8> {
    let key = state.v(register);
    if key > 0xF {
        return Err(MachineError::InvalidKey { key });
    }
    Ok(key)
}

fn present(ctx: &mut Context) -> Result<()> {
    ctx.display
        .render(ctx.frame_buffer.frame())
        .map_err(MachineError::DisplayPort)
}

/// clear
fn clr(_op: &Opcode, ctx: &mut Context) -> Result<Flow> {
    ctx.frame_buffer.clear();
    present(ctx)?;
    Ok(Flow::Next)
}

/// PC = STACK.pop()
/// The pc then moves past the call that pushed it
fn rts(_op: &Opcode, ctx: &mut Context) -> Result<Flow> {
    let pc = ctx.state.pop(ctx.config.stack_policy)?;
    ctx.state.set_pc(pc);
    Ok(Flow::Next)
}

/// PC = addr
fn jump(op: &Opcode, ctx: &mut Context) -> Result<Flow> {
    ctx.state.set_pc(op.addr());
    Ok(Flow::Jumped)
}

/// STACK.push(PC); PC = addr
fn call(op: &Opcode, ctx: &mut Context) -> Result<Flow> {
    ctx.state.push(ctx.state.pc(), ctx.config.stack_policy)?;
    ctx.state.set_pc(op.addr());
    Ok(Flow::Jumped)
}

/// if Vx == kk then pc += 2
fn ske(op: &Opcode, ctx: &mut Context) -> Result<Flow> {
    let condition = ctx.state.v(op.x()) == op.kk();
    Ok(skip_if(condition, ctx.state))
}

/// if Vx != kk then pc += 2
fn skne(op: &Opcode, ctx: &mut Context) -> Result<Flow> {
    let condition = ctx.state.v(op.x()) != op.kk();
    Ok(skip_if(condition, ctx.state))
}

/// if Vx == Vy then pc += 2
fn skre(op: &Opcode, ctx: &mut Context) -> Result<Flow> {
    let condition = ctx.state.v(op.x()) == ctx.state.v(op.y());
    Ok(skip_if(condition, ctx.state))
}

/// Vx = kk
fn load(op: &Opcode, ctx: &mut Context) -> Result<Flow> {
    ctx.state.set_v(op.x(), op.kk());
    Ok(Flow::Next)
}

/// Vx += kk; VF = overflow (see `Quirks::add_immediate_sets_flag`)
fn add(op: &Opcode, ctx: &mut Context) -> Result<Flow> {
    let (res, over) = ctx.state.v(op.x()).overflowing_add(op.kk());
    ctx.state.set_v(op.x(), res);
    if ctx.config.quirks.add_immediate_sets_flag {
        ctx.state.set_flag(over);
    }
    Ok(Flow::Next)
}

/// Vx = Vy
fn mv(op: &Opcode, ctx: &mut Context) -> Result<Flow> {
    ctx.state.set_v(op.x(), ctx.state.v(op.y()));
    Ok(Flow::Next)
}

/// Vx |= Vy
fn or(op: &Opcode, ctx: &mut Context) -> Result<Flow> {
    let res = ctx.state.v(op.x()) | ctx.state.v(op.y());
    ctx.state.set_v(op.x(), res);
    Ok(Flow::Next)
}

/// Vx &= Vy
fn and(op: &Opcode, ctx: &mut Context) -> Result<Flow> {
    let res = ctx.state.v(op.x()) & ctx.state.v(op.y());
    ctx.state.set_v(op.x(), res);
    Ok(Flow::Next)
}

/// Vx ^= Vy
fn xor(op: &Opcode, ctx: &mut Context) -> Result<Flow> {
    let res = ctx.state.v(op.x()) ^ ctx.state.v(op.y());
    ctx.state.set_v(op.x(), res);
    Ok(Flow::Next)
}

/// Vx += Vy; VF = overflow
fn addr(op: &Opcode, ctx: &mut Context) -> Result<Flow> {
    let (res, over) = ctx.state.v(op.x()).overflowing_add(ctx.state.v(op.y()));
    ctx.state.set_v(op.x(), res);
    ctx.state.set_flag(over);
    Ok(Flow::Next)
}

/// Vx -= Vy; VF = !underflow
fn sub(op: &Opcode, ctx: &mut Context) -> Result<Flow> {
    let (vx, vy) = (ctx.state.v(op.x()), ctx.state.v(op.y()));
    ctx.state.set_v(op.x(), vx.wrapping_sub(vy));
    ctx.state.set_flag(vx >= vy);
    Ok(Flow::Next)
}

/// The register a shift reads from
fn shift_source(op: &Opcode, ctx: &Context) -> u8 {
    if ctx.config.quirks.shift_uses_vy {
        ctx.state.v(op.y())
    } else {
        ctx.state.v(op.x())
    }
}

/// Vx = src >> 1; VF = shifted out bit
fn shr(op: &Opcode, ctx: &mut Context) -> Result<Flow> {
    let src = shift_source(op, ctx);
    ctx.state.set_v(op.x(), src >> 1);
    ctx.state.set_flag(src & 0x01 != 0);
    Ok(Flow::Next)
}

/// Vx = Vy - Vx; VF = !underflow
fn subn(op: &Opcode, ctx: &mut Context) -> Result<Flow> {
    let (vx, vy) = (ctx.state.v(op.x()), ctx.state.v(op.y()));
    ctx.state.set_v(op.x(), vy.wrapping_sub(vx));
    ctx.state.set_flag(vy >= vx);
    Ok(Flow::Next)
}

/// Vx = src << 1; VF = shifted out bit
fn shl(op: &Opcode, ctx: &mut Context) -> Result<Flow> {
    let src = shift_source(op, ctx);
    ctx.state.set_v(op.x(), src << 1);
    ctx.state.set_flag(src & 0x80 != 0);
    Ok(Flow::Next)
}

/// if Vx != Vy then pc += 2
fn skrne(op: &Opcode, ctx: &mut Context) -> Result<Flow> {
    let condition = ctx.state.v(op.x()) != ctx.state.v(op.y());
    Ok(skip_if(condition, ctx.state))
}

/// I = addr
fn loadi(op: &Opcode, ctx: &mut Context) -> Result<Flow> {
    ctx.state.set_i(op.addr());
    Ok(Flow::Next)
}

/// PC = V0 + addr, or Vx + addr with `Quirks::jump_uses_vx`
fn jumpi(op: &Opcode, ctx: &mut Context) -> Result<Flow> {
    let offset = if ctx.config.quirks.jump_uses_vx {
        ctx.state.v(op.x())
    } else {
        ctx.state.v(Register::V0)
    };
    ctx.state.set_pc(op.addr() + u16::from(offset));
    Ok(Flow::Jumped)
}

/// Vx = rand_byte & kk
fn rand(op: &Opcode, ctx: &mut Context) -> Result<Flow> {
    let rand_byte = (ctx.rng.next_u32() & 0xFF) as u8;
    ctx.state.set_v(op.x(), rand_byte & op.kk());
    Ok(Flow::Next)
}

/// draw_sprite(x=Vx y=Vy size=n)
/// XORs a sprite from memory i..n at position x, y on the FrameBuffer with wrapping.
/// Sets VF if any pixels were erased
fn draw(op: &Opcode, ctx: &mut Context) -> Result<Flow> {
    let x = i32::from(ctx.state.v(op.x()));
    let y = i32::from(ctx.state.v(op.y()));

    let sprite = ctx
        .state
        .read_slice(usize::from(ctx.state.i()), usize::from(op.n()))?;
    let mut collided = false;
    for (row, byte) in sprite.iter().enumerate() {
        collided |= ctx.frame_buffer.draw_byte(*byte, x, y + row as i32);
    }
    ctx.state.set_flag(collided);

    present(ctx)?;
    Ok(Flow::Next)
}

/// if Vx.pressed then pc += 2
fn skpr(op: &Opcode, ctx: &mut Context) -> Result<Flow> {
    let key = key_in(op.x(), ctx.state)?;
    let pressed = ctx.input.is_pressed(key).map_err(MachineError::InputPort)?;
    Ok(skip_if(pressed, ctx.state))
}

/// if !Vx.pressed then pc += 2
fn skup(op: &Opcode, ctx: &mut Context) -> Result<Flow> {
    let key = key_in(op.x(), ctx.state)?;
    let pressed = ctx.input.is_pressed(key).map_err(MachineError::InputPort)?;
    Ok(skip_if(!pressed, ctx.state))
}

/// Vx = DT
fn moved(op: &Opcode, ctx: &mut Context) -> Result<Flow> {
    ctx.state.set_v(op.x(), ctx.state.delay_timer());
    Ok(Flow::Next)
}

/// await keypress for Vx
fn keyd(op: &Opcode, _ctx: &mut Context) -> Result<Flow> {
    Ok(Flow::WaitForKey(op.x()))
}

/// DT = Vx
fn loads(op: &Opcode, ctx: &mut Context) -> Result<Flow> {
    ctx.state.set_delay_timer(ctx.state.v(op.x()));
    Ok(Flow::Next)
}

/// ST = Vx
fn ld(op: &Opcode, ctx: &mut Context) -> Result<Flow> {
    ctx.state.set_sound_timer(ctx.state.v(op.x()));
    Ok(Flow::Next)
}

/// I += Vx; VF = overflow out of 16 bits
fn addi(op: &Opcode, ctx: &mut Context) -> Result<Flow> {
    let (res, over) = ctx.state.i().overflowing_add(u16::from(ctx.state.v(op.x())));
    ctx.state.set_i(res);
    ctx.state.set_flag(over);
    Ok(Flow::Next)
}

/// I = Vx * 5
/// Set I to the memory address of the sprite for the digit in the low nibble of Vx
fn ldspr(op: &Opcode, ctx: &mut Context) -> Result<Flow> {
    let digit = u16::from(ctx.state.v(op.x()) & 0xF);
    ctx.state.set_i(digit * SPRITE_HEIGHT);
    Ok(Flow::Next)
}

/// mem[I..I+3] = bcd(Vx)
fn bcd(op: &Opcode, ctx: &mut Context) -> Result<Flow> {
    let value = ctx.state.v(op.x());
    let digits = [value / 100, value / 10 % 10, value % 10];
    ctx.state.write_slice(usize::from(ctx.state.i()), &digits)?;
    Ok(Flow::Next)
}

/// Leaves I past the transferred block when `Quirks::load_store_increments_i` is set
fn bump_i(op: &Opcode, ctx: &mut Context) {
    if ctx.config.quirks.load_store_increments_i {
        let count = op.x().index() as u16 + 1;
        ctx.state.set_i(ctx.state.i().wrapping_add(count));
    }
}

/// mem[I..=I+x] = V0..=Vx
fn stor(op: &Opcode, ctx: &mut Context) -> Result<Flow> {
    let count = op.x().index() + 1;
    let registers = *ctx.state.registers();
    ctx.state
        .write_slice(usize::from(ctx.state.i()), &registers[..count])?;
    bump_i(op, ctx);
    Ok(Flow::Next)
}

/// V0..=Vx = mem[I..=I+x]
fn read(op: &Opcode, ctx: &mut Context) -> Result<Flow> {
    let count = op.x().index() + 1;
    let mut block = [0; 16];
    block[..count].copy_from_slice(ctx.state.read_slice(usize::from(ctx.state.i()), count)?);
    for register in op.x().range_from_v0() {
        ctx.state.set_v(register, block[register.index()]);
    }
    bump_i(op, ctx);
    Ok(Flow::Next)
}

/// 0000 ends the program unless `Config::halt_on_zero` is off
fn halt(op: &Opcode, ctx: &mut Context) -> Result<Flow> {
    if ctx.config.halt_on_zero {
        Ok(Flow::Halt(HaltReason::ZeroOpcode))
    } else {
        unknown(op, ctx)
    }
}

/// Reports the word and carries on as if it were a no-op
fn unknown(op: &Opcode, ctx: &mut Context) -> Result<Flow> {
    warn!(
        "{} at {:#06X}; skipping",
        MachineError::InvalidInstruction { opcode: op.word() },
        ctx.state.pc()
    );
    Ok(Flow::Next)
}
