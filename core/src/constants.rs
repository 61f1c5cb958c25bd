use std::time::Duration;

/// Bytes of addressable memory
pub const MEMORY_SIZE: usize = 4096;

/// Address ROMs are loaded at; everything below it belongs to the interpreter
pub const PROGRAM_START: u16 = 0x200;

/// Largest ROM that fits between `PROGRAM_START` and the end of memory
pub const MAX_PROGRAM_SIZE: usize = MEMORY_SIZE - PROGRAM_START as usize;

pub const DISPLAY_WIDTH: usize = 64;
pub const DISPLAY_HEIGHT: usize = 32;

/// Number of return addresses the stack can hold
pub const STACK_DEPTH: usize = 16;

/// Index of the flag register VF
pub const FLAG: usize = 0xF;

/// Rate the delay and sound timers count down at
pub const TIMER_HZ: u32 = 60;

/// Wall-clock time between two timer decrements
pub const TIMER_PERIOD: Duration = Duration::from_nanos(1_000_000_000 / TIMER_HZ as u64);

/// Default instruction rate used to pace `Chip8::run`
pub const CLOCK_SPEED_HZ: u32 = 500;

/// Default pitch of the buzzer
pub const TONE_HZ: u32 = 400;

/// Each built-in digit sprite is 5 bytes tall
pub const SPRITE_HEIGHT: u16 = 5;

/// # Sprite Sheet
/// The hexadecimal digits 0..F as 4x5 sprites, stored from address 0x000.
///
/// ```text
/// 0xF0  ####....
/// 0x90  #..#....
/// 0x90  #..#....
/// 0x90  #..#....
/// 0xF0  ####....
/// ```
#[rustfmt::skip]
pub const SPRITE_SHEET: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];
