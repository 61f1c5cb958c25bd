use crate::constants::{DISPLAY_HEIGHT, DISPLAY_WIDTH};

/// A snapshot of every pixel, indexed as [y][x]
pub type Frame = [[bool; DISPLAY_WIDTH]; DISPLAY_HEIGHT];

/// # Frame Buffer
/// The 64x32 monochrome screen.
///
/// Pixels are only ever flipped, never assigned, so every draw reports whether it erased
/// something. Coordinates wrap around both edges before they are used.
#[derive(Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    pixels: Frame,
}

impl FrameBuffer {
    pub fn new() -> Self {
        FrameBuffer {
            pixels: [[false; DISPLAY_WIDTH]; DISPLAY_HEIGHT],
        }
    }

    /// Flips the pixel at (x, y) after wrapping, returning whether it was lit beforehand
    pub fn toggle_pixel(&mut self, x: i32, y: i32) -> bool {
        let (x, y) = wrap(x, y);
        let was_set = self.pixels[y][x];
        self.pixels[y][x] = !was_set;
        was_set
    }

    /// XORs one sprite row onto the screen.
    ///
    /// The bits of `byte` are drawn most significant first, left to right from x.
    /// Returns true if any lit pixel was erased.
    pub fn draw_byte(&mut self, byte: u8, x: i32, y: i32) -> bool {
        let mut collided = false;
        for bit in 0..8 {
            if byte & (0x80 >> bit) != 0 {
                collided |= self.toggle_pixel(x + bit, y);
            }
        }
        collided
    }

    pub fn clear(&mut self) {
        self.pixels = [[false; DISPLAY_WIDTH]; DISPLAY_HEIGHT];
    }

    pub fn is_set(&self, x: i32, y: i32) -> bool {
        let (x, y) = wrap(x, y);
        self.pixels[y][x]
    }

    pub fn frame(&self) -> &Frame {
        &self.pixels
    }

    pub fn is_blank(&self) -> bool {
        self.pixels.iter().flatten().all(|pixel| !pixel)
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

fn wrap(x: i32, y: i32) -> (usize, usize) {
    (
        x.rem_euclid(DISPLAY_WIDTH as i32) as usize,
        y.rem_euclid(DISPLAY_HEIGHT as i32) as usize,
    )
}
