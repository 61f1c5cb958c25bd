use sdl2::pixels::PixelFormatEnum;
use sdl2::render::WindowCanvas;
use sdl2::VideoSubsystem;

use vip8_core::constants::{DISPLAY_HEIGHT, DISPLAY_WIDTH};
use vip8_core::{DisplayPort, Frame, PortError};

/// Bytes per RGB24 pixel
const CHANNELS: usize = 3;

pub const DEFAULT_SCALE: u32 = 10;

/// # Display
/// The Chip-8 display is composed of 64x32 black/white pixels, scaled up to fill a window.
/// The display only gets a call to `render` when the machine's FrameBuffer is updated.
pub struct SdlDisplay {
    canvas: WindowCanvas,
}

impl SdlDisplay {
    /// Opens a window bound to an sdl2 video subsystem.
    ///
    /// # Arguments
    /// * `video` the subsystem to open the window with
    /// * `title` the window title
    /// * `scale` the size multiplier for each pixel
    pub fn new(video: &VideoSubsystem, title: &str, scale: u32) -> Result<Self, PortError> {
        let window = video
            .window(
                title,
                DISPLAY_WIDTH as u32 * scale,
                DISPLAY_HEIGHT as u32 * scale,
            )
            .position_centered()
            .opengl()
            .build()?;
        let canvas = window.into_canvas().build()?;

        Ok(SdlDisplay { canvas })
    }
}

/// Formats a Frame for rendering as an SDL2 texture.
///
/// An SDL2 texture is a 1D array of ints that represent concatenated rows of RGB pixels.
///
/// This creates a black and white rendering by:
/// - Flattening the 2D frame into a 1D array by concatenating its rows
/// - Triplicating each element of that 1D array to represent the RGB values of each pixel
/// - Mapping lit pixels to full intensity
fn frame_to_sdl_texture(frame: &Frame) -> Vec<u8> {
    frame
        .iter()
        .flat_map(|row| row.iter())
        .flat_map(|pixel| std::iter::repeat(*pixel).take(CHANNELS))
        .map(|lit| if lit { 255 } else { 0 })
        .collect()
}

impl DisplayPort for SdlDisplay {
    /// Formats the Frame as an SDL2 RGB24 texture and renders it.
    fn render(&mut self, frame: &Frame) -> Result<(), PortError> {
        let texture_creator = self.canvas.texture_creator();
        let mut texture = texture_creator.create_texture_streaming(
            PixelFormatEnum::RGB24,
            DISPLAY_WIDTH as u32,
            DISPLAY_HEIGHT as u32,
        )?;

        let pixels = frame_to_sdl_texture(frame);
        let row_len = DISPLAY_WIDTH * CHANNELS;
        texture.with_lock(None, |buffer: &mut [u8], pitch: usize| {
            for (y, row) in pixels.chunks(row_len).enumerate() {
                let start = y * pitch;
                buffer[start..start + row_len].copy_from_slice(row);
            }
        })?;

        self.canvas.copy(&texture, None, None)?;
        self.canvas.present();
        Ok(())
    }
}
