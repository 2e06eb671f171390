//! Presentation surfaces.
//!
//! The renderer writes CPU pixels; where they end up is the surface's
//! business.  [`WindowSurface`] shows them in a window, while
//! [`HeadlessSurface`] keeps them in memory for tests and offline use.

use minifb::{Window, WindowOptions};

use super::{Pixel, RenderError};

/// A CPU-writable pixel buffer with a present step.
///
/// The contract mirrors a mapped streaming buffer: `acquire_write` hands
/// out exclusive write access for the frame, `release_and_present`
/// declares the contents final and shows them.
pub trait PixelSurface {
    /// (width, height) in pixels.
    fn size(&self) -> (usize, usize);

    /// Exclusive write access to the `width * height` buffer.
    fn acquire_write(&mut self) -> &mut [Pixel];

    /// The buffer contents are final; display them.
    fn release_and_present(&mut self) -> Result<(), RenderError>;
}

/*──────────────────────────── window ────────────────────────────────*/

/// Surface backed by an OS window.  Present converts the RGBA buffer to
/// the window's packed format and swaps.
pub struct WindowSurface {
    window: Window,
    pixels: Vec<Pixel>,
    packed: Vec<u32>,
    width: usize,
    height: usize,
}

impl WindowSurface {
    pub fn new(title: &str, width: usize, height: usize) -> Result<Self, RenderError> {
        let window = Window::new(title, width, height, WindowOptions::default())
            .map_err(|e| RenderError::InvalidConfig(format!("unable to create window: {e}")))?;
        Ok(Self {
            window,
            pixels: vec![Pixel::BLACK; width * height],
            packed: vec![0; width * height],
            width,
            height,
        })
    }

    /// The underlying window, for input polling.
    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn window_mut(&mut self) -> &mut Window {
        &mut self.window
    }
}

impl PixelSurface for WindowSurface {
    fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn acquire_write(&mut self) -> &mut [Pixel] {
        &mut self.pixels
    }

    fn release_and_present(&mut self) -> Result<(), RenderError> {
        for (dst, src) in self.packed.iter_mut().zip(&self.pixels) {
            *dst = src.to_0rgb();
        }
        self.window
            .update_with_buffer(&self.packed, self.width, self.height)
            .map_err(|e| RenderError::FrameError(format!("buffer swap failed: {e}")))
    }
}

/*──────────────────────────── headless ──────────────────────────────*/

/// In-memory surface; present is a counter so tests can assert the
/// scoped-writer guarantee.
pub struct HeadlessSurface {
    pixels: Vec<Pixel>,
    width: usize,
    height: usize,
    presents: usize,
}

impl HeadlessSurface {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            pixels: vec![Pixel::BLACK; width * height],
            width,
            height,
            presents: 0,
        }
    }

    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    pub fn pixel(&self, x: usize, y: usize) -> Pixel {
        self.pixels[y * self.width + x]
    }

    /// How many times the surface has been presented.
    pub fn presents(&self) -> usize {
        self.presents
    }
}

impl PixelSurface for HeadlessSurface {
    fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn acquire_write(&mut self) -> &mut [Pixel] {
        &mut self.pixels
    }

    fn release_and_present(&mut self) -> Result<(), RenderError> {
        self.presents += 1;
        Ok(())
    }
}
