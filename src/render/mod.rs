//! Column-based software renderer.
//!
//! The [`Renderer`] is long-lived; each frame it hands out a [`Frame`],
//! a scoped writer over the surface's pixel buffer.  Dropping the frame
//! (or calling [`Frame::present`]) releases the buffer and shows it.

mod colors;
mod frame;
mod spans;
mod surface;

pub use colors::ShadeTable;
pub use frame::Frame;
pub use spans::{Span, SpanSet};
pub use surface::{HeadlessSurface, PixelSurface, WindowSurface};

use thiserror::Error;

use crate::world::{Camera, Map};

/// Lower clamp for the projection scale; keeps far geometry from
/// degenerating to zero-height columns.
pub const SCALE_MIN: f32 = 0.0025;
/// Upper clamp for the projection scale; keeps near-zero depths from
/// producing unbounded row ranges.
pub const SCALE_MAX: f32 = 250_000.0;

/// One framebuffer texel, 4 bytes, row-major W×H.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Pixel {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const BLACK: Pixel = Pixel::rgb(0, 0, 0);
    pub const WHITE: Pixel = Pixel::rgb(255, 255, 255);

    /// Pack into the 0x00RRGGBB layout window surfaces expect.
    pub fn to_0rgb(self) -> u32 {
        (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
    }
}

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("invalid renderer configuration: {0}")]
    InvalidConfig(String),

    #[error("frame error: {0}")]
    FrameError(String),
}

/// Knobs the host may set once at startup.
#[derive(Clone, Copy, Debug)]
pub struct RendererConfig {
    pub clear_color: Pixel,
    /// Used for sides whose texture slot is empty (`"-"`).
    pub fill_color: Pixel,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            clear_color: Pixel::BLACK,
            fill_color: Pixel::WHITE,
        }
    }
}

/// Owns everything that outlives a single frame: the target size, the
/// host configuration and the memoized wall shades.
pub struct Renderer {
    width: usize,
    height: usize,
    config: RendererConfig,
    shades: ShadeTable,
}

impl Renderer {
    pub fn new(width: usize, height: usize, config: RendererConfig) -> Result<Self, RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidConfig(format!(
                "degenerate target size {width}x{height}"
            )));
        }
        Ok(Self {
            width,
            height,
            config,
            shades: ShadeTable::new(),
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub(crate) fn shades_mut(&mut self) -> &mut ShadeTable {
        &mut self.shades
    }

    /// Start a frame: take exclusive hold of the surface's buffer and
    /// snapshot the camera for the duration of the frame.
    ///
    /// Fails with [`RenderError::FrameError`] when the surface does not
    /// match the renderer's target size.
    pub fn begin_frame<'a, S: PixelSurface>(
        &'a mut self,
        surface: &'a mut S,
        map: &'a Map,
        camera: &'a Camera,
    ) -> Result<Frame<'a, S>, RenderError> {
        Frame::begin(self, surface, map, camera)
    }
}
