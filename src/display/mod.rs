mod canvas;
mod paint;
mod pixel_buffer;
#[cfg(feature = "window")]
mod window;

pub use canvas::Canvas;
pub use paint::{ColorStop, Paint, RadialGradient, Rgb, Rgba};
pub use pixel_buffer::PixelBuffer;
#[cfg(feature = "window")]
pub use window::{Display, InputEvent, RenderTarget};

pub const DEFAULT_WIDTH: u32 = 800;
pub const DEFAULT_HEIGHT: u32 = 600;

/// A host that owns named drawing surfaces (a page with canvas elements,
/// a window, a headless test harness).
pub trait SurfaceHost {
    /// Current pixel size of the surface with this id, if it exists
    fn surface_size(&self, id: &str) -> Option<(u32, u32)>;
}

/// Headless host with a single named surface
#[derive(Debug, Clone)]
pub struct OffscreenHost {
    id: String,
    width: u32,
    height: u32,
}

impl OffscreenHost {
    pub fn new(id: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            id: id.into(),
            width,
            height,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }
}

impl SurfaceHost for OffscreenHost {
    fn surface_size(&self, id: &str) -> Option<(u32, u32)> {
        (id == self.id).then_some((self.width, self.height))
    }
}
