pub mod sakura;

pub use sakura::{DriverState, SakuraTree};

use crate::display::PixelBuffer;

/// Trait for animated effects drawn into a pixel buffer
pub trait Effect {
    /// Update effect state (called each frame)
    /// - dt: delta time in seconds
    /// - width/height: current surface size; a change triggers a rebuild
    fn update(&mut self, dt: f32, width: u32, height: u32);

    /// Render effect to the pixel buffer
    fn render(&self, buffer: &mut PixelBuffer);

    /// Effect name for UI/debugging
    fn name(&self) -> &str;
}
