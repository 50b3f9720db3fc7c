//! Pre-rendered flower sprites
//!
//! Every (layer, palette color) pair gets its own small off-screen bitmap so
//! the tree cache can stamp thousands of flowers with a single image draw
//! each. Softer gradients on the back layers stand in for a blur filter.

use super::generator::FlowerLayer;
use crate::display::{Canvas, Paint, PixelBuffer, RadialGradient, Rgb, Rgba};
use crate::math2d::Vec2;
use crate::theme::{Palette, PALETTE_SIZE};
use std::f32::consts::TAU;

/// Nominal rosette size in sprite pixels
pub const SPRITE_SIZE: f32 = 30.0;
/// Side of the square sprite surface
pub const SPRITE_EXTENT: u32 = 60;
/// A flower of this size is drawn at 1:1 sprite scale
pub const SPRITE_UNIT: f64 = 15.0;

const PETALS: usize = 5;
const CENTER_COLOR: Rgb = Rgb::new(255, 230, 180);

/// Five-petal flower silhouette, parameterized by size.
///
/// Each petal is an ellipse pushed out from the center and filled with a
/// radial gradient centered on the petal; a dot covers the middle.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Rosette {
    pub size: f32,
    /// Petal center distance from the flower center, as a fraction of size
    pub petal_offset: f32,
    pub petal_rx: f32,
    pub petal_ry: f32,
    pub gradient_radius: f32,
    /// (offset, alpha) gradient stops
    pub stops: [(f32, f32); 3],
    pub dot_radius: f32,
    pub dot_alpha: f32,
}

impl Rosette {
    /// Sprite rosette for one depth layer
    pub fn for_layer(layer: FlowerLayer) -> Self {
        let (gradient_radius, stops, dot_alpha) = match layer {
            FlowerLayer::Foreground => (0.5, [(0.0, 1.0), (0.85, 0.95), (1.0, 0.7)], 1.0),
            FlowerLayer::Middle => (0.55, [(0.0, 0.9), (0.7, 0.7), (1.0, 0.2)], 0.8),
            FlowerLayer::Background => (0.6, [(0.0, 0.7), (0.5, 0.4), (1.0, 0.0)], 0.5),
        };
        Self {
            size: SPRITE_SIZE,
            petal_offset: 0.4,
            petal_rx: 0.3,
            petal_ry: 0.5,
            gradient_radius,
            stops,
            dot_radius: 0.2,
            dot_alpha,
        }
    }

    /// Live falling-petal rosette; slightly plumper petals than the sprites
    pub fn falling(size: f32) -> Self {
        Self {
            size,
            petal_offset: 0.4,
            petal_rx: 0.35,
            petal_ry: 0.5,
            gradient_radius: 0.6,
            stops: [(0.0, 1.0), (0.7, 0.8), (1.0, 0.3)],
            dot_radius: 0.25,
            dot_alpha: 0.9,
        }
    }

    /// Draw centered on the canvas origin
    pub fn draw(&self, canvas: &mut Canvas, color: Rgb) {
        let s = self.size;
        let petal_center = Vec2::new(0.0, -s * self.petal_offset);
        let paint: Paint = self
            .stops
            .iter()
            .fold(
                RadialGradient::new(petal_center, s * self.gradient_radius),
                |g, &(offset, alpha)| g.with_stop(offset, color.with_alpha(alpha)),
            )
            .into();

        for p in 0..PETALS {
            canvas.save();
            canvas.rotate(p as f32 * TAU / PETALS as f32);
            canvas.fill_ellipse(
                petal_center.x,
                petal_center.y,
                s * self.petal_rx,
                s * self.petal_ry,
                &paint,
            );
            canvas.restore();
        }

        let dot: Rgba = CENTER_COLOR.with_alpha(self.dot_alpha);
        canvas.fill_circle(0.0, 0.0, s * self.dot_radius, &dot.into());
    }
}

/// 3 layers x 4 colors of flower bitmaps
#[derive(Debug, Clone)]
pub struct FlowerSprites {
    tiers: [[PixelBuffer; PALETTE_SIZE]; 3],
}

impl FlowerSprites {
    pub fn build(palette: &Palette) -> Self {
        let tiers = std::array::from_fn(|tier| {
            let rosette = Rosette::for_layer(FlowerLayer::ALL[tier]);
            std::array::from_fn(|color| Self::render_sprite(&rosette, palette[color]))
        });
        log::debug!("Built {} flower sprites", 3 * PALETTE_SIZE);
        Self { tiers }
    }

    fn render_sprite(rosette: &Rosette, color: Rgb) -> PixelBuffer {
        let mut sprite = PixelBuffer::with_size(SPRITE_EXTENT, SPRITE_EXTENT);
        let mut canvas = Canvas::new(&mut sprite);
        let half = SPRITE_EXTENT as f32 / 2.0;
        canvas.translate(half, half);
        rosette.draw(&mut canvas, color);
        sprite
    }

    /// Sprite for a layer and palette index (index wraps)
    pub fn get(&self, layer: FlowerLayer, pattern_index: usize) -> &PixelBuffer {
        &self.tiers[layer.index()][pattern_index % PALETTE_SIZE]
    }
}
