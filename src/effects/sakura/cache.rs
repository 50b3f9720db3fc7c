//! Off-screen raster of the static tree
//!
//! Branches and flowers never move relative to each other, so they are
//! painted once into this buffer and the per-frame loop just composites it.
//! A rebuild is only needed when the surface size or the palette changes.

use super::generator::{Branch, FlowerCluster, Tree};
use super::sprites::{FlowerSprites, SPRITE_UNIT};
use crate::display::{Canvas, PixelBuffer, Rgba};

/// Bark brightness at the trunk; each generation lightens it
const BARK_BASE: u32 = 35;
const BARK_STEP: u32 = 6;

/// Bark color for a branch generation: dark and warm near the trunk
pub fn bark_color(depth: u32) -> Rgba {
    let shade = (BARK_BASE + depth * BARK_STEP).min(255);
    Rgba::new(
        shade as u8,
        shade.saturating_sub(8) as u8,
        shade.saturating_sub(15) as u8,
        1.0,
    )
}

#[derive(Debug, Clone)]
pub struct TreeCache {
    buffer: PixelBuffer,
    builds: u64,
}

impl TreeCache {
    pub fn new() -> Self {
        Self {
            buffer: PixelBuffer::with_size(0, 0),
            builds: 0,
        }
    }

    /// Repaint the whole cache at `width` x `height`, mapping base
    /// coordinates through (scale_x, scale_y). Same inputs, same pixels.
    pub fn render(
        &mut self,
        tree: &Tree,
        sprites: &FlowerSprites,
        width: u32,
        height: u32,
        scale_x: f64,
        scale_y: f64,
    ) {
        if self.buffer.width() != width || self.buffer.height() != height {
            self.buffer.resize(width, height);
        }

        let mut canvas = Canvas::new(&mut self.buffer);
        canvas.clear();
        canvas.save();
        canvas.scale(scale_x as f32, scale_y as f32);

        for branch in &tree.branches {
            draw_branch(&mut canvas, branch);
        }
        for flower in tree.flowers_back_to_front() {
            draw_flower(&mut canvas, sprites, flower);
        }

        canvas.restore();
        self.builds += 1;
        log::debug!(
            "Tree cache rendered at {}x{} (build #{})",
            width,
            height,
            self.builds
        );
    }

    pub fn buffer(&self) -> &PixelBuffer {
        &self.buffer
    }

    /// Number of times the cache has been painted
    pub fn builds(&self) -> u64 {
        self.builds
    }
}

impl Default for TreeCache {
    fn default() -> Self {
        Self::new()
    }
}

fn draw_branch(canvas: &mut Canvas, branch: &Branch) {
    canvas.stroke_line(
        branch.x1 as f32,
        branch.y1 as f32,
        branch.x2 as f32,
        branch.y2 as f32,
        branch.width as f32,
        bark_color(branch.depth),
    );
}

fn draw_flower(canvas: &mut Canvas, sprites: &FlowerSprites, flower: &FlowerCluster) {
    let sprite = sprites.get(flower.layer, flower.pattern_index);
    let scale = flower.size / SPRITE_UNIT;
    let w = sprite.width() as f64 * scale;
    let h = sprite.height() as f64 * scale;

    canvas.save();
    canvas.translate(flower.x as f32, flower.y as f32);
    canvas.rotate(flower.rotation as f32);
    canvas.set_global_alpha(flower.opacity as f32);
    canvas.draw_image(
        sprite,
        (-w / 2.0) as f32,
        (-h / 2.0) as f32,
        w as f32,
        h as f32,
    );
    canvas.restore();
}
