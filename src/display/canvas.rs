//! 2D drawing context over a `PixelBuffer`
//!
//! A small immediate-mode API in the shape of an HTML canvas context:
//! a save/restore stack of transforms and global alpha, filled ellipses
//! with radial gradients, round-capped strokes and transformed image draws.
//! Every primitive inverse-maps device pixels back to user space, so any
//! affine transform (rotation, non-uniform scale) is handled uniformly.

use super::paint::{Paint, Rgba};
use super::PixelBuffer;
use crate::math2d::{Transform, Vec2};

pub struct Canvas<'a> {
    target: &'a mut PixelBuffer,
    transform: Transform,
    global_alpha: f32,
    stack: Vec<(Transform, f32)>,
}

impl<'a> Canvas<'a> {
    pub fn new(target: &'a mut PixelBuffer) -> Self {
        Self {
            target,
            transform: Transform::IDENTITY,
            global_alpha: 1.0,
            stack: Vec::new(),
        }
    }

    // ========================================================================
    // State
    // ========================================================================

    pub fn save(&mut self) {
        self.stack.push((self.transform, self.global_alpha));
    }

    /// Pop the last saved state; unbalanced restores are ignored
    pub fn restore(&mut self) {
        if let Some((transform, alpha)) = self.stack.pop() {
            self.transform = transform;
            self.global_alpha = alpha;
        }
    }

    pub fn translate(&mut self, tx: f32, ty: f32) {
        self.transform = self.transform.then_translate(tx, ty);
    }

    pub fn rotate(&mut self, angle: f32) {
        self.transform = self.transform.then_rotate(angle);
    }

    pub fn scale(&mut self, sx: f32, sy: f32) {
        self.transform = self.transform.then_scale(sx, sy);
    }

    pub fn set_global_alpha(&mut self, alpha: f32) {
        self.global_alpha = alpha.clamp(0.0, 1.0);
    }

    pub fn global_alpha(&self) -> f32 {
        self.global_alpha
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    /// Clear the whole surface to transparent, ignoring the transform
    pub fn clear(&mut self) {
        self.target.clear_transparent();
    }

    // ========================================================================
    // Primitives
    // ========================================================================

    /// Fill an axis-aligned (in user space) ellipse
    pub fn fill_ellipse(&mut self, cx: f32, cy: f32, rx: f32, ry: f32, paint: &Paint) {
        if rx <= 0.0 || ry <= 0.0 || self.global_alpha <= 0.0 {
            return;
        }
        let Some(inv) = self.transform.invert() else {
            return;
        };

        // Width of the anti-aliased rim, in normalized ellipse units
        let device_radius = rx.min(ry) * self.transform.mean_scale();
        let rim = 1.0 / device_radius.max(0.5);

        let corners = [
            Vec2::new(cx - rx, cy - ry),
            Vec2::new(cx + rx, cy - ry),
            Vec2::new(cx - rx, cy + ry),
            Vec2::new(cx + rx, cy + ry),
        ];
        let Some((x0, y0, x1, y1)) = self.device_bounds(&corners) else {
            return;
        };

        for py in y0..=y1 {
            for px in x0..=x1 {
                let local = inv.apply(Vec2::new(px as f32 + 0.5, py as f32 + 0.5));
                let nx = (local.x - cx) / rx;
                let ny = (local.y - cy) / ry;
                let d = (nx * nx + ny * ny).sqrt();
                let coverage = ((1.0 - d) / rim + 0.5).clamp(0.0, 1.0);
                if coverage <= 0.0 {
                    continue;
                }
                let (r, g, b, a) = paint.color_at(local);
                self.plot(px, py, r, g, b, a * coverage);
            }
        }
    }

    pub fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, paint: &Paint) {
        self.fill_ellipse(cx, cy, radius, radius, paint);
    }

    /// Stroke a straight segment with round caps (`lineCap = 'round'`).
    ///
    /// The pen is round in user space, so a non-uniform scale stretches it
    /// the same way it stretches the segment.
    pub fn stroke_line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, width: f32, color: Rgba) {
        if width <= 0.0 || self.global_alpha <= 0.0 {
            return;
        }
        let Some(inv) = self.transform.invert() else {
            return;
        };
        let half = width * 0.5;
        let (a, b) = (Vec2::new(x1, y1), Vec2::new(x2, y2));

        let corners = [
            Vec2::new(x1.min(x2) - half, y1.min(y2) - half),
            Vec2::new(x1.max(x2) + half, y1.min(y2) - half),
            Vec2::new(x1.min(x2) - half, y1.max(y2) + half),
            Vec2::new(x1.max(x2) + half, y1.max(y2) + half),
        ];
        let Some((x0, y0, x1, y1)) = self.device_bounds(&corners) else {
            return;
        };

        let seg = b - a;
        let seg_len_sq = seg.dot(&seg);
        let (r, g, bl) = (color.r as f32, color.g as f32, color.b as f32);
        let pixel_fallback = 1.0 / self.transform.mean_scale().max(1e-6);

        for py in y0..=y1 {
            for px in x0..=x1 {
                let p = inv.apply(Vec2::new(px as f32 + 0.5, py as f32 + 0.5));
                let t = if seg_len_sq > 0.0 {
                    ((p - a).dot(&seg) / seg_len_sq).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let offset = p - (a + seg * t);
                let dist = offset.length();

                // User units per device pixel along the distance gradient
                let per_pixel = if dist > 1e-6 {
                    let n = offset * (1.0 / dist);
                    Vec2::new(inv.a * n.x + inv.b * n.y, inv.c * n.x + inv.d * n.y).length()
                } else {
                    pixel_fallback
                };
                let coverage = ((half - dist) / per_pixel.max(1e-6) + 0.5).clamp(0.0, 1.0);
                if coverage > 0.0 {
                    self.plot(px, py, r, g, bl, color.a * coverage);
                }
            }
        }
    }

    /// Draw `image` into the user-space rectangle (dx, dy, dw, dh) with
    /// bilinear filtering (`drawImage` with destination size)
    pub fn draw_image(&mut self, image: &PixelBuffer, dx: f32, dy: f32, dw: f32, dh: f32) {
        if dw <= 0.0 || dh <= 0.0 || image.width() == 0 || image.height() == 0 {
            return;
        }
        if self.global_alpha <= 0.0 {
            return;
        }

        // Pixel-aligned 1:1 copy: straight composite, no resampling
        let t = self.transform;
        if self.global_alpha >= 1.0
            && t.a == 1.0
            && t.b == 0.0
            && t.c == 0.0
            && t.d == 1.0
            && dw == image.width() as f32
            && dh == image.height() as f32
            && (t.e + dx).fract() == 0.0
            && (t.f + dy).fract() == 0.0
        {
            self.target
                .composite(image, (t.e + dx) as i32, (t.f + dy) as i32);
            return;
        }

        let Some(inv) = t.invert() else {
            return;
        };
        let corners = [
            Vec2::new(dx, dy),
            Vec2::new(dx + dw, dy),
            Vec2::new(dx, dy + dh),
            Vec2::new(dx + dw, dy + dh),
        ];
        let Some((x0, y0, x1, y1)) = self.device_bounds(&corners) else {
            return;
        };

        let sx = image.width() as f32 / dw;
        let sy = image.height() as f32 / dh;
        for py in y0..=y1 {
            for px in x0..=x1 {
                let local = inv.apply(Vec2::new(px as f32 + 0.5, py as f32 + 0.5));
                let u = (local.x - dx) * sx;
                let v = (local.y - dy) * sy;
                if u < -0.5
                    || v < -0.5
                    || u > image.width() as f32 + 0.5
                    || v > image.height() as f32 + 0.5
                {
                    continue;
                }
                let (r, g, b, a) = image.sample_bilinear(u, v);
                if a > 0.0 {
                    self.plot(px, py, r, g, b, a / 255.0);
                }
            }
        }
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    /// Blend one device pixel; `alpha` in 0..=1 before global alpha
    #[inline]
    fn plot(&mut self, x: i32, y: i32, r: f32, g: f32, b: f32, alpha: f32) {
        let a = (alpha * self.global_alpha * 255.0).round();
        if a < 1.0 {
            return;
        }
        self.target.blend_pixel_rgba(
            x,
            y,
            r.round() as u8,
            g.round() as u8,
            b.round() as u8,
            a.min(255.0) as u8,
        );
    }

    /// Device-space pixel bounds of transformed user-space points, clipped
    fn device_bounds(&self, points: &[Vec2]) -> Option<(i32, i32, i32, i32)> {
        let mut min = Vec2::new(f32::MAX, f32::MAX);
        let mut max = Vec2::new(f32::MIN, f32::MIN);
        for p in points {
            let d = self.transform.apply(*p);
            min.x = min.x.min(d.x);
            min.y = min.y.min(d.y);
            max.x = max.x.max(d.x);
            max.y = max.y.max(d.y);
        }
        self.clip(
            min.x.floor() as i32 - 1,
            min.y.floor() as i32 - 1,
            max.x.ceil() as i32 + 1,
            max.y.ceil() as i32 + 1,
        )
    }

    fn clip(&self, x0: i32, y0: i32, x1: i32, y1: i32) -> Option<(i32, i32, i32, i32)> {
        let x0 = x0.max(0);
        let y0 = y0.max(0);
        let x1 = x1.min(self.target.width() as i32 - 1);
        let y1 = y1.min(self.target.height() as i32 - 1);
        if x0 > x1 || y0 > y1 {
            None
        } else {
            Some((x0, y0, x1, y1))
        }
    }
}
