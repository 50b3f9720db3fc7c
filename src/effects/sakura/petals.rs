//! Falling petals
//!
//! A fixed pool of petals drifting down over the tree. Petals are recycled
//! in place: one leaving the bottom reappears above the top at a fresh x,
//! one leaving a side reappears at the other side.

use super::sprites::Rosette;
use crate::display::{Canvas, Paint, RadialGradient, Rgb};
use crate::math2d::Vec2;
use crate::theme::{Palette, PALETTE_SIZE};
use crate::util::{RandomSource, Rng};
use std::f64::consts::TAU;

/// Distance outside the surface a petal may travel before wrapping
pub const EDGE_MARGIN: f32 = 50.0;
/// Fraction of the wind strength added to horizontal motion each frame
const WIND_FACTOR: f32 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub struct FallingPetal {
    pub x: f32,
    pub y: f32,
    pub size: f32,
    /// Pixels per frame
    pub speed: f32,
    /// Swing phase in radians
    pub swing: f32,
    pub swing_speed: f32,
    pub swing_amplitude: f32,
    pub rotation: f32,
    pub rotation_speed: f32,
    pub opacity: f32,
    /// Five-petal rosette if set, plain ellipse otherwise
    pub rosette: bool,
    pub vertical_drift: f32,
}

impl FallingPetal {
    /// Random petal somewhere above a `width` x `height` surface
    pub fn spawn<R: RandomSource>(rng: &mut R, width: u32, height: u32) -> Self {
        let (w, h) = (width as f64, height as f64);
        Self {
            x: rng.range_f64(0.0, w) as f32,
            y: rng.range_f64(-h, 0.0) as f32,
            size: rng.range_f64(4.0, 9.0) as f32,
            speed: rng.range_f64(0.3, 0.8) as f32,
            swing: rng.range_f64(0.0, TAU) as f32,
            swing_speed: rng.range_f64(0.01, 0.025) as f32,
            swing_amplitude: rng.range_f64(1.0, 3.0) as f32,
            rotation: rng.range_f64(0.0, TAU) as f32,
            rotation_speed: rng.range_f64(-0.03, 0.03) as f32,
            opacity: rng.range_f64(0.5, 1.0) as f32,
            rosette: rng.next_f64() > 0.5,
            vertical_drift: rng.range_f64(-0.1, 0.1) as f32,
        }
    }

    /// Palette slot picked from the current position, so a petal's
    /// color shifts as it drifts
    #[inline]
    pub fn color_index(&self) -> usize {
        ((self.x + self.y).floor().abs() as usize) % PALETTE_SIZE
    }
}

/// Fixed-size petal pool plus the random source used to re-place petals
pub struct PetalPool<R: RandomSource = Rng> {
    petals: Vec<FallingPetal>,
    rng: R,
}

impl PetalPool<Rng> {
    /// Pool seeded from the wall clock; petal positions need not be stable
    pub fn new(count: usize, width: u32, height: u32) -> Self {
        Self::with_rng(count, width, height, Rng::from_time())
    }
}

impl<R: RandomSource> PetalPool<R> {
    pub fn with_rng(count: usize, width: u32, height: u32, mut rng: R) -> Self {
        let petals = (0..count)
            .map(|_| FallingPetal::spawn(&mut rng, width, height))
            .collect();
        Self { petals, rng }
    }

    pub fn len(&self) -> usize {
        self.petals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.petals.is_empty()
    }

    pub fn petals(&self) -> &[FallingPetal] {
        &self.petals
    }

    /// Mutable view; the pool itself cannot grow or shrink
    pub fn petals_mut(&mut self) -> &mut [FallingPetal] {
        &mut self.petals
    }

    /// Advance every petal by `frames` 60 Hz frames under the given wind,
    /// then wrap anything that left the `width` x `height` surface
    pub fn step(&mut self, frames: f32, wind: f32, width: u32, height: u32) {
        let (w, h) = (width as f32, height as f32);
        for petal in &mut self.petals {
            petal.y += (petal.speed + petal.vertical_drift) * frames;
            petal.x += (petal.swing.sin() * petal.swing_amplitude + wind * WIND_FACTOR) * frames;
            petal.swing += petal.swing_speed * frames;
            petal.rotation += petal.rotation_speed * frames;

            if petal.y > h + EDGE_MARGIN {
                petal.y = -EDGE_MARGIN;
                petal.x = self.rng.range_f64(0.0, w as f64) as f32;
            }
            if petal.x < -EDGE_MARGIN {
                petal.x = w + EDGE_MARGIN;
            }
            if petal.x > w + EDGE_MARGIN {
                petal.x = -EDGE_MARGIN;
            }
        }
    }

    /// Paint every petal at its current position
    pub fn draw(&self, canvas: &mut Canvas, palette: &Palette) {
        for petal in &self.petals {
            let color = palette[petal.color_index()];
            canvas.save();
            canvas.translate(petal.x, petal.y);
            canvas.rotate(petal.rotation);
            canvas.set_global_alpha(petal.opacity);
            if petal.rosette {
                Rosette::falling(petal.size).draw(canvas, color);
            } else {
                draw_ellipse_petal(canvas, petal.size, color);
            }
            canvas.restore();
        }
    }
}

fn draw_ellipse_petal(canvas: &mut Canvas, size: f32, color: Rgb) {
    let paint: Paint = RadialGradient::new(Vec2::default(), size)
        .with_stop(0.0, color.with_alpha(1.0))
        .with_stop(0.7, color.with_alpha(0.8))
        .with_stop(1.0, color.with_alpha(0.2))
        .into();
    canvas.fill_ellipse(0.0, 0.0, size, size * 0.7, &paint);
}
