//! Colors and fill styles for the canvas context

use crate::math2d::Vec2;
use serde::{Deserialize, Serialize};

/// Opaque RGB triple (palette entries)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn with_alpha(self, a: f32) -> Rgba {
        Rgba {
            r: self.r,
            g: self.g,
            b: self.b,
            a,
        }
    }
}

/// Color with straight alpha in 0.0..=1.0 (CSS `rgba()` semantics)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

/// One stop of a gradient: offset in 0.0..=1.0 and its color
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorStop {
    pub offset: f32,
    pub color: Rgba,
}

/// Radial gradient from a single center, inner radius zero.
/// Offsets map linearly from the center (0.0) to `radius` (1.0);
/// points beyond the radius take the last stop.
#[derive(Debug, Clone, PartialEq)]
pub struct RadialGradient {
    center: Vec2,
    radius: f32,
    stops: Vec<ColorStop>,
}

impl RadialGradient {
    pub fn new(center: Vec2, radius: f32) -> Self {
        Self {
            center,
            radius,
            stops: Vec::with_capacity(3),
        }
    }

    /// Add a stop; stops must be added in increasing offset order
    pub fn with_stop(mut self, offset: f32, color: Rgba) -> Self {
        self.stops.push(ColorStop {
            offset: offset.clamp(0.0, 1.0),
            color,
        });
        self
    }

    /// Color at a point in the gradient's own coordinate space.
    /// Returns (r, g, b, alpha) with channels in 0..=255 and alpha in 0..=1.
    pub fn color_at(&self, p: Vec2) -> (f32, f32, f32, f32) {
        let Some(first) = self.stops.first() else {
            return (0.0, 0.0, 0.0, 0.0);
        };
        let t = if self.radius > 0.0 {
            ((p - self.center).length() / self.radius).min(1.0)
        } else {
            1.0
        };

        if t <= first.offset {
            return unpack(first.color);
        }
        for pair in self.stops.windows(2) {
            let (lo, hi) = (pair[0], pair[1]);
            if t <= hi.offset {
                let span = hi.offset - lo.offset;
                let k = if span > 0.0 { (t - lo.offset) / span } else { 1.0 };
                let (r0, g0, b0, a0) = unpack(lo.color);
                let (r1, g1, b1, a1) = unpack(hi.color);
                return (
                    r0 + (r1 - r0) * k,
                    g0 + (g1 - g0) * k,
                    b0 + (b1 - b0) * k,
                    a0 + (a1 - a0) * k,
                );
            }
        }
        self.stops
            .last()
            .map_or((0.0, 0.0, 0.0, 0.0), |s| unpack(s.color))
    }
}

#[inline]
fn unpack(c: Rgba) -> (f32, f32, f32, f32) {
    (c.r as f32, c.g as f32, c.b as f32, c.a.clamp(0.0, 1.0))
}

/// Fill style
#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    Solid(Rgba),
    Radial(RadialGradient),
}

impl Paint {
    #[inline]
    pub fn color_at(&self, p: Vec2) -> (f32, f32, f32, f32) {
        match self {
            Paint::Solid(c) => unpack(*c),
            Paint::Radial(g) => g.color_at(p),
        }
    }
}

impl From<Rgba> for Paint {
    fn from(c: Rgba) -> Self {
        Paint::Solid(c)
    }
}

impl From<RadialGradient> for Paint {
    fn from(g: RadialGradient) -> Self {
        Paint::Radial(g)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pink() -> Rgb {
        Rgb::new(255, 200, 220)
    }

    #[test]
    fn test_gradient_stops_interpolate_alpha() {
        let g = RadialGradient::new(Vec2::new(0.0, 0.0), 10.0)
            .with_stop(0.0, pink().with_alpha(1.0))
            .with_stop(0.5, pink().with_alpha(0.4))
            .with_stop(1.0, pink().with_alpha(0.0));

        assert_eq!(g.color_at(Vec2::new(0.0, 0.0)).3, 1.0);
        assert!((g.color_at(Vec2::new(2.5, 0.0)).3 - 0.7).abs() < 1e-5);
        assert!((g.color_at(Vec2::new(0.0, 5.0)).3 - 0.4).abs() < 1e-5);
        assert!((g.color_at(Vec2::new(7.5, 0.0)).3 - 0.2).abs() < 1e-5);
        // Past the outer radius the last stop holds
        assert_eq!(g.color_at(Vec2::new(50.0, 0.0)).3, 0.0);
        let (r, gg, b, _) = g.color_at(Vec2::new(3.0, 4.0));
        assert_eq!((r, gg, b), (255.0, 200.0, 220.0));
    }

    #[test]
    fn test_empty_gradient_is_transparent() {
        let g = RadialGradient::new(Vec2::default(), 5.0);
        assert_eq!(g.color_at(Vec2::default()), (0.0, 0.0, 0.0, 0.0));
    }

    #[test]
    fn test_solid_paint() {
        let p: Paint = Rgba::new(255, 230, 180, 0.8).into();
        assert_eq!(p.color_at(Vec2::new(99.0, -1.0)), (255.0, 230.0, 180.0, 0.8));
    }
}
