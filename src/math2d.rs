//! 2D Math Utilities
//!
//! Vector and affine transform types backing the canvas context.

use std::ops::{Add, Mul, Sub};

/// 2D Vector (for screen coordinates)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    #[inline]
    pub fn dot(&self, other: &Self) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// Approximate equality check for floating point comparison
    #[inline]
    pub fn approx_eq(&self, other: &Self, epsilon: f32) -> bool {
        (self.x - other.x).abs() < epsilon && (self.y - other.y).abs() < epsilon
    }
}

impl Add for Vec2 {
    type Output = Self;
    #[inline]
    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

impl Sub for Vec2 {
    type Output = Self;
    #[inline]
    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }
}

impl Mul<f32> for Vec2 {
    type Output = Self;
    #[inline]
    fn mul(self, scalar: f32) -> Self {
        Self {
            x: self.x * scalar,
            y: self.y * scalar,
        }
    }
}

/// 2D affine transform in canvas matrix order:
///
/// ```text
/// x' = a*x + c*y + e
/// y' = b*x + d*y + f
/// ```
///
/// `then_*` methods post-multiply, so they behave like successive calls on a
/// canvas context: the last call applies to points first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    /// `self * other`: apply `other` first, then `self`
    pub fn multiply(&self, other: &Self) -> Self {
        Self {
            a: self.a * other.a + self.c * other.b,
            b: self.b * other.a + self.d * other.b,
            c: self.a * other.c + self.c * other.d,
            d: self.b * other.c + self.d * other.d,
            e: self.a * other.e + self.c * other.f + self.e,
            f: self.b * other.e + self.d * other.f + self.f,
        }
    }

    pub fn then_translate(&self, tx: f32, ty: f32) -> Self {
        self.multiply(&Self {
            e: tx,
            f: ty,
            ..Self::IDENTITY
        })
    }

    pub fn then_rotate(&self, angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        self.multiply(&Self {
            a: c,
            b: s,
            c: -s,
            d: c,
            e: 0.0,
            f: 0.0,
        })
    }

    pub fn then_scale(&self, sx: f32, sy: f32) -> Self {
        self.multiply(&Self {
            a: sx,
            d: sy,
            ..Self::IDENTITY
        })
    }

    #[inline]
    pub fn apply(&self, p: Vec2) -> Vec2 {
        Vec2::new(
            self.a * p.x + self.c * p.y + self.e,
            self.b * p.x + self.d * p.y + self.f,
        )
    }

    /// Inverse transform, or None when the matrix is singular
    pub fn invert(&self) -> Option<Self> {
        let det = self.a * self.d - self.b * self.c;
        if det.abs() < 1e-12 {
            return None;
        }
        let inv = 1.0 / det;
        Some(Self {
            a: self.d * inv,
            b: -self.b * inv,
            c: -self.c * inv,
            d: self.a * inv,
            e: (self.c * self.f - self.d * self.e) * inv,
            f: (self.b * self.e - self.a * self.f) * inv,
        })
    }

    /// Average linear scale factor, for sizing anti-aliased rims
    pub fn mean_scale(&self) -> f32 {
        let det = (self.a * self.d - self.b * self.c).abs();
        det.sqrt()
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_translate_then_rotate_matches_canvas_order() {
        // translate(10, 0) then rotate(90deg): a local (1, 0) lands at (10, 1)
        let t = Transform::IDENTITY.then_translate(10.0, 0.0).then_rotate(FRAC_PI_2);
        let p = t.apply(Vec2::new(1.0, 0.0));
        assert!(p.approx_eq(&Vec2::new(10.0, 1.0), 1e-5), "{:?}", p);
    }

    #[test]
    fn test_invert_round_trip() {
        let t = Transform::IDENTITY
            .then_translate(40.0, -7.0)
            .then_rotate(0.3)
            .then_scale(2.0, 0.5);
        let inv = t.invert().unwrap();
        let p = Vec2::new(3.5, -12.0);
        assert!(inv.apply(t.apply(p)).approx_eq(&p, 1e-4));
    }

    #[test]
    fn test_singular_has_no_inverse() {
        let t = Transform::IDENTITY.then_scale(0.0, 1.0);
        assert!(t.invert().is_none());
    }

    #[test]
    fn test_mean_scale() {
        let t = Transform::IDENTITY.then_scale(2.0, 8.0).then_rotate(1.0);
        assert!((t.mean_scale() - 4.0).abs() < 1e-4);
    }

    #[test]
    fn test_vec2_ops() {
        let a = Vec2::new(3.0, 4.0);
        assert_eq!(a.length(), 5.0);
        assert_eq!((a - Vec2::new(1.0, 1.0)).dot(&Vec2::new(1.0, 0.0)), 2.0);
        assert_eq!(a * 2.0 + a, Vec2::new(9.0, 12.0));
    }
}
