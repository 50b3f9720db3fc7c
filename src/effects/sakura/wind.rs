//! Breeze model shared by the petals and the tree sway

/// Time advance per 60 Hz frame
const TIME_STEP: f64 = 0.01;
/// Peak sway rotation of the whole tree, in radians
const SWAY_AMPLITUDE: f64 = 0.003;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Wind {
    /// Must stay f64: an f32 clock stalls near 2^18
    time: f64,
}

impl Wind {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    /// Advance by a (possibly fractional) number of frames
    pub fn advance(&mut self, frames: f32) {
        self.time += TIME_STEP * f64::from(frames.max(0.0));
    }

    /// Two incommensurate sines, so the gusts never quite repeat
    pub fn strength(&self) -> f32 {
        (self.time.sin() * 0.8 + (self.time * 2.3).sin() * 0.4) as f32
    }

    /// Sub-degree rotation applied to the cached tree
    pub fn sway_angle(&self) -> f32 {
        ((self.time * 0.5).sin() * SWAY_AMPLITUDE) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calm_at_start() {
        let wind = Wind::new();
        assert_eq!(wind.strength(), 0.0);
        assert_eq!(wind.sway_angle(), 0.0);
    }

    #[test]
    fn test_advance_per_frame() {
        let mut wind = Wind::new();
        for _ in 0..100 {
            wind.advance(1.0);
        }
        assert!((wind.time() - 1.0).abs() < 1e-4);
        let expected = (1.0f64.sin() * 0.8 + 2.3f64.sin() * 0.4) as f32;
        assert!((wind.strength() - expected).abs() < 1e-4);

        wind.advance(-5.0);
        assert!((wind.time() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_bounds() {
        let mut wind = Wind::new();
        for _ in 0..5000 {
            wind.advance(1.0);
            assert!(wind.strength().abs() <= 1.2 + 1e-5);
            assert!(wind.sway_angle().abs() <= SWAY_AMPLITUDE as f32 + 1e-7);
        }
    }

    #[test]
    fn test_clock_keeps_moving_after_days() {
        let mut wind = Wind::new();
        // Five days at 60 Hz
        let frames = 60 * 60 * 60 * 24 * 5;
        for _ in 0..frames {
            wind.advance(1.0);
        }
        assert!((wind.time() - 259_200.0).abs() < 1.0);

        let before = wind.time();
        let strength = wind.strength();
        wind.advance(1.0);
        assert!((wind.time() - before - 0.01).abs() < 1e-6);
        assert_ne!(wind.strength(), strength);
    }
}
