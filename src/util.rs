//! Shared utilities

use std::collections::VecDeque;
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

// ============================================================================
// Random Sources
// ============================================================================

/// Anything that can hand out uniform values in [0, 1)
///
/// The tree generator and the petal pool are generic over this so tests can
/// feed them a fixed sequence.
pub trait RandomSource {
    fn next_f64(&mut self) -> f64;

    /// Uniform value in [min, max)
    #[inline]
    fn range_f64(&mut self, min: f64, max: f64) -> f64 {
        min + self.next_f64() * (max - min)
    }
}

const LCG_MULTIPLIER: u64 = 9301;
const LCG_INCREMENT: u64 = 49297;
const LCG_MODULUS: u64 = 233_280;

/// Linear congruential generator that drives tree shape
///
/// `seed = (seed * 9301 + 49297) mod 233280`, output `seed / 233280`.
/// Integer arithmetic keeps the stream exact across platforms.
#[derive(Debug, Clone)]
pub struct SeededRandom {
    initial: u64,
    state: u64,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        // Reducing first keeps the multiply in range; the stream is unchanged
        Self {
            initial: seed,
            state: seed % LCG_MODULUS,
        }
    }

    /// Rewind to the initial seed so the next generation is identical
    pub fn reseed(&mut self) {
        self.state = self.initial % LCG_MODULUS;
    }

    pub fn seed(&self) -> u64 {
        self.initial
    }
}

impl RandomSource for SeededRandom {
    #[inline]
    fn next_f64(&mut self) -> f64 {
        self.state = (self.state * LCG_MULTIPLIER + LCG_INCREMENT) % LCG_MODULUS;
        self.state as f64 / LCG_MODULUS as f64
    }
}

/// Simple RNG using xorshift64
/// Used where exact reproducibility does not matter (falling petals)
pub struct Rng {
    state: u64,
}

impl Rng {
    /// Create a new RNG with the given seed
    pub fn new(seed: u64) -> Self {
        Self { state: seed.max(1) } // Ensure non-zero
    }

    /// Seed from the wall clock
    pub fn from_time() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0x5A4C_0DE5);
        Self::new(nanos ^ 0x9E37_79B9_7F4A_7C15)
    }

    /// Get the next random u64
    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 7;
        self.state ^= self.state << 17;
        self.state
    }
}

impl RandomSource for Rng {
    #[inline]
    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }
}

// ============================================================================
// FPS Counter
// ============================================================================

/// FPS counter with rolling average
pub struct FpsCounter {
    frame_times: VecDeque<f32>,
    last_frame: Instant,
    sample_count: usize,
}

impl FpsCounter {
    /// Create a new FPS counter with specified sample window
    pub fn new(sample_count: usize) -> Self {
        Self {
            frame_times: VecDeque::with_capacity(sample_count),
            last_frame: Instant::now(),
            sample_count,
        }
    }

    /// Call at the start of each frame to record timing
    /// Returns (delta_time, average_fps)
    pub fn tick(&mut self) -> (f32, f32) {
        let now = Instant::now();
        let dt = (now - self.last_frame).as_secs_f32();
        self.last_frame = now;
        self.record(dt)
    }

    fn record(&mut self, dt: f32) -> (f32, f32) {
        self.frame_times.push_back(dt);
        if self.frame_times.len() > self.sample_count {
            self.frame_times.pop_front();
        }

        let avg_dt = self.avg_frame_time();
        let avg_fps = if avg_dt > 0.0 { 1.0 / avg_dt } else { 0.0 };
        (dt, avg_fps)
    }

    fn avg_frame_time(&self) -> f32 {
        self.frame_times.iter().sum::<f32>() / self.frame_times.len().max(1) as f32
    }

    /// Get the average frame time in milliseconds
    pub fn avg_frame_time_ms(&self) -> f32 {
        self.avg_frame_time() * 1000.0
    }

    /// Get min/max FPS from sample window
    pub fn min_max_fps(&self) -> (f32, f32) {
        if self.frame_times.is_empty() {
            return (0.0, 0.0);
        }
        let min_dt = self
            .frame_times
            .iter()
            .cloned()
            .fold(f32::INFINITY, f32::min);
        let max_dt = self.frame_times.iter().cloned().fold(0.0, f32::max);
        let max_fps = if min_dt > 0.0 { 1.0 / min_dt } else { 0.0 };
        let min_fps = if max_dt > 0.0 { 1.0 / max_dt } else { 0.0 };
        (min_fps, max_fps)
    }
}

// ============================================================================
// Frame Limiter
// ============================================================================

/// Sleep-based frame cap for the low-end tier and uncapped (no vsync) runs
pub struct FrameLimiter {
    frame_budget: Duration,
    frame_start: Instant,
}

impl FrameLimiter {
    pub fn new(target_fps: u32) -> Self {
        Self {
            frame_budget: Self::budget_for(target_fps),
            frame_start: Instant::now(),
        }
    }

    fn budget_for(target_fps: u32) -> Duration {
        Duration::from_secs_f64(1.0 / target_fps.max(1) as f64)
    }

    /// Time left in the current frame's budget
    pub fn remaining(&self) -> Duration {
        self.frame_budget.saturating_sub(self.frame_start.elapsed())
    }

    /// Block until the frame budget is spent, then start the next frame
    pub fn wait(&mut self) {
        let remaining = self.remaining();
        if !remaining.is_zero() {
            thread::sleep(remaining);
        }
        self.frame_start = Instant::now();
    }
}
