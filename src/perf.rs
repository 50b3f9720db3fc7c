//! Performance tier
//!
//! Supplies petal pool size, whether the tree sways, and a frame-rate target.
//! Resolved once before the tree initializes.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::thread;

/// Machines reporting this many hardware threads or fewer are low end
const LOW_END_MAX_THREADS: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerfConfig {
    pub falling_petals_count: usize,
    pub enable_tree_sway: bool,
    pub target_fps: u32,
}

impl PerfConfig {
    pub fn low_end() -> Self {
        Self {
            falling_petals_count: 15,
            enable_tree_sway: false,
            target_fps: 30,
        }
    }

    /// Pick a tier from the host's available parallelism
    pub fn detect() -> Self {
        let threads = thread::available_parallelism().map_or(LOW_END_MAX_THREADS, |n| n.get());
        Self::for_threads(threads)
    }

    fn for_threads(threads: usize) -> Self {
        if threads <= LOW_END_MAX_THREADS {
            log::info!(
                "Low-end machine detected ({} threads), using reduced effects",
                threads
            );
            Self::low_end()
        } else {
            Self::default()
        }
    }

    pub fn is_low_end(&self) -> bool {
        self.target_fps <= 30 || !self.enable_tree_sway
    }

    /// Load from a JSON file; missing fields take defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

impl Default for PerfConfig {
    fn default() -> Self {
        Self {
            falling_petals_count: 30,
            enable_tree_sway: true,
            target_fps: 60,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_tier() {
        let cfg = PerfConfig::default();
        assert_eq!(cfg.falling_petals_count, 30);
        assert!(cfg.enable_tree_sway);
        assert!(!cfg.is_low_end());
    }

    #[test]
    fn test_thread_count_selects_tier() {
        assert_eq!(PerfConfig::for_threads(2), PerfConfig::low_end());
        assert_eq!(PerfConfig::for_threads(8), PerfConfig::default());
        assert!(PerfConfig::low_end().is_low_end());
    }

    #[test]
    fn test_load_partial_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"falling_petals_count": 5}}"#).unwrap();
        let cfg = PerfConfig::load(file.path()).unwrap();
        assert_eq!(cfg.falling_petals_count, 5);
        assert!(cfg.enable_tree_sway);
        assert_eq!(cfg.target_fps, 60);
    }

    #[test]
    fn test_load_missing_file_is_error() {
        assert!(PerfConfig::load("/nonexistent/perf.json").is_err());
    }
}
