use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Per-generation length multiplier, drawn uniformly from `[min, min + spread)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecayRange {
    pub min: f64,
    pub spread: f64,
}

/// Shape parameters of the generated tree.
///
/// Coordinates are in a fixed base space (`base_width` x `base_height`);
/// the raster cache scales them to the actual surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Seed for the shape PRNG; same seed, same tree
    pub seed: u64,
    pub base_width: f64,
    pub base_height: f64,
    /// Uniform-width segments approximating the tapered trunk
    pub trunk_segments: usize,
    /// Branches deeper than this are never created
    pub max_depth: u32,
    /// Branches at or below this depth do not fork
    pub fork_depth: u32,
    /// Branches shorter than this are never created
    pub min_branch_length: f64,
    /// Chance that a flowering branch actually carries flowers
    pub flower_probability: f64,
    /// Flowers per branch, indexed by depth; last entry repeats, 0 = none
    pub flower_count_by_depth: Vec<usize>,
    pub branch_length_decay: DecayRange,
    pub branch_width_decay: f64,
}

impl TreeConfig {
    pub fn flower_count(&self, depth: u32) -> usize {
        self.flower_count_by_depth
            .get(depth as usize)
            .or_else(|| self.flower_count_by_depth.last())
            .copied()
            .unwrap_or(0)
    }

    /// Load from a JSON file; missing fields take defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Save to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            seed: 12345,
            base_width: 800.0,
            base_height: 600.0,
            trunk_segments: 12,
            max_depth: 9,
            fork_depth: 8,
            min_branch_length: 6.0,
            flower_probability: 0.85,
            flower_count_by_depth: vec![0, 0, 0, 0, 2, 2, 3, 4, 4, 4],
            branch_length_decay: DecayRange {
                min: 0.65,
                spread: 0.15,
            },
            branch_width_decay: 0.7,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flower_count_by_depth() {
        let cfg = TreeConfig::default();
        assert_eq!(cfg.flower_count(0), 0);
        assert_eq!(cfg.flower_count(3), 0);
        assert_eq!(cfg.flower_count(4), 2);
        assert_eq!(cfg.flower_count(5), 2);
        assert_eq!(cfg.flower_count(6), 3);
        assert_eq!(cfg.flower_count(7), 4);
        assert_eq!(cfg.flower_count(40), 4);

        let empty = TreeConfig {
            flower_count_by_depth: Vec::new(),
            ..TreeConfig::default()
        };
        assert_eq!(empty.flower_count(5), 0);
    }

    #[test]
    fn test_save_load_keeps_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tree.json");
        let cfg = TreeConfig {
            seed: 99,
            max_depth: 6,
            ..TreeConfig::default()
        };
        cfg.save(&path).unwrap();
        assert_eq!(TreeConfig::load(&path).unwrap(), cfg);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let cfg: TreeConfig = serde_json::from_str(r#"{"seed": 7}"#).unwrap();
        assert_eq!(cfg.seed, 7);
        assert_eq!(cfg.trunk_segments, 12);
        assert_eq!(cfg.branch_width_decay, 0.7);
    }
}
