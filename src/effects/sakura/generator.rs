//! Procedural blossom tree
//!
//! A tapered trunk, a vertical leader and a handful of major limbs, each
//! grown recursively into forks. Flowers are scattered along the thinner
//! branches and tagged with a depth layer (background, middle, foreground)
//! that later picks a sharper or softer sprite.
//!
//! Generation only ever appends; unlucky draws just give a sparser or denser
//! crown. The order of random draws is part of the contract: a given seed
//! always yields the same tree.

use super::config::TreeConfig;
use crate::theme::PALETTE_SIZE;
use crate::util::{RandomSource, SeededRandom};
use std::f64::consts::{FRAC_PI_2, PI, TAU};

/// Trunk runs from the base to this fraction of the base height
const TRUNK_HEIGHT_RATIO: f64 = 0.35;
/// Horizontal lean of the trunk top, in base units
const TRUNK_LEAN: f64 = 8.0;
const TRUNK_BASE_WIDTH: f64 = 70.0;
const TRUNK_TOP_WIDTH: f64 = 45.0;

const LEADER_LENGTH_RATIO: f64 = 0.15;
const LEADER_WIDTH: f64 = 32.0;
const MAJOR_BRANCH_WIDTH: f64 = 35.0;
const UPPER_BRANCH_WIDTH: f64 = 28.0;
const UPPER_BRANCH_LENGTH_RATIO: f64 = 0.18;

/// Forks shallower than this always split in two, wide
const SHALLOW_FORK_DEPTH: u32 = 2;
/// Forks shallower than this (and not shallow) split in two or three
const MIDDLE_FORK_DEPTH: u32 = 5;

/// Layer sample thresholds: below is background, above is foreground
const BACKGROUND_BELOW: f64 = 0.3;
const FOREGROUND_ABOVE: f64 = 0.7;

/// Straight branch segment in base coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Branch {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub width: f64,
    /// 0 for trunk segments, 1 for limbs leaving the trunk
    pub depth: u32,
}

impl Branch {
    pub fn length(&self) -> f64 {
        (self.x2 - self.x1).hypot(self.y2 - self.y1)
    }
}

/// Fake depth-of-field layer; ordered back to front
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FlowerLayer {
    Background,
    Middle,
    Foreground,
}

impl FlowerLayer {
    pub const ALL: [FlowerLayer; 3] = [
        FlowerLayer::Background,
        FlowerLayer::Middle,
        FlowerLayer::Foreground,
    ];

    /// Classify a uniform sample: ~30% background, ~40% middle, ~30% foreground
    pub fn from_sample(v: f64) -> Self {
        if v < BACKGROUND_BELOW {
            FlowerLayer::Background
        } else if v > FOREGROUND_ABOVE {
            FlowerLayer::Foreground
        } else {
            FlowerLayer::Middle
        }
    }

    #[inline]
    pub fn index(&self) -> usize {
        *self as usize
    }
}

/// Single blossom sprite placed on the tree
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowerCluster {
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub rotation: f64,
    /// Palette color 0..4
    pub pattern_index: usize,
    pub opacity: f64,
    pub layer: FlowerLayer,
}

/// Generator output
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tree {
    pub branches: Vec<Branch>,
    pub flowers: Vec<FlowerCluster>,
}

impl Tree {
    /// Generate from the config's own seed
    pub fn generate(config: &TreeConfig) -> Self {
        let mut rng = SeededRandom::new(config.seed);
        Self::generate_with(config, &mut rng)
    }

    /// Generate drawing from an arbitrary random source
    pub fn generate_with<R: RandomSource>(config: &TreeConfig, rng: &mut R) -> Self {
        let mut generator = TreeGenerator {
            config,
            rng,
            tree: Tree::default(),
        };
        generator.grow_tree();
        let tree = generator.tree;
        log::debug!(
            "Generated tree: {} branches, {} flowers (seed {})",
            tree.branches.len(),
            tree.flowers.len(),
            config.seed
        );
        tree
    }

    /// Flowers in paint order: background, then middle, then foreground.
    /// Generation order is kept within a layer.
    pub fn flowers_back_to_front(&self) -> Vec<&FlowerCluster> {
        let mut sorted: Vec<&FlowerCluster> = self.flowers.iter().collect();
        sorted.sort_by_key(|f| f.layer);
        sorted
    }

    pub fn branch_count_by_depth(&self) -> Vec<usize> {
        let mut counts = Vec::new();
        for b in &self.branches {
            let d = b.depth as usize;
            if counts.len() <= d {
                counts.resize(d + 1, 0);
            }
            counts[d] += 1;
        }
        counts
    }

    pub fn flower_count_by_layer(&self) -> [usize; 3] {
        let mut counts = [0; 3];
        for f in &self.flowers {
            counts[f.layer.index()] += 1;
        }
        counts
    }
}

struct TreeGenerator<'a, R: RandomSource> {
    config: &'a TreeConfig,
    rng: &'a mut R,
    tree: Tree,
}

impl<R: RandomSource> TreeGenerator<'_, R> {
    #[inline]
    fn random(&mut self) -> f64 {
        self.rng.next_f64()
    }

    fn grow_tree(&mut self) {
        let base_h = self.config.base_height;
        let start_x = self.config.base_width / 2.0;
        let start_y = base_h;
        let trunk_height = base_h * TRUNK_HEIGHT_RATIO;
        let top_x = start_x - TRUNK_LEAN;
        let top_y = start_y - trunk_height;

        self.taper_trunk(start_x, start_y, top_x, top_y);

        // Leader straight up from the trunk top
        self.grow_branch(
            top_x,
            top_y,
            -FRAC_PI_2,
            base_h * LEADER_LENGTH_RATIO,
            LEADER_WIDTH,
            1,
        );

        // 3-4 major limbs, alternating sides, climbing the trunk
        let major_count = 3 + (self.random() * 2.0) as usize;
        for i in 0..major_count {
            let height_ratio = 0.3 + i as f64 * 0.15 + self.random() * 0.1;
            let y = start_y - trunk_height * height_ratio;
            let x = start_x - TRUNK_LEAN * height_ratio;
            let side = if i % 2 == 0 { -1.0 } else { 1.0 };
            let angle = -FRAC_PI_2 + side * (0.4 + self.random() * 0.3);
            let length = base_h * (0.26 + self.random() * 0.1);
            self.grow_branch(x, y, angle, length, MAJOR_BRANCH_WIDTH, 1);
        }

        // Two smaller limbs filling the upper crown
        for i in 0..2 {
            let height_ratio = 0.6 + i as f64 * 0.15;
            let y = start_y - trunk_height * height_ratio;
            let x = start_x - TRUNK_LEAN * height_ratio;
            let side = if i % 2 == 0 { 1.0 } else { -1.0 };
            let angle = -FRAC_PI_2 + side * (0.25 + self.random() * 0.2);
            let length = base_h * UPPER_BRANCH_LENGTH_RATIO;
            self.grow_branch(x, y, angle, length, UPPER_BRANCH_WIDTH, 1);
        }
    }

    /// Uniform-width segments stepping from the base width to the top width
    fn taper_trunk(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) {
        let steps = self.config.trunk_segments;
        for i in 0..steps {
            let t1 = i as f64 / steps as f64;
            let t2 = (i + 1) as f64 / steps as f64;
            self.tree.branches.push(Branch {
                x1: x1 + (x2 - x1) * t1,
                y1: y1 + (y2 - y1) * t1,
                x2: x1 + (x2 - x1) * t2,
                y2: y1 + (y2 - y1) * t2,
                width: TRUNK_BASE_WIDTH + (TRUNK_TOP_WIDTH - TRUNK_BASE_WIDTH) * t1,
                depth: 0,
            });
        }
    }

    fn grow_branch(&mut self, x: f64, y: f64, angle: f64, length: f64, width: f64, depth: u32) {
        if depth > self.config.max_depth || length < self.config.min_branch_length {
            return;
        }

        let end_x = x + angle.cos() * length;
        let end_y = y + angle.sin() * length;
        self.tree.branches.push(Branch {
            x1: x,
            y1: y,
            x2: end_x,
            y2: end_y,
            width,
            depth,
        });

        let flower_count = self.config.flower_count(depth);
        if flower_count > 0 && self.random() < self.config.flower_probability {
            for f in 0..flower_count {
                self.place_flower(x, y, end_x, end_y, angle, length, f, flower_count);
            }
        }

        if depth >= self.config.fork_depth {
            return;
        }

        let fork_count = if depth < SHALLOW_FORK_DEPTH {
            2
        } else if depth < MIDDLE_FORK_DEPTH {
            if self.random() > 0.5 {
                2
            } else {
                3
            }
        } else {
            2
        };

        let decay = self.config.branch_length_decay;
        for i in 0..fork_count {
            let angle_offset = if fork_count == 2 {
                let side = if i == 0 { -1.0 } else { 1.0 };
                side * (0.4 + self.random() * 0.3)
            } else {
                (i as f64 - 1.0) * (0.45 + self.random() * 0.2)
            };
            let child_length = length * (decay.min + self.random() * decay.spread);
            let child_width = width * self.config.branch_width_decay;
            self.grow_branch(
                end_x,
                end_y,
                angle + angle_offset,
                child_length,
                child_width,
                depth + 1,
            );
        }
    }

    /// Flower `index` of `count`, spread evenly along the branch with jitter,
    /// pushed a little off the branch line
    fn place_flower(
        &mut self,
        x: f64,
        y: f64,
        end_x: f64,
        end_y: f64,
        angle: f64,
        length: f64,
        index: usize,
        count: usize,
    ) {
        let t = (index as f64 + 0.5) / count as f64 + (self.random() - 0.5) * 0.2;
        let fx = x + (end_x - x) * t;
        let fy = y + (end_y - y) * t;

        let offset_ratio = 0.08 + self.random() * 0.12;
        let offset_angle = angle + FRAC_PI_2 + (self.random() - 0.5) * PI * 0.6;
        let offset_dist = length * offset_ratio;

        let layer = FlowerLayer::from_sample(self.random());
        let size = match layer {
            FlowerLayer::Foreground => 10.0 + self.random() * 6.0,
            FlowerLayer::Background => 6.0 + self.random() * 4.0,
            FlowerLayer::Middle => 8.0 + self.random() * 4.0,
        };
        let rotation = self.random() * TAU;
        let pattern_index = ((self.random() * PALETTE_SIZE as f64) as usize).min(PALETTE_SIZE - 1);
        let opacity = match layer {
            FlowerLayer::Foreground => 0.9,
            FlowerLayer::Background => 0.4 + self.random() * 0.2,
            FlowerLayer::Middle => 0.65 + self.random() * 0.2,
        };

        self.tree.flowers.push(FlowerCluster {
            x: fx + offset_angle.cos() * offset_dist,
            y: fy + offset_angle.sin() * offset_dist,
            size,
            rotation,
            pattern_index,
            opacity,
            layer,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Always returns the same value
    struct Constant(f64);

    impl RandomSource for Constant {
        fn next_f64(&mut self) -> f64 {
            self.0
        }
    }

    /// Replays a fixed sequence, cycling
    struct Sequence {
        values: Vec<f64>,
        pos: usize,
    }

    impl RandomSource for Sequence {
        fn next_f64(&mut self) -> f64 {
            let v = self.values[self.pos % self.values.len()];
            self.pos += 1;
            v
        }
    }

    fn depth_hash(tree: &Tree) -> u64 {
        tree.branches
            .iter()
            .fold(0u64, |h, b| (h * 31 + b.depth as u64) % 1_000_000_007)
    }

    #[test]
    fn test_generation_is_deterministic() {
        let cfg = TreeConfig::default();
        let a = Tree::generate(&cfg);
        let b = Tree::generate(&cfg);
        assert_eq!(a, b);

        let mut rng = SeededRandom::new(cfg.seed);
        let c = Tree::generate_with(&cfg, &mut rng);
        rng.reseed();
        let d = Tree::generate_with(&cfg, &mut rng);
        assert_eq!(c, d);
        assert_eq!(a, c);
    }

    #[test]
    fn test_golden_tree_for_default_seed() {
        let tree = Tree::generate(&TreeConfig::default());
        assert_eq!(tree.branches.len(), 3145);
        assert_eq!(
            tree.branch_count_by_depth(),
            vec![12, 6, 12, 30, 79, 201, 402, 804, 1599]
        );
        assert_eq!(depth_hash(&tree), 327_761_927);
        assert_eq!(tree.flowers.len(), 9706);
        assert_eq!(tree.flower_count_by_layer(), [2979, 3820, 2907]);

        let mut patterns = [0usize; PALETTE_SIZE];
        for f in &tree.flowers {
            patterns[f.pattern_index] += 1;
        }
        assert_eq!(patterns, [2491, 2361, 2456, 2398]);
    }

    #[test]
    fn test_trunk_always_has_twelve_segments() {
        for seed in [1, 12345, 987_654, 42_424_242] {
            let cfg = TreeConfig {
                seed,
                ..TreeConfig::default()
            };
            let tree = Tree::generate(&cfg);
            let trunk: Vec<&Branch> = tree.branches.iter().filter(|b| b.depth == 0).collect();
            assert_eq!(trunk.len(), 12, "seed {}", seed);
            // Trunk comes first and tapers monotonically
            assert!(tree.branches[..12].iter().all(|b| b.depth == 0));
            assert_eq!(trunk[0].width, 70.0);
            assert!(trunk.windows(2).all(|w| w[1].width < w[0].width));
            // Segments chain end to start
            assert!(trunk
                .windows(2)
                .all(|w| (w[0].x2 - w[1].x1).abs() < 1e-9 && (w[0].y2 - w[1].y1).abs() < 1e-9));
        }
    }

    #[test]
    fn test_trunk_base_at_bottom_center() {
        let tree = Tree::generate(&TreeConfig::default());
        let base = tree.branches[0];
        assert_eq!((base.x1, base.y1), (400.0, 600.0));
        let top = tree.branches[11];
        assert!((top.x2 - 392.0).abs() < 1e-9);
        assert!((top.y2 - 390.0).abs() < 1e-9);
    }

    #[test]
    fn test_leader_grows_straight_up_from_trunk_top() {
        let tree = Tree::generate(&TreeConfig::default());
        let leader = tree.branches[12];
        assert_eq!(leader.depth, 1);
        assert_eq!(leader.width, 32.0);
        assert!((leader.x1 - 392.0).abs() < 1e-9 && (leader.y1 - 390.0).abs() < 1e-9);
        assert!((leader.x2 - 392.0).abs() < 1e-9 && (leader.y2 - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_branches_respect_termination_bounds() {
        for seed in [3, 12345, 55_555] {
            let cfg = TreeConfig {
                seed,
                ..TreeConfig::default()
            };
            let tree = Tree::generate(&cfg);
            for b in tree.branches.iter().filter(|b| b.depth > 0) {
                assert!(b.depth <= cfg.max_depth);
                assert!(b.length() >= cfg.min_branch_length - 1e-9);
            }
            // At least 3 major limbs plus leader and upper limbs leave the trunk
            assert!(tree.branch_count_by_depth()[1] >= 6);
        }
    }

    #[test]
    fn test_width_decays_by_fixed_factor() {
        let tree = Tree::generate(&TreeConfig::default());
        let allowed = [32.0, 35.0, 28.0];
        for b in tree.branches.iter().filter(|b| b.depth > 0) {
            let root = b.width / 0.7f64.powi(b.depth as i32 - 1);
            assert!(
                allowed.iter().any(|w| (root - w).abs() < 1e-6),
                "width {} at depth {}",
                b.width,
                b.depth
            );
        }
    }

    #[test]
    fn test_layer_thresholds() {
        assert_eq!(FlowerLayer::from_sample(0.0), FlowerLayer::Background);
        assert_eq!(FlowerLayer::from_sample(0.2999), FlowerLayer::Background);
        assert_eq!(FlowerLayer::from_sample(0.3), FlowerLayer::Middle);
        assert_eq!(FlowerLayer::from_sample(0.7), FlowerLayer::Middle);
        assert_eq!(FlowerLayer::from_sample(0.7001), FlowerLayer::Foreground);
        assert!(FlowerLayer::Background < FlowerLayer::Middle);
        assert!(FlowerLayer::Middle < FlowerLayer::Foreground);
    }

    #[test]
    fn test_mocked_random_fixes_every_layer() {
        let cfg = TreeConfig::default();
        for (value, layer, opacity) in [
            (0.1, FlowerLayer::Background, 0.4 + 0.1 * 0.2),
            (0.5, FlowerLayer::Middle, 0.65 + 0.5 * 0.2),
            (0.8, FlowerLayer::Foreground, 0.9),
        ] {
            let tree = Tree::generate_with(&cfg, &mut Constant(value));
            assert!(!tree.flowers.is_empty());
            for f in &tree.flowers {
                assert_eq!(f.layer, layer);
                assert!((f.opacity - opacity).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_flower_probability_gate() {
        // 0.9 is above the 85% gate: no branch carries flowers
        let tree = Tree::generate_with(&TreeConfig::default(), &mut Constant(0.9));
        assert!(tree.flowers.is_empty());
        assert!(tree.branches.len() > 12);
    }

    #[test]
    fn test_mocked_sequence_layer_and_size() {
        // Draws for one flower: t, offset ratio, offset angle, layer, size, ...
        let mut rng = Sequence {
            values: vec![0.5, 0.5, 0.5, 0.75, 0.5, 0.0, 0.99, 0.5],
            pos: 0,
        };
        let tree = Tree::generate_with(&TreeConfig::default(), &mut rng);
        assert!(tree.flowers.iter().all(|f| f.size >= 6.0 && f.size < 16.0));
        assert!(tree.flowers.iter().all(|f| f.pattern_index < PALETTE_SIZE));
    }

    #[test]
    fn test_layer_controls_size_and_opacity() {
        let tree = Tree::generate(&TreeConfig::default());
        for f in &tree.flowers {
            match f.layer {
                FlowerLayer::Foreground => {
                    assert!((10.0..16.0).contains(&f.size));
                    assert_eq!(f.opacity, 0.9);
                },
                FlowerLayer::Middle => {
                    assert!((8.0..12.0).contains(&f.size));
                    assert!((0.65..0.85).contains(&f.opacity));
                },
                FlowerLayer::Background => {
                    assert!((6.0..10.0).contains(&f.size));
                    assert!((0.4..0.6).contains(&f.opacity));
                },
            }
        }
    }

    #[test]
    fn test_flowers_only_on_thin_branches() {
        let cfg = TreeConfig {
            flower_count_by_depth: vec![0, 0, 0, 0, 0, 0, 0, 0, 1],
            ..TreeConfig::default()
        };
        let tree = Tree::generate(&cfg);
        let deepest = tree.branch_count_by_depth()[8];
        assert!(!tree.flowers.is_empty());
        assert!(tree.flowers.len() <= deepest);
    }

    #[test]
    fn test_back_to_front_order_is_stable() {
        let tree = Tree::generate(&TreeConfig::default());
        let sorted = tree.flowers_back_to_front();
        assert_eq!(sorted.len(), tree.flowers.len());
        assert!(sorted.windows(2).all(|w| w[0].layer <= w[1].layer));
        let first_bg = tree
            .flowers
            .iter()
            .find(|f| f.layer == FlowerLayer::Background)
            .unwrap();
        assert_eq!(sorted[0], first_bg);
    }

    #[test]
    fn test_degenerate_config_only_trunk() {
        let cfg = TreeConfig {
            min_branch_length: 10_000.0,
            ..TreeConfig::default()
        };
        let tree = Tree::generate(&cfg);
        assert_eq!(tree.branches.len(), 12);
        assert!(tree.flowers.is_empty());
    }
}
