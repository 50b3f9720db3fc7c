//! Blossom tree effect
//!
//! Owns the whole pipeline: the seeded generator feeds the static raster
//! cache, and each frame composites that cache (optionally swaying in the
//! wind) under a live pool of falling petals.
//!
//! The cache is rebuilt on exactly two triggers, a surface size change and a
//! theme change, and always before the next frame reads it.

mod cache;
mod config;
mod generator;
mod petals;
mod sprites;
mod wind;

pub use cache::{bark_color, TreeCache};
pub use config::{DecayRange, TreeConfig};
pub use generator::{Branch, FlowerCluster, FlowerLayer, Tree};
pub use petals::{FallingPetal, PetalPool, EDGE_MARGIN};
pub use sprites::FlowerSprites;
pub use wind::Wind;

use super::Effect;
use crate::display::{Canvas, PixelBuffer, SurfaceHost};
use crate::perf::PerfConfig;
use crate::theme::{Palette, Theme, ThemeChange, ThemeProvider, ThemeSubscription};
use crate::util::SeededRandom;

/// Petal and wind motion is tuned per 60 Hz frame
const FRAMES_PER_SECOND: f32 = 60.0;
/// Longest step taken in one tick, in frames
const MAX_FRAME_STEP: f32 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    /// Built and cached, no frame run yet
    Idle,
    Running,
    /// Stopped for good; no further frames are requested
    Stopped,
}

pub struct SakuraTree {
    config: TreeConfig,
    perf: PerfConfig,
    rng: SeededRandom,
    theme: Theme,
    palette: Palette,
    subscription: Option<ThemeSubscription>,

    sprites: FlowerSprites,
    tree: Tree,
    cache: TreeCache,
    petals: PetalPool,
    wind: Wind,

    width: u32,
    height: u32,
    state: DriverState,
}

impl SakuraTree {
    /// Build for a `width` x `height` surface: sprites, tree, cache and petals
    pub fn new(width: u32, height: u32, config: TreeConfig, perf: PerfConfig, theme: Theme) -> Self {
        let palette = theme.palette();
        let sprites = FlowerSprites::build(&palette);
        let petals = PetalPool::new(perf.falling_petals_count, width, height);
        let mut tree = Self {
            rng: SeededRandom::new(config.seed),
            config,
            perf,
            theme,
            palette,
            subscription: None,
            sprites,
            tree: Tree::default(),
            cache: TreeCache::new(),
            petals,
            wind: Wind::new(),
            width,
            height,
            state: DriverState::Idle,
        };
        tree.rebuild();
        log::info!(
            "Sakura tree ready: {}x{}, {} branches, {} flowers, {} petals",
            width,
            height,
            tree.tree.branches.len(),
            tree.tree.flowers.len(),
            tree.petals.len()
        );
        tree
    }

    /// Bind to the surface `canvas_id` of `host` and follow the provider's
    /// theme. A missing surface is not an error: nothing is built.
    pub fn attach(
        host: &impl SurfaceHost,
        canvas_id: &str,
        config: TreeConfig,
        perf: PerfConfig,
        themes: &mut ThemeProvider,
    ) -> Option<Self> {
        let Some((width, height)) = host.surface_size(canvas_id) else {
            log::debug!("No surface '{}', sakura tree not started", canvas_id);
            return None;
        };
        let mut tree = Self::new(width, height, config, perf, themes.current());
        tree.subscription = Some(themes.subscribe());
        Some(tree)
    }

    /// Regenerate the tree from the original seed and repaint the cache
    fn rebuild(&mut self) {
        self.rng.reseed();
        self.tree = Tree::generate_with(&self.config, &mut self.rng);
        let scale_x = self.width as f64 / self.config.base_width;
        let scale_y = self.height as f64 / self.config.base_height;
        self.cache.render(
            &self.tree,
            &self.sprites,
            self.width,
            self.height,
            scale_x,
            scale_y,
        );
    }

    /// Record a new surface size. Returns false when unchanged.
    fn adopt_size(&mut self, width: u32, height: u32) -> bool {
        if width == self.width && height == self.height {
            return false;
        }
        log::debug!(
            "Surface resized {}x{} -> {}x{}",
            self.width,
            self.height,
            width,
            height
        );
        self.width = width;
        self.height = height;
        true
    }

    /// Adopt a new surface size; no-op when unchanged
    pub fn resize(&mut self, width: u32, height: u32) {
        if self.adopt_size(width, height) {
            self.rebuild();
        }
    }

    /// Colors are baked into the sprites, so they are redrawn here. The
    /// caller still owes a `rebuild` when this returns true.
    fn adopt_theme(&mut self, change: ThemeChange) -> bool {
        if change.theme == self.theme {
            return false;
        }
        log::debug!("Rebuilding sprites for theme '{}'", change.theme);
        self.theme = change.theme;
        self.palette = change.palette;
        self.sprites = FlowerSprites::build(&self.palette);
        true
    }

    /// Switch theme without a provider
    pub fn set_theme(&mut self, theme: Theme) {
        let change = ThemeChange {
            theme,
            palette: theme.palette(),
        };
        if self.adopt_theme(change) {
            self.rebuild();
        }
    }

    /// Run one frame into `buffer`. Returns whether another frame is wanted.
    pub fn tick(&mut self, dt: f32, buffer: &mut PixelBuffer) -> bool {
        if self.state == DriverState::Stopped {
            return false;
        }
        self.update(dt, buffer.width(), buffer.height());
        self.render(buffer);
        true
    }

    /// Cancel further frames
    pub fn stop(&mut self) {
        if self.state != DriverState::Stopped {
            log::info!("Sakura tree stopped");
            self.state = DriverState::Stopped;
        }
    }

    pub fn is_running(&self) -> bool {
        self.state != DriverState::Stopped
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    /// How many times the raster cache has been painted
    pub fn cache_builds(&self) -> u64 {
        self.cache.builds()
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn cache(&self) -> &TreeCache {
        &self.cache
    }

    pub fn petals(&self) -> &PetalPool {
        &self.petals
    }

    pub fn wind(&self) -> Wind {
        self.wind
    }
}

impl Effect for SakuraTree {
    fn update(&mut self, dt: f32, width: u32, height: u32) {
        let pending = self.subscription.as_ref().and_then(ThemeSubscription::poll);
        let themed = match pending {
            Some(change) => self.adopt_theme(change),
            None => false,
        };
        // One rebuild covers a theme change and a resize in the same frame
        let resized = self.adopt_size(width, height);
        if themed || resized {
            self.rebuild();
        }

        if self.state == DriverState::Stopped {
            return;
        }
        self.state = DriverState::Running;

        let frames = (dt * FRAMES_PER_SECOND).clamp(0.0, MAX_FRAME_STEP);
        self.wind.advance(frames);
        self.petals
            .step(frames, self.wind.strength(), self.width, self.height);
    }

    fn render(&self, buffer: &mut PixelBuffer) {
        let (w, h) = (self.width as f32, self.height as f32);
        let mut canvas = Canvas::new(buffer);
        canvas.clear();

        let cached = self.cache.buffer();
        if self.perf.enable_tree_sway {
            // Rotate about the bottom center, where the trunk stands
            canvas.save();
            canvas.translate(w / 2.0, h);
            canvas.rotate(self.wind.sway_angle());
            canvas.translate(-w / 2.0, -h);
            canvas.draw_image(cached, 0.0, 0.0, w, h);
            canvas.restore();
        } else {
            canvas.draw_image(cached, 0.0, 0.0, w, h);
        }

        self.petals.draw(&mut canvas, &self.palette);
    }

    fn name(&self) -> &str {
        "Sakura"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::OffscreenHost;

    const CANVAS: &str = "cherry-blossom-canvas";

    fn still_perf() -> PerfConfig {
        PerfConfig {
            falling_petals_count: 0,
            enable_tree_sway: false,
            target_fps: 30,
        }
    }

    #[test]
    fn test_attach_without_surface_is_noop() {
        let host = OffscreenHost::new("other-canvas", 200, 150);
        let mut themes = ThemeProvider::default();
        let tree = SakuraTree::attach(
            &host,
            CANVAS,
            TreeConfig::default(),
            PerfConfig::default(),
            &mut themes,
        );
        assert!(tree.is_none());
        assert_eq!(themes.subscriber_count(), 0);
    }

    #[test]
    fn test_attach_builds_once_and_starts_idle() {
        let host = OffscreenHost::new(CANVAS, 200, 150);
        let mut themes = ThemeProvider::default();
        let tree = SakuraTree::attach(
            &host,
            CANVAS,
            TreeConfig::default(),
            PerfConfig::default(),
            &mut themes,
        )
        .unwrap();
        assert_eq!(tree.state(), DriverState::Idle);
        assert_eq!(tree.cache_builds(), 1);
        assert_eq!(tree.size(), (200, 150));
        assert_eq!(tree.petals().len(), 30);
        assert_eq!(themes.subscriber_count(), 1);
    }

    #[test]
    fn test_frames_never_rebuild_cache() {
        let mut tree =
            SakuraTree::new(200, 150, TreeConfig::default(), PerfConfig::default(), Theme::Cherry);
        let mut buffer = PixelBuffer::with_size(200, 150);
        for _ in 0..20 {
            assert!(tree.tick(1.0 / 60.0, &mut buffer));
        }
        assert_eq!(tree.state(), DriverState::Running);
        assert_eq!(tree.cache_builds(), 1);
        assert!(buffer.coverage() > 0);
        assert!((tree.wind().time() - 0.2).abs() < 1e-4);
    }

    #[test]
    fn test_resize_rebuilds_before_next_frame() {
        let mut tree =
            SakuraTree::new(200, 150, TreeConfig::default(), still_perf(), Theme::Cherry);
        let original = tree.cache().buffer().clone();
        let branches = tree.tree().branches.len();

        let mut small = PixelBuffer::with_size(100, 75);
        tree.tick(1.0 / 60.0, &mut small);
        assert_eq!(tree.cache_builds(), 2);
        assert_eq!(tree.size(), (100, 75));
        assert_eq!(tree.cache().buffer().width(), 100);

        // Back to the first size: same seed, same pixels
        let mut big = PixelBuffer::with_size(200, 150);
        tree.tick(1.0 / 60.0, &mut big);
        assert_eq!(tree.cache_builds(), 3);
        assert_eq!(tree.cache().buffer(), &original);
        assert_eq!(tree.tree().branches.len(), branches);
    }

    #[test]
    fn test_theme_change_rebuilds_cache() {
        let host = OffscreenHost::new(CANVAS, 160, 120);
        let mut themes = ThemeProvider::default();
        let mut tree =
            SakuraTree::attach(&host, CANVAS, TreeConfig::default(), still_perf(), &mut themes)
                .unwrap();
        let mut buffer = PixelBuffer::with_size(160, 120);
        tree.tick(1.0 / 60.0, &mut buffer);
        assert_eq!(tree.cache_builds(), 1);

        themes.set_theme(Theme::Cherry);
        tree.tick(1.0 / 60.0, &mut buffer);
        assert_eq!(tree.cache_builds(), 1);

        themes.set_theme(Theme::Dark);
        tree.tick(1.0 / 60.0, &mut buffer);
        assert_eq!(tree.theme(), Theme::Dark);
        assert_eq!(tree.cache_builds(), 2);

        tree.tick(1.0 / 60.0, &mut buffer);
        assert_eq!(tree.cache_builds(), 2);
    }

    #[test]
    fn test_theme_and_resize_in_one_frame_build_once() {
        let host = OffscreenHost::new(CANVAS, 160, 120);
        let mut themes = ThemeProvider::default();
        let mut tree =
            SakuraTree::attach(&host, CANVAS, TreeConfig::default(), still_perf(), &mut themes)
                .unwrap();
        assert_eq!(tree.cache_builds(), 1);

        themes.set_theme(Theme::Blue);
        let mut resized = PixelBuffer::with_size(200, 150);
        tree.tick(1.0 / 60.0, &mut resized);
        assert_eq!(tree.cache_builds(), 2);
        assert_eq!(tree.theme(), Theme::Blue);
        assert_eq!(tree.size(), (200, 150));
        assert_eq!(tree.cache().buffer().width(), 200);
    }

    #[test]
    fn test_without_sway_frame_is_the_cache() {
        let mut tree =
            SakuraTree::new(160, 120, TreeConfig::default(), still_perf(), Theme::Cherry);
        let mut buffer = PixelBuffer::with_size(160, 120);
        tree.tick(0.5, &mut buffer);
        assert_eq!(&buffer, tree.cache().buffer());
    }

    #[test]
    fn test_sway_keeps_tree_on_screen() {
        let perf = PerfConfig {
            falling_petals_count: 0,
            ..PerfConfig::default()
        };
        let mut tree = SakuraTree::new(160, 120, TreeConfig::default(), perf, Theme::Cherry);
        let mut buffer = PixelBuffer::with_size(160, 120);
        for _ in 0..30 {
            tree.tick(1.0 / 60.0, &mut buffer);
        }
        assert!(tree.wind().sway_angle() != 0.0);
        let cached = tree.cache().buffer().coverage();
        assert!(buffer.coverage() > cached / 2);
        // The trunk base sits on the pivot and barely moves
        assert_eq!(buffer.get_pixel_rgba(80, 115).map(|p| p.3), Some(255));
    }

    #[test]
    fn test_large_dt_is_clamped() {
        let mut tree =
            SakuraTree::new(160, 120, TreeConfig::default(), still_perf(), Theme::Cherry);
        let mut buffer = PixelBuffer::with_size(160, 120);
        tree.tick(10.0, &mut buffer);
        assert!((tree.wind().time() - 0.03).abs() < 1e-6);
    }

    #[test]
    fn test_stop_cancels_frames() {
        let mut tree =
            SakuraTree::new(160, 120, TreeConfig::default(), still_perf(), Theme::Cherry);
        let mut buffer = PixelBuffer::with_size(160, 120);
        assert!(tree.tick(1.0 / 60.0, &mut buffer));
        tree.stop();
        assert_eq!(tree.state(), DriverState::Stopped);
        assert!(!tree.is_running());

        buffer.clear_transparent();
        assert!(!tree.tick(1.0 / 60.0, &mut buffer));
        assert_eq!(buffer.coverage(), 0);
    }

    #[test]
    fn test_set_theme_directly() {
        let mut tree =
            SakuraTree::new(160, 120, TreeConfig::default(), still_perf(), Theme::Cherry);
        tree.set_theme(Theme::Cherry);
        assert_eq!(tree.cache_builds(), 1);
        tree.set_theme(Theme::Green);
        assert_eq!(tree.cache_builds(), 2);
        assert_eq!(tree.name(), "Sakura");
    }
}
