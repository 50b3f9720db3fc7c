use clap::Parser;
use env_logger::Env;
use sdl2::keyboard::Keycode;
use std::path::PathBuf;

use sakura::display::{Display, InputEvent, PixelBuffer, RenderTarget, DEFAULT_HEIGHT, DEFAULT_WIDTH};
use sakura::effects::sakura::TreeConfig;
use sakura::effects::SakuraTree;
use sakura::mqtt::{ThemeRemote, DEFAULT_PORT, DEFAULT_TOPIC};
use sakura::perf::PerfConfig;
use sakura::theme::{Theme, ThemeProvider};
use sakura::util::{FpsCounter, FrameLimiter};
use sakura::SakuraError;

/// Refresh rate assumed for a vsync-locked window
const DISPLAY_HZ: u32 = 60;

/// Procedural cherry-blossom tree with falling petals
#[derive(Parser, Debug)]
#[command(name = "sakura", version, about)]
struct Args {
    /// Window width
    #[arg(short = 'W', long, default_value_t = DEFAULT_WIDTH)]
    width: u32,

    /// Window height
    #[arg(short = 'H', long, default_value_t = DEFAULT_HEIGHT)]
    height: u32,

    /// Disable VSync; frames are paced to the tier's target FPS instead
    #[arg(long)]
    no_vsync: bool,

    /// Performance tier JSON (falling_petals_count, enable_tree_sway, target_fps)
    #[arg(long, value_name = "JSON")]
    perf: Option<PathBuf>,

    /// Force the low-end tier (15 petals, no sway, 30 fps)
    #[arg(long, conflicts_with = "perf")]
    low_end: bool,

    /// Tree shape JSON (seed, max_depth, flower_probability, ...)
    #[arg(long, value_name = "JSON")]
    tree_config: Option<PathBuf>,

    /// Initial theme: cherry, dark, light, blue, green, orange
    #[arg(long, default_value = "cherry")]
    theme: Theme,

    /// Name of the drawing surface the window exposes
    #[arg(long, default_value = "cherry-blossom-canvas")]
    canvas: String,

    /// MQTT broker for remote theme changes (disabled if not given)
    #[arg(long)]
    mqtt_host: Option<String>,

    #[arg(long, default_value_t = DEFAULT_PORT)]
    mqtt_port: u16,

    #[arg(long, default_value = DEFAULT_TOPIC)]
    mqtt_topic: String,
}

fn resolve_perf(args: &Args) -> PerfConfig {
    if args.low_end {
        return PerfConfig::low_end();
    }
    match &args.perf {
        Some(path) => PerfConfig::load(path).unwrap_or_else(|e| {
            log::warn!("Failed to load {}: {}, using defaults", path.display(), e);
            PerfConfig::default()
        }),
        None => PerfConfig::detect(),
    }
}

fn resolve_tree_config(args: &Args) -> TreeConfig {
    match &args.tree_config {
        Some(path) => TreeConfig::load(path).unwrap_or_else(|e| {
            log::warn!("Failed to load {}: {}, using defaults", path.display(), e);
            TreeConfig::default()
        }),
        None => TreeConfig::default(),
    }
}

fn main() -> Result<(), SakuraError> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let perf = resolve_perf(&args);
    let tree_config = resolve_tree_config(&args);
    let mut themes = ThemeProvider::new(args.theme);

    let remote = args.mqtt_host.as_deref().and_then(|host| {
        ThemeRemote::connect(host, args.mqtt_port, &args.mqtt_topic)
            .map_err(|e| log::warn!("Remote themes disabled: {}", e))
            .ok()
    });

    let vsync = !args.no_vsync;
    let (mut display, texture_creator) =
        Display::with_options("sakura", &args.canvas, args.width, args.height, vsync)?;
    let mut target = RenderTarget::with_size(&texture_creator, args.width, args.height)?;
    let mut buffer = PixelBuffer::with_size(args.width, args.height);

    let Some(mut sakura) =
        SakuraTree::attach(&display, &args.canvas, tree_config, perf.clone(), &mut themes)
    else {
        log::warn!("Surface '{}' not found, nothing to draw", args.canvas);
        return Ok(());
    };

    // FPS counter with 60 sample rolling average
    let mut fps_counter = FpsCounter::new(60);
    let mut limiter = FrameLimiter::new(perf.target_fps);
    let pace_frames = !vsync || perf.target_fps < DISPLAY_HZ;

    log::info!("Resolution: {}x{}", args.width, args.height);
    log::info!(
        "Tier: {}, {} petals, sway {}, {} fps target",
        if perf.is_low_end() { "low end" } else { "standard" },
        perf.falling_petals_count,
        if perf.enable_tree_sway { "on" } else { "off" },
        perf.target_fps
    );
    log::info!("Controls: T cycle theme, F log FPS, Escape quit");

    loop {
        let (dt, avg_fps) = fps_counter.tick();

        for event in display.poll_events() {
            match event {
                InputEvent::Quit | InputEvent::KeyDown(Keycode::Escape) => sakura.stop(),
                InputEvent::KeyDown(Keycode::T) => {
                    let next = themes.current().next();
                    themes.set_theme(next);
                },
                InputEvent::KeyDown(Keycode::F) => {
                    let (min_fps, max_fps) = fps_counter.min_max_fps();
                    log::info!(
                        "FPS {} avg  {} min  {} max  {}ms",
                        avg_fps as u32,
                        min_fps as u32,
                        max_fps as u32,
                        fps_counter.avg_frame_time_ms() as u32
                    );
                },
                InputEvent::KeyDown(_) => {},
                InputEvent::Resized { width, height } => {
                    // The tree picks up the new size on its next tick
                    if target.size() != (width, height) {
                        target = RenderTarget::with_size(&texture_creator, width, height)?;
                        buffer.resize(width, height);
                    }
                },
            }
        }

        if let Some(theme) = remote.as_ref().and_then(ThemeRemote::poll) {
            themes.set_theme(theme);
        }

        if !sakura.tick(dt, &mut buffer) {
            break;
        }
        display.present(&mut target, &buffer, themes.current().backdrop())?;

        if pace_frames {
            limiter.wait();
        }
    }

    Ok(())
}
