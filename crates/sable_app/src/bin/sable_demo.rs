//! Sable demo
//!
//! Composites a small scene in a pixel buffer, uploads it once and animates
//! it through the batching layer.
//!
//! Run with: cargo run -p sable_app --bin sable-demo -- --fps 120
//! Headless: cargo run -p sable_app --bin sable-demo -- --headless --frames 240

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use sable_app::{DriverConfig, FrameContext, FrameDriver};
use sable_core::{Color, Point, Rect};
use sable_gpu::{BlendMode, Line, Quad, RecordingDevice, RenderDevice, TextureHandle};
use sable_paint::PixelBuffer;
use sable_platform::WindowConfig;
use tracing_subscriber::EnvFilter;

/// Frames the headless recording keeps for inspection
const RETAINED_FRAMES: usize = 8;

#[derive(Parser, Debug)]
#[command(name = "sable-demo", about = "Software compositing and batched presentation demo")]
struct Args {
    /// Driver configuration (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the target frame rate (0 = unthrottled)
    #[arg(long)]
    fps: Option<u32>,

    /// Render without a window using the recording device
    #[arg(long)]
    headless: bool,

    /// Frames to render in headless mode
    #[arg(long, default_value_t = 120)]
    frames: u64,
}

/// Sprite composited on the CPU
fn composite_sprite() -> PixelBuffer {
    let mut sprite = PixelBuffer::new(64, 64);
    sprite.clear(Color::TRANSPARENT);
    sprite.fill_rect(Color::rgba(40, 120, 220, 255), Rect::new(4.0, 4.0, 56.0, 56.0));
    sprite.fill_circle(Color::rgba(255, 200, 40, 200), Point::new(32.0, 32.0), 20.0);
    sprite.draw_circle(Color::WHITE, Point::new(32.0, 32.0), 26.0);
    sprite.draw_line(Color::BLACK, Point::new(4.0, 60.0), Point::new(60.0, 4.0));
    sprite
}

/// Per-frame scene drawing, shared by both modes
struct Scene {
    sprite: Option<TextureHandle>,
}

impl Scene {
    fn new() -> Self {
        Self { sprite: None }
    }

    fn draw<D: RenderDevice>(&mut self, ctx: &mut FrameContext<'_, D>) {
        let sprite = match self.sprite {
            Some(sprite) => sprite,
            None => {
                let handle = ctx.upload(&composite_sprite());
                self.sprite = Some(handle);
                handle
            }
        };

        let (width, height) = ctx.target_size();
        let (width, height) = (width as f32, height as f32);
        let t = ctx.frame_number() as f32 / 60.0;

        ctx.draw_quad(&Quad::solid(
            Rect::new(0.0, height - 40.0, width, 40.0),
            Color::rgb(30, 30, 36),
        ));

        for i in 0..8 {
            let phase = t + i as f32 * 0.6;
            let x = (width - 64.0) * (0.5 + 0.45 * phase.sin());
            let y = (height - 104.0) * (0.5 + 0.45 * (phase * 1.3).cos());
            let quad = Quad::textured(Rect::new(x, y, 64.0, 64.0), sprite)
                .with_alpha(0.5 + 0.5 * (phase * 2.0).sin().abs());
            let quad = if i % 2 == 0 {
                quad
            } else {
                quad.with_blend(BlendMode::Light)
            };
            ctx.draw_quad(&quad);
        }

        let cx = width / 2.0;
        let cy = height / 2.0;
        let tip = Point::new(cx + 120.0 * t.cos(), cy + 120.0 * t.sin());
        ctx.draw_line(&Line::new(Point::new(cx, cy), tip, Color::GREEN).with_weight(3.0));
    }
}

fn run_headless(config: DriverConfig, frames: u64) -> Result<()> {
    let device = RecordingDevice::new(config.window.width, config.window.height)
        .with_frame_limit(RETAINED_FRAMES);
    let log = device.log();
    let mut driver = FrameDriver::new(config);
    driver.on_frame_complete(|stats| {
        if stats.sequence % 60 == 0 {
            tracing::info!(
                "Frame {} in slot {} took {:?}",
                stats.sequence,
                stats.slot,
                stats.duration
            );
        }
    })?;
    driver.attach_context(device, 1.0)?;

    let mut scene = Scene::new();
    driver.start(move |ctx| scene.draw(ctx))?;

    let started = Instant::now();
    let mut presented = 0u64;
    let mut last = None;
    while presented < frames {
        if let Some(sequence) = driver.present_latest(|_| {}) {
            if last != Some(sequence) {
                last = Some(sequence);
                presented += 1;
            }
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    driver.terminate();

    tracing::info!(
        "Presented {} of {} rendered frames ({} batches) in {:?}",
        presented,
        log.frame_count(),
        log.batch_count(),
        started.elapsed()
    );
    Ok(())
}

#[cfg(feature = "windowed")]
fn run_window(config: DriverConfig) -> Result<()> {
    use sable_app::{run_windowed, WindowedHooks};
    use sable_core::{EventType, InputEvent, KeyCode};

    let mut scene = Scene::new();
    let hooks = WindowedHooks::default().with_event_sink(|event: &InputEvent| {
        if event.has(EventType::KEY_TYPED) {
            tracing::info!("Typed {:?}", event.character);
        } else if event.has(EventType::KEY_DOWN) && event.key == KeyCode::ESCAPE {
            tracing::info!("Escape pressed; close the window to exit");
        }
    });
    run_windowed(config, move |ctx| scene.draw(ctx), hooks)?;
    Ok(())
}

#[cfg(not(feature = "windowed"))]
fn run_window(_config: DriverConfig) -> Result<()> {
    anyhow::bail!("Built without the `windowed` feature; use --headless")
}

/// Command-line settings on top of the loaded configuration
fn apply_args(config: &mut DriverConfig, args: &Args) {
    if config.window.title == WindowConfig::default().title {
        config.window.title = "Sable Demo".to_string();
    }
    if let Some(fps) = args.fps {
        config.frame.target_fps = fps;
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => DriverConfig::load(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => {
            let mut config = DriverConfig::default();
            config.apply_env_overrides();
            config
        }
    };
    apply_args(&mut config, &args);

    if args.headless {
        run_headless(config, args.frames)
    } else {
        run_window(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_title_is_kept() {
        let args = Args::parse_from(["sable-demo", "--fps", "30"]);
        let mut config = DriverConfig::from_toml_str("[window]\ntitle = \"Custom\"\n").unwrap();
        apply_args(&mut config, &args);
        assert_eq!(config.window.title, "Custom");
        assert_eq!(config.frame.target_fps, 30);
    }

    #[test]
    fn default_title_names_the_demo() {
        let args = Args::parse_from(["sable-demo"]);
        let mut config = DriverConfig::default();
        let fps = config.frame.target_fps;
        apply_args(&mut config, &args);
        assert_eq!(config.window.title, "Sable Demo");
        assert_eq!(config.frame.target_fps, fps);
    }
}
