//! Driver configuration
//!
//! Loaded from TOML. Every field has a default, so an empty file is a valid
//! configuration:
//!
//! ```toml
//! [window]
//! title = "Demo"
//! width = 1024
//! height = 768
//!
//! [frame]
//! target_fps = 120
//! swap_chain_depth = 3
//! clear_color = 0xFF202020
//!
//! [batch]
//! max_vertices = 60000
//! texture_slots = 8
//! ```
//!
//! `SABLE_TARGET_FPS` and `SABLE_SWAP_CHAIN_DEPTH` override the file.

use std::path::Path;

use sable_core::Color;
use sable_gpu::{DEFAULT_MAX_VERTICES, MAX_TEXTURE_SLOTS, VERTICES_PER_QUAD};
use sable_platform::WindowConfig;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

pub const TARGET_FPS_ENV: &str = "SABLE_TARGET_FPS";
pub const SWAP_CHAIN_DEPTH_ENV: &str = "SABLE_SWAP_CHAIN_DEPTH";

/// Fewest swap targets that let the writer and presenter run concurrently
pub const MIN_SWAP_CHAIN_DEPTH: usize = 2;

fn env_u32(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<u32> {
    lookup(name).and_then(|v| v.trim().parse::<u32>().ok())
}

fn env_usize(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<usize> {
    lookup(name).and_then(|v| v.trim().parse::<usize>().ok())
}

/// Frame production and presentation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    /// Frames per second; 0 renders as fast as slots free up
    pub target_fps: u32,
    /// Number of off-screen targets rotated between render and present
    pub swap_chain_depth: usize,
    /// Main-thread presentation polling interval
    pub poll_interval_ms: u64,
    /// Clear color of every frame (0xAARRGGBB)
    pub clear_color: Color,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            target_fps: 60,
            swap_chain_depth: 3,
            poll_interval_ms: 2,
            clear_color: Color::BLACK,
        }
    }
}

/// Draw buffer sizing
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub max_vertices: usize,
    pub texture_slots: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_vertices: DEFAULT_MAX_VERTICES,
            texture_slots: MAX_TEXTURE_SLOTS,
        }
    }
}

/// Top-level driver configuration
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    pub window: WindowConfig,
    pub frame: FrameConfig,
    pub batch: BatchConfig,
}

impl DriverConfig {
    /// Load a TOML file, then apply environment overrides
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))?;
        tracing::info!("Loaded driver config from {}", path.display());
        Ok(config)
    }

    /// Parse TOML, then apply environment overrides
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let mut config: DriverConfig =
            toml::from_str(content).map_err(|e| AppError::Config(e.to_string()))?;
        config.apply_env_overrides();
        Ok(config.normalized())
    }

    /// Apply `SABLE_*` environment overrides
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|name| std::env::var(name).ok());
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(fps) = env_u32(&lookup, TARGET_FPS_ENV) {
            tracing::debug!("{} overrides target_fps: {}", TARGET_FPS_ENV, fps);
            self.frame.target_fps = fps;
        }
        if let Some(depth) = env_usize(&lookup, SWAP_CHAIN_DEPTH_ENV) {
            tracing::debug!("{} overrides swap_chain_depth: {}", SWAP_CHAIN_DEPTH_ENV, depth);
            self.frame.swap_chain_depth = depth;
        }
    }

    /// Clamp every field into its supported range
    pub fn normalized(mut self) -> Self {
        if self.frame.swap_chain_depth < MIN_SWAP_CHAIN_DEPTH {
            tracing::warn!(
                "swap_chain_depth {} is below {}, clamping",
                self.frame.swap_chain_depth,
                MIN_SWAP_CHAIN_DEPTH
            );
            self.frame.swap_chain_depth = MIN_SWAP_CHAIN_DEPTH;
        }
        if self.frame.poll_interval_ms == 0 {
            self.frame.poll_interval_ms = 1;
        }

        let max_vertices =
            (self.batch.max_vertices / VERTICES_PER_QUAD).max(1) * VERTICES_PER_QUAD;
        if max_vertices != self.batch.max_vertices {
            tracing::warn!(
                "max_vertices {} is not a positive multiple of {}, using {}",
                self.batch.max_vertices,
                VERTICES_PER_QUAD,
                max_vertices
            );
            self.batch.max_vertices = max_vertices;
        }

        let slots = self.batch.texture_slots.clamp(1, MAX_TEXTURE_SLOTS);
        if slots != self.batch.texture_slots {
            tracing::warn!(
                "texture_slots {} is outside 1..={}, using {}",
                self.batch.texture_slots,
                MAX_TEXTURE_SLOTS,
                slots
            );
            self.batch.texture_slots = slots;
        }
        self
    }
}
