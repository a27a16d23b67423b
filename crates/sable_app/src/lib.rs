//! Sable Frame Driver
//!
//! Runs frame production on a dedicated render thread and hands finished
//! frames to the main thread for presentation.
//!
//! # Example
//!
//! ```ignore
//! use sable_app::{run_windowed, DriverConfig, WindowedHooks};
//! use sable_core::{Color, Rect};
//! use sable_gpu::Quad;
//!
//! fn main() -> anyhow::Result<()> {
//!     run_windowed(
//!         DriverConfig::default(),
//!         |ctx| {
//!             ctx.draw_quad(&Quad::solid(Rect::new(20.0, 20.0, 200.0, 120.0), Color::RED));
//!         },
//!         WindowedHooks::default(),
//!     )?;
//!     Ok(())
//! }
//! ```

pub mod clock;
pub mod config;
pub mod context;
pub mod driver;
pub mod error;
pub mod handoff;

#[cfg(all(
    feature = "windowed",
    not(any(target_os = "android", target_os = "ios"))
))]
pub mod windowed;

pub use clock::FrameClock;
pub use config::{BatchConfig, DriverConfig, FrameConfig};
pub use context::FrameContext;
pub use driver::{DriverState, FrameDriver, FrameStats};
pub use error::{AppError, Result};
pub use handoff::{CompletedFrame, FrameHandoff};

#[cfg(all(
    feature = "windowed",
    not(any(target_os = "android", target_os = "ios"))
))]
pub use windowed::{run_windowed, WindowedHooks};
