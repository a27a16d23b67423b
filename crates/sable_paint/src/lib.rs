//! Sable Paint
//!
//! CPU-side compositor. Text, shapes and images are rasterized into a
//! [`PixelBuffer`] which is later uploaded as a GPU texture.
//!
//! # Features
//!
//! - **Clipped drawing**: every write is limited to the buffer's clip rect
//! - **Bit-exact blending**: integer "over" compositing, see [`kernel::blend`]
//! - **Wide kernel**: four pixels per aligned word on 64-bit targets
//! - **Primitives**: anti-aliased lines and midpoint circles
//!
//! # Example
//!
//! ```rust
//! use sable_core::{Color, Rect};
//! use sable_paint::PixelBuffer;
//!
//! let mut buffer = PixelBuffer::new(4, 4);
//! buffer.fill_rect(Color::RED, Rect::new(0.0, 0.0, 2.0, 2.0));
//! assert_eq!(buffer.pixels()[0], Color::RED.value());
//! ```

pub mod buffer;
pub mod kernel;
mod line;
mod shapes;

pub use buffer::PixelBuffer;
pub use kernel::{blend, BlendKernel, KernelKind, ScalarKernel, WideKernel};
