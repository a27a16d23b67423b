//! Sable Core
//!
//! Shared vocabulary for the Sable crates:
//!
//! - **Geometry**: [`Point`], [`Vec2`], [`Size`], [`Rect`]
//! - **Color**: packed `0xAARRGGBB` [`Color`] values used by the compositor
//! - **Events**: normalized [`InputEvent`] records and the [`EventSink`] trait

pub mod color;
pub mod events;
pub mod geometry;

pub use color::Color;
pub use events::{EventSink, EventType, InputEvent, KeyCode, Modifiers};
pub use geometry::{Point, Rect, Size, Vec2};
