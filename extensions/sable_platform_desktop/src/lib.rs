//! Sable Desktop Platform
//!
//! Windowing and input for macOS, Windows, and Linux.

pub mod event_loop;
pub mod input;
pub mod window;

pub use event_loop::{DesktopEventLoop, DEFAULT_POLL_INTERVAL};
pub use input::InputTranslator;
pub use window::DesktopWindow;
