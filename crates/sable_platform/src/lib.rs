//! Sable Platform Abstraction
//!
//! Platform-neutral window, event loop and lifecycle types. Backends such as
//! `sable_platform_desktop` implement [`EventLoop`] and [`Window`] and
//! translate native input into [`sable_core::InputEvent`].

pub mod error;
pub mod event;
pub mod event_loop;
pub mod window;

pub use error::{PlatformError, Result};
pub use event::{ControlFlow, Event, LifecycleEvent, WindowEvent};
pub use event_loop::EventLoop;
pub use window::{Window, WindowConfig, WindowControl};

pub use sable_core::{EventType, InputEvent, KeyCode, Modifiers};
