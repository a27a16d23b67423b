//! Platform events delivered to the event loop handler

use sable_core::InputEvent;

/// Event loop control returned by the handler
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ControlFlow {
    #[default]
    Continue,
    Exit,
}

/// Window-level changes
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum WindowEvent {
    /// New physical size in pixels
    Resized { width: u32, height: u32 },
    ScaleFactorChanged { scale_factor: f64 },
    Focused(bool),
    CloseRequested,
}

/// Application lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// The window exists and rendering resources may be created
    Resumed,
    Suspended,
}

/// Everything the event loop reports
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Event {
    Window(WindowEvent),
    Input(InputEvent),
    /// Poll tick; the handler may present a finished frame
    Frame,
    Lifecycle(LifecycleEvent),
}
