//! Event loop trait

use crate::error::Result;
use crate::event::{ControlFlow, Event};
use crate::window::Window;

/// A platform event loop
///
/// `run` blocks until the handler returns [`ControlFlow::Exit`] or the
/// platform shuts the loop down.
pub trait EventLoop {
    type Window: Window;

    fn run<F>(self, handler: F) -> Result<()>
    where
        F: FnMut(Event, &Self::Window) -> ControlFlow + 'static;
}
