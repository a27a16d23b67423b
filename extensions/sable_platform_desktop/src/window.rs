//! Desktop window implementation using winit

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use sable_platform::{Window, WindowConfig, WindowControl};
use winit::dpi::LogicalSize;
use winit::event_loop::ActiveEventLoop;
use winit::window::{Fullscreen, Window as WinitWindow, WindowAttributes};

/// Desktop window wrapping a winit window
pub struct DesktopWindow {
    window: Arc<WinitWindow>,
    focused: AtomicBool,
}

impl DesktopWindow {
    /// Create a new desktop window
    pub fn new(
        event_loop: &ActiveEventLoop,
        config: &WindowConfig,
    ) -> Result<Self, winit::error::OsError> {
        let mut attrs = WindowAttributes::default()
            .with_title(&config.title)
            .with_inner_size(LogicalSize::new(config.width, config.height))
            .with_resizable(config.resizable);

        if config.fullscreen {
            attrs = attrs.with_fullscreen(Some(Fullscreen::Borderless(None)));
        }

        let window = Arc::new(event_loop.create_window(attrs)?);
        tracing::info!(
            "Created window \"{}\" ({}x{} @ {:.2}x)",
            config.title,
            config.width,
            config.height,
            window.scale_factor()
        );

        Ok(Self {
            window,
            focused: AtomicBool::new(true),
        })
    }

    /// Get the underlying winit window
    pub fn winit_window(&self) -> &WinitWindow {
        &self.window
    }

    /// Get an Arc to the winit window, e.g. for creating a GPU surface
    pub fn winit_window_arc(&self) -> Arc<WinitWindow> {
        Arc::clone(&self.window)
    }

    /// Set focus state (called by event loop)
    pub(crate) fn set_focused(&self, focused: bool) {
        self.focused.store(focused, Ordering::Relaxed);
    }
}

impl Window for DesktopWindow {
    fn size(&self) -> (u32, u32) {
        let size = self.window.inner_size();
        (size.width, size.height)
    }

    fn scale_factor(&self) -> f64 {
        self.window.scale_factor()
    }

    fn request_redraw(&self) {
        self.window.request_redraw();
    }

    fn is_focused(&self) -> bool {
        self.focused.load(Ordering::Relaxed)
    }
}

impl WindowControl for DesktopWindow {
    fn set_title(&self, title: &str) {
        self.window.set_title(title);
    }

    fn set_size(&self, width: u32, height: u32) {
        // Some platforms apply the size asynchronously and report it via Resized
        let _ = self
            .window
            .request_inner_size(LogicalSize::new(width, height));
    }

    fn set_fullscreen(&self, fullscreen: bool) {
        let mode = fullscreen.then_some(Fullscreen::Borderless(None));
        self.window.set_fullscreen(mode);
    }

    fn is_fullscreen(&self) -> bool {
        self.window.fullscreen().is_some()
    }
}
