//! Window configuration and the window trait

use serde::{Deserialize, Serialize};

/// Initial window settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    /// Logical width
    pub width: u32,
    /// Logical height
    pub height: u32,
    pub fullscreen: bool,
    pub resizable: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Sable".to_string(),
            width: 800,
            height: 600,
            fullscreen: false,
            resizable: true,
        }
    }
}

impl WindowConfig {
    pub fn new(title: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            title: title.into(),
            width,
            height,
            ..Default::default()
        }
    }

    pub fn with_fullscreen(mut self, fullscreen: bool) -> Self {
        self.fullscreen = fullscreen;
        self
    }

    pub fn with_resizable(mut self, resizable: bool) -> Self {
        self.resizable = resizable;
        self
    }
}

/// A platform window
///
/// Methods take `&self`; implementations synchronize internally so the
/// window can be queried from the event handler while it is borrowed.
pub trait Window {
    /// Physical size in pixels
    fn size(&self) -> (u32, u32);

    /// Size in logical points (physical size divided by the scale factor)
    fn logical_size(&self) -> (f32, f32) {
        let (w, h) = self.size();
        let scale = self.scale_factor();
        ((w as f64 / scale) as f32, (h as f64 / scale) as f32)
    }

    /// Display scale factor (device pixels per logical point)
    fn scale_factor(&self) -> f64;

    fn request_redraw(&self);

    fn is_focused(&self) -> bool;
}

/// Runtime window changes
pub trait WindowControl: Window {
    fn set_title(&self, title: &str);

    /// Request a new logical size; the platform may adjust or ignore it
    fn set_size(&self, width: u32, height: u32);

    fn set_fullscreen(&self, fullscreen: bool);

    fn is_fullscreen(&self) -> bool;
}
