//! 2D camera applied to batched geometry

use sable_core::{Point, Vec2};

/// Translate-then-scale view transform
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub translation: Vec2,
    pub scale: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            translation: Vec2::ZERO,
            scale: 1.0,
        }
    }
}

impl Camera {
    pub fn new(translation: Vec2, scale: f32) -> Self {
        Self { translation, scale }
    }

    /// Identity translation with a display scale factor
    pub fn scaled(scale: f32) -> Self {
        Self {
            translation: Vec2::ZERO,
            scale,
        }
    }

    /// `(point + translation) * scale`
    pub fn transform(&self, point: Point) -> Point {
        Point::new(
            (point.x + self.translation.x) * self.scale,
            (point.y + self.translation.y) * self.scale,
        )
    }

    pub fn transform_size(&self, size: Vec2) -> Vec2 {
        size * self.scale
    }
}
