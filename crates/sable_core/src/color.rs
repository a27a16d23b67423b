//! Packed 32-bit colors
//!
//! Colors are stored as `0xAARRGGBB`. The compositor's blend arithmetic depends
//! on alpha occupying the top byte, so every path that builds a pixel goes
//! through this type or its raw `u32` value.

use serde::{Deserialize, Serialize};

/// Packed ARGB color (alpha in the top byte)
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    bytemuck::Pod,
    bytemuck::Zeroable,
)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Color(u32);

impl Color {
    pub const TRANSPARENT: Color = Color(0x0000_0000);
    pub const BLACK: Color = Color(0xFF00_0000);
    pub const WHITE: Color = Color(0xFFFF_FFFF);
    pub const RED: Color = Color(0xFFFF_0000);
    pub const GREEN: Color = Color(0xFF00_FF00);
    pub const BLUE: Color = Color(0xFF00_00FF);

    /// Create from u8 components (0-255)
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self(((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | (b as u32))
    }

    /// Opaque color from u8 components
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    /// Wrap a raw `0xAARRGGBB` value
    pub const fn from_value(value: u32) -> Self {
        Self(value)
    }

    /// Create from normalized components, clamped to `0.0..=1.0`
    pub fn from_f32(r: f32, g: f32, b: f32, a: f32) -> Self {
        let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self::rgba(q(r), q(g), q(b), q(a))
    }

    /// Raw packed value
    pub const fn value(self) -> u32 {
        self.0
    }

    pub const fn red(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub const fn green(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub const fn blue(self) -> u8 {
        self.0 as u8
    }

    pub const fn alpha(self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// Replace the alpha channel
    pub const fn with_alpha(self, alpha: u8) -> Self {
        Self((self.0 & 0x00FF_FFFF) | ((alpha as u32) << 24))
    }

    /// Normalized `[r, g, b, a]`, the layout used by vertex tints
    pub fn to_f32_array(self) -> [f32; 4] {
        [
            self.red() as f32 / 255.0,
            self.green() as f32 / 255.0,
            self.blue() as f32 / 255.0,
            self.alpha() as f32 / 255.0,
        ]
    }

    /// Convert to u8 array `[r, g, b, a]`
    pub const fn to_rgba8(self) -> [u8; 4] {
        [self.red(), self.green(), self.blue(), self.alpha()]
    }
}

impl From<u32> for Color {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl From<Color> for u32 {
    fn from(color: Color) -> Self {
        color.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_packing() {
        let c = Color::rgba(0x12, 0x34, 0x56, 0x78);
        assert_eq!(c.value(), 0x7812_3456);
        assert_eq!(c.red(), 0x12);
        assert_eq!(c.green(), 0x34);
        assert_eq!(c.blue(), 0x56);
        assert_eq!(c.alpha(), 0x78);
        assert_eq!(c.to_rgba8(), [0x12, 0x34, 0x56, 0x78]);
    }

    #[test]
    fn with_alpha_keeps_rgb() {
        assert_eq!(Color::RED.with_alpha(0x80).value(), 0x80FF_0000);
        assert_eq!(Color::TRANSPARENT.with_alpha(0xFF), Color::BLACK);
    }

    #[test]
    fn float_conversion_clamps() {
        assert_eq!(Color::from_f32(2.0, -1.0, 0.0, 1.0), Color::RED);
        assert_eq!(Color::WHITE.to_f32_array(), [1.0, 1.0, 1.0, 1.0]);
    }
}
