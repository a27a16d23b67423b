//! Clipped RGBA pixel buffer
//!
//! A [`PixelBuffer`] owns `width * height` packed pixels. Every drawing
//! operation is intersected with the buffer's clip rectangle (which itself can
//! never exceed the buffer bounds) before anything is written, so off-canvas
//! drawing is a silent no-op rather than an error.

use sable_core::{Color, Point, Rect};

use crate::kernel::{BlendKernel, KernelKind};

/// Integer clip bounds, half-open on the max edges
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Clip {
    x0: i64,
    y0: i64,
    x1: i64,
    y1: i64,
}

impl Clip {
    fn full(width: usize, height: usize) -> Self {
        Self {
            x0: 0,
            y0: 0,
            x1: width as i64,
            y1: height as i64,
        }
    }

    fn is_empty(&self) -> bool {
        self.x0 >= self.x1 || self.y0 >= self.y1
    }

    fn to_rect(self) -> Rect {
        Rect::new(
            self.x0 as f32,
            self.y0 as f32,
            (self.x1 - self.x0) as f32,
            (self.y1 - self.y0) as f32,
        )
    }
}

/// Owned, fixed-size buffer of `0xAARRGGBB` pixels
#[derive(Clone)]
pub struct PixelBuffer {
    width: usize,
    height: usize,
    pixels: Vec<u32>,
    clip: Clip,
    kernel: KernelKind,
}

impl std::fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("clip", &self.clip_rect())
            .field("kernel", &self.kernel)
            .finish()
    }
}

impl PixelBuffer {
    /// Create a zero-filled (fully transparent) buffer
    pub fn new(width: u32, height: u32) -> Self {
        let (width, height) = (width as usize, height as usize);
        Self {
            width,
            height,
            pixels: vec![0; width * height],
            clip: Clip::full(width, height),
            kernel: KernelKind::detect(),
        }
    }

    /// Create a buffer seeded with existing pixel values
    ///
    /// If `pixels` does not hold exactly `width * height` values the buffer
    /// stays zeroed.
    pub fn from_pixels(width: u32, height: u32, pixels: &[u32]) -> Self {
        let mut buffer = Self::new(width, height);
        if pixels.len() == buffer.pixels.len() {
            buffer.pixels.copy_from_slice(pixels);
        } else {
            tracing::warn!(
                "PixelBuffer seed has {} pixels, expected {}x{}; leaving buffer empty",
                pixels.len(),
                width,
                height
            );
        }
        buffer
    }

    /// Use a specific blend kernel instead of the detected one
    pub fn with_kernel(mut self, kind: KernelKind) -> Self {
        self.kernel = kind;
        self
    }

    pub fn set_kernel(&mut self, kind: KernelKind) {
        self.kernel = kind;
    }

    pub fn kernel_kind(&self) -> KernelKind {
        self.kernel
    }

    fn kernel(&self) -> &'static dyn BlendKernel {
        self.kernel.kernel()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn width(&self) -> u32 {
        self.width as u32
    }

    pub fn height(&self) -> u32 {
        self.height as u32
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width as u32, self.height as u32)
    }

    /// Size of the pixel data in bytes
    pub fn count(&self) -> usize {
        self.pixels.len() * 4
    }

    /// Packed pixel values, row-major
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// Raw pixel bytes (BGRA order on little-endian hosts)
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    /// Pixel value at a linear index
    pub fn at(&self, index: usize) -> Option<u32> {
        self.pixels.get(index).copied()
    }

    /// Color at a pixel coordinate
    pub fn color(&self, point: Point) -> Option<Color> {
        if !(point.x >= 0.0 && point.y >= 0.0) {
            return None;
        }
        let (x, y) = (point.x as usize, point.y as usize);
        if x >= self.width || y >= self.height {
            return None;
        }
        self.at(y * self.width + x).map(Color::from_value)
    }

    fn row_mut(&mut self, line: i64) -> &mut [u32] {
        let start = line as usize * self.width;
        &mut self.pixels[start..start + self.width]
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Clipping
    // ─────────────────────────────────────────────────────────────────────────

    /// Restrict drawing to `rect`, intersected with the buffer bounds
    pub fn set_clip_rect(&mut self, rect: Rect) {
        let full = Clip::full(self.width, self.height);
        self.clip = match self.integer_bounds(&rect, full) {
            Some(clip) => clip,
            None => Clip {
                x0: 0,
                y0: 0,
                x1: 0,
                y1: 0,
            },
        };
    }

    /// Reset the clip rectangle to the full buffer
    pub fn clear_clip_rect(&mut self) {
        self.clip = Clip::full(self.width, self.height);
    }

    pub fn clip_rect(&self) -> Rect {
        self.clip.to_rect()
    }

    /// Rows inside the clip rect
    pub(crate) fn clip_rows(&self) -> std::ops::Range<i64> {
        self.clip.y0..self.clip.y1
    }

    /// Columns inside the clip rect
    pub(crate) fn clip_columns(&self) -> std::ops::Range<i64> {
        self.clip.x0..self.clip.x1
    }

    /// Intersect a float rect with integer bounds; `None` when nothing remains
    fn integer_bounds(&self, rect: &Rect, within: Clip) -> Option<Clip> {
        if !rect.origin.is_finite() || !rect.size.width.is_finite() || !rect.size.height.is_finite()
        {
            return None;
        }
        let clip = Clip {
            x0: rect.x().max(within.x0 as f32) as i64,
            y0: rect.y().max(within.y0 as f32) as i64,
            x1: rect.max_x().min(within.x1 as f32) as i64,
            y1: rect.max_y().min(within.y1 as f32) as i64,
        };
        (!clip.is_empty()).then_some(clip)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Drawing
    // ─────────────────────────────────────────────────────────────────────────

    /// Overwrite every pixel inside the clip rect with `color`
    pub fn clear(&mut self, color: Color) {
        let bounds = Rect::new(0.0, 0.0, self.width as f32, self.height as f32);
        self.clear_rect(color, bounds);
    }

    /// Overwrite every pixel of `rect` (clipped) with `color`, ignoring existing alpha
    pub fn clear_rect(&mut self, color: Color, rect: Rect) {
        let Some(area) = self.integer_bounds(&rect, self.clip) else {
            return;
        };
        let kernel = self.kernel();
        let (x0, x1) = (area.x0 as usize, area.x1 as usize);
        for line in area.y0..area.y1 {
            kernel.fill(&mut self.row_mut(line)[x0..x1], color.value());
        }
    }

    /// Blend `color` over every pixel of `rect` (clipped)
    pub fn fill_rect(&mut self, color: Color, rect: Rect) {
        let Some(area) = self.integer_bounds(&rect, self.clip) else {
            return;
        };
        for line in area.y0..area.y1 {
            self.apply_run(color, area.x0, area.x1, line);
        }
    }

    /// Blend `color` over a single pixel; off-clip points are ignored
    pub fn draw_pixel(&mut self, color: Color, point: Point) {
        if !self.clip.to_rect().contains_pixel(point) {
            return;
        }
        let (x, y) = (point.x as i64, point.y as i64);
        self.apply_run(color, x, x + 1, y);
    }

    /// Blend `color` over `[start_x, end_x)` on row `line`
    pub fn apply_run(&mut self, color: Color, start_x: i64, end_x: i64, line: i64) {
        if line < self.clip.y0 || line >= self.clip.y1 || start_x >= end_x {
            return;
        }
        let start = start_x.max(self.clip.x0);
        let end = end_x.min(self.clip.x1);
        if start >= end {
            return;
        }
        let kernel = self.kernel();
        kernel.blend_solid(
            &mut self.row_mut(line)[start as usize..end as usize],
            color.value(),
        );
    }

    /// Blend one color per pixel starting at `start_x` on row `line`
    pub fn apply_run_colors(&mut self, colors: &[Color], start_x: i64, line: i64) {
        self.apply_run_values(bytemuck::cast_slice(colors), start_x, line);
    }

    /// Blend raw `0xAARRGGBB` values starting at `start_x` on row `line`
    ///
    /// Values that land outside the clip rect are skipped; the rest stay
    /// aligned with their pixels.
    pub fn apply_run_values(&mut self, values: &[u32], start_x: i64, line: i64) {
        if line < self.clip.y0 || line >= self.clip.y1 || values.is_empty() {
            return;
        }
        let end_x = start_x.saturating_add(values.len() as i64);
        let start = start_x.max(self.clip.x0);
        let end = end_x.min(self.clip.x1);
        if start >= end {
            return;
        }
        let skip = (start - start_x) as usize;
        let len = (end - start) as usize;
        let kernel = self.kernel();
        kernel.blend_span(
            &mut self.row_mut(line)[start as usize..end as usize],
            &values[skip..skip + len],
        );
    }

    /// Replace this buffer's alpha channel with the low byte of `mask`'s pixels
    ///
    /// Both buffers must hold the same number of pixels; otherwise nothing
    /// changes.
    pub fn apply_mask(&mut self, mask: &PixelBuffer) {
        if mask.pixels.len() != self.pixels.len() {
            tracing::warn!(
                "apply_mask size mismatch: mask is {}x{}, buffer is {}x{}",
                mask.width,
                mask.height,
                self.width,
                self.height
            );
            return;
        }
        let kernel = self.kernel();
        kernel.replace_alpha(&mut self.pixels, &mask.pixels);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLUE_50: Color = Color::from_value(0x8000_00FF);

    fn both_kernels(width: u32, height: u32) -> [PixelBuffer; 2] {
        [
            PixelBuffer::new(width, height).with_kernel(KernelKind::Scalar),
            PixelBuffer::new(width, height).with_kernel(KernelKind::Wide),
        ]
    }

    /// Every pixel outside `allowed` still equals the sentinel
    fn assert_untouched_outside(buffer: &PixelBuffer, allowed: Rect, sentinel: u32) {
        for y in 0..buffer.height() {
            for x in 0..buffer.width() {
                let p = Point::new(x as f32, y as f32);
                if !allowed.contains_pixel(p) {
                    assert_eq!(
                        buffer.color(p).map(Color::value),
                        Some(sentinel),
                        "pixel ({x}, {y}) outside clip was written"
                    );
                }
            }
        }
    }

    #[test]
    fn new_buffer_is_transparent() {
        let buffer = PixelBuffer::new(3, 2);
        assert_eq!(buffer.count(), 3 * 2 * 4);
        assert!(buffer.pixels().iter().all(|&p| p == 0));
        assert_eq!(buffer.clip_rect(), Rect::new(0.0, 0.0, 3.0, 2.0));
    }

    #[test]
    fn seeded_buffer_copies_pixels() {
        let seed = [1, 2, 3, 4];
        assert_eq!(PixelBuffer::from_pixels(2, 2, &seed).pixels(), &seed);
        // Wrong length leaves the buffer zeroed
        assert!(PixelBuffer::from_pixels(2, 2, &seed[..3])
            .pixels()
            .iter()
            .all(|&p| p == 0));
    }

    #[test]
    fn four_by_four_red_then_half_blue() {
        for mut buffer in both_kernels(4, 4) {
            buffer.clear(Color::TRANSPARENT);
            buffer.fill_rect(Color::RED, Rect::new(0.0, 0.0, 2.0, 2.0));
            buffer.apply_run(BLUE_50, 0, 4, 0);

            let row0: Vec<u32> = buffer.pixels()[..4].to_vec();
            assert_eq!(row0, vec![0xFF7F_007F, 0xFF7F_007F, 0x8000_007F, 0x8000_007F]);

            // Row 1 keeps the red square and transparent remainder
            assert_eq!(&buffer.pixels()[4..8], &[0xFFFF_0000, 0xFFFF_0000, 0, 0]);
            assert!(buffer.pixels()[8..].iter().all(|&p| p == 0));
        }
    }

    #[test]
    fn full_opacity_blend_is_idempotent() {
        let seed: Vec<u32> = (0..64u32).map(|i| i.wrapping_mul(0x0107_0B0D)).collect();
        let mut buffer = PixelBuffer::from_pixels(8, 8, &seed);
        let c = Color::rgba(10, 200, 30, 255);
        buffer.fill_rect(c, Rect::new(0.0, 0.0, 8.0, 8.0));
        assert!(buffer.pixels().iter().all(|&p| p == c.value()));
    }

    #[test]
    fn zero_alpha_blend_changes_nothing() {
        let seed: Vec<u32> = (0..64u32).map(|i| i.wrapping_mul(0x0F0F_1357)).collect();
        let mut buffer = PixelBuffer::from_pixels(8, 8, &seed);
        buffer.fill_rect(Color::rgba(255, 255, 255, 0), Rect::new(0.0, 0.0, 8.0, 8.0));
        buffer.apply_run_values(&[0x00FF_FFFF; 8], 0, 3);
        assert_eq!(buffer.pixels(), seed.as_slice());
    }

    #[test]
    fn fill_rect_reaches_the_right_edge() {
        let mut buffer = PixelBuffer::new(4, 1);
        buffer.fill_rect(Color::GREEN, Rect::new(0.0, 0.0, 10.0, 1.0));
        assert!(buffer.pixels().iter().all(|&p| p == Color::GREEN.value()));
    }

    #[test]
    fn clear_rect_ignores_existing_alpha() {
        let mut buffer = PixelBuffer::new(4, 4);
        buffer.clear(Color::WHITE);
        buffer.clear_rect(BLUE_50, Rect::new(1.0, 1.0, 2.0, 2.0));
        assert_eq!(buffer.color(Point::new(1.0, 1.0)), Some(BLUE_50));
        assert_eq!(buffer.color(Point::new(0.0, 0.0)), Some(Color::WHITE));
    }

    #[test]
    fn off_canvas_drawing_is_a_no_op() {
        let mut buffer = PixelBuffer::new(4, 4);
        buffer.draw_pixel(Color::RED, Point::new(-0.5, 1.0));
        buffer.draw_pixel(Color::RED, Point::new(4.0, 1.0));
        buffer.draw_pixel(Color::RED, Point::new(f32::NAN, 1.0));
        buffer.fill_rect(Color::RED, Rect::new(10.0, 10.0, 5.0, 5.0));
        buffer.fill_rect(Color::RED, Rect::new(0.0, 0.0, -3.0, 2.0));
        buffer.apply_run(Color::RED, 2, 1, 0);
        buffer.apply_run(Color::RED, 0, 4, 4);
        buffer.apply_run(Color::RED, 0, 4, -1);
        buffer.apply_run_values(&[0xFFFF_FFFF; 3], -3, 0);
        assert!(buffer.pixels().iter().all(|&p| p == 0));
    }

    #[test]
    fn per_pixel_run_stays_aligned_when_clipped() {
        let mut buffer = PixelBuffer::new(4, 1);
        buffer.apply_run_values(&[0xFF00_0001, 0xFF00_0002, 0xFF00_0003, 0xFF00_0004], -2, 0);
        assert_eq!(buffer.pixels(), &[0xFF00_0003, 0xFF00_0004, 0, 0]);

        let colors = [Color::RED, Color::GREEN, Color::BLUE];
        buffer.apply_run_colors(&colors, 2, 0);
        assert_eq!(
            buffer.pixels(),
            &[0xFF00_0003, 0xFF00_0004, Color::RED.value(), Color::GREEN.value()]
        );
    }

    #[test]
    fn clip_rect_never_exceeds_bounds() {
        let mut buffer = PixelBuffer::new(4, 4);
        buffer.set_clip_rect(Rect::new(-10.0, 2.0, 100.0, 100.0));
        assert_eq!(buffer.clip_rect(), Rect::new(0.0, 2.0, 4.0, 2.0));

        buffer.set_clip_rect(Rect::new(50.0, 50.0, 2.0, 2.0));
        assert_eq!(buffer.clip_rect().size.area(), 0.0);
        buffer.clear(Color::WHITE);
        assert!(buffer.pixels().iter().all(|&p| p == 0));

        buffer.clear_clip_rect();
        assert_eq!(buffer.clip_rect(), Rect::new(0.0, 0.0, 4.0, 4.0));
    }

    #[test]
    fn every_operation_respects_the_clip() {
        const SENTINEL: u32 = 0x1234_5678;
        let clip = Rect::new(2.0, 3.0, 5.0, 4.0);

        for kind in [KernelKind::Scalar, KernelKind::Wide] {
            let mut buffer =
                PixelBuffer::from_pixels(11, 9, &[SENTINEL; 99]).with_kernel(kind);
            buffer.set_clip_rect(clip);

            buffer.clear_rect(Color::WHITE, Rect::new(-5.0, -5.0, 30.0, 30.0));
            buffer.fill_rect(BLUE_50, Rect::new(0.0, 0.0, 11.0, 9.0));
            for line in -2..12 {
                buffer.apply_run(Color::RED, -4, 20, line);
                buffer.apply_run_values(&[0x80FF_00FF; 16], -3, line);
            }
            for y in -1..10 {
                for x in -1..12 {
                    buffer.draw_pixel(Color::GREEN, Point::new(x as f32, y as f32));
                }
            }
            buffer.draw_line(Color::BLACK, Point::new(-3.0, -2.0), Point::new(14.0, 12.0));
            buffer.draw_line(Color::BLACK, Point::new(0.0, 8.0), Point::new(10.0, 0.0));
            buffer.fill_circle(Color::RED, Point::new(5.0, 5.0), 6.0);
            buffer.draw_circle(Color::BLUE, Point::new(4.0, 4.0), 3.0);

            assert_untouched_outside(&buffer, clip, SENTINEL);
        }
    }

    #[test]
    fn scalar_and_wide_buffers_are_byte_identical() {
        let seed: Vec<u32> = (0..(13 * 7) as u32)
            .map(|i| i.wrapping_mul(0x9E37_79B9))
            .collect();
        let values: Vec<u32> = (0..13u32).map(|i| (i * 19) << 24 | 0x00AB_CDEF).collect();

        let mut scalar = PixelBuffer::from_pixels(13, 7, &seed).with_kernel(KernelKind::Scalar);
        let mut wide = PixelBuffer::from_pixels(13, 7, &seed).with_kernel(KernelKind::Wide);

        for buffer in [&mut scalar, &mut wide] {
            buffer.clear_rect(Color::from_value(0x4020_1008), Rect::new(1.0, 1.0, 9.0, 2.0));
            for line in 0..7 {
                buffer.apply_run(Color::from_value(0x7733_6699), line, 13 - line, line);
                buffer.apply_run_values(&values[line as usize..], line, line);
            }
            buffer.draw_line(Color::WHITE, Point::new(0.5, 6.5), Point::new(12.5, 0.25));
        }

        assert_eq!(scalar.as_bytes(), wide.as_bytes());
    }

    #[test]
    fn apply_mask_replaces_alpha_only() {
        let mut buffer = PixelBuffer::from_pixels(2, 1, &[0xFF11_2233, 0x0044_5566]);
        let mask = PixelBuffer::from_pixels(2, 1, &[0x0000_0040, 0xFFFF_FFFF]);
        buffer.apply_mask(&mask);
        assert_eq!(buffer.pixels(), &[0x4011_2233, 0xFF44_5566]);
    }

    #[test]
    fn apply_mask_size_mismatch_is_ignored() {
        let mut buffer = PixelBuffer::from_pixels(2, 1, &[0xFF11_2233, 0x0044_5566]);
        let mask = PixelBuffer::new(3, 1);
        buffer.apply_mask(&mask);
        assert_eq!(buffer.pixels(), &[0xFF11_2233, 0x0044_5566]);
    }

    #[test]
    fn bytes_follow_pixel_order() {
        let buffer = PixelBuffer::from_pixels(1, 1, &[0xAABB_CCDD]);
        assert_eq!(buffer.as_bytes(), &0xAABB_CCDDu32.to_ne_bytes());
    }
}
