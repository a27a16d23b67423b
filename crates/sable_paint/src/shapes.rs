//! Circles

use sable_core::{Color, Point, Rect};

use crate::buffer::PixelBuffer;

impl PixelBuffer {
    /// Rounded center and radius, or `None` when the circle can't touch the buffer
    ///
    /// Values stay in `f64` so radii far beyond the buffer size never
    /// overflow integer math.
    fn circle_params(&self, center: Point, radius: f32) -> Option<(f64, f64, f64)> {
        if !center.is_finite() || !radius.is_finite() || radius <= 0.0 {
            return None;
        }
        let extended = Rect::new(
            -radius,
            -radius,
            self.width() as f32 + radius * 2.0,
            self.height() as f32 + radius * 2.0,
        );
        if !extended.contains(center) {
            return None;
        }
        Some((
            (center.x as f64).round(),
            (center.y as f64).round(),
            (radius as f64).round().max(1.0),
        ))
    }

    /// Circle outline, one pixel wide
    ///
    /// Each octant offset `y` picks `x` by midpoint rounding of
    /// `sqrt(r² - y²)`. Only offsets that can land on a clipped row or column
    /// are visited, so the work is bounded by the clip size, not the radius.
    pub fn draw_circle(&mut self, color: Color, center: Point, radius: f32) {
        let Some((cx, cy, r)) = self.circle_params(center, radius) else {
            return;
        };

        let mut offsets: Vec<f64> = self
            .clip_rows()
            .map(|row| (row as f64 - cy).abs())
            .chain(self.clip_columns().map(|col| (col as f64 - cx).abs()))
            .filter(|&y| y <= r)
            .collect();
        offsets.sort_unstable_by(f64::total_cmp);
        offsets.dedup();

        for y in offsets {
            let x = ((r * r - y * y).sqrt() + 0.5).floor();
            if x < y {
                continue;
            }
            let mut octants = [
                (cx + x, cy + y),
                (cx + y, cy + x),
                (cx - y, cy + x),
                (cx - x, cy + y),
                (cx - x, cy - y),
                (cx - y, cy - x),
                (cx + y, cy - x),
                (cx + x, cy - y),
            ]
            .map(|(px, py)| (px as i64, py as i64));
            // Octants collapse on the axes and diagonals; blend each pixel once
            octants.sort_unstable();
            let mut previous = None;
            for p in octants {
                if previous != Some(p) {
                    self.apply_run(color, p.0, p.0.saturating_add(1), p.1);
                    previous = Some(p);
                }
            }
        }
    }

    /// Filled circle, one run per clipped row
    pub fn fill_circle(&mut self, color: Color, center: Point, radius: f32) {
        let Some((cx, cy, r)) = self.circle_params(center, radius) else {
            return;
        };
        for line in self.clip_rows() {
            let dy = line as f64 - cy;
            if dy.abs() > r {
                continue;
            }
            let half = (r * r - dy * dy).sqrt().floor();
            self.apply_run(color, (cx - half) as i64, (cx + half + 1.0) as i64, line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filled_circle_is_symmetric() {
        let mut buffer = PixelBuffer::new(11, 11);
        buffer.fill_circle(Color::RED, Point::new(5.0, 5.0), 4.0);
        let px = |x: u32, y: u32| buffer.pixels()[(y * 11 + x) as usize];
        assert_eq!(px(5, 5), Color::RED.value());
        assert_eq!(px(1, 5), Color::RED.value());
        assert_eq!(px(9, 5), Color::RED.value());
        assert_eq!(px(5, 1), Color::RED.value());
        assert_eq!(px(0, 5), 0);
        assert_eq!(px(1, 1), 0);
    }

    #[test]
    fn outline_blends_each_pixel_once() {
        let mut buffer = PixelBuffer::new(9, 9);
        let half_white = Color::WHITE.with_alpha(0x80);
        buffer.draw_circle(half_white, Point::new(4.0, 4.0), 3.0);
        // A double blend would raise alpha above a single pass
        let once = crate::kernel::blend(0, half_white.value());
        assert!(buffer.pixels().iter().all(|&p| p == 0 || p == once));
        assert_eq!(buffer.pixels()[4 * 9 + 7], once);
        // Center stays empty
        assert_eq!(buffer.pixels()[4 * 9 + 4], 0);
    }

    #[test]
    fn distant_circles_are_skipped() {
        let mut buffer = PixelBuffer::new(8, 8);
        buffer.fill_circle(Color::RED, Point::new(40.0, 40.0), 3.0);
        buffer.draw_circle(Color::RED, Point::new(-10.0, 4.0), 2.0);
        buffer.fill_circle(Color::RED, Point::new(4.0, 4.0), 0.0);
        buffer.fill_circle(Color::RED, Point::new(4.0, 4.0), f32::NAN);
        assert!(buffer.pixels().iter().all(|&p| p == 0));
    }

    #[test]
    fn huge_radius_draws_only_the_visible_arc() {
        let mut buffer = PixelBuffer::new(8, 8);
        buffer.fill_circle(Color::RED, Point::new(4.0, 4.0), 4e9);
        assert!(buffer.pixels().iter().all(|&p| p == Color::RED.value()));

        let mut buffer = PixelBuffer::new(8, 8);
        buffer.draw_circle(Color::RED, Point::new(4.0, 4.0), 4e9);
        assert!(buffer.pixels().iter().all(|&p| p == 0));

        // Center one radius above the buffer; the bottom of the circle is row 2
        let mut buffer = PixelBuffer::new(8, 8);
        buffer.draw_circle(Color::RED, Point::new(4.0, -1e6 + 2.0), 1e6);
        assert_eq!(buffer.pixels()[2 * 8 + 4], Color::RED.value());
        assert_eq!(buffer.pixels()[3 * 8 + 4], 0);
        assert_eq!(buffer.pixels()[4], 0);
    }

    #[test]
    fn outline_matches_small_circle_rasterization() {
        let mut buffer = PixelBuffer::new(9, 9);
        buffer.draw_circle(Color::RED, Point::new(4.0, 4.0), 3.0);
        let lit: Vec<(usize, usize)> = (0..81)
            .filter(|&i| buffer.pixels()[i] != 0)
            .map(|i| (i % 9, i / 9))
            .collect();
        assert_eq!(lit.len(), 16);
        for (x, y) in [(7, 4), (7, 5), (6, 6), (5, 7), (4, 7), (1, 4), (4, 1), (2, 2)] {
            assert!(lit.contains(&(x, y)), "missing ({}, {})", x, y);
        }
    }

    #[test]
    fn partially_visible_circle_is_clipped() {
        let mut buffer = PixelBuffer::new(8, 8);
        buffer.fill_circle(Color::GREEN, Point::new(-2.0, 4.0), 4.0);
        assert_eq!(buffer.pixels()[4 * 8], Color::GREEN.value());
        assert_eq!(buffer.pixels()[4 * 8 + 3], 0);
    }
}
