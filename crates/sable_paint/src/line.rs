//! Anti-aliased lines (Xiaolin Wu)

use sable_core::{Color, Point, Rect};

use crate::buffer::PixelBuffer;

#[inline]
fn fpart(v: f32) -> f32 {
    v - v.floor()
}

#[inline]
fn rfpart(v: f32) -> f32 {
    1.0 - fpart(v)
}

/// Sign of the z component of `(b - a) x (c - a)`
fn orientation(a: Point, b: Point, c: Point) -> f32 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

fn on_segment(a: Point, b: Point, p: Point) -> bool {
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}

fn segments_cross(p1: Point, p2: Point, q1: Point, q2: Point) -> bool {
    let d1 = orientation(q1, q2, p1);
    let d2 = orientation(q1, q2, p2);
    let d3 = orientation(p1, p2, q1);
    let d4 = orientation(p1, p2, q2);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }
    (d1 == 0.0 && on_segment(q1, q2, p1))
        || (d2 == 0.0 && on_segment(q1, q2, p2))
        || (d3 == 0.0 && on_segment(p1, p2, q1))
        || (d4 == 0.0 && on_segment(p1, p2, q2))
}

/// True when the segment has an endpoint inside `bounds` or crosses one of its edges
pub(crate) fn segment_touches(bounds: &Rect, from: Point, to: Point) -> bool {
    if bounds.contains(from) || bounds.contains(to) {
        return true;
    }
    let tl = bounds.origin;
    let tr = Point::new(bounds.max_x(), bounds.y());
    let bl = Point::new(bounds.x(), bounds.max_y());
    let br = Point::new(bounds.max_x(), bounds.max_y());
    [(tl, tr), (tr, br), (br, bl), (bl, tl)]
        .into_iter()
        .any(|(a, b)| segments_cross(from, to, a, b))
}

impl PixelBuffer {
    fn plot_coverage(&mut self, color: Color, steep: bool, x: f32, y: f32, coverage: f32) {
        if coverage <= 0.0 {
            return;
        }
        let alpha = (color.alpha() as f32 * coverage.min(1.0)) as u8;
        let point = if steep {
            Point::new(y, x)
        } else {
            Point::new(x, y)
        };
        self.draw_pixel(color.with_alpha(alpha), point);
    }

    /// Draw a one pixel wide anti-aliased line
    ///
    /// Coverage is applied by scaling the color's alpha, and each pixel goes
    /// through [`PixelBuffer::draw_pixel`] so the clip rect is honored.
    pub fn draw_line(&mut self, color: Color, from: Point, to: Point) {
        if !from.is_finite() || !to.is_finite() {
            return;
        }
        let bounds = Rect::new(0.0, 0.0, self.width() as f32, self.height() as f32);
        if !segment_touches(&bounds, from, to) {
            return;
        }

        let (mut x0, mut y0, mut x1, mut y1) = (from.x, from.y, to.x, to.y);
        let steep = (y1 - y0).abs() > (x1 - x0).abs();
        if steep {
            std::mem::swap(&mut x0, &mut y0);
            std::mem::swap(&mut x1, &mut y1);
        }
        if x0 > x1 {
            std::mem::swap(&mut x0, &mut x1);
            std::mem::swap(&mut y0, &mut y1);
        }

        let dx = x1 - x0;
        let gradient = if dx == 0.0 { 1.0 } else { (y1 - y0) / dx };

        // First end-cap
        let xend = x0.round();
        let yend = y0 + gradient * (xend - x0);
        let xgap = rfpart(x0 + 0.5);
        let xpxl1 = xend;
        let ypxl1 = yend.floor();
        self.plot_coverage(color, steep, xpxl1, ypxl1, rfpart(yend) * xgap);
        self.plot_coverage(color, steep, xpxl1, ypxl1 + 1.0, fpart(yend) * xgap);

        // Second end-cap
        let xend = x1.round();
        let yend = y1 + gradient * (xend - x1);
        let xgap = fpart(x1 + 0.5);
        let xpxl2 = xend;
        let ypxl2 = yend.floor();
        if xpxl2 != xpxl1 {
            self.plot_coverage(color, steep, xpxl2, ypxl2, rfpart(yend) * xgap);
            self.plot_coverage(color, steep, xpxl2, ypxl2 + 1.0, fpart(yend) * xgap);
        }

        // Interior, limited to the buffer extent along the major axis
        let extent = if steep { self.height() } else { self.width() } as f32;
        let first = (xpxl1 + 1.0).max(0.0);
        let last = xpxl2.min(extent);
        let mut x = first;
        while x < last {
            let intery = y0 + gradient * (x - x0);
            let y = intery.floor();
            self.plot_coverage(color, steep, x, y, rfpart(intery));
            self.plot_coverage(color, steep, x, y + 1.0, fpart(intery));
            x += 1.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn painted(buffer: &PixelBuffer) -> usize {
        buffer.pixels().iter().filter(|&&p| p != 0).count()
    }

    #[test]
    fn horizontal_line_covers_its_row() {
        let mut buffer = PixelBuffer::new(8, 4);
        buffer.draw_line(Color::WHITE, Point::new(1.0, 2.0), Point::new(6.0, 2.0));
        for x in 1..=6 {
            let px = buffer.color(Point::new(x as f32, 2.0)).map(Color::value);
            assert_ne!(px, Some(0), "column {x} not drawn");
        }
        // Nothing above the line
        assert!(buffer.pixels()[..8].iter().all(|&p| p == 0));
    }

    #[test]
    fn steep_line_walks_rows() {
        let mut buffer = PixelBuffer::new(4, 10);
        buffer.draw_line(Color::WHITE, Point::new(1.0, 1.0), Point::new(2.0, 8.0));
        for y in 2..8 {
            let row = &buffer.pixels()[y * 4..y * 4 + 4];
            assert!(row.iter().any(|&p| p != 0), "row {y} not drawn");
        }
    }

    #[test]
    fn fully_off_canvas_line_draws_nothing() {
        let mut buffer = PixelBuffer::new(8, 8);
        buffer.draw_line(Color::WHITE, Point::new(-10.0, -5.0), Point::new(-1.0, 20.0));
        buffer.draw_line(Color::WHITE, Point::new(20.0, 0.0), Point::new(30.0, 7.0));
        buffer.draw_line(Color::WHITE, Point::new(f32::NAN, 0.0), Point::new(3.0, 3.0));
        assert_eq!(painted(&buffer), 0);
    }

    #[test]
    fn line_crossing_the_canvas_is_drawn() {
        let mut buffer = PixelBuffer::new(8, 8);
        buffer.draw_line(Color::WHITE, Point::new(-100.0, 4.0), Point::new(100.0, 4.0));
        assert!(painted(&buffer) >= 8);
    }

    #[test]
    fn segment_edge_test() {
        let bounds = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(segment_touches(&bounds, Point::new(5.0, 5.0), Point::new(50.0, 50.0)));
        assert!(segment_touches(&bounds, Point::new(-5.0, 5.0), Point::new(15.0, 5.0)));
        assert!(!segment_touches(&bounds, Point::new(-5.0, -5.0), Point::new(-1.0, 20.0)));
        assert!(!segment_touches(&bounds, Point::new(11.0, 0.0), Point::new(20.0, 10.0)));
    }
}
