//! Software rasterisation into a [`PixelBuffer`].

use sparkle_engine::{PixelBuffer, Rgba};

/// Draws a line with Bresenham's algorithm, clipped to the buffer.
pub fn line(buf: &mut PixelBuffer, from: (i32, i32), to: (i32, i32), color: Rgba) {
    let (w, h) = (buf.width() as i32, buf.height() as i32);
    let ((x0, y0), (x1, y1)) = (from, to);

    // Skip lines whose bounding box misses the buffer entirely.
    if x0.max(x1) < 0 || y0.max(y1) < 0 || x0.min(x1) >= w || y0.min(y1) >= h {
        return;
    }

    let dx = (x1 as i64 - x0 as i64).abs();
    let dy = -(y1 as i64 - y0 as i64).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };

    let (mut x, mut y) = (x0, y0);
    let mut err = dx + dy;
    loop {
        buf.blend(x, y, color);
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

/// Fills a triangle, sampling at pixel centres. Winding does not matter.
pub fn fill_triangle(buf: &mut PixelBuffer, pts: [(f32, f32); 3], color: Rgba) {
    let [a, b, c] = pts;
    let area = edge(a, b, c);
    if area == 0.0 || !area.is_finite() {
        return;
    }

    let (w, h) = (buf.width() as f32, buf.height() as f32);
    let min_x = a.0.min(b.0).min(c.0).floor().max(0.0);
    let min_y = a.1.min(b.1).min(c.1).floor().max(0.0);
    let max_x = a.0.max(b.0).max(c.0).ceil().min(w);
    let max_y = a.1.max(b.1).max(c.1).ceil().min(h);

    for y in min_y as i32..max_y as i32 {
        for x in min_x as i32..max_x as i32 {
            let p = (x as f32 + 0.5, y as f32 + 0.5);
            let (w0, w1, w2) = (edge(b, c, p), edge(c, a, p), edge(a, b, p));
            let inside = if area > 0.0 {
                w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0
            } else {
                w0 <= 0.0 && w1 <= 0.0 && w2 <= 0.0
            };
            if inside {
                buf.blend(x, y, color);
            }
        }
    }
}

fn edge(a: (f32, f32), b: (f32, f32), p: (f32, f32)) -> f32 {
    (b.0 - a.0) * (p.1 - a.1) - (b.1 - a.1) * (p.0 - a.0)
}

#[cfg(test)]
mod tests {
    use sparkle_engine::Size;

    use super::*;

    fn buffer(w: u32, h: u32) -> PixelBuffer {
        PixelBuffer::try_new(Size::new(w, h)).unwrap()
    }

    fn lit(buf: &PixelBuffer) -> usize {
        buf.pixels().iter().filter(|p| p.a > 0).count()
    }

    #[test]
    fn line_covers_both_endpoints() {
        let mut buf = buffer(10, 10);
        line(&mut buf, (1, 1), (8, 4), Rgba::WHITE);
        assert_eq!(buf.get(1, 1), Some(Rgba::WHITE));
        assert_eq!(buf.get(8, 4), Some(Rgba::WHITE));
        // One pixel per column on a shallow line.
        assert_eq!(lit(&buf), 8);
    }

    #[test]
    fn line_is_clipped() {
        let mut buf = buffer(4, 4);
        line(&mut buf, (-5, 1), (10, 1), Rgba::WHITE);
        assert_eq!(lit(&buf), 4);

        let mut buf = buffer(4, 4);
        line(&mut buf, (-10, -10), (-1, -3), Rgba::WHITE);
        assert_eq!(lit(&buf), 0);
    }

    #[test]
    fn triangle_fills_interior_in_either_winding() {
        for pts in [
            [(0.0, 0.0), (8.0, 0.0), (0.0, 8.0)],
            [(0.0, 0.0), (0.0, 8.0), (8.0, 0.0)],
        ] {
            let mut buf = buffer(8, 8);
            fill_triangle(&mut buf, pts, Rgba::WHITE);
            assert_eq!(buf.get(1, 1), Some(Rgba::WHITE));
            assert_eq!(buf.get(7, 7), Some(Rgba::TRANSPARENT));
            assert_eq!(lit(&buf), 36);
        }
    }

    #[test]
    fn triangle_is_clipped_and_degenerate_is_skipped() {
        let mut buf = buffer(4, 4);
        fill_triangle(&mut buf, [(-100.0, -100.0), (100.0, -100.0), (0.0, 100.0)], Rgba::WHITE);
        assert_eq!(lit(&buf), 16);

        let mut buf = buffer(4, 4);
        fill_triangle(&mut buf, [(0.0, 0.0), (2.0, 2.0), (4.0, 4.0)], Rgba::WHITE);
        assert_eq!(lit(&buf), 0);
    }
}
