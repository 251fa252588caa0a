use super::Size;

/// Axis-aligned pixel rectangle (top-left origin).
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    #[inline]
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Rectangle anchored at the origin covering `size`.
    #[inline]
    pub const fn from_size(size: Size) -> Self {
        Self::new(0, 0, size.width, size.height)
    }

    #[inline]
    pub const fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    #[inline]
    fn right(&self) -> i64 {
        self.x as i64 + self.width as i64
    }

    #[inline]
    fn bottom(&self) -> i64 {
        self.y as i64 + self.height as i64
    }

    /// Returns true if the pixel at `(x, y)` lies inside (right/bottom exclusive).
    pub fn contains(&self, x: i32, y: i32) -> bool {
        let (x, y) = (x as i64, y as i64);
        x >= self.x as i64 && y >= self.y as i64 && x < self.right() && y < self.bottom()
    }

    /// Overlap of two rectangles, or `None` if they do not overlap.
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let x0 = (self.x as i64).max(other.x as i64);
        let y0 = (self.y as i64).max(other.y as i64);
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());

        if x1 <= x0 || y1 <= y0 {
            return None;
        }

        Some(Rect::new(x0 as i32, y0 as i32, (x1 - x0) as u32, (y1 - y0) as u32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(x: i32, y: i32, w: u32, h: u32) -> Rect {
        Rect::new(x, y, w, h)
    }

    #[test]
    fn contains_is_right_bottom_exclusive() {
        let rect = r(0, 0, 10, 10);
        assert!(rect.contains(0, 0));
        assert!(rect.contains(9, 9));
        assert!(!rect.contains(10, 9));
        assert!(!rect.contains(9, 10));
        assert!(!rect.contains(-1, 0));
    }

    #[test]
    fn intersect_clips_to_overlap() {
        let a = r(0, 0, 100, 50);
        let b = r(90, 40, 30, 30);
        assert_eq!(a.intersect(&b), Some(r(90, 40, 10, 10)));
    }

    #[test]
    fn intersect_handles_negative_origin() {
        let screen = Rect::from_size(Size::new(64, 64));
        assert_eq!(r(-8, -8, 16, 16).intersect(&screen), Some(r(0, 0, 8, 8)));
    }

    #[test]
    fn touching_edges_do_not_intersect() {
        assert_eq!(r(0, 0, 10, 10).intersect(&r(10, 0, 5, 5)), None);
    }
}
