use bytemuck::{Pod, Zeroable};

use crate::coords::{Rect, Size};

use super::AllocError;

/// One RGBA8 pixel, premultiplied alpha.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash, Pod, Zeroable)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);
    pub const BLACK: Rgba = Rgba::opaque(0, 0, 0);
    pub const WHITE: Rgba = Rgba::opaque(255, 255, 255);

    #[inline]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    #[inline]
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Premultiplies a straight-alpha colour.
    pub fn premultiplied(r: u8, g: u8, b: u8, a: u8) -> Self {
        let mul = |c: u8| ((c as u16 * a as u16 + 127) / 255) as u8;
        Self::new(mul(r), mul(g), mul(b), a)
    }

    /// Composites `self` over `dst` (both premultiplied).
    pub fn over(self, dst: Rgba) -> Rgba {
        let inv = 255 - self.a as u16;
        let blend = |s: u8, d: u8| (s as u16 + (d as u16 * inv + 127) / 255).min(255) as u8;
        Rgba::new(
            blend(self.r, dst.r),
            blend(self.g, dst.g),
            blend(self.b, dst.b),
            blend(self.a, dst.a),
        )
    }

    /// Channels as `0.0..=1.0` floats, in RGBA order.
    pub fn to_f64(self) -> [f64; 4] {
        [self.r, self.g, self.b, self.a].map(|c| c as f64 / 255.0)
    }
}

/// CPU-addressable RGBA surface.
///
/// Rows are tightly packed (`width * 4` bytes). Contents are premultiplied so
/// the surface provider can composite them with "over" blending directly.
#[derive(Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    size: Size,
    pixels: Vec<Rgba>,
}

impl PixelBuffer {
    /// Allocates a zeroed (transparent) buffer, reporting allocator failure
    /// instead of aborting.
    pub fn try_new(size: Size) -> Result<Self, AllocError> {
        if size.is_empty() {
            return Err(AllocError::Empty { size });
        }

        let len = size
            .area()
            .filter(|n| n.checked_mul(4).is_some_and(|b| b <= isize::MAX as usize))
            .ok_or(AllocError::TooLarge { size, limit: u32::MAX })?;

        let mut pixels = Vec::new();
        pixels
            .try_reserve_exact(len)
            .map_err(|_| AllocError::OutOfMemory { size })?;
        pixels.resize(len, Rgba::TRANSPARENT);

        Ok(Self { size, pixels })
    }

    #[inline]
    pub fn size(&self) -> Size {
        self.size
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.size.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.size.height
    }

    /// Full extent as a rectangle at the origin.
    #[inline]
    pub fn bounds(&self) -> Rect {
        Rect::from_size(self.size)
    }

    /// Bytes per row (no padding).
    #[inline]
    pub fn stride(&self) -> u32 {
        self.size.width * 4
    }

    pub fn pixels(&self) -> &[Rgba] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [Rgba] {
        &mut self.pixels
    }

    /// Raw RGBA bytes, row-major.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        bytemuck::cast_slice_mut(&mut self.pixels)
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as u32 >= self.size.width || y as u32 >= self.size.height {
            return None;
        }
        Some(y as usize * self.size.width as usize + x as usize)
    }

    pub fn get(&self, x: i32, y: i32) -> Option<Rgba> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    /// Writes one pixel; out-of-bounds writes are dropped.
    pub fn set(&mut self, x: i32, y: i32, color: Rgba) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = color;
        }
    }

    /// Composites `color` over the pixel at `(x, y)`; out-of-bounds is dropped.
    pub fn blend(&mut self, x: i32, y: i32, color: Rgba) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = color.over(self.pixels[i]);
        }
    }

    pub fn fill(&mut self, color: Rgba) {
        self.pixels.fill(color);
    }

    /// Fills `rect` clipped to the buffer.
    pub fn fill_rect(&mut self, rect: Rect, color: Rgba) {
        let Some(clip) = rect.intersect(&self.bounds()) else { return };
        let w = self.size.width as usize;
        for y in clip.y as usize..clip.y as usize + clip.height as usize {
            let start = y * w + clip.x as usize;
            self.pixels[start..start + clip.width as usize].fill(color);
        }
    }

    /// Copies `src` with its top-left at `(x, y)`, compositing "over" and
    /// clipping to this buffer.
    pub fn draw_over(&mut self, src: &PixelBuffer, x: i32, y: i32) {
        let dst_rect = Rect::new(x, y, src.width(), src.height());
        let Some(clip) = dst_rect.intersect(&self.bounds()) else { return };

        for row in 0..clip.height as i32 {
            for col in 0..clip.width as i32 {
                let (dx, dy) = (clip.x + col, clip.y + row);
                if let Some(p) = src.get(dx - x, dy - y) {
                    self.blend(dx, dy, p);
                }
            }
        }
    }
}

impl std::fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixelBuffer").field("size", &self.size).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_buffer_is_transparent_and_sized() {
        let buf = PixelBuffer::try_new(Size::new(4, 3)).unwrap();
        assert_eq!(buf.size(), Size::new(4, 3));
        assert_eq!(buf.pixels().len(), 12);
        assert_eq!(buf.as_bytes().len(), 48);
        assert_eq!(buf.stride(), 16);
        assert!(buf.pixels().iter().all(|p| *p == Rgba::TRANSPARENT));
    }

    #[test]
    fn empty_size_is_rejected() {
        let err = PixelBuffer::try_new(Size::new(0, 10)).unwrap_err();
        assert_eq!(err, AllocError::Empty { size: Size::new(0, 10) });
    }

    #[test]
    fn set_and_get_are_bounds_checked() {
        let mut buf = PixelBuffer::try_new(Size::new(2, 2)).unwrap();
        buf.set(1, 1, Rgba::WHITE);
        buf.set(2, 0, Rgba::WHITE);
        buf.set(-1, 0, Rgba::WHITE);
        assert_eq!(buf.get(1, 1), Some(Rgba::WHITE));
        assert_eq!(buf.get(2, 0), None);
        assert_eq!(buf.pixels().iter().filter(|p| **p == Rgba::WHITE).count(), 1);
    }

    #[test]
    fn bytes_are_rgba_row_major() {
        let mut buf = PixelBuffer::try_new(Size::new(2, 1)).unwrap();
        buf.set(1, 0, Rgba::new(1, 2, 3, 4));
        assert_eq!(buf.as_bytes(), &[0, 0, 0, 0, 1, 2, 3, 4]);
    }

    #[test]
    fn fill_rect_clips() {
        let mut buf = PixelBuffer::try_new(Size::new(4, 4)).unwrap();
        buf.fill_rect(Rect::new(2, 2, 10, 10), Rgba::WHITE);
        assert_eq!(buf.pixels().iter().filter(|p| **p == Rgba::WHITE).count(), 4);
        assert_eq!(buf.get(1, 1), Some(Rgba::TRANSPARENT));
        assert_eq!(buf.get(3, 3), Some(Rgba::WHITE));
    }

    #[test]
    fn over_opaque_replaces_and_transparent_keeps() {
        let dst = Rgba::opaque(10, 20, 30);
        assert_eq!(Rgba::WHITE.over(dst), Rgba::WHITE);
        assert_eq!(Rgba::TRANSPARENT.over(dst), dst);
    }

    #[test]
    fn premultiplied_half_alpha() {
        let c = Rgba::premultiplied(255, 0, 100, 128);
        assert_eq!(c, Rgba::new(128, 0, 50, 128));
    }

    #[test]
    fn draw_over_clips_to_destination() {
        let mut dst = PixelBuffer::try_new(Size::new(4, 4)).unwrap();
        let mut src = PixelBuffer::try_new(Size::new(3, 3)).unwrap();
        src.fill(Rgba::WHITE);
        dst.draw_over(&src, 2, -1);
        assert_eq!(dst.get(2, 0), Some(Rgba::WHITE));
        assert_eq!(dst.get(3, 1), Some(Rgba::WHITE));
        assert_eq!(dst.get(2, 2), Some(Rgba::TRANSPARENT));
        assert_eq!(dst.get(1, 0), Some(Rgba::TRANSPARENT));
    }
}
