use crate::buffer::{AllocError, PixelBuffer, Rgba};
use crate::coords::{Rect, Size};
use crate::time::{FrameClock, FrameTime};

use super::glyphs::{self, GLYPH_HEIGHT, GLYPH_WIDTH};

const SCALE: u32 = 2;
const SPACING: u32 = 2;
const PADDING: u32 = 4;
const MARGIN: i32 = 4;
/// Longest label: "9999 FPS".
const MAX_CHARS: u32 = 8;
const MAX_FPS: u32 = 9999;

const ADVANCE: u32 = GLYPH_WIDTH * SCALE + SPACING;
const TILE_WIDTH: u32 = PADDING * 2 + MAX_CHARS * ADVANCE - SPACING;
const TILE_HEIGHT: u32 = PADDING * 2 + GLYPH_HEIGHT * SCALE;

/// Frames-per-second overlay.
///
/// Created when a session starts and dropped when it stops; the draw loop
/// ticks it once per frame and composites [`Diagnostics::render`] at
/// [`Diagnostics::placement`].
pub struct Diagnostics {
    clock: FrameClock,
    tile: PixelBuffer,
    backdrop: Rgba,
    ink: Rgba,
}

impl Diagnostics {
    pub fn new() -> Result<Self, AllocError> {
        Ok(Self {
            clock: FrameClock::new(),
            tile: PixelBuffer::try_new(Size::new(TILE_WIDTH, TILE_HEIGHT))?,
            backdrop: Rgba::premultiplied(0, 0, 0, 160),
            ink: Rgba::WHITE,
        })
    }

    pub fn tick(&mut self) -> FrameTime {
        self.clock.tick()
    }

    pub fn fps(&self) -> f32 {
        self.clock.fps()
    }

    pub fn label(&self) -> String {
        let fps = self.fps().round().clamp(0.0, MAX_FPS as f32) as u32;
        format!("{fps} FPS")
    }

    /// Draws the current label into the overlay tile.
    pub fn render(&mut self) -> &PixelBuffer {
        let label = self.label();
        self.render_text(&label);
        &self.tile
    }

    fn render_text(&mut self, text: &str) {
        self.tile.fill(self.backdrop);

        let mut x = PADDING;
        for c in text.chars().take(MAX_CHARS as usize) {
            if let Some(rows) = glyphs::glyph(c) {
                for (cx, cy) in glyphs::lit_cells(rows) {
                    let cell = Rect::new(
                        (x + cx * SCALE) as i32,
                        (PADDING + cy * SCALE) as i32,
                        SCALE,
                        SCALE,
                    );
                    self.tile.fill_rect(cell, self.ink);
                }
            }
            x += ADVANCE;
        }
    }

    /// Where the tile goes in a window of `window` size; `None` when the
    /// window is too small to hold it.
    pub fn placement(&self, window: Size) -> Option<Rect> {
        let dst = Rect::new(MARGIN, MARGIN, TILE_WIDTH, TILE_HEIGHT);
        let fits = dst.intersect(&Rect::from_size(window)) == Some(dst);
        fits.then_some(dst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_fits_longest_label() {
        let d = Diagnostics::new().unwrap();
        assert_eq!(d.tile.size(), Size::new(70, 18));
        assert_eq!(d.label(), "0 FPS");
    }

    #[test]
    fn render_draws_ink_over_backdrop() {
        let mut d = Diagnostics::new().unwrap();
        d.render_text("1");

        // Top cell of '1' is the middle column.
        let px = PADDING as i32 + SCALE as i32;
        assert_eq!(d.tile.get(px, PADDING as i32), Some(Rgba::WHITE));
        assert_eq!(d.tile.get(PADDING as i32, PADDING as i32), Some(d.backdrop));
        assert_eq!(d.tile.get(0, 0), Some(d.backdrop));
    }

    #[test]
    fn placement_requires_room() {
        let d = Diagnostics::new().unwrap();
        assert_eq!(d.placement(Size::new(32, 32)), None);
        assert_eq!(
            d.placement(Size::new(640, 480)),
            Some(Rect::new(MARGIN, MARGIN, TILE_WIDTH, TILE_HEIGHT))
        );
    }

    #[test]
    fn label_tracks_clock() {
        let mut d = Diagnostics::new().unwrap();
        let start = std::time::Instant::now();
        d.clock.reset();
        d.clock.tick_at(start + std::time::Duration::from_secs(1));
        assert_eq!(d.label(), "4 FPS");
    }
}
