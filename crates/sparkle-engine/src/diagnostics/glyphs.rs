//! 3×5 bitmap glyphs for the overlay label.
//!
//! Each row is three bits, most significant bit leftmost.

pub(super) const GLYPH_WIDTH: u32 = 3;
pub(super) const GLYPH_HEIGHT: u32 = 5;

pub(super) fn glyph(c: char) -> Option<[u8; 5]> {
    let rows = match c {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'F' => [0b111, 0b100, 0b110, 0b100, 0b100],
        'P' => [0b110, 0b101, 0b110, 0b100, 0b100],
        'S' => [0b011, 0b100, 0b010, 0b001, 0b110],
        ' ' => [0; 5],
        _ => return None,
    };
    Some(rows)
}

/// Iterates the lit cells of `rows` as `(column, row)`.
pub(super) fn lit_cells(rows: [u8; 5]) -> impl Iterator<Item = (u32, u32)> {
    (0..GLYPH_HEIGHT).flat_map(move |y| {
        (0..GLYPH_WIDTH)
            .filter(move |x| rows[y as usize] & (0b100 >> x) != 0)
            .map(move |x| (x, y))
    })
}
