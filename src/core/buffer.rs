//! Character buffer: a grid of (glyph, fg, bg) cells with clipped writes.

use unicode_width::UnicodeWidthChar;

use crate::core::geometry::{LayoutRect, Point};
use crate::core::style::{Color, ColorPair};

/// Placeholder glyph for the trailing half of a double-width character.
pub const CONTINUATION: char = '\0';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    pub ch: char,
    pub fg: Color,
    pub bg: Color,
}

impl Cell {
    pub const fn new(ch: char, fg: Color, bg: Color) -> Self {
        Self { ch, fg, bg }
    }

    pub const fn blank(colors: ColorPair) -> Self {
        Self::new(' ', colors.fg, colors.bg)
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::new(' ', Color::Default, Color::Default)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl CharacterBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::default(); width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn bounds(&self) -> LayoutRect {
        LayoutRect::new(0, 0, self.width as i32, self.height as i32)
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        if self.width == width && self.height == height {
            return;
        }
        self.width = width;
        self.height = height;
        self.cells = vec![Cell::default(); width * height];
    }

    pub fn clear(&mut self, colors: ColorPair) {
        self.cells.fill(Cell::blank(colors));
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 {
            return None;
        }
        let (x, y) = (x as usize, y as usize);
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y * self.width + x)
    }

    pub fn get(&self, x: i32, y: i32) -> Option<&Cell> {
        self.index(x, y).map(|idx| &self.cells[idx])
    }

    /// Writes one cell; silently dropped outside the buffer.
    pub fn set_cell(&mut self, x: i32, y: i32, cell: Cell) {
        if let Some(idx) = self.index(x, y) {
            self.cells[idx] = cell;
        }
    }

    /// Writes one cell only when it falls inside `clip`.
    pub fn set_cell_clipped(&mut self, x: i32, y: i32, cell: Cell, clip: &LayoutRect) {
        if clip.contains(Point::new(x, y)) {
            self.set_cell(x, y, cell);
        }
    }

    pub fn fill_rect(&mut self, rect: &LayoutRect, cell: Cell) {
        let area = rect.intersect(&self.bounds());
        for y in area.y..area.bottom() {
            for x in area.x..area.right() {
                self.set_cell(x, y, cell);
            }
        }
    }

    /// Writes a run of pre-parsed cells starting at `(x, y)`, keeping only the part inside
    /// `clip`. A double-width glyph whose halves straddle the clip edge is replaced with a
    /// blank so no half-glyph is left behind.
    pub fn write_cells_clipped(&mut self, x: i32, y: i32, cells: &[Cell], clip: &LayoutRect) {
        if y < clip.y || y >= clip.bottom() {
            return;
        }
        for (offset, cell) in cells.iter().enumerate() {
            let cx = x + offset as i32;
            if cx >= clip.right() {
                break;
            }
            if cx < clip.x {
                continue;
            }
            let wide = cell.ch != CONTINUATION && UnicodeWidthChar::width(cell.ch).unwrap_or(1) > 1;
            let orphan_tail = cell.ch == CONTINUATION && cx == clip.x;
            if (wide && cx + 1 >= clip.right()) || orphan_tail {
                self.set_cell(cx, y, Cell::new(' ', cell.fg, cell.bg));
                continue;
            }
            self.set_cell(cx, y, *cell);
        }
    }

    /// Writes plain text (no escape processing) in a single color pair.
    pub fn write_str_clipped(
        &mut self,
        x: i32,
        y: i32,
        text: &str,
        colors: ColorPair,
        clip: &LayoutRect,
    ) {
        let mut cells = Vec::with_capacity(text.len());
        for ch in text.chars() {
            let width = UnicodeWidthChar::width(ch).unwrap_or(0);
            if width == 0 {
                continue;
            }
            cells.push(Cell::new(ch, colors.fg, colors.bg));
            if width > 1 {
                cells.push(Cell::new(CONTINUATION, colors.fg, colors.bg));
            }
        }
        self.write_cells_clipped(x, y, &cells, clip);
    }

    /// Plain text of one row with continuation cells removed.
    pub fn row_text(&self, y: usize) -> String {
        if y >= self.height {
            return String::new();
        }
        self.cells[y * self.width..(y + 1) * self.width]
            .iter()
            .filter(|cell| cell.ch != CONTINUATION)
            .map(|cell| cell.ch)
            .collect()
    }

    pub fn to_plain_lines(&self) -> Vec<String> {
        (0..self.height).map(|y| self.row_text(y)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn colors() -> ColorPair {
        ColorPair::new(Color::WHITE, Color::BLACK)
    }

    #[test]
    fn new_buffer_is_blank() {
        let buffer = CharacterBuffer::new(4, 2);
        assert_eq!(buffer.to_plain_lines(), vec!["    ", "    "]);
    }

    #[test]
    fn writes_outside_clip_are_dropped() {
        let mut buffer = CharacterBuffer::new(10, 1);
        let clip = LayoutRect::new(2, 0, 3, 1);
        buffer.write_str_clipped(0, 0, "ABCDEFGH", colors(), &clip);
        assert_eq!(buffer.row_text(0), "  CDE     ");
    }

    #[test]
    fn fill_rect_is_bounded_by_buffer() {
        let mut buffer = CharacterBuffer::new(3, 3);
        buffer.fill_rect(&LayoutRect::new(-2, 1, 10, 1), Cell::new('#', Color::RED, Color::BLACK));
        assert_eq!(buffer.to_plain_lines(), vec!["   ", "###", "   "]);
    }

    #[test]
    fn wide_glyph_straddling_clip_edge_is_blanked() {
        let mut buffer = CharacterBuffer::new(4, 1);
        let clip = LayoutRect::new(0, 0, 2, 1);
        buffer.write_str_clipped(1, 0, "你", colors(), &clip);
        assert_eq!(buffer.get(1, 0).map(|cell| cell.ch), Some(' '));
    }

    #[test]
    fn negative_origin_rows_are_clipped() {
        let mut buffer = CharacterBuffer::new(4, 2);
        let clip = buffer.bounds();
        buffer.write_str_clipped(0, -1, "hidden", colors(), &clip);
        buffer.write_str_clipped(-2, 1, "xyab", colors(), &clip);
        assert_eq!(buffer.to_plain_lines(), vec!["    ", "ab  "]);
    }
}
