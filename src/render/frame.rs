//! Immutable snapshot of a painted buffer.
//!
//! A `Frame` groups each buffer row into runs of identically colored cells. Hosts hand the
//! frame to their terminal driver; tests compare its plain text.

use crate::core::buffer::{CharacterBuffer, CONTINUATION};
use crate::core::style::Color;
use crate::core::text::markup::{background_sgr, foreground_sgr};

/// A contiguous run of cells sharing one color pair.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Span {
    text: String,
    fg: Color,
    bg: Color,
}

impl Span {
    pub fn new(text: String, fg: Color, bg: Color) -> Self {
        Self { text, fg, bg }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn fg(&self) -> Color {
        self.fg
    }

    pub fn bg(&self) -> Color {
        self.bg
    }
}

/// A single painted row.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Line {
    spans: Vec<Span>,
}

impl Line {
    pub fn new(spans: Vec<Span>) -> Self {
        Self { spans }
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn plain_text(&self) -> String {
        self.spans.iter().map(Span::as_str).collect()
    }

    /// Row encoded with SGR color changes, terminated by a reset.
    pub fn to_ansi(&self) -> String {
        let mut out = String::new();
        for span in &self.spans {
            out.push_str("\x1b[0m");
            out.push_str(&foreground_sgr(span.fg));
            out.push_str(&background_sgr(span.bg));
            out.push_str(&span.text);
        }
        if !self.spans.is_empty() {
            out.push_str("\x1b[0m");
        }
        out
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Frame {
    width: usize,
    lines: Vec<Line>,
}

impl Frame {
    pub fn from_buffer(buffer: &CharacterBuffer) -> Self {
        let mut lines = Vec::with_capacity(buffer.height());
        for y in 0..buffer.height() {
            let mut spans: Vec<Span> = Vec::new();
            for x in 0..buffer.width() {
                let Some(cell) = buffer.get(x as i32, y as i32) else {
                    continue;
                };
                if cell.ch == CONTINUATION {
                    continue;
                }
                match spans.last_mut() {
                    Some(span) if span.fg == cell.fg && span.bg == cell.bg => span.text.push(cell.ch),
                    _ => spans.push(Span::new(cell.ch.to_string(), cell.fg, cell.bg)),
                }
            }
            lines.push(Line::new(spans));
        }
        Self {
            width: buffer.width(),
            lines,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn into_strings(self) -> Vec<String> {
        self.lines.iter().map(Line::plain_text).collect()
    }

    pub fn to_ansi_strings(&self) -> Vec<String> {
        self.lines.iter().map(Line::to_ansi).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::buffer::Cell;
    use crate::core::geometry::LayoutRect;
    use crate::core::style::ColorPair;

    #[test]
    fn spans_split_on_color_changes() {
        let mut buffer = CharacterBuffer::new(4, 1);
        buffer.clear(ColorPair::new(Color::WHITE, Color::BLACK));
        buffer.set_cell(2, 0, Cell::new('x', Color::RED, Color::BLACK));

        let frame = Frame::from_buffer(&buffer);
        let spans = frame.lines()[0].spans();
        assert_eq!(spans.len(), 3);
        assert_eq!(spans[1].as_str(), "x");
        assert_eq!(spans[1].fg(), Color::RED);
        assert_eq!(frame.into_strings(), vec!["  x "]);
    }

    #[test]
    fn wide_glyph_tails_are_dropped_from_text() {
        let mut buffer = CharacterBuffer::new(3, 1);
        let clip = buffer.bounds();
        buffer.write_str_clipped(0, 0, "你a", ColorPair::default(), &clip);
        assert_eq!(Frame::from_buffer(&buffer).into_strings(), vec!["你a"]);
    }

    #[test]
    fn ansi_rows_carry_colors() {
        let mut buffer = CharacterBuffer::new(1, 1);
        buffer.fill_rect(&LayoutRect::new(0, 0, 1, 1), Cell::new('#', Color::RED, Color::BLUE));
        let rows = Frame::from_buffer(&buffer).to_ansi_strings();
        assert_eq!(rows[0], "\x1b[0m\x1b[31m\x1b[44m#\x1b[0m");
    }
}
