//! Scrollbar painting. Geometry comes from the caller; this module only draws.

use crate::core::buffer::{Cell, CharacterBuffer};
use crate::core::geometry::{to_i32, LayoutRect};
use crate::core::style::Color;

pub const TRACK_GLYPH: char = '│';
pub const THUMB_GLYPH: char = '█';
pub const HORIZONTAL_TRACK_GLYPH: char = '─';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollbarColors {
    pub track: Color,
    pub thumb: Color,
    pub background: Color,
}

/// Paints a one-column vertical scrollbar occupying `track` (width is ignored beyond the
/// first column). `thumb` is `(offset, length)` within the track.
pub fn paint_vertical(
    buffer: &mut CharacterBuffer,
    track: &LayoutRect,
    thumb: (usize, usize),
    colors: ScrollbarColors,
    clip: &LayoutRect,
) {
    if track.is_empty() {
        return;
    }
    let (thumb_start, thumb_len) = (to_i32(thumb.0), to_i32(thumb.1));
    for row in 0..track.height {
        let in_thumb = row >= thumb_start && row < thumb_start + thumb_len;
        let cell = if in_thumb {
            Cell::new(THUMB_GLYPH, colors.thumb, colors.background)
        } else {
            Cell::new(TRACK_GLYPH, colors.track, colors.background)
        };
        buffer.set_cell_clipped(track.x, track.y + row, cell, clip);
    }
}

/// Paints a one-row horizontal scrollbar.
pub fn paint_horizontal(
    buffer: &mut CharacterBuffer,
    track: &LayoutRect,
    thumb: (usize, usize),
    colors: ScrollbarColors,
    clip: &LayoutRect,
) {
    if track.is_empty() {
        return;
    }
    let (thumb_start, thumb_len) = (to_i32(thumb.0), to_i32(thumb.1));
    for col in 0..track.width {
        let in_thumb = col >= thumb_start && col < thumb_start + thumb_len;
        let cell = if in_thumb {
            Cell::new(THUMB_GLYPH, colors.thumb, colors.background)
        } else {
            Cell::new(HORIZONTAL_TRACK_GLYPH, colors.track, colors.background)
        };
        buffer.set_cell_clipped(track.x + col, track.y, cell, clip);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn colors() -> ScrollbarColors {
        ScrollbarColors {
            track: Color::GRAY,
            thumb: Color::WHITE,
            background: Color::BLACK,
        }
    }

    #[test]
    fn vertical_thumb_is_drawn_at_offset() {
        let mut buffer = CharacterBuffer::new(1, 5);
        let clip = buffer.bounds();
        paint_vertical(&mut buffer, &LayoutRect::new(0, 0, 1, 5), (1, 2), colors(), &clip);
        assert_eq!(buffer.to_plain_lines(), vec!["│", "█", "█", "│", "│"]);
    }

    #[test]
    fn horizontal_bar_respects_clip() {
        let mut buffer = CharacterBuffer::new(4, 1);
        let clip = LayoutRect::new(0, 0, 3, 1);
        paint_horizontal(&mut buffer, &LayoutRect::new(0, 0, 4, 1), (2, 2), colors(), &clip);
        assert_eq!(buffer.row_text(0), "──█ ");
    }
}
