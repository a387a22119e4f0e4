//! Box-drawing borders.

use crate::core::buffer::{Cell, CharacterBuffer};
use crate::core::geometry::LayoutRect;
use crate::core::style::{BorderStyle, ColorPair};
use crate::core::text::width::fit_plain;

/// Draws a border on the outermost ring of `rect`, clipped to `clip`. An optional title is
/// written into the top edge after the corner, truncated to fit. Rectangles smaller than
/// 2x2 have no room for a border and are left untouched.
pub fn draw_border(
    buffer: &mut CharacterBuffer,
    rect: &LayoutRect,
    style: BorderStyle,
    colors: ColorPair,
    clip: &LayoutRect,
    title: Option<&str>,
) {
    if rect.width < 2 || rect.height < 2 {
        return;
    }
    let glyphs = style.glyphs();
    let cell = |ch: char| Cell::new(ch, colors.fg, colors.bg);
    let (left, top) = (rect.x, rect.y);
    let (right, bottom) = (rect.right() - 1, rect.bottom() - 1);

    for x in left + 1..right {
        buffer.set_cell_clipped(x, top, cell(glyphs.horizontal), clip);
        buffer.set_cell_clipped(x, bottom, cell(glyphs.horizontal), clip);
    }
    for y in top + 1..bottom {
        buffer.set_cell_clipped(left, y, cell(glyphs.vertical), clip);
        buffer.set_cell_clipped(right, y, cell(glyphs.vertical), clip);
    }
    buffer.set_cell_clipped(left, top, cell(glyphs.top_left), clip);
    buffer.set_cell_clipped(right, top, cell(glyphs.top_right), clip);
    buffer.set_cell_clipped(left, bottom, cell(glyphs.bottom_left), clip);
    buffer.set_cell_clipped(right, bottom, cell(glyphs.bottom_right), clip);

    if let Some(title) = title.filter(|title| !title.is_empty()) {
        let room = (rect.width - 4).max(0) as usize;
        if room == 0 {
            return;
        }
        let label = format!(" {} ", fit_plain(title, room.saturating_sub(2)));
        let title_clip = clip.intersect(&LayoutRect::new(left + 1, top, rect.width - 2, 1));
        buffer.write_str_clipped(left + 1, top, &label, colors, &title_clip);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::style::Color;

    #[test]
    fn single_border_outlines_rect() {
        let mut buffer = CharacterBuffer::new(4, 3);
        let clip = buffer.bounds();
        draw_border(
            &mut buffer,
            &LayoutRect::new(0, 0, 4, 3),
            BorderStyle::Single,
            ColorPair::new(Color::WHITE, Color::BLACK),
            &clip,
            None,
        );
        assert_eq!(buffer.to_plain_lines(), vec!["┌──┐", "│  │", "└──┘"]);
    }

    #[test]
    fn title_is_truncated_inside_top_edge() {
        let mut buffer = CharacterBuffer::new(10, 2);
        let clip = buffer.bounds();
        draw_border(
            &mut buffer,
            &LayoutRect::new(0, 0, 10, 2),
            BorderStyle::Rounded,
            ColorPair::default(),
            &clip,
            Some("Settings"),
        );
        assert_eq!(buffer.row_text(0), "╭ Set… ──╮");
    }

    #[test]
    fn border_respects_clip() {
        let mut buffer = CharacterBuffer::new(4, 3);
        let clip = LayoutRect::new(0, 0, 2, 3);
        draw_border(
            &mut buffer,
            &LayoutRect::new(0, 0, 4, 3),
            BorderStyle::Double,
            ColorPair::default(),
            &clip,
            None,
        );
        assert_eq!(buffer.to_plain_lines(), vec!["╔═  ", "║   ", "╚═  "]);
    }
}
