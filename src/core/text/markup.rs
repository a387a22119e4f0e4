//! Text rendering service consumed by controls.
//!
//! Controls never interpret markup themselves: they ask a [`TextRenderer`] for ANSI lines at
//! a given width and turn each line into cells with [`TextRenderer::parse`]. Hosts with a
//! richer markup engine plug it in through the trait.

use std::fmt;

use unicode_segmentation::UnicodeSegmentation;

use crate::core::buffer::Cell;
use crate::core::style::Color;
use crate::core::text::ansi::{extract_ansi_code, parse_cells, AnsiCodeKind};
use crate::core::text::width::{grapheme_width, next_ansi_or_end, visible_width};

pub trait TextRenderer: fmt::Debug {
    /// Renders `text` into ANSI-encoded lines no wider than `width` columns. `height`
    /// caps the number of lines when present.
    fn render(&self, text: &str, width: usize, height: Option<usize>, background: Color)
        -> Vec<String>;

    fn visible_length(&self, line: &str) -> usize {
        visible_width(line)
    }

    fn parse(&self, line: &str, default_fg: Color, default_bg: Color) -> Vec<Cell> {
        parse_cells(line, default_fg, default_bg)
    }
}

/// Plain ANSI renderer: honors embedded SGR colors and word-wraps by visible width.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnsiTextRenderer;

impl TextRenderer for AnsiTextRenderer {
    fn render(
        &self,
        text: &str,
        width: usize,
        height: Option<usize>,
        background: Color,
    ) -> Vec<String> {
        let mut lines = wrap_text(text, width);
        if let Some(height) = height {
            lines.truncate(height);
        }
        let prefix = background_sgr(background);
        if !prefix.is_empty() {
            for line in &mut lines {
                line.insert_str(0, &prefix);
            }
        }
        lines
    }
}

/// SGR sequence selecting `color` as background; empty for the terminal default.
pub fn background_sgr(color: Color) -> String {
    match color {
        Color::Default => String::new(),
        Color::Indexed(index) if index < 8 => format!("\x1b[{}m", 40 + index as u16),
        Color::Indexed(index) if index < 16 => format!("\x1b[{}m", 100 + (index as u16 - 8)),
        Color::Indexed(index) => format!("\x1b[48;5;{index}m"),
        Color::Rgb(r, g, b) => format!("\x1b[48;2;{r};{g};{b}m"),
    }
}

/// SGR sequence selecting `color` as foreground; empty for the terminal default.
pub fn foreground_sgr(color: Color) -> String {
    match color {
        Color::Default => String::new(),
        Color::Indexed(index) if index < 8 => format!("\x1b[{}m", 30 + index as u16),
        Color::Indexed(index) if index < 16 => format!("\x1b[{}m", 90 + (index as u16 - 8)),
        Color::Indexed(index) => format!("\x1b[38;5;{index}m"),
        Color::Rgb(r, g, b) => format!("\x1b[38;2;{r};{g};{b}m"),
    }
}

/// Word-wraps ANSI text to `width` columns. Active SGR state is re-emitted at the start of
/// every continuation line so colors survive the break. Words longer than a line are split
/// by grapheme.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if text.is_empty() || width == 0 {
        return vec![String::new()];
    }

    let mut result = Vec::new();
    let mut active = ActiveSgr::default();
    for input_line in text.split('\n') {
        let line = format!("{}{}", active.prefix(), input_line);
        result.extend(wrap_single_line(&line, width));
        active.absorb(input_line);
    }
    result
        .into_iter()
        .map(|line| line.trim_end_matches(' ').to_string())
        .collect()
}

#[derive(Debug, Default, Clone)]
struct ActiveSgr {
    codes: String,
}

impl ActiveSgr {
    fn prefix(&self) -> &str {
        &self.codes
    }

    fn apply(&mut self, code: &str) {
        if code == "\x1b[0m" || code == "\x1b[m" {
            self.codes.clear();
        } else if code.ends_with('m') {
            self.codes.push_str(code);
        }
    }

    fn absorb(&mut self, text: &str) {
        let mut idx = 0;
        while idx < text.len() {
            if let Some(ansi) = extract_ansi_code(text, idx) {
                if ansi.kind == AnsiCodeKind::Csi {
                    self.apply(&ansi.code);
                }
                idx += ansi.length;
                continue;
            }
            idx = next_ansi_or_end(text, idx);
        }
    }
}

fn wrap_single_line(line: &str, width: usize) -> Vec<String> {
    if visible_width(line) <= width {
        return vec![line.to_string()];
    }

    let mut active = ActiveSgr::default();
    let mut wrapped = Vec::new();
    let mut current = String::new();
    let mut current_width = 0;

    for token in split_tokens(line) {
        let token_width = visible_width(&token);
        let is_whitespace = token_width > 0 && token.trim().is_empty();

        if token_width > width && !is_whitespace {
            if current_width > 0 {
                wrapped.push(std::mem::take(&mut current));
            }
            let mut pieces = break_long_word(&token, width, &mut active);
            current = pieces.pop().unwrap_or_default();
            current_width = visible_width(&current);
            wrapped.extend(pieces);
            continue;
        }

        if current_width + token_width > width && current_width > 0 {
            wrapped.push(std::mem::take(&mut current));
            current.push_str(active.prefix());
            current_width = 0;
            if is_whitespace {
                active.absorb(&token);
                continue;
            }
        }
        current.push_str(&token);
        current_width += token_width;
        active.absorb(&token);
    }

    if current_width > 0 || wrapped.is_empty() {
        wrapped.push(current);
    }
    wrapped
}

/// Splits into alternating word / space runs; escape sequences stick to the following run.
fn split_tokens(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_space = false;
    let mut idx = 0;

    while idx < text.len() {
        if let Some(ansi) = extract_ansi_code(text, idx) {
            current.push_str(&ansi.code);
            idx += ansi.length;
            continue;
        }
        let Some(ch) = text[idx..].chars().next() else {
            break;
        };
        let is_space = ch == ' ';
        if is_space != in_space && visible_width(&current) > 0 {
            tokens.push(std::mem::take(&mut current));
        }
        in_space = is_space;
        current.push(ch);
        idx += ch.len_utf8();
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

fn break_long_word(word: &str, width: usize, active: &mut ActiveSgr) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = active.prefix().to_string();
    let mut current_width = 0;
    let mut idx = 0;

    while idx < word.len() {
        if let Some(ansi) = extract_ansi_code(word, idx) {
            current.push_str(&ansi.code);
            if ansi.kind == AnsiCodeKind::Csi {
                active.apply(&ansi.code);
            }
            idx += ansi.length;
            continue;
        }
        let end = next_ansi_or_end(word, idx);
        for grapheme in word[idx..end].graphemes(true) {
            let grapheme_cols = grapheme_width(grapheme);
            if current_width + grapheme_cols > width && current_width > 0 {
                lines.push(std::mem::replace(&mut current, active.prefix().to_string()));
                current_width = 0;
            }
            current.push_str(grapheme);
            current_width += grapheme_cols;
        }
        idx = end;
    }
    lines.push(current);
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_one_line() {
        assert_eq!(wrap_text("hello", 10), vec!["hello"]);
    }

    #[test]
    fn wraps_on_spaces_without_leading_whitespace() {
        assert_eq!(wrap_text("word  word", 4), vec!["word", "word"]);
        assert_eq!(wrap_text("one two three", 7), vec!["one two", "three"]);
    }

    #[test]
    fn newlines_start_new_lines() {
        assert_eq!(wrap_text("a\nb", 10), vec!["a", "b"]);
    }

    #[test]
    fn long_words_split_by_grapheme() {
        assert_eq!(wrap_text("abcdefgh", 3), vec!["abc", "def", "gh"]);
    }

    #[test]
    fn colors_carry_over_wrapped_lines() {
        let lines = wrap_text("\x1b[31mword word", 4);
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("\x1b[31m"));
        let cells = AnsiTextRenderer.parse(&lines[1], Color::WHITE, Color::BLACK);
        assert_eq!(cells[0].fg, Color::RED);
    }

    #[test]
    fn render_caps_height_and_applies_background() {
        let lines = AnsiTextRenderer.render("a b c", 1, Some(2), Color::BLUE);
        assert_eq!(lines.len(), 2);
        let cells = AnsiTextRenderer.parse(&lines[0], Color::WHITE, Color::BLACK);
        assert_eq!(cells[0].bg, Color::BLUE);
    }

    #[test]
    fn visible_length_ignores_escapes() {
        assert_eq!(AnsiTextRenderer.visible_length("\x1b[1mbold\x1b[0m"), 4);
    }
}
