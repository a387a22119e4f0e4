//! ANSI escape extraction and SGR color tracking.
//!
//! Only the color subset of SGR matters to cell painting; other attributes are consumed
//! and ignored.

use unicode_segmentation::UnicodeSegmentation;

use crate::core::buffer::{Cell, CONTINUATION};
use crate::core::style::Color;
use crate::core::text::width::grapheme_width;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnsiCodeKind {
    Csi,
    Osc,
    Apc,
    Dcs,
    Ss3,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnsiCode {
    pub code: String,
    pub length: usize,
    pub kind: AnsiCodeKind,
}

pub fn extract_ansi_code(input: &str, pos: usize) -> Option<AnsiCode> {
    let bytes = input.as_bytes();
    if pos >= bytes.len() || bytes[pos] != 0x1b {
        return None;
    }
    if pos + 1 >= bytes.len() {
        return None;
    }

    match bytes[pos + 1] {
        b'[' => extract_csi(input, pos),
        b']' => extract_string_terminated(input, pos, AnsiCodeKind::Osc),
        b'_' => extract_string_terminated(input, pos, AnsiCodeKind::Apc),
        b'P' => extract_string_terminated(input, pos, AnsiCodeKind::Dcs),
        b'O' => extract_ss3(input, pos),
        _ => None,
    }
}

fn extract_csi(input: &str, pos: usize) -> Option<AnsiCode> {
    let bytes = input.as_bytes();
    let mut idx = pos + 2;
    while idx < bytes.len() {
        if (0x40..=0x7e).contains(&bytes[idx]) {
            let end = idx + 1;
            return Some(AnsiCode {
                code: input[pos..end].to_string(),
                length: end - pos,
                kind: AnsiCodeKind::Csi,
            });
        }
        idx += 1;
    }
    None
}

fn extract_ss3(input: &str, pos: usize) -> Option<AnsiCode> {
    if pos + 2 >= input.len() {
        return None;
    }
    let end = pos + 3;
    Some(AnsiCode {
        code: input.get(pos..end)?.to_string(),
        length: end - pos,
        kind: AnsiCodeKind::Ss3,
    })
}

fn extract_string_terminated(input: &str, pos: usize, kind: AnsiCodeKind) -> Option<AnsiCode> {
    let bytes = input.as_bytes();
    let mut idx = pos + 2;
    while idx < bytes.len() {
        if bytes[idx] == 0x07 {
            let end = idx + 1;
            return Some(AnsiCode {
                code: input[pos..end].to_string(),
                length: end - pos,
                kind,
            });
        }
        if bytes[idx] == 0x1b && idx + 1 < bytes.len() && bytes[idx + 1] == b'\\' {
            let end = idx + 2;
            return Some(AnsiCode {
                code: input[pos..end].to_string(),
                length: end - pos,
                kind,
            });
        }
        idx += 1;
    }
    None
}

/// Current foreground/background as SGR sequences are applied.
#[derive(Debug, Clone, Copy)]
pub struct SgrColorState {
    default_fg: Color,
    default_bg: Color,
    pub fg: Color,
    pub bg: Color,
    inverse: bool,
}

impl SgrColorState {
    pub fn new(default_fg: Color, default_bg: Color) -> Self {
        Self {
            default_fg,
            default_bg,
            fg: default_fg,
            bg: default_bg,
            inverse: false,
        }
    }

    /// Effective colors after inverse video.
    pub fn colors(&self) -> (Color, Color) {
        if self.inverse {
            (self.bg, self.fg)
        } else {
            (self.fg, self.bg)
        }
    }

    pub fn process(&mut self, ansi_code: &str) {
        let Some(params) = ansi_code
            .strip_prefix("\x1b[")
            .and_then(|rest| rest.strip_suffix('m'))
        else {
            return;
        };

        if params.is_empty() {
            self.reset();
            return;
        }

        let parts: Vec<u16> = params
            .split(';')
            .map(|part| part.parse::<u16>().unwrap_or(0))
            .collect();
        let mut idx = 0;
        while idx < parts.len() {
            let code = parts[idx];
            if code == 38 || code == 48 {
                if let Some((color, consumed)) = extended_color(&parts[idx + 1..]) {
                    if code == 38 {
                        self.fg = color;
                    } else {
                        self.bg = color;
                    }
                    idx += 1 + consumed;
                    continue;
                }
            }

            match code {
                0 => self.reset(),
                7 => self.inverse = true,
                27 => self.inverse = false,
                39 => self.fg = self.default_fg,
                49 => self.bg = self.default_bg,
                30..=37 => self.fg = Color::Indexed((code - 30) as u8),
                90..=97 => self.fg = Color::Indexed((code - 90 + 8) as u8),
                40..=47 => self.bg = Color::Indexed((code - 40) as u8),
                100..=107 => self.bg = Color::Indexed((code - 100 + 8) as u8),
                _ => {}
            }
            idx += 1;
        }
    }

    fn reset(&mut self) {
        self.fg = self.default_fg;
        self.bg = self.default_bg;
        self.inverse = false;
    }
}

fn extended_color(parts: &[u16]) -> Option<(Color, usize)> {
    match parts.first()? {
        5 => {
            let index = *parts.get(1)?;
            Some((Color::Indexed(index.min(255) as u8), 2))
        }
        2 => {
            let r = *parts.get(1)?;
            let g = *parts.get(2)?;
            let b = *parts.get(3)?;
            Some((
                Color::Rgb(r.min(255) as u8, g.min(255) as u8, b.min(255) as u8),
                4,
            ))
        }
        _ => None,
    }
}

/// Converts one ANSI-encoded line to cells. Wide graphemes are followed by a
/// [`CONTINUATION`] cell; tabs expand to three spaces.
pub fn parse_cells(line: &str, default_fg: Color, default_bg: Color) -> Vec<Cell> {
    let mut cells = Vec::with_capacity(line.len());
    let mut state = SgrColorState::new(default_fg, default_bg);
    let mut idx = 0;
    let mut run_start = 0;

    while idx < line.len() {
        if let Some(code) = extract_ansi_code(line, idx) {
            push_run(&line[run_start..idx], &state, &mut cells);
            if code.kind == AnsiCodeKind::Csi {
                state.process(&code.code);
            }
            idx += code.length;
            run_start = idx;
            continue;
        }
        let Some(ch) = line[idx..].chars().next() else {
            break;
        };
        idx += ch.len_utf8();
    }
    push_run(&line[run_start..], &state, &mut cells);
    cells
}

fn push_run(run: &str, state: &SgrColorState, cells: &mut Vec<Cell>) {
    if run.is_empty() {
        return;
    }
    let (fg, bg) = state.colors();
    for grapheme in run.graphemes(true) {
        if grapheme == "\t" {
            for _ in 0..3 {
                cells.push(Cell::new(' ', fg, bg));
            }
            continue;
        }
        let width = grapheme_width(grapheme);
        if width == 0 {
            continue;
        }
        let ch = grapheme.chars().next().unwrap_or(' ');
        cells.push(Cell::new(ch, fg, bg));
        for _ in 1..width {
            cells.push(Cell::new(CONTINUATION, fg, bg));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_csi_and_osc_sequences() {
        let csi = extract_ansi_code("\x1b[31mred", 0).expect("csi");
        assert_eq!(csi.kind, AnsiCodeKind::Csi);
        assert_eq!(csi.length, 5);

        let osc = extract_ansi_code("\x1b]8;;https://x\x07link", 0).expect("osc");
        assert_eq!(osc.kind, AnsiCodeKind::Osc);
        assert_eq!(&osc.code, "\x1b]8;;https://x\x07");
    }

    #[test]
    fn parse_applies_basic_and_extended_colors() {
        let cells = parse_cells(
            "a\x1b[31mb\x1b[38;5;200mc\x1b[48;2;1;2;3md\x1b[0me",
            Color::WHITE,
            Color::BLACK,
        );
        let text: String = cells.iter().map(|cell| cell.ch).collect();
        assert_eq!(text, "abcde");
        assert_eq!(cells[0].fg, Color::WHITE);
        assert_eq!(cells[1].fg, Color::RED);
        assert_eq!(cells[2].fg, Color::Indexed(200));
        assert_eq!(cells[3].bg, Color::Rgb(1, 2, 3));
        assert_eq!(cells[4].fg, Color::WHITE);
        assert_eq!(cells[4].bg, Color::BLACK);
    }

    #[test]
    fn bright_colors_map_to_upper_palette() {
        let cells = parse_cells("\x1b[91;104mx", Color::Default, Color::Default);
        assert_eq!(cells[0].fg, Color::Indexed(9));
        assert_eq!(cells[0].bg, Color::Indexed(12));
    }

    #[test]
    fn inverse_swaps_colors() {
        let cells = parse_cells("\x1b[7mx\x1b[27my", Color::WHITE, Color::BLACK);
        assert_eq!((cells[0].fg, cells[0].bg), (Color::BLACK, Color::WHITE));
        assert_eq!((cells[1].fg, cells[1].bg), (Color::WHITE, Color::BLACK));
    }

    #[test]
    fn wide_glyphs_emit_continuation_cells() {
        let cells = parse_cells("你a", Color::Default, Color::Default);
        assert_eq!(cells.len(), 3);
        assert_eq!(cells[1].ch, CONTINUATION);
        assert_eq!(cells[2].ch, 'a');
    }
}
