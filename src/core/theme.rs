//! Named theme colors with built-in fallbacks.
//!
//! Loading themes from disk is the host's business; the toolkit only needs lookups that
//! never fail. A missing name falls back to the built-in table, then to the caller's default.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::core::style::Color;

pub mod names {
    pub const WINDOW_FG: &str = "window.fg";
    pub const WINDOW_BG: &str = "window.bg";
    pub const BORDER_FG: &str = "border.fg";
    pub const BORDER_FOCUSED_FG: &str = "border.focused.fg";
    pub const BUTTON_FG: &str = "button.fg";
    pub const BUTTON_BG: &str = "button.bg";
    pub const BUTTON_FOCUSED_FG: &str = "button.focused.fg";
    pub const BUTTON_FOCUSED_BG: &str = "button.focused.bg";
    pub const BUTTON_DISABLED_FG: &str = "button.disabled.fg";
    pub const TAB_HEADER_FG: &str = "tab.header.fg";
    pub const TAB_HEADER_BG: &str = "tab.header.bg";
    pub const TAB_ACTIVE_FG: &str = "tab.active.fg";
    pub const TAB_ACTIVE_BG: &str = "tab.active.bg";
    pub const SCROLLBAR_TRACK_FG: &str = "scrollbar.track.fg";
    pub const SCROLLBAR_THUMB_FG: &str = "scrollbar.thumb.fg";
    pub const SPLITTER_FG: &str = "splitter.fg";
    pub const SPLITTER_FOCUSED_FG: &str = "splitter.focused.fg";
    pub const PROGRESS_FILLED_FG: &str = "progress.filled.fg";
    pub const PROGRESS_EMPTY_FG: &str = "progress.empty.fg";
    pub const MENU_FG: &str = "menu.fg";
    pub const MENU_BG: &str = "menu.bg";
    pub const MENU_SELECTED_FG: &str = "menu.selected.fg";
    pub const MENU_SELECTED_BG: &str = "menu.selected.bg";
    pub const MENU_DISABLED_FG: &str = "menu.disabled.fg";
    pub const LOG_ERROR_FG: &str = "log.error.fg";
    pub const LOG_WARN_FG: &str = "log.warn.fg";
    pub const LOG_INFO_FG: &str = "log.info.fg";
    pub const LOG_DEBUG_FG: &str = "log.debug.fg";
}

static BUILTIN_COLORS: Lazy<HashMap<&'static str, Color>> = Lazy::new(|| {
    use names::*;

    let mut map = HashMap::new();
    map.insert(WINDOW_FG, Color::WHITE);
    map.insert(WINDOW_BG, Color::BLACK);
    map.insert(BORDER_FG, Color::GRAY);
    map.insert(BORDER_FOCUSED_FG, Color::CYAN);
    map.insert(BUTTON_FG, Color::WHITE);
    map.insert(BUTTON_BG, Color::BLUE);
    map.insert(BUTTON_FOCUSED_FG, Color::BLACK);
    map.insert(BUTTON_FOCUSED_BG, Color::CYAN);
    map.insert(BUTTON_DISABLED_FG, Color::GRAY);
    map.insert(TAB_HEADER_FG, Color::GRAY);
    map.insert(TAB_HEADER_BG, Color::BLACK);
    map.insert(TAB_ACTIVE_FG, Color::BRIGHT_WHITE);
    map.insert(TAB_ACTIVE_BG, Color::BLUE);
    map.insert(SCROLLBAR_TRACK_FG, Color::GRAY);
    map.insert(SCROLLBAR_THUMB_FG, Color::BRIGHT_WHITE);
    map.insert(SPLITTER_FG, Color::GRAY);
    map.insert(SPLITTER_FOCUSED_FG, Color::YELLOW);
    map.insert(PROGRESS_FILLED_FG, Color::GREEN);
    map.insert(PROGRESS_EMPTY_FG, Color::GRAY);
    map.insert(MENU_FG, Color::BLACK);
    map.insert(MENU_BG, Color::WHITE);
    map.insert(MENU_SELECTED_FG, Color::BRIGHT_WHITE);
    map.insert(MENU_SELECTED_BG, Color::BLUE);
    map.insert(MENU_DISABLED_FG, Color::GRAY);
    map.insert(LOG_ERROR_FG, Color::RED);
    map.insert(LOG_WARN_FG, Color::YELLOW);
    map.insert(LOG_INFO_FG, Color::WHITE);
    map.insert(LOG_DEBUG_FG, Color::GRAY);
    map
});

#[derive(Debug, Clone, Default)]
pub struct Theme {
    overrides: HashMap<String, Color>,
}

impl Theme {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, color: Color) {
        self.overrides.insert(name.into(), color);
    }

    pub fn remove(&mut self, name: &str) -> Option<Color> {
        self.overrides.remove(name)
    }

    /// Override first, then the built-in table.
    pub fn lookup(&self, name: &str) -> Option<Color> {
        self.overrides
            .get(name)
            .copied()
            .or_else(|| BUILTIN_COLORS.get(name).copied())
    }

    pub fn color_or(&self, name: &str, fallback: Color) -> Color {
        self.lookup(name).unwrap_or(fallback)
    }
}
