//! Environment configuration.

use std::env;
use std::time::Duration;

pub const DEFAULT_DOUBLE_CLICK_MS: u64 = 500;
pub const DEFAULT_TICK_MS: u64 = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolkitConfig {
    /// Maximum gap between two presses that still counts as a double click.
    pub double_click_threshold: Duration,
    /// Default scrollbar visibility for new scrollable panels.
    pub show_scrollbars: bool,
    pub debug_layout: bool,
    /// Tick interval granted to animated controls.
    pub tick_interval: Duration,
}

impl Default for ToolkitConfig {
    fn default() -> Self {
        Self {
            double_click_threshold: Duration::from_millis(DEFAULT_DOUBLE_CLICK_MS),
            show_scrollbars: true,
            debug_layout: false,
            tick_interval: Duration::from_millis(DEFAULT_TICK_MS),
        }
    }
}

impl ToolkitConfig {
    pub fn from_env() -> Self {
        Self {
            double_click_threshold: Duration::from_millis(env_millis(
                "TAPE_WIDGETS_DOUBLE_CLICK_MS",
                DEFAULT_DOUBLE_CLICK_MS,
            )),
            show_scrollbars: !env_flag("TAPE_WIDGETS_HIDE_SCROLLBARS"),
            debug_layout: env_flag("TAPE_WIDGETS_DEBUG_LAYOUT"),
            tick_interval: Duration::from_millis(env_millis("TAPE_WIDGETS_TICK_MS", DEFAULT_TICK_MS)),
        }
    }
}

fn env_flag(key: &str) -> bool {
    env::var(key).map(|value| value == "1").unwrap_or(false)
}

fn env_string_opt(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        if value.trim().is_empty() {
            None
        } else {
            Some(value)
        }
    })
}

fn env_millis(key: &str, default: u64) -> u64 {
    match env_string_opt(key) {
        Some(value) => match value.trim().parse::<u64>() {
            Ok(millis) if millis > 0 => millis,
            _ => {
                tracing::warn!(key, value = %value, "ignoring invalid millisecond value");
                default
            }
        },
        None => default,
    }
}
