//! Navigation keybindings.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::core::input::KeyEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavigationAction {
    FocusNext,
    FocusPrevious,
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    PageUp,
    PageDown,
    Home,
    End,
    Activate,
    Cancel,
    NextTab,
    PreviousTab,
    ResizeLeft,
    ResizeRight,
    ResizeLeftLarge,
    ResizeRightLarge,
}

pub type KeyId = String;

#[derive(Debug, Clone)]
pub enum KeyBinding {
    Single(KeyId),
    Multiple(Vec<KeyId>),
}

impl From<&str> for KeyBinding {
    fn from(value: &str) -> Self {
        KeyBinding::Single(value.to_string())
    }
}

impl From<Vec<&str>> for KeyBinding {
    fn from(value: Vec<&str>) -> Self {
        KeyBinding::Multiple(value.into_iter().map(|item| item.to_string()).collect())
    }
}

#[derive(Debug, Clone, Default)]
pub struct KeybindingsConfig {
    entries: HashMap<NavigationAction, KeyBinding>,
}

impl KeybindingsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set<K: Into<KeyBinding>>(&mut self, action: NavigationAction, keys: K) {
        self.entries.insert(action, keys.into());
    }
}

pub static DEFAULT_NAVIGATION_KEYBINDINGS: Lazy<HashMap<NavigationAction, Vec<KeyId>>> =
    Lazy::new(|| {
        use NavigationAction::*;

        let mut map = HashMap::new();
        map.insert(FocusNext, vec!["tab".to_string()]);
        map.insert(FocusPrevious, vec!["shift+tab".to_string()]);
        map.insert(MoveUp, vec!["up".to_string()]);
        map.insert(MoveDown, vec!["down".to_string()]);
        map.insert(MoveLeft, vec!["left".to_string()]);
        map.insert(MoveRight, vec!["right".to_string()]);
        map.insert(PageUp, vec!["pageUp".to_string()]);
        map.insert(PageDown, vec!["pageDown".to_string()]);
        map.insert(Home, vec!["home".to_string(), "ctrl+home".to_string()]);
        map.insert(End, vec!["end".to_string(), "ctrl+end".to_string()]);
        map.insert(Activate, vec!["enter".to_string(), "space".to_string()]);
        map.insert(Cancel, vec!["escape".to_string()]);
        map.insert(NextTab, vec!["ctrl+pageDown".to_string()]);
        map.insert(PreviousTab, vec!["ctrl+pageUp".to_string()]);
        map.insert(ResizeLeft, vec!["left".to_string()]);
        map.insert(ResizeRight, vec!["right".to_string()]);
        map.insert(ResizeLeftLarge, vec!["shift+left".to_string()]);
        map.insert(ResizeRightLarge, vec!["shift+right".to_string()]);
        map
    });

/// Resolved action -> keys table, defaults overlaid with user overrides.
#[derive(Debug, Clone)]
pub struct NavigationKeymap {
    action_to_keys: HashMap<NavigationAction, Vec<KeyEvent>>,
}

impl Default for NavigationKeymap {
    fn default() -> Self {
        Self::new(KeybindingsConfig::default())
    }
}

impl NavigationKeymap {
    pub fn new(config: KeybindingsConfig) -> Self {
        let mut keymap = Self {
            action_to_keys: HashMap::new(),
        };
        keymap.build_maps(&config);
        keymap
    }

    fn build_maps(&mut self, config: &KeybindingsConfig) {
        self.action_to_keys.clear();

        for (action, keys) in DEFAULT_NAVIGATION_KEYBINDINGS.iter() {
            self.action_to_keys.insert(*action, parse_keys(keys));
        }

        for (action, binding) in config.entries.iter() {
            let key_list = match binding {
                KeyBinding::Single(key) => vec![key.clone()],
                KeyBinding::Multiple(keys) => keys.clone(),
            };
            self.action_to_keys.insert(*action, parse_keys(&key_list));
        }
    }

    pub fn matches(&self, key: &KeyEvent, action: NavigationAction) -> bool {
        self.action_to_keys
            .get(&action)
            .is_some_and(|keys| keys.contains(key))
    }

    pub fn get_keys(&self, action: NavigationAction) -> Vec<KeyEvent> {
        self.action_to_keys.get(&action).cloned().unwrap_or_default()
    }

    pub fn set_config(&mut self, config: KeybindingsConfig) {
        self.build_maps(&config);
    }
}

fn parse_keys(keys: &[KeyId]) -> Vec<KeyEvent> {
    keys.iter()
        .filter_map(|key| {
            let parsed = KeyEvent::from_key_id(key);
            if parsed.is_none() {
                tracing::warn!(key = %key, "ignoring unparseable key binding");
            }
            parsed
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{KeyBinding, KeybindingsConfig, NavigationAction, NavigationKeymap};
    use crate::core::input::{KeyCode, KeyEvent, KeyModifiers};

    #[test]
    fn defaults_match_expected_keys() {
        let keymap = NavigationKeymap::default();
        assert!(keymap.matches(&KeyEvent::plain(KeyCode::Tab), NavigationAction::FocusNext));
        assert!(keymap.matches(
            &KeyEvent::new(KeyCode::Tab, KeyModifiers::SHIFT),
            NavigationAction::FocusPrevious
        ));
        assert!(keymap.matches(
            &KeyEvent::new(KeyCode::PageDown, KeyModifiers::CTRL),
            NavigationAction::NextTab
        ));
    }

    #[test]
    fn overrides_replace_defaults() {
        let mut config = KeybindingsConfig::default();
        config.set(
            NavigationAction::Activate,
            KeyBinding::Single("ctrl+x".to_string()),
        );
        let keymap = NavigationKeymap::new(config);
        assert!(keymap.matches(
            &KeyEvent::new(KeyCode::Char('x'), KeyModifiers::CTRL),
            NavigationAction::Activate
        ));
        assert!(!keymap.matches(&KeyEvent::plain(KeyCode::Enter), NavigationAction::Activate));
    }
}
