//! Keyboard and mouse input types.
//!
//! Raw terminal decoding belongs to the console driver; controls only ever see these
//! already-decoded events.

use crate::core::geometry::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Char(char),
    Enter,
    Escape,
    Tab,
    Backspace,
    Delete,
    Insert,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    F(u8),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct KeyModifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl KeyModifiers {
    pub const NONE: KeyModifiers = KeyModifiers {
        shift: false,
        ctrl: false,
        alt: false,
    };
    pub const SHIFT: KeyModifiers = KeyModifiers {
        shift: true,
        ctrl: false,
        alt: false,
    };
    pub const CTRL: KeyModifiers = KeyModifiers {
        shift: false,
        ctrl: true,
        alt: false,
    };

    pub fn is_empty(&self) -> bool {
        !self.shift && !self.ctrl && !self.alt
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyEvent {
    pub const fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    pub const fn plain(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::NONE)
    }

    /// Parses a key id such as `"tab"`, `"shift+tab"` or `"ctrl+pageDown"`.
    pub fn from_key_id(key_id: &str) -> Option<KeyEvent> {
        let lowered = key_id.to_lowercase();
        let parts: Vec<&str> = lowered.split('+').collect();
        let key = *parts.last()?;
        if key.is_empty() {
            return None;
        }
        let modifiers = KeyModifiers {
            ctrl: parts.iter().any(|part| *part == "ctrl"),
            shift: parts.iter().any(|part| *part == "shift"),
            alt: parts.iter().any(|part| *part == "alt"),
        };
        let code = match key {
            "enter" | "return" => KeyCode::Enter,
            "escape" | "esc" => KeyCode::Escape,
            "tab" => KeyCode::Tab,
            "backspace" => KeyCode::Backspace,
            "delete" => KeyCode::Delete,
            "insert" => KeyCode::Insert,
            "up" => KeyCode::Up,
            "down" => KeyCode::Down,
            "left" => KeyCode::Left,
            "right" => KeyCode::Right,
            "home" => KeyCode::Home,
            "end" => KeyCode::End,
            "pageup" => KeyCode::PageUp,
            "pagedown" => KeyCode::PageDown,
            "space" => KeyCode::Char(' '),
            other => {
                if let Some(number) = other.strip_prefix('f').and_then(|n| n.parse::<u8>().ok()) {
                    KeyCode::F(number)
                } else {
                    let mut chars = other.chars();
                    let ch = chars.next()?;
                    if chars.next().is_some() {
                        return None;
                    }
                    KeyCode::Char(ch)
                }
            }
        };
        Some(KeyEvent::new(code, modifiers))
    }

    pub fn matches(&self, key_id: &str) -> bool {
        KeyEvent::from_key_id(key_id).is_some_and(|parsed| parsed == *self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseEventKind {
    Pressed(MouseButton),
    Released(MouseButton),
    /// Native double-click report; drivers without one only ever send `Pressed`.
    DoubleClicked(MouseButton),
    Dragged(MouseButton),
    Moved,
    WheelUp,
    WheelDown,
    Enter,
    Leave,
}

impl MouseEventKind {
    pub fn is_wheel(&self) -> bool {
        matches!(self, MouseEventKind::WheelUp | MouseEventKind::WheelDown)
    }

    pub fn is_press(&self) -> bool {
        matches!(
            self,
            MouseEventKind::Pressed(_) | MouseEventKind::DoubleClicked(_)
        )
    }
}

/// Mouse event in the receiving control's local coordinate space.
///
/// `handled` is the bubble-suppression flag: once set, ancestors must not act on the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseEvent {
    pub position: Point,
    pub kind: MouseEventKind,
    pub modifiers: KeyModifiers,
    pub handled: bool,
}

impl MouseEvent {
    pub fn new(position: Point, kind: MouseEventKind) -> Self {
        Self {
            position,
            kind,
            modifiers: KeyModifiers::NONE,
            handled: false,
        }
    }

    pub fn press(x: i32, y: i32) -> Self {
        Self::new(Point::new(x, y), MouseEventKind::Pressed(MouseButton::Left))
    }

    /// Same event re-expressed relative to a child whose origin is `origin`.
    pub fn translated(&self, origin: Point) -> Self {
        Self {
            position: Point::new(self.position.x - origin.x, self.position.y - origin.y),
            ..*self
        }
    }

    pub fn with_kind(&self, kind: MouseEventKind) -> Self {
        Self { kind, ..*self }
    }
}
