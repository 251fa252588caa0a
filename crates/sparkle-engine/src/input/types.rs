use std::fmt;

/// Keyboard key identifier.
///
/// Printable keys are reported as lowercase characters; keys the host does not
/// name are `Unknown`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Key {
    Escape,
    Enter,
    Tab,
    Backspace,
    Space,
    Delete,

    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,

    /// Function key `F1`..=`F24`.
    Function(u8),

    /// Printable character, lowercase.
    Char(char),

    Unknown,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum KeyState {
    Pressed,
    Released,
}

/// Key transition delivered to the dispatcher.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct KeyEvent {
    pub key: Key,
    pub state: KeyState,
    /// True when generated by key-repeat.
    pub repeat: bool,
}

impl KeyEvent {
    pub const fn pressed(key: Key) -> Self {
        Self { key, state: KeyState::Pressed, repeat: false }
    }

    pub const fn released(key: Key) -> Self {
        Self { key, state: KeyState::Released, repeat: false }
    }

    /// True for the initial press of `key` (repeats excluded).
    pub fn is_press_of(&self, key: Key) -> bool {
        self.key == key && self.state == KeyState::Pressed && !self.repeat
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Function(n) => write!(f, "F{n}"),
            Key::Char(c) => write!(f, "'{c}'"),
            other => write!(f, "{other:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_of_ignores_repeat_and_release() {
        assert!(KeyEvent::pressed(Key::Escape).is_press_of(Key::Escape));
        assert!(!KeyEvent::released(Key::Escape).is_press_of(Key::Escape));

        let repeat = KeyEvent { repeat: true, ..KeyEvent::pressed(Key::Escape) };
        assert!(!repeat.is_press_of(Key::Escape));
        assert!(!KeyEvent::pressed(Key::Enter).is_press_of(Key::Escape));
    }

    #[test]
    fn display_names() {
        assert_eq!(Key::Function(5).to_string(), "F5");
        assert_eq!(Key::Char('q').to_string(), "'q'");
        assert_eq!(Key::Escape.to_string(), "Escape");
    }
}
