use winit::event::{ElementState, KeyEvent as WinitKeyEvent};
use winit::keyboard::{Key as LogicalKey, NamedKey};

use crate::input::{Key, KeyEvent, KeyState};

/// Translates a winit keyboard event into an engine [`KeyEvent`].
pub(crate) fn translate_key_event(event: &WinitKeyEvent) -> KeyEvent {
    KeyEvent {
        key: map_logical_key(&event.logical_key),
        state: match event.state {
            ElementState::Pressed => KeyState::Pressed,
            ElementState::Released => KeyState::Released,
        },
        repeat: event.repeat,
    }
}

fn map_logical_key(key: &LogicalKey) -> Key {
    match key {
        LogicalKey::Named(named) => map_named_key(*named),
        LogicalKey::Character(text) => {
            let mut chars = text.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Key::Char(c.to_lowercase().next().unwrap_or(c)),
                _ => Key::Unknown,
            }
        }
        _ => Key::Unknown,
    }
}

fn map_named_key(named: NamedKey) -> Key {
    let function = [
        NamedKey::F1, NamedKey::F2, NamedKey::F3, NamedKey::F4,
        NamedKey::F5, NamedKey::F6, NamedKey::F7, NamedKey::F8,
        NamedKey::F9, NamedKey::F10, NamedKey::F11, NamedKey::F12,
        NamedKey::F13, NamedKey::F14, NamedKey::F15, NamedKey::F16,
        NamedKey::F17, NamedKey::F18, NamedKey::F19, NamedKey::F20,
        NamedKey::F21, NamedKey::F22, NamedKey::F23, NamedKey::F24,
    ];
    if let Some(i) = function.iter().position(|f| *f == named) {
        return Key::Function(i as u8 + 1);
    }

    match named {
        NamedKey::Escape => Key::Escape,
        NamedKey::Enter => Key::Enter,
        NamedKey::Tab => Key::Tab,
        NamedKey::Backspace => Key::Backspace,
        NamedKey::Space => Key::Space,
        NamedKey::Delete => Key::Delete,
        NamedKey::ArrowUp => Key::ArrowUp,
        NamedKey::ArrowDown => Key::ArrowDown,
        NamedKey::ArrowLeft => Key::ArrowLeft,
        NamedKey::ArrowRight => Key::ArrowRight,
        _ => Key::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_keys_map() {
        assert_eq!(map_named_key(NamedKey::Escape), Key::Escape);
        assert_eq!(map_named_key(NamedKey::F1), Key::Function(1));
        assert_eq!(map_named_key(NamedKey::F12), Key::Function(12));
        assert_eq!(map_named_key(NamedKey::CapsLock), Key::Unknown);
    }

    #[test]
    fn characters_are_lowercased() {
        assert_eq!(map_logical_key(&LogicalKey::Character("Q".into())), Key::Char('q'));
        assert_eq!(map_logical_key(&LogicalKey::Character("ab".into())), Key::Unknown);
    }
}
