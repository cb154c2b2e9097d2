use iced::keyboard::key::Named;
use iced::keyboard::{Key, Modifiers};

/// A parsed key chord such as `Ctrl+0` or `Ctrl+Shift+Escape`. Matching is
/// exact on modifiers: extra held modifiers do not trigger the chord.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Hotkey {
    ctrl: bool,
    shift: bool,
    alt: bool,
    logo: bool,
    key: ChordKey,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ChordKey {
    Named(Named),
    Character(String),
}

impl Hotkey {
    /// Parse a chord spec. Falls back to `Ctrl+0` (the default chord) when
    /// the spec is empty or names no key.
    pub(crate) fn parse(spec: &str) -> Self {
        let mut ctrl = false;
        let mut shift = false;
        let mut alt = false;
        let mut logo = false;
        let mut key = None;

        for token in spec.split('+').map(str::trim).filter(|t| !t.is_empty()) {
            match token.to_ascii_lowercase().as_str() {
                "ctrl" | "control" => ctrl = true,
                "shift" => shift = true,
                "alt" => alt = true,
                "super" | "meta" | "cmd" | "logo" => logo = true,
                other => key = Some(parse_key(other)),
            }
        }

        match key {
            Some(key) => Self {
                ctrl,
                shift,
                alt,
                logo,
                key,
            },
            None => {
                eprintln!("[restwall] hotkey {spec:?} names no key, using Ctrl+0");
                Self::default()
            }
        }
    }

    pub(crate) fn matches(&self, key: &Key, modifiers: Modifiers) -> bool {
        if modifiers.control() != self.ctrl
            || modifiers.shift() != self.shift
            || modifiers.alt() != self.alt
            || modifiers.logo() != self.logo
        {
            return false;
        }
        match (&self.key, key) {
            (ChordKey::Named(expected), Key::Named(pressed)) => expected == pressed,
            (ChordKey::Character(expected), Key::Character(pressed)) => {
                expected.eq_ignore_ascii_case(pressed.as_str())
            }
            _ => false,
        }
    }
}

impl Default for Hotkey {
    fn default() -> Self {
        Self {
            ctrl: true,
            shift: false,
            alt: false,
            logo: false,
            key: ChordKey::Character("0".to_string()),
        }
    }
}

fn parse_key(token: &str) -> ChordKey {
    let named = match token {
        "escape" | "esc" => Some(Named::Escape),
        "enter" | "return" => Some(Named::Enter),
        "space" => Some(Named::Space),
        "tab" => Some(Named::Tab),
        "backspace" => Some(Named::Backspace),
        "delete" | "del" => Some(Named::Delete),
        "home" => Some(Named::Home),
        "end" => Some(Named::End),
        "pageup" => Some(Named::PageUp),
        "pagedown" => Some(Named::PageDown),
        "up" => Some(Named::ArrowUp),
        "down" => Some(Named::ArrowDown),
        "left" => Some(Named::ArrowLeft),
        "right" => Some(Named::ArrowRight),
        "f1" => Some(Named::F1),
        "f2" => Some(Named::F2),
        "f3" => Some(Named::F3),
        "f4" => Some(Named::F4),
        "f5" => Some(Named::F5),
        "f6" => Some(Named::F6),
        "f7" => Some(Named::F7),
        "f8" => Some(Named::F8),
        "f9" => Some(Named::F9),
        "f10" => Some(Named::F10),
        "f11" => Some(Named::F11),
        "f12" => Some(Named::F12),
        _ => None,
    };
    match named {
        Some(named) => ChordKey::Named(named),
        None => ChordKey::Character(token.to_string()),
    }
}
