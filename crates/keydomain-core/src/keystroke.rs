//! Key strokes: a key plus modifiers, parsed from combo strings like `"Ctrl+S"`.

use std::fmt;
use std::str::FromStr;

use crate::error::KeyStrokeParseError;

/// Keyboard modifier state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    /// Control key.
    pub ctrl: bool,
    /// Alt / Option key.
    pub alt: bool,
    /// Shift key.
    pub shift: bool,
    /// Meta / Command / Windows key.
    pub meta: bool,
}

impl Modifiers {
    /// No modifiers pressed.
    pub const NONE: Self = Self {
        ctrl: false,
        alt: false,
        shift: false,
        meta: false,
    };

    /// Only Ctrl pressed.
    pub const CTRL: Self = Self {
        ctrl: true,
        ..Self::NONE
    };

    /// Check if no modifiers are pressed.
    pub fn is_empty(&self) -> bool {
        !(self.ctrl || self.alt || self.shift || self.meta)
    }
}

/// A single key with modifiers.
///
/// Parsing is case-insensitive and accepts common aliases (`control`,
/// `option`, `cmd`, `escape`, `return`, ...). The [`Display`](fmt::Display)
/// form is canonical: lowercase, modifiers in `ctrl+alt+shift+meta` order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyStroke {
    /// Canonical key name, e.g. `"s"`, `"enter"`, `"f5"`, `"+"`.
    pub key: String,
    /// Modifiers held with the key.
    pub modifiers: Modifiers,
}

impl KeyStroke {
    /// Create a key stroke from an already canonical key name.
    pub fn new(key: impl Into<String>, modifiers: Modifiers) -> Self {
        Self {
            key: canonical_key(&key.into()),
            modifiers,
        }
    }

    /// A key with no modifiers.
    pub fn plain(key: impl Into<String>) -> Self {
        Self::new(key, Modifiers::NONE)
    }
}

impl fmt::Display for KeyStroke {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = &self.modifiers;
        for (held, name) in [
            (m.ctrl, "ctrl"),
            (m.alt, "alt"),
            (m.shift, "shift"),
            (m.meta, "meta"),
        ] {
            if held {
                write!(f, "{}+", name)?;
            }
        }
        write!(f, "{}", self.key)
    }
}

impl FromStr for KeyStroke {
    type Err = KeyStrokeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(KeyStrokeParseError::Empty);
        }

        // A literal plus is written "+" or "mod++".
        let (rest, plus_key) = if s == "+" {
            ("", true)
        } else if let Some(rest) = s.strip_suffix("++") {
            (rest, true)
        } else {
            (s, false)
        };

        let mut modifiers = Modifiers::NONE;
        let mut key: Option<String> = plus_key.then(|| "+".to_string());

        if !rest.is_empty() {
            for part in rest.split('+') {
                let part = part.trim();
                if part.is_empty() {
                    return Err(KeyStrokeParseError::NoKey(s.to_string()));
                }
                match part.to_lowercase().as_str() {
                    "ctrl" | "control" => modifiers.ctrl = true,
                    "alt" | "option" => modifiers.alt = true,
                    "shift" => modifiers.shift = true,
                    "meta" | "cmd" | "command" | "win" | "windows" | "super" => modifiers.meta = true,
                    other => {
                        if key.is_some() || other.chars().any(char::is_whitespace) {
                            return Err(KeyStrokeParseError::MultipleKeys(s.to_string()));
                        }
                        key = Some(canonical_key(other));
                    }
                }
            }
        }

        match key {
            Some(key) => Ok(KeyStroke { key, modifiers }),
            None => Err(KeyStrokeParseError::NoKey(s.to_string())),
        }
    }
}

fn canonical_key(key: &str) -> String {
    let lower = key.to_lowercase();
    match lower.as_str() {
        "escape" => "esc".into(),
        "return" => "enter".into(),
        "del" => "delete".into(),
        "plus" => "+".into(),
        "spacebar" | " " => "space".into(),
        "arrowup" => "up".into(),
        "arrowdown" => "down".into(),
        "arrowleft" => "left".into(),
        "arrowright" => "right".into(),
        "pgup" => "pageup".into(),
        "pgdn" => "pagedown".into(),
        _ => lower,
    }
}
