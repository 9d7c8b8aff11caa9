//! Key-combo recognizer abstraction and an in-process implementation.
//!
//! A recognizer maps combo strings (`"h"`, `"ctrl+s"`) to one callback each.
//! Binding a combo that is already bound replaces the callback; unbinding an
//! unbound combo does nothing.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::keystroke::KeyStroke;
use crate::logging::targets;

/// How a combo reached its callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComboSource {
    /// A physical key press was recognised.
    Pressed,
    /// The combo was fired programmatically.
    Triggered,
}

/// The event handed to combo callbacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComboEvent {
    /// Canonical combo string.
    pub combo: String,
    /// Where the combo came from.
    pub source: ComboSource,
}

impl ComboEvent {
    /// Create a programmatic event for `combo`.
    pub fn triggered(combo: impl Into<String>) -> Self {
        Self {
            combo: combo.into(),
            source: ComboSource::Triggered,
        }
    }
}

/// Callback invoked for a recognised combo. Returns whether it consumed the key.
pub type ComboCallback = Arc<dyn Fn(&ComboEvent) -> bool + Send + Sync>;

/// Turns key input into combo callbacks.
pub trait ComboRecognizer: Send + Sync {
    /// Bind every combo in `keys` to `callback`, replacing existing bindings.
    fn bind(&self, keys: &[String], callback: ComboCallback);

    /// Remove the bindings for `keys`. Unknown combos are ignored.
    fn unbind(&self, keys: &[String]);

    /// Fire the callback bound to `combo` as if it had been pressed.
    ///
    /// Returns the callback's result, or `false` if nothing is bound.
    fn trigger(&self, combo: &str) -> bool;

    /// Drop every binding.
    fn reset(&self);
}

/// Normalize a combo string to its canonical form.
///
/// Strings that parse as a [`KeyStroke`] are rendered canonically
/// (`"Ctrl+S"` becomes `"ctrl+s"`). Anything else, such as the key sequence
/// `"g i"`, is lowercased with whitespace collapsed.
pub fn normalize_combo(combo: &str) -> String {
    match combo.parse::<KeyStroke>() {
        Ok(stroke) => stroke.to_string(),
        Err(_) => combo
            .split_whitespace()
            .map(str::to_lowercase)
            .collect::<Vec<_>>()
            .join(" "),
    }
}

/// In-process recognizer backed by a combo table.
///
/// Physical input is fed through [`press`](Self::press).
#[derive(Default)]
pub struct ComboTable {
    bindings: RwLock<HashMap<String, ComboCallback>>,
}

impl ComboTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver a physical key stroke. Returns whether a callback consumed it.
    pub fn press(&self, stroke: &KeyStroke) -> bool {
        let combo = stroke.to_string();
        self.fire(ComboEvent {
            combo,
            source: ComboSource::Pressed,
        })
    }

    /// Check whether a combo has a binding.
    pub fn is_bound(&self, combo: &str) -> bool {
        self.bindings.read().contains_key(&normalize_combo(combo))
    }

    /// All bound combos, sorted.
    pub fn bound_combos(&self) -> Vec<String> {
        let mut combos: Vec<String> = self.bindings.read().keys().cloned().collect();
        combos.sort();
        combos
    }

    /// Number of bound combos.
    pub fn len(&self) -> usize {
        self.bindings.read().len()
    }

    /// Check if nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.bindings.read().is_empty()
    }

    fn fire(&self, event: ComboEvent) -> bool {
        // Clone out so the callback may rebind keys.
        let callback = self.bindings.read().get(&event.combo).cloned();
        match callback {
            Some(callback) => {
                tracing::trace!(target: targets::RECOGNIZER, combo = %event.combo, source = ?event.source, "combo fired");
                callback(&event)
            }
            None => false,
        }
    }
}

impl ComboRecognizer for ComboTable {
    fn bind(&self, keys: &[String], callback: ComboCallback) {
        let mut bindings = self.bindings.write();
        for key in keys {
            let combo = normalize_combo(key);
            tracing::trace!(target: targets::RECOGNIZER, %combo, "bind");
            bindings.insert(combo, callback.clone());
        }
    }

    fn unbind(&self, keys: &[String]) {
        let mut bindings = self.bindings.write();
        for key in keys {
            let combo = normalize_combo(key);
            if bindings.remove(&combo).is_some() {
                tracing::trace!(target: targets::RECOGNIZER, %combo, "unbind");
            }
        }
    }

    fn trigger(&self, combo: &str) -> bool {
        self.fire(ComboEvent::triggered(normalize_combo(combo)))
    }

    fn reset(&self) {
        self.bindings.write().clear();
    }
}

impl std::fmt::Debug for ComboTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComboTable")
            .field("combos", &self.bound_combos())
            .finish()
    }
}
