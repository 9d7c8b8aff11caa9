//! Table of domain-less key bindings.

use std::collections::HashMap;

use keydomain_core::{ComboEvent, normalize_combo};
use parking_lot::RwLock;

use crate::registry::{GlobalFallback, KeyHandler};

/// Key → handler table for bindings registered without a domain.
#[derive(Default)]
pub struct GlobalBindings {
    handlers: RwLock<HashMap<String, KeyHandler>>,
}

impl GlobalBindings {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `key`, returning the handler it replaces.
    pub fn insert(&self, key: &str, handler: KeyHandler) -> Option<KeyHandler> {
        self.handlers.write().insert(normalize_combo(key), handler)
    }

    /// Remove the binding for `key`.
    pub fn remove(&self, key: &str) -> Option<KeyHandler> {
        self.handlers.write().remove(&normalize_combo(key))
    }

    /// Handler bound to `key`.
    pub fn get(&self, key: &str) -> Option<KeyHandler> {
        self.handlers.read().get(&normalize_combo(key)).cloned()
    }

    /// Check whether `key` has a global handler.
    pub fn contains(&self, key: &str) -> bool {
        self.handlers.read().contains_key(&normalize_combo(key))
    }

    /// Bound keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.handlers.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Drop every binding.
    pub fn clear(&self) {
        self.handlers.write().clear();
    }
}

impl GlobalFallback for GlobalBindings {
    fn trigger_global(&self, key: &str, event: &ComboEvent) -> bool {
        match self.get(key) {
            Some(handler) => handler(event),
            None => false,
        }
    }

    fn global_handler(&self, key: &str) -> Option<KeyHandler> {
        self.get(key)
    }
}

impl std::fmt::Debug for GlobalBindings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlobalBindings")
            .field("keys", &self.keys())
            .finish()
    }
}
