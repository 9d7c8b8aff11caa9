//! Per-domain key bindings on top of a shared combo recognizer.
//!
//! [`DomainRegistry`] keeps a `domain → (key → handler)` table and makes sure
//! each key has exactly one subscription with the recognizer, however many
//! domains bind it. Keys with only a global handler are subscribed the same
//! way through [`bind_global`](DomainRegistry::bind_global). The
//! subscription is a dispatcher which, when the key fires, looks at the
//! current domain:
//!
//! - no current domain: the key is escalated to the [`GlobalFallback`];
//! - the current domain binds the key: its handler runs;
//! - otherwise the key is swallowed.
//!
//! Domains whose element leaves the document can be suspended, which parks
//! their bindings until [`resume_domain`](DomainRegistry::resume_domain).

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Weak};

use keydomain_core::{ComboCallback, ComboEvent, ComboRecognizer, normalize_combo};
use parking_lot::Mutex;

use crate::logging::targets;

/// Handler invoked for a key. Returns whether it consumed the key.
pub type KeyHandler = ComboCallback;

/// Receives keys that fire while no domain is current.
pub trait GlobalFallback: Send + Sync {
    /// Run the global handler for `key`. Returns `false` when there is none.
    fn trigger_global(&self, key: &str, event: &ComboEvent) -> bool;

    /// The global handler for `key`, if any.
    fn global_handler(&self, key: &str) -> Option<KeyHandler>;
}

type BindingTable = BTreeMap<String, BTreeMap<String, KeyHandler>>;

/// Snapshot of a binding table: domain → bound keys.
pub type BindingSnapshot = BTreeMap<String, BTreeSet<String>>;

#[derive(Default)]
struct RegistryState {
    current: Option<String>,
    live: BindingTable,
    suspended: BindingTable,
}

impl RegistryState {
    fn key_in_use(&self, key: &str) -> bool {
        self.live.values().any(|keys| keys.contains_key(key))
    }
}

fn snapshot(table: &BindingTable) -> BindingSnapshot {
    table
        .iter()
        .map(|(domain, keys)| (domain.clone(), keys.keys().cloned().collect()))
        .collect()
}

enum Route {
    Global,
    Domain(KeyHandler),
    Swallow,
}

struct RegistryShared {
    recognizer: Arc<dyn ComboRecognizer>,
    fallback: Arc<dyn GlobalFallback>,
    state: Mutex<RegistryState>,
}

impl RegistryShared {
    fn dispatch(&self, key: &str, event: &ComboEvent) -> bool {
        let route = {
            let state = self.state.lock();
            match &state.current {
                None => Route::Global,
                Some(domain) => match state.live.get(domain).and_then(|keys| keys.get(key)) {
                    Some(handler) => Route::Domain(handler.clone()),
                    None => Route::Swallow,
                },
            }
        };

        match route {
            Route::Global => self.fallback.trigger_global(key, event),
            Route::Domain(handler) => handler(event),
            Route::Swallow => {
                tracing::trace!(target: targets::REGISTRY, key, "swallowed by current domain");
                false
            }
        }
    }
}

/// Domain-scoped binding table.
///
/// Cloning yields another handle to the same table.
#[derive(Clone)]
pub struct DomainRegistry {
    shared: Arc<RegistryShared>,
}

impl DomainRegistry {
    /// Create a registry over `recognizer`, escalating domain-less keys to `fallback`.
    pub fn new(recognizer: Arc<dyn ComboRecognizer>, fallback: Arc<dyn GlobalFallback>) -> Self {
        Self {
            shared: Arc::new(RegistryShared {
                recognizer,
                fallback,
                state: Mutex::new(RegistryState::default()),
            }),
        }
    }

    fn dispatcher(&self, key: String) -> ComboCallback {
        let weak: Weak<RegistryShared> = Arc::downgrade(&self.shared);
        Arc::new(move |event: &ComboEvent| match weak.upgrade() {
            Some(shared) => shared.dispatch(&key, event),
            None => false,
        })
    }

    /// Bind every key in `keys` to `handler` in every domain in `domains`.
    ///
    /// Keys not yet bound in any live domain get a dispatcher subscription.
    /// Existing (domain, key) entries are overwritten.
    pub fn bind_domain<D, K>(&self, domains: &[D], keys: &[K], handler: KeyHandler)
    where
        D: AsRef<str>,
        K: AsRef<str>,
    {
        let keys: Vec<String> = keys.iter().map(|k| normalize_combo(k.as_ref())).collect();

        let unused: Vec<String> = {
            let mut state = self.shared.state.lock();
            let unused = keys
                .iter()
                .filter(|key| !state.key_in_use(key))
                .cloned()
                .collect::<BTreeSet<_>>();
            for domain in domains {
                let entry = state.live.entry(domain.as_ref().to_string()).or_default();
                for key in &keys {
                    entry.insert(key.clone(), handler.clone());
                }
            }
            unused.into_iter().collect()
        };

        for key in unused {
            tracing::trace!(target: targets::REGISTRY, %key, "subscribing dispatcher");
            self.shared
                .recognizer
                .bind(std::slice::from_ref(&key), self.dispatcher(key.clone()));
        }
        tracing::debug!(
            target: targets::REGISTRY,
            domains = ?domains.iter().map(|d| d.as_ref()).collect::<Vec<&str>>(),
            ?keys,
            "bound"
        );
    }

    /// Subscribe a dispatcher for global keys that no live domain binds.
    ///
    /// The handlers themselves live in the [`GlobalFallback`]; the
    /// dispatcher only reaches them while no domain is current.
    pub fn bind_global<K: AsRef<str>>(&self, keys: &[K]) {
        let free: Vec<String> = {
            let state = self.shared.state.lock();
            keys.iter()
                .map(|k| normalize_combo(k.as_ref()))
                .filter(|key| !state.key_in_use(key))
                .collect()
        };
        for key in free {
            tracing::trace!(target: targets::REGISTRY, %key, "subscribing global dispatcher");
            self.shared
                .recognizer
                .bind(std::slice::from_ref(&key), self.dispatcher(key.clone()));
        }
    }

    /// Remove the (domain, key) entries for every pair in `domains × keys`.
    ///
    /// A key no live domain binds any more has its subscription torn down,
    /// unless it still has a global handler.
    pub fn unbind_domain<D, K>(&self, domains: &[D], keys: &[K])
    where
        D: AsRef<str>,
        K: AsRef<str>,
    {
        let keys: Vec<String> = keys.iter().map(|k| normalize_combo(k.as_ref())).collect();

        let released: Vec<String> = {
            let mut state = self.shared.state.lock();
            let was_used: Vec<bool> = keys.iter().map(|k| state.key_in_use(k)).collect();
            for domain in domains {
                let domain = domain.as_ref();
                if let Some(entry) = state.live.get_mut(domain) {
                    for key in &keys {
                        entry.remove(key);
                    }
                    if entry.is_empty() {
                        state.live.remove(domain);
                    }
                }
            }
            keys.iter()
                .zip(was_used)
                .filter(|(key, used)| *used && !state.key_in_use(key))
                .map(|(key, _)| key.clone())
                .collect()
        };

        for key in released {
            if self.shared.fallback.global_handler(&key).is_some() {
                tracing::trace!(target: targets::REGISTRY, %key, "kept for global handler");
                continue;
            }
            tracing::trace!(target: targets::REGISTRY, %key, "unsubscribing");
            self.shared.recognizer.unbind(std::slice::from_ref(&key));
        }
    }

    /// Park all bindings of each domain and unbind them.
    pub fn suspend_domain<D: AsRef<str>>(&self, domains: &[D]) {
        for domain in domains {
            let domain = domain.as_ref();
            let keys: Vec<String> = {
                let mut state = self.shared.state.lock();
                let Some(bindings) = state.live.get(domain).cloned() else {
                    continue;
                };
                let keys = bindings.keys().cloned().collect();
                state
                    .suspended
                    .entry(domain.to_string())
                    .or_default()
                    .extend(bindings);
                keys
            };
            tracing::debug!(target: targets::REGISTRY, domain, count = keys.len(), "suspending domain");
            self.unbind_domain(&[domain], &keys);
        }
    }

    /// Re-bind every parked binding of each domain. No-op for domains with none.
    pub fn resume_domain<D: AsRef<str>>(&self, domains: &[D]) {
        for domain in domains {
            let domain = domain.as_ref();
            let suspended = self.shared.state.lock().suspended.remove(domain);
            let Some(bindings) = suspended else {
                continue;
            };
            tracing::debug!(target: targets::REGISTRY, domain, count = bindings.len(), "resuming domain");
            for (key, handler) in bindings {
                self.bind_domain(&[domain], &[key], handler);
            }
        }
    }

    /// Set the domain whose bindings are active. `None` routes keys to the global fallback.
    pub fn focus_domain(&self, domain: Option<&str>) {
        self.shared.state.lock().current = domain.map(str::to_string);
    }

    /// The domain whose bindings are active.
    pub fn current_domain(&self) -> Option<String> {
        self.shared.state.lock().current.clone()
    }

    /// Forget all live and suspended bindings and the current domain.
    ///
    /// Recognizer subscriptions are left alone; reset the recognizer too.
    pub fn reset(&self) {
        let mut state = self.shared.state.lock();
        *state = RegistryState::default();
    }

    /// Check whether any live domain binds `key`.
    pub fn is_key_bound(&self, key: &str) -> bool {
        self.shared.state.lock().key_in_use(&normalize_combo(key))
    }

    /// The live handler for (`domain`, `key`).
    pub fn handler(&self, domain: &str, key: &str) -> Option<KeyHandler> {
        self.shared
            .state
            .lock()
            .live
            .get(domain)
            .and_then(|keys| keys.get(&normalize_combo(key)))
            .cloned()
    }

    /// The suspended handler for (`domain`, `key`).
    pub fn suspended_handler(&self, domain: &str, key: &str) -> Option<KeyHandler> {
        self.shared
            .state
            .lock()
            .suspended
            .get(domain)
            .and_then(|keys| keys.get(&normalize_combo(key)))
            .cloned()
    }

    /// Live bindings: domain → keys.
    pub fn bindings(&self) -> BindingSnapshot {
        snapshot(&self.shared.state.lock().live)
    }

    /// Suspended bindings: domain → keys.
    pub fn suspended_bindings(&self) -> BindingSnapshot {
        snapshot(&self.shared.state.lock().suspended)
    }

    /// The recognizer this registry subscribes to.
    pub fn recognizer(&self) -> &Arc<dyn ComboRecognizer> {
        &self.shared.recognizer
    }
}

impl std::fmt::Debug for DomainRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("DomainRegistry")
            .field("current", &state.current)
            .field("live", &snapshot(&state.live))
            .field("suspended", &snapshot(&state.suspended))
            .finish()
    }
}
