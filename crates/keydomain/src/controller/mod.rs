//! Domain focus tracking on top of a [`Document`].
//!
//! A [`FocusController`] attaches to a whole document or to a single element,
//! scans it for elements declaring a domain name and keeps track of which
//! domain holds logical keyboard focus. Pointer presses and focus events seen
//! by its capture listeners move that focus; key combos are then routed
//! through the [`DomainRegistry`] to the handlers of the current domain.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use keydomain::FocusController;
//! use keydomain_core::Document;
//!
//! let doc = Document::new();
//! let panel = doc.create_element("div");
//! doc.set_attribute(panel, "data-keydomain", "panel").unwrap();
//! doc.append_child(doc.body(), panel).unwrap();
//!
//! let controller = FocusController::attach(doc.clone()).unwrap();
//! assert_eq!(controller.list_domains(), vec!["panel".to_string()]);
//!
//! let hits = Arc::new(AtomicUsize::new(0));
//! let counter = hits.clone();
//! controller.register("panel", &["ctrl+s"], move |_| {
//!     counter.fetch_add(1, Ordering::SeqCst);
//!     true
//! });
//!
//! controller.focus_domain("panel");
//! controller.trigger("ctrl+s");
//! assert_eq!(hits.load(Ordering::SeqCst), 1);
//! ```

mod focus;
mod reconcile;

use std::collections::HashMap;
use std::sync::Arc;

use keydomain_core::{
    ComboEvent, ComboRecognizer, ComboTable, Document, DomError, ListenerId, NodeId, TaskQueue,
    normalize_combo,
};
use parking_lot::Mutex;

use crate::attachment::AttachmentRegistry;
use crate::config::ControllerConfig;
use crate::error::{KeyDomainError, Result};
use crate::global::GlobalBindings;
use crate::logging::targets;
use crate::registry::{DomainRegistry, KeyHandler};

/// Where a controller listens and what it scans for domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachTarget {
    /// The whole document. Only one controller may attach per document.
    Document,
    /// A single element and its subtree.
    Element(NodeId),
}

/// A registered domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Domain {
    /// Domain name.
    pub name: String,
    /// Root element of the domain.
    pub element: NodeId,
    /// Selector for the element to focus when the domain becomes current.
    /// An empty selector targets the root itself.
    pub focus_selector: Option<String>,
    /// Whether the focus target is focused even when DOM focus is suppressed.
    pub focus_lock: bool,
}

/// Whether a domain transition may move real DOM focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DomFocus {
    /// Focus the domain's target (or root) element.
    #[default]
    Apply,
    /// Leave DOM focus alone unless the domain locks focus.
    Suppress,
}

/// Where a registered handler applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Domain-less binding, active while no domain is current.
    Global,
    /// Bound in each of the named domains.
    Domains(Vec<String>),
}

impl From<&str> for Scope {
    fn from(domain: &str) -> Self {
        Scope::Domains(vec![domain.to_string()])
    }
}

impl From<String> for Scope {
    fn from(domain: String) -> Self {
        Scope::Domains(vec![domain])
    }
}

impl From<Vec<String>> for Scope {
    fn from(domains: Vec<String>) -> Self {
        Scope::Domains(domains)
    }
}

impl<const N: usize> From<[&str; N]> for Scope {
    fn from(domains: [&str; N]) -> Self {
        Scope::Domains(domains.iter().map(|d| d.to_string()).collect())
    }
}

/// Handle returned by [`FocusController::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u64);

impl HandlerId {
    /// Get the raw value.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

#[derive(Debug)]
struct Registration {
    keys: Vec<String>,
    domains: Option<Vec<String>>,
}

#[derive(Debug, Default, Clone, Copy)]
struct PressState {
    handling: bool,
    focus_was_reset: bool,
}

#[derive(Debug, Default)]
struct ControllerState {
    attached: bool,
    claimed: bool,
    domains: Vec<Domain>,
    current: Option<String>,
    default_domain: Option<String>,
    last_focused: Option<NodeId>,
    press: PressState,
    registrations: HashMap<HandlerId, Registration>,
    next_handler_id: u64,
    listeners: Vec<ListenerId>,
}

impl ControllerState {
    fn domain(&self, name: &str) -> Option<&Domain> {
        self.domains.iter().find(|d| d.name == name)
    }
}

pub(crate) struct ControllerShared {
    document: Document,
    target: AttachTarget,
    config: ControllerConfig,
    recognizer: Arc<dyn ComboRecognizer>,
    registry: DomainRegistry,
    globals: Arc<GlobalBindings>,
    tasks: TaskQueue,
    state: Mutex<ControllerState>,
}

impl ControllerShared {
    fn initialize(self: &Arc<Self>) -> Result<()> {
        match self.target {
            AttachTarget::Document => {
                AttachmentRegistry::global().claim(self.document.id())?;
                self.state.lock().claimed = true;
            }
            AttachTarget::Element(node) => {
                let valid = self.document.tag(node).is_ok() && self.document.is_connected(node);
                if !valid {
                    return Err(KeyDomainError::InvalidTarget(node));
                }
            }
        }

        if let Err(err) = self.install_listeners().and_then(|()| self.scan()) {
            self.teardown();
            return Err(err);
        }
        self.state.lock().attached = true;
        tracing::debug!(target: targets::CONTROLLER, target_node = ?self.target, "attached");
        Ok(())
    }

    fn scan(&self) -> Result<()> {
        let attr = &self.config.attributes.domain;
        let declared: Vec<(String, NodeId)> = self.document.with_tree(|tree| {
            let nodes = match self.target {
                AttachTarget::Document => tree.descendants(tree.root())?,
                AttachTarget::Element(node) => {
                    let mut nodes = vec![node];
                    nodes.extend(tree.descendants(node)?);
                    nodes
                }
            };
            Ok::<_, DomError>(
                nodes
                    .into_iter()
                    .filter_map(|node| tree.attribute(node, attr).map(|name| (name.to_string(), node)))
                    .collect(),
            )
        })?;

        for (name, element) in declared {
            match self.add_domain(&name, element) {
                Ok(()) => {}
                Err(KeyDomainError::DuplicateDomain(name)) => {
                    tracing::warn!(target: targets::CONTROLLER, %name, ?element, "skipping duplicate domain declaration");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    /// Remove listeners and give back the document claim.
    fn teardown(&self) {
        self.remove_listeners();
        let claimed = std::mem::take(&mut self.state.lock().claimed);
        if claimed {
            AttachmentRegistry::global().release(self.document.id());
        }
    }

    fn make_domain(&self, name: &str, element: NodeId) -> Result<Domain> {
        let attrs = &self.config.attributes;
        self.document
            .with_tree(|tree| {
                tree.tag(element).ok()?;
                let focus_selector = tree.attribute(element, &attrs.focus).map(|s| s.trim().to_string());
                let focus_lock = focus_selector.is_some()
                    && tree.attribute(element, &attrs.focus_lock) == Some("true");
                Some(Domain {
                    name: name.to_string(),
                    element,
                    focus_selector,
                    focus_lock,
                })
            })
            .ok_or_else(|| KeyDomainError::MissingElement {
                domain: name.to_string(),
                element,
            })
    }

    #[tracing::instrument(skip(self), target = "keydomain::controller", level = "debug")]
    fn add_domain(&self, name: &str, element: NodeId) -> Result<()> {
        let domain = self.make_domain(name, element)?;
        let refocus = {
            let mut state = self.state.lock();
            if state.domain(name).is_some() {
                return Err(KeyDomainError::DuplicateDomain(name.to_string()));
            }
            state.domains.push(domain);
            state.current.as_deref() == Some(name)
        };

        self.registry.resume_domain(&[name]);
        if refocus {
            self.focus_domain(Some(name), DomFocus::Apply);
        }
        Ok(())
    }

    #[tracing::instrument(skip(self), target = "keydomain::controller", level = "debug")]
    fn remove_domain(&self, name: &str) {
        let (known, is_current, fallback) = {
            let state = self.state.lock();
            (
                state.domain(name).is_some(),
                state.current.as_deref() == Some(name),
                state.default_domain.clone(),
            )
        };
        if !known {
            return;
        }
        if is_current {
            self.focus_domain(fallback.as_deref(), DomFocus::Apply);
        }
        self.registry.suspend_domain(&[name]);
        self.state.lock().domains.retain(|d| d.name != name);
    }

    fn register(&self, scope: Scope, keys: Vec<String>, handler: KeyHandler) -> HandlerId {
        let id = {
            let mut state = self.state.lock();
            let id = HandlerId(state.next_handler_id);
            state.next_handler_id += 1;
            state.registrations.insert(
                id,
                Registration {
                    keys: keys.clone(),
                    domains: match &scope {
                        Scope::Global => None,
                        Scope::Domains(domains) => Some(domains.clone()),
                    },
                },
            );
            id
        };

        match scope {
            Scope::Domains(domains) => self.registry.bind_domain(&domains, &keys, handler),
            Scope::Global => {
                for key in &keys {
                    self.globals.insert(key, handler.clone());
                }
                self.registry.bind_global(&keys);
            }
        }
        tracing::debug!(target: targets::CONTROLLER, id = id.as_u64(), ?keys, "registered handler");
        id
    }

    fn unregister(&self, id: HandlerId) -> bool {
        let Some(registration) = self.state.lock().registrations.remove(&id) else {
            return false;
        };
        match registration.domains {
            Some(domains) => self.registry.unbind_domain(&domains, &registration.keys),
            None => {
                for key in &registration.keys {
                    self.globals.remove(key);
                }
                let free: Vec<String> = registration
                    .keys
                    .iter()
                    .filter(|key| !self.registry.is_key_bound(key))
                    .cloned()
                    .collect();
                self.recognizer.unbind(&free);
            }
        }
        tracing::debug!(target: targets::CONTROLLER, id = id.as_u64(), "unregistered handler");
        true
    }

    fn reset(self: &Arc<Self>, skip_reattach: bool) -> Result<()> {
        self.teardown();
        self.registry.reset();
        self.recognizer.reset();
        self.globals.clear();
        {
            let mut state = self.state.lock();
            state.attached = false;
            state.domains.clear();
            state.current = None;
            state.default_domain = None;
            state.last_focused = None;
            state.press = PressState::default();
            state.registrations.clear();
        }
        tracing::debug!(target: targets::CONTROLLER, skip_reattach, "reset");

        if skip_reattach {
            return Ok(());
        }
        self.initialize()
    }
}

/// Tracks the current key domain of a document and routes key combos to it.
///
/// Dropping the controller removes its listeners and releases its document
/// claim. Deferred press handling that is still queued becomes a no-op.
pub struct FocusController {
    shared: Arc<ControllerShared>,
}

impl FocusController {
    /// Attach to the whole of `document` with default settings.
    pub fn attach(document: Document) -> Result<Self> {
        Self::builder(document).attach()
    }

    /// Start configuring a controller for `document`.
    pub fn builder(document: Document) -> ControllerBuilder {
        ControllerBuilder::new(document)
    }

    // -------------------------------------------------------------------------
    // Domains
    // -------------------------------------------------------------------------

    /// Register `element` as the root of domain `name`.
    ///
    /// The focus target and focus lock are read from the element's attributes
    /// now. Suspended bindings of `name` are restored, and if `name` is still
    /// current, focus is applied again.
    pub fn add_domain(&self, name: &str, element: NodeId) -> Result<()> {
        self.shared.add_domain(name, element)
    }

    /// Unregister domain `name`, suspending its bindings.
    ///
    /// If it is current, focus moves to the default domain first. Unknown
    /// names are ignored.
    pub fn remove_domain(&self, name: &str) {
        self.shared.remove_domain(name);
    }

    /// Set the fallback domain and focus it.
    pub fn set_default_domain<'a>(&self, name: impl Into<Option<&'a str>>) {
        let name = name.into();
        self.shared.state.lock().default_domain = name.map(str::to_string);
        self.shared.focus_domain(name, DomFocus::Apply);
    }

    /// The fallback domain.
    pub fn default_domain(&self) -> Option<String> {
        self.shared.state.lock().default_domain.clone()
    }

    /// Make `name` the current domain and move DOM focus into it.
    ///
    /// Unknown names (and `None`) resolve to the default domain; the
    /// configured no-change sentinel does nothing.
    pub fn focus_domain<'a>(&self, name: impl Into<Option<&'a str>>) {
        self.shared.focus_domain(name.into(), DomFocus::Apply);
    }

    /// Like [`focus_domain`](Self::focus_domain) with explicit DOM focus handling.
    pub fn focus_domain_with<'a>(&self, name: impl Into<Option<&'a str>>, dom_focus: DomFocus) {
        self.shared.focus_domain(name.into(), dom_focus);
    }

    /// The domain holding logical focus.
    pub fn current_domain(&self) -> Option<String> {
        self.shared.state.lock().current.clone()
    }

    /// Root element of the current domain.
    pub fn current_domain_element(&self) -> Option<NodeId> {
        let state = self.shared.state.lock();
        state
            .current
            .as_deref()
            .and_then(|name| state.domain(name))
            .map(|d| d.element)
    }

    /// Registered domain names, in registration order.
    pub fn list_domains(&self) -> Vec<String> {
        self.shared
            .state
            .lock()
            .domains
            .iter()
            .map(|d| d.name.clone())
            .collect()
    }

    /// Look up a registered domain.
    pub fn domain(&self, name: &str) -> Option<Domain> {
        self.shared.state.lock().domain(name).cloned()
    }

    /// Check whether domain `name` exists and locks focus.
    pub fn is_locking_focus(&self, name: &str) -> bool {
        self.shared.is_locking_focus(Some(name))
    }

    /// Name of the closest domain declared on `element` or its ancestors.
    pub fn find_domain_containing(&self, element: NodeId) -> Option<String> {
        self.shared.find_domain_containing(element)
    }

    // -------------------------------------------------------------------------
    // Key handlers
    // -------------------------------------------------------------------------

    /// Bind `keys` to `handler` in `scope`.
    ///
    /// Domain-scoped handlers fire while one of their domains is current;
    /// global handlers fire while no domain is.
    pub fn register<K, F>(&self, scope: impl Into<Scope>, keys: &[K], handler: F) -> HandlerId
    where
        K: AsRef<str>,
        F: Fn(&ComboEvent) -> bool + Send + Sync + 'static,
    {
        let keys = keys.iter().map(|k| normalize_combo(k.as_ref())).collect();
        self.shared.register(scope.into(), keys, Arc::new(handler))
    }

    /// Remove a registration. Returns `false` for unknown ids.
    pub fn unregister(&self, id: HandlerId) -> bool {
        self.shared.unregister(id)
    }

    /// Fire `combo` as if it had been pressed. Returns whether a handler consumed it.
    pub fn trigger(&self, combo: &str) -> bool {
        self.shared.recognizer.trigger(combo)
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Drop all domains, bindings and listeners, then attach and scan again
    /// unless `skip_reattach` is set.
    pub fn reset(&self, skip_reattach: bool) -> Result<()> {
        self.shared.reset(skip_reattach)
    }

    /// Stop reacting to pointer and focus events.
    pub fn remove_listeners(&self) {
        self.shared.remove_listeners();
    }

    /// Whether the controller's listeners are installed.
    pub fn is_attached(&self) -> bool {
        self.shared.state.lock().attached
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// The document this controller watches.
    pub fn document(&self) -> &Document {
        &self.shared.document
    }

    /// The attachment target.
    pub fn target(&self) -> AttachTarget {
        self.shared.target
    }

    /// The domain binding table.
    pub fn registry(&self) -> &DomainRegistry {
        &self.shared.registry
    }

    /// The global binding table.
    pub fn globals(&self) -> &GlobalBindings {
        &self.shared.globals
    }

    /// The queue deferred press handling is posted to.
    pub fn task_queue(&self) -> &TaskQueue {
        &self.shared.tasks
    }

    /// The combo recognizer.
    pub fn recognizer(&self) -> &Arc<dyn ComboRecognizer> {
        &self.shared.recognizer
    }

    /// The configuration.
    pub fn config(&self) -> &ControllerConfig {
        &self.shared.config
    }
}

impl Drop for FocusController {
    fn drop(&mut self) {
        self.shared.teardown();
    }
}

impl std::fmt::Debug for FocusController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("FocusController")
            .field("document", &self.shared.document.id())
            .field("target", &self.shared.target)
            .field("attached", &state.attached)
            .field("domains", &state.domains)
            .field("current", &state.current)
            .field("default_domain", &state.default_domain)
            .finish()
    }
}

/// Builder for [`FocusController`].
pub struct ControllerBuilder {
    document: Document,
    target: AttachTarget,
    recognizer: Option<Arc<dyn ComboRecognizer>>,
    tasks: Option<TaskQueue>,
    config: ControllerConfig,
}

impl ControllerBuilder {
    /// Start a builder attaching to the whole of `document`.
    pub fn new(document: Document) -> Self {
        Self {
            document,
            target: AttachTarget::Document,
            recognizer: None,
            tasks: None,
            config: ControllerConfig::default(),
        }
    }

    /// Attach to `element` and its subtree instead of the whole document.
    pub fn element(mut self, element: NodeId) -> Self {
        self.target = AttachTarget::Element(element);
        self
    }

    /// Set the attachment target.
    pub fn target(mut self, target: AttachTarget) -> Self {
        self.target = target;
        self
    }

    /// Use `recognizer` instead of a fresh [`ComboTable`].
    pub fn recognizer(mut self, recognizer: Arc<dyn ComboRecognizer>) -> Self {
        self.recognizer = Some(recognizer);
        self
    }

    /// Post deferred press handling to `tasks`.
    pub fn task_queue(mut self, tasks: TaskQueue) -> Self {
        self.tasks = Some(tasks);
        self
    }

    /// Set the configuration.
    pub fn config(mut self, config: ControllerConfig) -> Self {
        self.config = config;
        self
    }

    /// Install listeners, scan for declared domains and return the controller.
    pub fn attach(self) -> Result<FocusController> {
        let recognizer: Arc<dyn ComboRecognizer> = self
            .recognizer
            .unwrap_or_else(|| Arc::new(ComboTable::new()));
        let globals = Arc::new(GlobalBindings::new());
        let registry = DomainRegistry::new(recognizer.clone(), globals.clone());

        let shared = Arc::new(ControllerShared {
            document: self.document,
            target: self.target,
            config: self.config,
            recognizer,
            registry,
            globals,
            tasks: self.tasks.unwrap_or_default(),
            state: Mutex::new(ControllerState::default()),
        });
        shared.initialize()?;
        Ok(FocusController { shared })
    }
}
