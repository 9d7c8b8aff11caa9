//! A shared, thread-safe document model.
//!
//! [`Document`] is a cheap-to-clone handle around a [`DocumentTree`] arena plus
//! a listener table. It provides just enough of a browser document for focus
//! and keyboard routing: element attributes, selector queries, an active
//! element, and `PointerDown`/`Focus` event dispatch with capture and bubble
//! phases.
//!
//! Listeners are always invoked with no lock held, so a listener may freely
//! call back into the document (for example to move focus, which dispatches
//! a nested `Focus` event synchronously).
//!
//! # Example
//!
//! ```
//! use keydomain_core::Document;
//!
//! let doc = Document::new();
//! let input = doc.create_element("input");
//! doc.append_child(doc.body(), input).unwrap();
//!
//! doc.focus(input).unwrap();
//! assert_eq!(doc.active_element(), input);
//! ```

mod event;
mod tree;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock, RwLockReadGuard};
use slotmap::{SlotMap, new_key_type};

pub use event::{DomEvent, EventKind, Listener, Phase};
pub use tree::{DocumentTree, NodeId, NodeKind};

use crate::error::{DomError, Result};
use crate::logging::targets;
use crate::selector::Selector;

new_key_type! {
    /// Handle returned by [`Document::add_event_listener`].
    pub struct ListenerId;
}

/// Process-unique identity of a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocumentId(u64);

impl DocumentId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw value.
    pub fn as_raw(self) -> u64 {
        self.0
    }
}

struct ListenerEntry {
    node: NodeId,
    kind: EventKind,
    capture: bool,
    seq: u64,
    callback: Listener,
}

#[derive(Default)]
struct ListenerTable {
    entries: SlotMap<ListenerId, ListenerEntry>,
    next_seq: u64,
}

impl ListenerTable {
    /// Listeners on `node` for `kind`, in registration order.
    fn collect(&self, node: NodeId, kind: EventKind, capture: Option<bool>) -> Vec<Listener> {
        let mut matching: Vec<&ListenerEntry> = self
            .entries
            .values()
            .filter(|e| e.node == node && e.kind == kind && capture.is_none_or(|c| e.capture == c))
            .collect();
        matching.sort_by_key(|e| e.seq);
        matching.into_iter().map(|e| e.callback.clone()).collect()
    }
}

struct DocumentInner {
    id: DocumentId,
    tree: RwLock<DocumentTree>,
    listeners: Mutex<ListenerTable>,
}

/// Shared handle to a document.
///
/// Cloning yields another handle to the same document.
#[derive(Clone)]
pub struct Document {
    inner: Arc<DocumentInner>,
}

impl Document {
    /// Create an empty document (`html` and `body` only).
    pub fn new() -> Self {
        let id = DocumentId::next();
        tracing::debug!(target: targets::DOCUMENT, ?id, "created document");
        Self {
            inner: Arc::new(DocumentInner {
                id,
                tree: RwLock::new(DocumentTree::new()),
                listeners: Mutex::new(ListenerTable::default()),
            }),
        }
    }

    /// Identity of this document.
    pub fn id(&self) -> DocumentId {
        self.inner.id
    }

    /// Lock the tree for reading.
    ///
    /// Do not call mutating document methods while holding the guard.
    pub fn read(&self) -> RwLockReadGuard<'_, DocumentTree> {
        self.inner.tree.read()
    }

    /// Run a closure with read access to the tree.
    pub fn with_tree<R>(&self, f: impl FnOnce(&DocumentTree) -> R) -> R {
        f(&self.inner.tree.read())
    }

    // -------------------------------------------------------------------------
    // Structure
    // -------------------------------------------------------------------------

    /// The document node.
    pub fn root(&self) -> NodeId {
        self.read().root()
    }

    /// The `html` element.
    pub fn document_element(&self) -> NodeId {
        self.read().document_element()
    }

    /// The `body` element.
    pub fn body(&self) -> NodeId {
        self.read().body()
    }

    /// Create a new, disconnected element.
    pub fn create_element(&self, tag: &str) -> NodeId {
        self.inner.tree.write().create_element(tag)
    }

    /// Append `child` under `parent`.
    pub fn append_child(&self, parent: NodeId, child: NodeId) -> Result<()> {
        self.inner.tree.write().append_child(parent, child)
    }

    /// Detach `node` from its parent, keeping it alive.
    pub fn detach(&self, node: NodeId) -> Result<()> {
        self.inner.tree.write().detach(node)
    }

    /// Destroy `node` with its subtree and every listener attached to it.
    pub fn remove(&self, node: NodeId) -> Result<()> {
        let removed = self.inner.tree.write().remove(node)?;
        let mut listeners = self.inner.listeners.lock();
        listeners.entries.retain(|_, e| !removed.contains(&e.node));
        Ok(())
    }

    /// Check whether the handle refers to a live node.
    pub fn contains(&self, node: NodeId) -> bool {
        self.read().contains(node)
    }

    /// Check whether the node is reachable from the document node.
    pub fn is_connected(&self, node: NodeId) -> bool {
        self.read().is_connected(node)
    }

    /// Get the parent of a node.
    pub fn parent(&self, node: NodeId) -> Result<Option<NodeId>> {
        self.read().parent(node)
    }

    /// Get the parent if it is an element.
    pub fn parent_element(&self, node: NodeId) -> Option<NodeId> {
        self.read().parent_element(node)
    }

    /// Get the children of a node.
    pub fn children(&self, node: NodeId) -> Result<Vec<NodeId>> {
        self.read().children(node).map(<[NodeId]>::to_vec)
    }

    /// All descendants of `scope` in document order.
    pub fn descendants(&self, scope: NodeId) -> Result<Vec<NodeId>> {
        self.read().descendants(scope)
    }

    // -------------------------------------------------------------------------
    // Attributes and queries
    // -------------------------------------------------------------------------

    /// Tag name of an element.
    pub fn tag(&self, node: NodeId) -> Result<String> {
        self.read().tag(node).map(str::to_owned)
    }

    /// Attribute value of an element.
    pub fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.read().attribute(node, name).map(str::to_owned)
    }

    /// Check for an attribute regardless of its value.
    pub fn has_attribute(&self, node: NodeId, name: &str) -> bool {
        self.read().has_attribute(node, name)
    }

    /// Set an attribute on an element.
    pub fn set_attribute(
        &self,
        node: NodeId,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<()> {
        self.inner.tree.write().set_attribute(node, name, value)
    }

    /// Remove an attribute, returning its previous value.
    pub fn remove_attribute(&self, node: NodeId, name: &str) -> Result<Option<String>> {
        self.inner.tree.write().remove_attribute(node, name)
    }

    /// First connected element with the given `id` attribute.
    pub fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.read().element_by_id(id)
    }

    /// First descendant of `scope` matching the selector string.
    pub fn query_selector(&self, scope: NodeId, selector: &str) -> Result<Option<NodeId>> {
        let selector = Selector::parse(selector)?;
        self.read().query_selector(scope, &selector)
    }

    /// All descendants of `scope` matching the selector string.
    pub fn query_selector_all(&self, scope: NodeId, selector: &str) -> Result<Vec<NodeId>> {
        let selector = Selector::parse(selector)?;
        self.read().query_selector_all(scope, &selector)
    }

    /// Whether `node` matches the selector string.
    pub fn matches(&self, node: NodeId, selector: &str) -> Result<bool> {
        let selector = Selector::parse(selector)?;
        Ok(self.read().matches(node, &selector))
    }

    // -------------------------------------------------------------------------
    // Focus
    // -------------------------------------------------------------------------

    /// The element that currently has focus.
    pub fn active_element(&self) -> NodeId {
        self.read().active_element()
    }

    /// Whether the element can take keyboard focus.
    pub fn is_focusable(&self, node: NodeId) -> bool {
        self.read().is_focusable(node)
    }

    /// Move focus to `node` and dispatch a `Focus` event at it.
    ///
    /// Focusing the already active element does nothing.
    #[tracing::instrument(skip(self), target = "keydomain_core::document", level = "trace")]
    pub fn focus(&self, node: NodeId) -> Result<()> {
        {
            let mut tree = self.inner.tree.write();
            tree.tag(node)?;
            if !tree.is_connected(node) {
                return Err(DomError::Disconnected(node));
            }
            if !tree.is_focusable(node) {
                return Err(DomError::NotFocusable(node));
            }
            if tree.active_element() == node {
                return Ok(());
            }
            tree.set_active(node);
        }
        self.dispatch(EventKind::Focus, node);
        Ok(())
    }

    /// Drop focus from `node` if it has it. Returns whether focus moved.
    pub fn blur(&self, node: NodeId) -> bool {
        let mut tree = self.inner.tree.write();
        if tree.active_element() != node || node == tree.body() {
            return false;
        }
        let body = tree.body();
        tree.set_active(body);
        tracing::trace!(target: targets::DOCUMENT, ?node, "blurred");
        true
    }

    // -------------------------------------------------------------------------
    // Events
    // -------------------------------------------------------------------------

    /// Register a listener on `node`.
    ///
    /// Capture listeners run while the event travels down to the target;
    /// non-capture listeners run at the target and while bubbling.
    pub fn add_event_listener(
        &self,
        node: NodeId,
        kind: EventKind,
        capture: bool,
        callback: impl Fn(&DomEvent) + Send + Sync + 'static,
    ) -> Result<ListenerId> {
        if !self.contains(node) {
            return Err(DomError::InvalidNode(node));
        }
        let mut listeners = self.inner.listeners.lock();
        let seq = listeners.next_seq;
        listeners.next_seq += 1;
        let id = listeners.entries.insert(ListenerEntry {
            node,
            kind,
            capture,
            seq,
            callback: Arc::new(callback),
        });
        tracing::trace!(target: targets::DOCUMENT, ?id, ?node, ?kind, capture, "listener added");
        Ok(id)
    }

    /// Remove a listener. Returns `false` if it was already gone.
    pub fn remove_event_listener(&self, id: ListenerId) -> bool {
        self.inner.listeners.lock().entries.remove(id).is_some()
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.lock().entries.len()
    }

    /// Dispatch a `PointerDown` event at `target` without moving focus.
    pub fn dispatch_pointer_down(&self, target: NodeId) -> Result<()> {
        if !self.contains(target) {
            return Err(DomError::InvalidNode(target));
        }
        self.dispatch(EventKind::PointerDown, target);
        Ok(())
    }

    /// Dispatch a `Focus` event at `target` without moving focus.
    ///
    /// Useful to reproduce hosts that report focus on elements which never
    /// actually became active.
    pub fn dispatch_focus(&self, target: NodeId) -> Result<()> {
        if !self.contains(target) {
            return Err(DomError::InvalidNode(target));
        }
        self.dispatch(EventKind::Focus, target);
        Ok(())
    }

    /// Simulate a full pointer press on `target`.
    ///
    /// Dispatches `PointerDown`, then focuses the nearest focusable inclusive
    /// ancestor, or drops focus to the body when there is none.
    pub fn press(&self, target: NodeId) -> Result<()> {
        self.dispatch_pointer_down(target)?;

        let (focusable, active) = {
            let tree = self.read();
            (tree.focusable_ancestor(target), tree.active_element())
        };
        match focusable {
            Some(node) if self.is_connected(node) => self.focus(node),
            _ => {
                self.blur(active);
                Ok(())
            }
        }
    }

    fn dispatch(&self, kind: EventKind, target: NodeId) {
        let path = {
            let tree = self.read();
            let mut path = tree.ancestors(target).unwrap_or_default();
            path.reverse();
            path
        };

        let calls: Vec<(Phase, NodeId, Listener)> = {
            let listeners = self.inner.listeners.lock();
            let mut calls = Vec::new();
            for &node in &path {
                for cb in listeners.collect(node, kind, Some(true)) {
                    calls.push((Phase::Capture, node, cb));
                }
            }
            for cb in listeners.collect(target, kind, None) {
                calls.push((Phase::Target, target, cb));
            }
            if kind.bubbles() {
                for &node in path.iter().rev() {
                    for cb in listeners.collect(node, kind, Some(false)) {
                        calls.push((Phase::Bubble, node, cb));
                    }
                }
            }
            calls
        };

        tracing::trace!(target: targets::DOCUMENT, ?kind, ?target, listeners = calls.len(), "dispatch");
        for (phase, current_target, callback) in calls {
            callback(&DomEvent {
                kind,
                target,
                current_target,
                phase,
            });
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("id", &self.inner.id)
            .field("nodes", &self.read().node_count())
            .finish()
    }
}
