//! Arena storage for document nodes.

use std::collections::BTreeMap;

use slotmap::{SlotMap, new_key_type};

use crate::error::{DomError, Result};
use crate::logging::targets;
use crate::selector::{Selector, SelectorMatcher, SelectorTree};

new_key_type! {
    /// Handle to a node in a [`DocumentTree`].
    ///
    /// Handles are generational: a handle to a removed node never aliases a
    /// node created later.
    pub struct NodeId;
}

/// What a node is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// The document node at the top of the tree.
    Document,
    /// An element with a lowercase tag name.
    Element {
        /// Tag name, e.g. `"div"`.
        tag: String,
    },
}

#[derive(Debug)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    attributes: BTreeMap<String, String>,
}

impl NodeData {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            attributes: BTreeMap::new(),
        }
    }

    fn tag(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Element { tag } => Some(tag),
            NodeKind::Document => None,
        }
    }
}

/// Tags that accept focus without a `tabindex` attribute.
const NATIVELY_FOCUSABLE: &[&str] = &["input", "textarea", "select", "button"];

/// The node arena behind a [`Document`](super::Document).
///
/// A fresh tree contains the document node, an `html` element and a `body`
/// element. Nodes created with [`create_element`](Self::create_element) start
/// out disconnected until appended somewhere under the document node.
pub struct DocumentTree {
    nodes: SlotMap<NodeId, NodeData>,
    root: NodeId,
    document_element: NodeId,
    body: NodeId,
    active: NodeId,
}

impl DocumentTree {
    /// Create a tree with the `document > html > body` skeleton.
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(NodeData::new(NodeKind::Document));
        let document_element = nodes.insert(NodeData::new(NodeKind::Element { tag: "html".into() }));
        let body = nodes.insert(NodeData::new(NodeKind::Element { tag: "body".into() }));

        nodes[document_element].parent = Some(root);
        nodes[root].children.push(document_element);
        nodes[body].parent = Some(document_element);
        nodes[document_element].children.push(body);

        Self {
            nodes,
            root,
            document_element,
            body,
            active: body,
        }
    }

    /// The document node.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The `html` element.
    pub fn document_element(&self) -> NodeId {
        self.document_element
    }

    /// The `body` element.
    pub fn body(&self) -> NodeId {
        self.body
    }

    /// The element that currently has focus. Defaults to the body.
    pub fn active_element(&self) -> NodeId {
        self.active
    }

    /// Number of live nodes, the document node included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Check whether the handle refers to a live node.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Create a new, disconnected element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        let tag = tag.to_ascii_lowercase();
        let id = self.nodes.insert(NodeData::new(NodeKind::Element { tag }));
        tracing::trace!(target: targets::DOCUMENT, ?id, "created element");
        id
    }

    fn data(&self, id: NodeId) -> Result<&NodeData> {
        self.nodes.get(id).ok_or(DomError::InvalidNode(id))
    }

    fn element(&self, id: NodeId) -> Result<&NodeData> {
        let data = self.data(id)?;
        match data.kind {
            NodeKind::Element { .. } => Ok(data),
            NodeKind::Document => Err(DomError::NotAnElement(id)),
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Result<&mut NodeData> {
        let data = self.nodes.get_mut(id).ok_or(DomError::InvalidNode(id))?;
        match data.kind {
            NodeKind::Element { .. } => Ok(data),
            NodeKind::Document => Err(DomError::NotAnElement(id)),
        }
    }

    fn ensure_movable(&self, id: NodeId) -> Result<()> {
        self.element(id)?;
        if id == self.document_element || id == self.body {
            return Err(DomError::ProtectedNode(id));
        }
        Ok(())
    }

    /// Append `child` as the last child of `parent`, moving it if it already
    /// has a parent.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.data(parent)?;
        self.ensure_movable(child)?;
        if self.is_inclusive_ancestor(child, parent) {
            return Err(DomError::CircularParentage { parent, child });
        }

        self.unlink(child);
        self.nodes[child].parent = Some(parent);
        self.nodes[parent].children.push(child);
        self.fix_active();
        Ok(())
    }

    /// Remove `node` from its parent, keeping the subtree alive.
    pub fn detach(&mut self, node: NodeId) -> Result<()> {
        self.ensure_movable(node)?;
        self.unlink(node);
        self.fix_active();
        Ok(())
    }

    /// Destroy `node` and its whole subtree.
    ///
    /// Returns every destroyed handle, `node` last.
    #[tracing::instrument(skip(self), target = "keydomain_core::document", level = "trace")]
    pub fn remove(&mut self, node: NodeId) -> Result<Vec<NodeId>> {
        self.ensure_movable(node)?;
        self.unlink(node);

        let mut removed = self.descendants(node)?;
        removed.push(node);
        for &id in &removed {
            self.nodes.remove(id);
        }
        tracing::trace!(target: targets::DOCUMENT, ?node, count = removed.len(), "removed subtree");
        self.fix_active();
        Ok(removed)
    }

    fn unlink(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node].parent.take()
            && let Some(parent_data) = self.nodes.get_mut(parent)
        {
            parent_data.children.retain(|&c| c != node);
        }
    }

    /// If the focused element left the document, focus falls back to the body.
    fn fix_active(&mut self) {
        if !self.is_connected(self.active) {
            tracing::trace!(target: targets::DOCUMENT, previous = ?self.active, "active element disconnected");
            self.active = self.body;
        }
    }

    /// Check whether `ancestor` is `node` or one of its ancestors.
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.nodes.get(id).and_then(|d| d.parent);
        }
        false
    }

    /// Check whether `node` is a strict descendant of `ancestor`.
    pub fn contains_node(&self, ancestor: NodeId, node: NodeId) -> bool {
        ancestor != node && self.is_inclusive_ancestor(ancestor, node)
    }

    /// Check whether the node is reachable from the document node.
    pub fn is_connected(&self, node: NodeId) -> bool {
        self.contains(node) && self.is_inclusive_ancestor(self.root, node)
    }

    /// Get the parent of a node.
    pub fn parent(&self, id: NodeId) -> Result<Option<NodeId>> {
        self.data(id).map(|d| d.parent)
    }

    /// Get the parent if it is an element (the document node is skipped).
    pub fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.nodes.get(id)?.parent?;
        self.nodes.get(parent)?.tag().map(|_| parent)
    }

    /// Get the children of a node.
    pub fn children(&self, id: NodeId) -> Result<&[NodeId]> {
        self.data(id).map(|d| d.children.as_slice())
    }

    /// Ancestors of `id` from its parent up to the document node.
    pub fn ancestors(&self, id: NodeId) -> Result<Vec<NodeId>> {
        let mut result = Vec::new();
        let mut current = self.data(id)?.parent;
        while let Some(parent) = current {
            result.push(parent);
            current = self.nodes.get(parent).and_then(|d| d.parent);
        }
        Ok(result)
    }

    /// All descendants of `scope` in document (pre-)order, excluding `scope`.
    pub fn descendants(&self, scope: NodeId) -> Result<Vec<NodeId>> {
        let mut result = Vec::new();
        let mut stack: Vec<NodeId> = self.children(scope)?.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            result.push(id);
            if let Some(data) = self.nodes.get(id) {
                stack.extend(data.children.iter().rev());
            }
        }
        Ok(result)
    }

    /// The node kind.
    pub fn kind(&self, id: NodeId) -> Result<&NodeKind> {
        self.data(id).map(|d| &d.kind)
    }

    /// Tag name of an element.
    pub fn tag(&self, id: NodeId) -> Result<&str> {
        self.element(id).map(|d| d.tag().unwrap_or_default())
    }

    /// Attribute value, if the node is a live element carrying it.
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.nodes
            .get(id)
            .and_then(|d| d.attributes.get(name))
            .map(String::as_str)
    }

    /// Check for an attribute regardless of its value.
    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.attribute(id, name).is_some()
    }

    /// All attributes of an element, sorted by name.
    pub fn attributes(&self, id: NodeId) -> Result<&BTreeMap<String, String>> {
        self.element(id).map(|d| &d.attributes)
    }

    /// Set an attribute, replacing any previous value.
    pub fn set_attribute(
        &mut self,
        id: NodeId,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<()> {
        let data = self.element_mut(id)?;
        data.attributes.insert(name.into(), value.into());
        Ok(())
    }

    /// Remove an attribute, returning its previous value.
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Result<Option<String>> {
        let data = self.element_mut(id)?;
        Ok(data.attributes.remove(name))
    }

    /// First connected element whose `id` attribute equals `id`.
    pub fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.descendants(self.root)
            .ok()?
            .into_iter()
            .find(|&node| self.attribute(node, "id") == Some(id))
    }

    /// Whether `node` matches `selector`.
    pub fn matches(&self, node: NodeId, selector: &Selector) -> bool {
        SelectorMatcher::matches(selector, self, node)
    }

    /// First descendant of `scope` matching `selector`, in document order.
    pub fn query_selector(&self, scope: NodeId, selector: &Selector) -> Result<Option<NodeId>> {
        Ok(self
            .descendants(scope)?
            .into_iter()
            .find(|&node| self.matches(node, selector)))
    }

    /// All descendants of `scope` matching `selector`, in document order.
    pub fn query_selector_all(&self, scope: NodeId, selector: &Selector) -> Result<Vec<NodeId>> {
        Ok(self
            .descendants(scope)?
            .into_iter()
            .filter(|&node| self.matches(node, selector))
            .collect())
    }

    /// Whether the element can take keyboard focus.
    ///
    /// Form controls, links with `href` and anything with `tabindex` are
    /// focusable unless `disabled` is set.
    pub fn is_focusable(&self, id: NodeId) -> bool {
        let Ok(data) = self.element(id) else {
            return false;
        };
        if data.attributes.contains_key("disabled") {
            return false;
        }
        let tag = data.tag().unwrap_or_default();
        data.attributes.contains_key("tabindex")
            || NATIVELY_FOCUSABLE.contains(&tag)
            || (tag == "a" && data.attributes.contains_key("href"))
    }

    /// Nearest focusable inclusive ancestor of `id`.
    pub fn focusable_ancestor(&self, id: NodeId) -> Option<NodeId> {
        let mut current = Some(id);
        while let Some(node) = current {
            if self.is_focusable(node) {
                return Some(node);
            }
            current = self.parent_element(node);
        }
        None
    }

    pub(crate) fn set_active(&mut self, id: NodeId) {
        self.active = id;
    }
}

impl Default for DocumentTree {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectorTree for DocumentTree {
    type Node = NodeId;

    fn tag_name(&self, node: NodeId) -> Option<&str> {
        self.nodes.get(node).and_then(NodeData::tag)
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        DocumentTree::attribute(self, node, name)
    }

    fn parent_element(&self, node: NodeId) -> Option<NodeId> {
        DocumentTree::parent_element(self, node)
    }

    fn previous_sibling_element(&self, node: NodeId) -> Option<NodeId> {
        let siblings = &self.nodes.get(self.nodes.get(node)?.parent?)?.children;
        let index = siblings.iter().position(|&s| s == node)?;
        index.checked_sub(1).map(|i| siblings[i])
    }

    fn next_sibling_element(&self, node: NodeId) -> Option<NodeId> {
        let siblings = &self.nodes.get(self.nodes.get(node)?.parent?)?.children;
        let index = siblings.iter().position(|&s| s == node)?;
        siblings.get(index + 1).copied()
    }

    fn has_child_elements(&self, node: NodeId) -> bool {
        self.nodes
            .get(node)
            .is_some_and(|d| !d.children.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build() -> (DocumentTree, NodeId, NodeId, NodeId) {
        let mut tree = DocumentTree::new();
        let panel = tree.create_element("DIV");
        let input = tree.create_element("input");
        let span = tree.create_element("span");
        tree.append_child(tree.body(), panel).unwrap();
        tree.append_child(panel, input).unwrap();
        tree.append_child(panel, span).unwrap();
        (tree, panel, input, span)
    }

    #[test]
    fn skeleton() {
        let tree = DocumentTree::new();
        assert_eq!(tree.node_count(), 3);
        assert_eq!(tree.tag(tree.document_element()).unwrap(), "html");
        assert_eq!(tree.tag(tree.body()).unwrap(), "body");
        assert_eq!(tree.active_element(), tree.body());
        assert_eq!(tree.parent_element(tree.document_element()), None);
        assert_eq!(tree.tag(tree.root()), Err(DomError::NotAnElement(tree.root())));
    }

    #[test]
    fn append_and_order() {
        let (tree, panel, input, span) = build();
        assert_eq!(tree.tag(panel).unwrap(), "div");
        assert_eq!(tree.children(panel).unwrap(), &[input, span]);
        assert_eq!(tree.parent_element(input), Some(panel));
        let all = tree.descendants(tree.body()).unwrap();
        assert_eq!(all, vec![panel, input, span]);
        assert!(tree.is_connected(span));
        assert!(tree.contains_node(panel, span));
        assert!(!tree.contains_node(span, span));
    }

    #[test]
    fn circular_parentage() {
        let (mut tree, panel, input, _) = build();
        assert_eq!(
            tree.append_child(input, panel),
            Err(DomError::CircularParentage { parent: input, child: panel })
        );
        assert_eq!(
            tree.append_child(panel, panel),
            Err(DomError::CircularParentage { parent: panel, child: panel })
        );
    }

    #[test]
    fn skeleton_is_protected() {
        let mut tree = DocumentTree::new();
        let body = tree.body();
        let html = tree.document_element();
        assert_eq!(tree.detach(body), Err(DomError::ProtectedNode(body)));
        assert_eq!(tree.remove(html), Err(DomError::ProtectedNode(html)));
    }

    #[test]
    fn detach_and_remove() {
        let (mut tree, panel, input, span) = build();
        tree.detach(panel).unwrap();
        assert!(!tree.is_connected(input));
        assert!(tree.contains(input));

        let removed = tree.remove(panel).unwrap();
        assert_eq!(removed, vec![input, span, panel]);
        assert!(!tree.contains(input));
        assert_eq!(tree.parent(panel), Err(DomError::InvalidNode(panel)));
    }

    #[test]
    fn active_falls_back_to_body() {
        let (mut tree, panel, input, _) = build();
        tree.set_active(input);
        tree.detach(panel).unwrap();
        assert_eq!(tree.active_element(), tree.body());
    }

    #[test]
    fn attributes() {
        let (mut tree, panel, ..) = build();
        tree.set_attribute(panel, "id", "main").unwrap();
        tree.set_attribute(panel, "data-keydomain", "").unwrap();
        assert_eq!(tree.attribute(panel, "id"), Some("main"));
        assert!(tree.has_attribute(panel, "data-keydomain"));
        assert_eq!(tree.element_by_id("main"), Some(panel));
        assert_eq!(
            tree.remove_attribute(panel, "id").unwrap(),
            Some("main".to_string())
        );
        assert_eq!(tree.element_by_id("main"), None);
        let root = tree.root();
        assert!(tree.set_attribute(root, "x", "y").is_err());
    }

    #[test]
    fn query() {
        let (tree, panel, input, span) = build();
        let sel = Selector::parse("div > span").unwrap();
        assert_eq!(tree.query_selector(tree.body(), &sel).unwrap(), Some(span));
        let any = Selector::parse("*").unwrap();
        assert_eq!(tree.query_selector_all(panel, &any).unwrap(), vec![input, span]);
        // The scope itself never matches.
        let div = Selector::parse("div").unwrap();
        assert_eq!(tree.query_selector(panel, &div).unwrap(), None);
    }

    #[test]
    fn focusability() {
        let (mut tree, panel, input, span) = build();
        assert!(tree.is_focusable(input));
        assert!(!tree.is_focusable(panel));
        tree.set_attribute(panel, "tabindex", "-1").unwrap();
        assert!(tree.is_focusable(panel));
        tree.set_attribute(input, "disabled", "").unwrap();
        assert!(!tree.is_focusable(input));
        assert_eq!(tree.focusable_ancestor(span), Some(panel));
        assert!(!tree.is_focusable(tree.root()));
    }
}
