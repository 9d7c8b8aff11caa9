//! Domain focus transitions.

use keydomain_core::NodeId;

use super::{ControllerShared, DomFocus, Domain};
use crate::logging::targets;

impl ControllerShared {
    /// Make `name` the current domain.
    ///
    /// The previously focused element is blurred first. Unknown names fall
    /// back to the default domain, even when that names no registered domain.
    #[tracing::instrument(skip(self), target = "keydomain::focus", level = "debug")]
    pub(super) fn focus_domain(&self, name: Option<&str>, dom_focus: DomFocus) {
        if name == Some(self.config.no_change_sentinel.as_str()) {
            return;
        }

        let (previous, resolved, domain, last_focused) = {
            let mut state = self.state.lock();
            let resolved = match name {
                Some(name) if state.domain(name).is_some() => Some(name.to_string()),
                _ => state.default_domain.clone(),
            };
            let domain = resolved.as_deref().and_then(|n| state.domain(n)).cloned();
            let previous = std::mem::replace(&mut state.current, resolved.clone());
            (previous, resolved, domain, state.last_focused.take())
        };

        if let Some(node) = last_focused {
            self.document.blur(node);
        }

        if previous != resolved {
            tracing::debug!(target: targets::FOCUS, from = ?previous, to = ?resolved, "domain focus changed");
        }

        if let Some(domain) = domain {
            self.apply_dom_focus(&domain, dom_focus);
        }

        self.registry.focus_domain(resolved.as_deref());
    }

    fn apply_dom_focus(&self, domain: &Domain, dom_focus: DomFocus) {
        match &domain.focus_selector {
            Some(selector) if domain.focus_lock || dom_focus == DomFocus::Apply => {
                if let Some(target) = self.resolve_focus_target(domain, selector)
                    && self.try_focus(target)
                {
                    self.state.lock().last_focused = Some(target);
                }
            }
            None if dom_focus == DomFocus::Apply => {
                self.try_focus(domain.element);
            }
            _ => {}
        }
    }

    fn resolve_focus_target(&self, domain: &Domain, selector: &str) -> Option<NodeId> {
        if selector.is_empty() {
            return Some(domain.element);
        }
        match self.document.query_selector(domain.element, selector) {
            Ok(Some(node)) => Some(node),
            Ok(None) => {
                tracing::debug!(target: targets::FOCUS, domain = %domain.name, selector, "focus target not found");
                None
            }
            Err(err) => {
                tracing::warn!(target: targets::FOCUS, domain = %domain.name, %err, "bad focus target selector");
                None
            }
        }
    }

    /// Focus `node`, logging and swallowing document errors.
    fn try_focus(&self, node: NodeId) -> bool {
        match self.document.focus(node) {
            Ok(()) => true,
            Err(err) => {
                tracing::debug!(target: targets::FOCUS, ?node, %err, "focus suppressed");
                false
            }
        }
    }

    pub(super) fn is_locking_focus(&self, name: Option<&str>) -> bool {
        let Some(name) = name else {
            return false;
        };
        self.state
            .lock()
            .domain(name)
            .is_some_and(|d| d.focus_lock)
    }

    /// Walk from `element` up to the body and return the first declared domain.
    ///
    /// The attribute is read from the document, so elements not (or no longer)
    /// registered as domains still count.
    pub(super) fn find_domain_containing(&self, element: NodeId) -> Option<String> {
        let attr = &self.config.attributes.domain;
        let max_depth = self.config.max_ancestor_depth;

        self.document.with_tree(|tree| {
            let body = tree.body();
            let mut node = Some(element);
            for _ in 0..=max_depth {
                let current = node?;
                if let Some(name) = tree.attribute(current, attr) {
                    return Some(name.to_string());
                }
                if current == body {
                    return None;
                }
                node = tree.parent_element(current);
            }
            tracing::warn!(target: targets::FOCUS, ?element, max_depth, "ancestor walk exceeded depth limit");
            None
        })
    }
}
