//! Turning pointer presses and focus events into domain transitions.
//!
//! Both listeners run in the capture phase on the attachment node. A press
//! only records which domain was hit; the decision is posted to the task
//! queue so that a focus event the press causes is seen first and can
//! supersede it.

use std::sync::{Arc, Weak};

use keydomain_core::{DomEvent, EventKind, NodeId};

use super::{AttachTarget, ControllerShared, DomFocus};
use crate::error::Result;
use crate::logging::targets;

impl ControllerShared {
    fn listener_node(&self) -> NodeId {
        match self.target {
            AttachTarget::Document => self.document.body(),
            AttachTarget::Element(node) => node,
        }
    }

    pub(super) fn install_listeners(self: &Arc<Self>) -> Result<()> {
        let node = self.listener_node();

        let weak = Arc::downgrade(self);
        let press = self.document.add_event_listener(node, EventKind::PointerDown, true, move |event| {
            if let Some(shared) = weak.upgrade() {
                shared.on_pointer_down(event);
            }
        })?;
        self.state.lock().listeners.push(press);

        let weak = Arc::downgrade(self);
        let focus = self.document.add_event_listener(node, EventKind::Focus, true, move |event| {
            if let Some(shared) = weak.upgrade() {
                shared.on_focus(event);
            }
        })?;
        self.state.lock().listeners.push(focus);

        tracing::debug!(target: targets::CONTROLLER, ?node, "listeners installed");
        Ok(())
    }

    pub(super) fn remove_listeners(&self) {
        let listeners = {
            let mut state = self.state.lock();
            state.attached = false;
            std::mem::take(&mut state.listeners)
        };
        if listeners.is_empty() {
            return;
        }
        for id in listeners {
            self.document.remove_event_listener(id);
        }
        tracing::debug!(target: targets::CONTROLLER, "listeners removed");
    }

    fn on_pointer_down(self: &Arc<Self>, event: &DomEvent) {
        let target_domain = self.find_domain_containing(event.target);
        let active = self.document.active_element();
        // Nothing focused means focus is in no domain, not in the outer one.
        let focus_in_domain =
            active != self.document.body() && target_domain == self.find_domain_containing(active);

        self.state.lock().press.handling = true;
        tracing::trace!(
            target: targets::FOCUS,
            node = ?event.target,
            domain = ?target_domain,
            focus_in_domain,
            "pointer down"
        );

        let weak: Weak<Self> = Arc::downgrade(self);
        self.tasks.post(move || {
            if let Some(shared) = weak.upgrade() {
                shared.finish_press(target_domain, focus_in_domain);
            }
        });
    }

    /// Second half of press handling, one tick after the press.
    fn finish_press(&self, target_domain: Option<String>, focus_in_domain: bool) {
        let (attached, focus_was_reset) = {
            let state = self.state.lock();
            (state.attached, state.press.focus_was_reset)
        };

        let locking = self.is_locking_focus(target_domain.as_deref());
        if attached && (locking || (!focus_was_reset && !focus_in_domain)) {
            self.focus_domain(target_domain.as_deref(), DomFocus::Apply);
        } else {
            tracing::trace!(target: targets::FOCUS, domain = ?target_domain, focus_was_reset, "press superseded");
        }

        let mut state = self.state.lock();
        state.press.handling = false;
        state.press.focus_was_reset = false;
    }

    fn on_focus(&self, event: &DomEvent) {
        let body = self.document.body();
        if event.target == body && !self.document.has_attribute(body, &self.config.attributes.domain) {
            return;
        }

        let current = {
            let mut state = self.state.lock();
            if state.press.handling {
                state.press.focus_was_reset = true;
            }
            state.current.clone()
        };

        let target_domain = self.find_domain_containing(event.target);
        if target_domain != current {
            self.focus_domain(target_domain.as_deref(), DomFocus::Suppress);
            // A locking domain may have moved focus to its own target.
            let mut state = self.state.lock();
            if state.last_focused.is_none() {
                state.last_focused = Some(event.target);
            }
        }
    }
}
