//! Document events and listeners.

use std::sync::Arc;

use super::NodeId;

/// Kinds of events a [`Document`](super::Document) dispatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A pointer button was pressed over an element.
    PointerDown,
    /// An element received keyboard focus.
    Focus,
}

impl EventKind {
    /// Whether the event has a bubble phase after reaching its target.
    pub fn bubbles(self) -> bool {
        match self {
            EventKind::PointerDown => true,
            EventKind::Focus => false,
        }
    }
}

/// Propagation phase in which a listener is invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Travelling from the document node down to the target's parent.
    Capture,
    /// At the target itself.
    Target,
    /// Travelling from the target's parent back up to the document node.
    Bubble,
}

/// An event delivered to a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomEvent {
    /// What happened.
    pub kind: EventKind,
    /// The node the event was dispatched at.
    pub target: NodeId,
    /// The node whose listener is being invoked.
    pub current_target: NodeId,
    /// Current propagation phase.
    pub phase: Phase,
}

/// Shared listener callback.
pub type Listener = Arc<dyn Fn(&DomEvent) + Send + Sync>;
