//! Error types for keydomain-core.

use crate::document::NodeId;

/// Result type alias for document operations.
pub type Result<T> = std::result::Result<T, DomError>;

/// Errors that can occur while manipulating or querying a [`Document`](crate::Document).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    /// The node handle does not belong to this document or has been removed.
    #[error("invalid or removed node {0:?}")]
    InvalidNode(NodeId),

    /// The operation requires an element but the node is the document itself.
    #[error("node {0:?} is not an element")]
    NotAnElement(NodeId),

    /// Appending would make a node its own ancestor.
    #[error("cannot append {child:?} under {parent:?}: would create a cycle")]
    CircularParentage { parent: NodeId, child: NodeId },

    /// The document node, `<html>` and `<body>` cannot be moved or removed.
    #[error("node {0:?} belongs to the document skeleton")]
    ProtectedNode(NodeId),

    /// The element is not attached to the document tree.
    #[error("element {0:?} is not connected to the document")]
    Disconnected(NodeId),

    /// The element cannot receive keyboard focus.
    #[error("element {0:?} cannot receive focus")]
    NotFocusable(NodeId),

    /// Selector parsing error.
    #[error("invalid selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },
}

impl DomError {
    /// Create a selector error.
    pub fn invalid_selector(selector: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidSelector {
            selector: selector.into(),
            message: message.into(),
        }
    }
}

/// Errors produced when parsing a combo string such as `"ctrl+s"`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyStrokeParseError {
    /// The string is empty.
    #[error("empty key stroke")]
    Empty,

    /// Only modifiers were given.
    #[error("no key specified in '{0}'")]
    NoKey(String),

    /// More than one non-modifier key was given.
    #[error("more than one key in '{0}'")]
    MultipleKeys(String),
}
