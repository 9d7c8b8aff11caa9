//! Error types for keydomain.

use keydomain_core::{DocumentId, DomError, NodeId};

/// Result type alias for controller operations.
pub type Result<T> = std::result::Result<T, KeyDomainError>;

/// Errors reported by [`FocusController`](crate::FocusController).
#[derive(Debug, thiserror::Error)]
pub enum KeyDomainError {
    /// Another controller already listens on this whole document.
    #[error("a key handler is already attached to document {0:?}")]
    DocumentAlreadyAttached(DocumentId),

    /// The element passed to `add_domain` does not exist.
    #[error("element {element:?} for domain '{domain}' does not exist")]
    MissingElement { domain: String, element: NodeId },

    /// A domain with this name is already registered.
    #[error("domain '{0}' is already registered")]
    DuplicateDomain(String),

    /// The element given as attachment target is not usable.
    #[error("cannot attach to {0:?}: not a connected element")]
    InvalidTarget(NodeId),

    /// Document operation failed.
    #[error(transparent)]
    Dom(#[from] DomError),

    /// Configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
}

impl KeyDomainError {
    /// Returns true for errors caused by misconfiguration rather than document state.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::DocumentAlreadyAttached(_)
                | Self::DuplicateDomain(_)
                | Self::MissingElement { .. }
                | Self::Config(_)
        )
    }
}
