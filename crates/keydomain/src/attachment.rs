//! Process-wide guard against attaching two controllers to one document.
//!
//! A controller attached to a whole document claims that document's id here
//! and releases it on reset or drop. Controllers attached to a single element
//! do not claim anything.

use std::collections::BTreeSet;

use keydomain_core::DocumentId;
use parking_lot::Mutex;

use crate::error::{KeyDomainError, Result};
use crate::logging::targets;

/// Set of documents that currently have a document-level controller.
pub struct AttachmentRegistry {
    documents: Mutex<BTreeSet<DocumentId>>,
}

static GLOBAL_ATTACHMENTS: AttachmentRegistry = AttachmentRegistry::new();

impl AttachmentRegistry {
    /// Create an empty registry.
    pub const fn new() -> Self {
        Self {
            documents: Mutex::new(BTreeSet::new()),
        }
    }

    /// The process-wide registry.
    pub fn global() -> &'static AttachmentRegistry {
        &GLOBAL_ATTACHMENTS
    }

    /// Claim `document`. Fails if it is already claimed.
    pub fn claim(&self, document: DocumentId) -> Result<()> {
        if !self.documents.lock().insert(document) {
            tracing::warn!(target: targets::ATTACHMENT, ?document, "document already has a key handler");
            return Err(KeyDomainError::DocumentAlreadyAttached(document));
        }
        tracing::debug!(target: targets::ATTACHMENT, ?document, "claimed document");
        Ok(())
    }

    /// Release a claim. Returns `false` if `document` was not claimed.
    pub fn release(&self, document: DocumentId) -> bool {
        let released = self.documents.lock().remove(&document);
        if released {
            tracing::debug!(target: targets::ATTACHMENT, ?document, "released document");
        }
        released
    }

    /// Check whether `document` is claimed.
    pub fn is_attached(&self, document: DocumentId) -> bool {
        self.documents.lock().contains(&document)
    }
}

impl Default for AttachmentRegistry {
    fn default() -> Self {
        Self::new()
    }
}
