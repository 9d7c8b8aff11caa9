//! Commonly used types.
//!
//! ```
//! use keydomain::prelude::*;
//! ```

pub use crate::{
    ControllerConfig, DomFocus, FocusController, HandlerId, KeyDomainError, Scope,
};
pub use keydomain_core::{ComboEvent, ComboRecognizer, ComboTable, Document, NodeId, TaskQueue};
