//! Core systems for keydomain.
//!
//! This crate provides the collaborators that keyboard-domain routing is
//! built on:
//!
//! - **Document**: An arena document with attributes, an active element and
//!   capture/bubble event dispatch
//! - **Selectors**: CSS selector parsing (via `cssparser`) and matching
//! - **Key strokes**: Parsing and canonical formatting of combo strings
//! - **Recognizer**: The [`ComboRecognizer`] trait and the in-process
//!   [`ComboTable`]
//! - **Task Queue**: Tick-driven deferred tasks
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use keydomain_core::{ComboRecognizer, ComboTable, KeyStroke};
//!
//! let table = ComboTable::new();
//! table.bind(&["Ctrl+S".to_string()], Arc::new(|event| {
//!     println!("saving via {}", event.combo);
//!     true
//! }));
//!
//! let stroke: KeyStroke = "ctrl+s".parse().unwrap();
//! assert!(table.press(&stroke));
//! ```

pub mod document;
mod error;
mod keystroke;
pub mod logging;
mod recognizer;
pub mod selector;
mod tick;

pub use document::{
    Document, DocumentId, DocumentTree, DomEvent, EventKind, Listener, ListenerId, NodeId,
    NodeKind, Phase,
};
pub use error::{DomError, KeyStrokeParseError, Result};
pub use keystroke::{KeyStroke, Modifiers};
pub use recognizer::{
    ComboCallback, ComboEvent, ComboRecognizer, ComboSource, ComboTable, normalize_combo,
};
pub use selector::Selector;
pub use tick::{TaskId, TaskQueue};

// Handles are shared with listener closures and deferred tasks.
static_assertions::assert_impl_all!(Document: Send, Sync, Clone);
static_assertions::assert_impl_all!(TaskQueue: Send, Sync, Clone);
static_assertions::assert_impl_all!(ComboTable: Send, Sync);
