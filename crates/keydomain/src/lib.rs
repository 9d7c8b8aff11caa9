//! keydomain - scoped keyboard-shortcut routing.
//!
//! A page is split into named *domains*: elements carrying a
//! `data-keydomain="name"` attribute. A [`FocusController`] follows pointer
//! presses and focus changes to decide which domain the user is working in,
//! and key combos registered for that domain fire only while it is current.
//! Combos registered globally fire while no domain is.
//!
//! The document model, selectors and the combo recognizer live in
//! [`keydomain_core`], which this crate re-exports.
//!
//! # Example
//!
//! ```
//! use keydomain::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let doc = Document::new();
//!     let list = doc.create_element("ul");
//!     doc.set_attribute(list, "data-keydomain", "list")?;
//!     doc.append_child(doc.body(), list)?;
//!
//!     let controller = FocusController::attach(doc.clone())?;
//!     controller.register("list", &["j"], |_| true);
//!     controller.register(Scope::Global, &["?"], |_| true);
//!
//!     // Nothing is current yet: only the global combo is live.
//!     assert!(controller.trigger("?"));
//!     assert!(!controller.trigger("j"));
//!
//!     // A press inside the list makes it current on the next tick.
//!     doc.press(list)?;
//!     controller.task_queue().run_tick();
//!     assert_eq!(controller.current_domain().as_deref(), Some("list"));
//!     assert!(controller.trigger("j"));
//!     assert!(!controller.trigger("?"));
//!     Ok(())
//! }
//! ```

mod attachment;
mod config;
mod controller;
mod error;
mod global;
pub mod logging;
pub mod prelude;
mod registry;

pub use attachment::AttachmentRegistry;
pub use config::{ControllerConfig, DomainAttributes};
pub use controller::{
    AttachTarget, ControllerBuilder, DomFocus, Domain, FocusController, HandlerId, Scope,
};
pub use error::{KeyDomainError, Result};
pub use global::GlobalBindings;
pub use registry::{BindingSnapshot, DomainRegistry, GlobalFallback, KeyHandler};

pub use keydomain_core;

// Controllers are handed to other threads by embedders.
static_assertions::assert_impl_all!(FocusController: Send, Sync);
static_assertions::assert_impl_all!(DomainRegistry: Send, Sync, Clone);
