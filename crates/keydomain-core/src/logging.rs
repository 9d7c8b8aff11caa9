//! Logging facilities.
//!
//! keydomain uses the `tracing` crate for instrumentation. To see logs,
//! install a subscriber in your application:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("keydomain_core::document=trace")
//!     .init();
//! ```

/// Target names for log filtering.
pub mod targets {
    /// Document tree, focus and event dispatch.
    pub const DOCUMENT: &str = "keydomain_core::document";
    /// Combo recognizer.
    pub const RECOGNIZER: &str = "keydomain_core::recognizer";
    /// Deferred task queue.
    pub const TICK: &str = "keydomain_core::tick";
}
