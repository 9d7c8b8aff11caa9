//! Tracing targets used by keydomain.
//!
//! Filter with e.g. `RUST_LOG=keydomain::focus=debug` once a subscriber is
//! installed.

/// Target names for log filtering.
pub mod targets {
    /// Domain focus transitions and event reconciliation.
    pub const FOCUS: &str = "keydomain::focus";
    /// Domain binding table changes.
    pub const REGISTRY: &str = "keydomain::registry";
    /// Domain add/remove and handler registration.
    pub const CONTROLLER: &str = "keydomain::controller";
    /// Document attachment guard.
    pub const ATTACHMENT: &str = "keydomain::attachment";
}
