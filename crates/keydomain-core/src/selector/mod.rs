//! CSS selector types, parsing and matching.
//!
//! Domains may name a focus target with a selector such as `input` or
//! `.toolbar > button:first-child`. The selector is parsed with `cssparser`
//! and matched against any tree implementing [`SelectorTree`].

mod matcher;
mod parser;
mod types;

pub use matcher::{SelectorMatcher, SelectorTree};
pub use types::*;
