//! Controller configuration.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Names of the declarative attributes read from domain elements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomainAttributes {
    /// Marks an element as a domain root; its value is the domain name.
    pub domain: String,
    /// Focus target selector. An empty value targets the domain root.
    pub focus: String,
    /// `"true"` makes the focus target win over DOM focus suppression.
    pub focus_lock: String,
}

impl Default for DomainAttributes {
    fn default() -> Self {
        Self {
            domain: "data-keydomain".into(),
            focus: "data-keydomain-focus".into(),
            focus_lock: "data-keydomain-focus-lock".into(),
        }
    }
}

/// Configuration for a [`FocusController`](crate::FocusController).
///
/// # Example
///
/// ```
/// use keydomain::ControllerConfig;
///
/// let config = ControllerConfig::from_toml_str(r#"
///     no_change_sentinel = "(keep)"
///
///     [attributes]
///     domain = "data-scope"
/// "#).unwrap();
///
/// assert_eq!(config.attributes.domain, "data-scope");
/// assert_eq!(config.attributes.focus, "data-keydomain-focus");
/// assert_eq!(config.max_ancestor_depth, 512);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Domain name that leaves the current domain untouched.
    pub no_change_sentinel: String,
    /// Maximum number of ancestors inspected when resolving an element's domain.
    pub max_ancestor_depth: usize,
    /// Declarative attribute names.
    pub attributes: DomainAttributes,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            no_change_sentinel: "---".into(),
            max_ancestor_depth: 512,
            attributes: DomainAttributes::default(),
        }
    }
}

impl ControllerConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from TOML. Missing keys keep their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Set the domain attribute name.
    pub fn domain_attribute(mut self, name: impl Into<String>) -> Self {
        self.attributes.domain = name.into();
        self
    }

    /// Set the focus target attribute name.
    pub fn focus_attribute(mut self, name: impl Into<String>) -> Self {
        self.attributes.focus = name.into();
        self
    }

    /// Set the focus lock attribute name.
    pub fn focus_lock_attribute(mut self, name: impl Into<String>) -> Self {
        self.attributes.focus_lock = name.into();
        self
    }

    /// Set the no-change sentinel.
    pub fn no_change_sentinel(mut self, sentinel: impl Into<String>) -> Self {
        self.no_change_sentinel = sentinel.into();
        self
    }

    /// Set the ancestor walk bound.
    pub fn max_ancestor_depth(mut self, depth: usize) -> Self {
        self.max_ancestor_depth = depth;
        self
    }
}
