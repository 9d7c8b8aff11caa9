//! Parsed selector representation.

use std::fmt;

/// A parsed selector such as `#editor > input.primary`.
///
/// `parts` are compound selectors in source order; `combinators[i]` joins
/// `parts[i]` and `parts[i + 1]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Selector {
    pub parts: Vec<SelectorPart>,
    pub combinators: Vec<Combinator>,
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = self.parts.iter();
        if let Some(first) = parts.next() {
            write!(f, "{first}")?;
        }
        for (combinator, part) in self.combinators.iter().zip(parts) {
            f.write_str(combinator.as_css())?;
            write!(f, "{part}")?;
        }
        Ok(())
    }
}

/// One compound selector: every constraint applies to the same node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SelectorPart {
    pub type_selector: Option<TypeSelector>,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attributes: Vec<AttributeSelector>,
    pub pseudo_classes: Vec<PseudoClass>,
}

impl SelectorPart {
    /// True when nothing has been added to the compound yet.
    pub fn is_empty(&self) -> bool {
        self.type_selector.is_none()
            && self.id.is_none()
            && self.classes.is_empty()
            && self.attributes.is_empty()
            && self.pseudo_classes.is_empty()
    }
}

impl fmt::Display for SelectorPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.type_selector {
            Some(TypeSelector::Universal) => f.write_str("*")?,
            Some(TypeSelector::Type(tag)) => f.write_str(tag)?,
            None => {}
        }
        if let Some(id) = &self.id {
            write!(f, "#{id}")?;
        }
        for class in &self.classes {
            write!(f, ".{class}")?;
        }
        for attribute in &self.attributes {
            write!(f, "{attribute}")?;
        }
        for pseudo in &self.pseudo_classes {
            write!(f, ":{pseudo}")?;
        }
        Ok(())
    }
}

/// Tag constraint of a compound.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeSelector {
    /// `*`
    Universal,
    /// Lowercased tag name.
    Type(String),
}

/// `[name]` or `[name=value]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributeSelector {
    /// Lowercased attribute name.
    pub name: String,
    pub value: Option<String>,
}

impl AttributeSelector {
    pub fn present(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }

    pub fn equals(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }
}

impl fmt::Display for AttributeSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "[{}=\"{value}\"]", self.name),
            None => write!(f, "[{}]", self.name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Combinator {
    /// Whitespace: any ancestor.
    Descendant,
    /// `>`: the parent.
    Child,
    /// `+`: the previous element sibling.
    AdjacentSibling,
    /// `~`: any previous element sibling.
    GeneralSibling,
}

impl Combinator {
    fn as_css(self) -> &'static str {
        match self {
            Combinator::Descendant => " ",
            Combinator::Child => " > ",
            Combinator::AdjacentSibling => " + ",
            Combinator::GeneralSibling => " ~ ",
        }
    }
}

/// Supported structural pseudo-classes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PseudoClass {
    FirstChild,
    LastChild,
    OnlyChild,
    /// No element children.
    Empty,
    Not(Box<SelectorPart>),
}

impl PseudoClass {
    /// Looks up an argument-less pseudo-class by name, ignoring case.
    pub fn from_css(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "first-child" => Some(Self::FirstChild),
            "last-child" => Some(Self::LastChild),
            "only-child" => Some(Self::OnlyChild),
            "empty" => Some(Self::Empty),
            _ => None,
        }
    }
}

impl fmt::Display for PseudoClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PseudoClass::FirstChild => f.write_str("first-child"),
            PseudoClass::LastChild => f.write_str("last-child"),
            PseudoClass::OnlyChild => f.write_str("only-child"),
            PseudoClass::Empty => f.write_str("empty"),
            PseudoClass::Not(inner) => write!(f, "not({inner})"),
        }
    }
}
