//! Selector matching algorithm.

use super::{Combinator, PseudoClass, Selector, SelectorPart, TypeSelector};

/// Structural view of a tree that selectors can be matched against.
///
/// Only element nodes are ever passed in; the document node itself is
/// never a selector subject.
pub trait SelectorTree {
    /// Node handle type.
    type Node: Copy + Eq;

    /// Lowercase tag name of an element.
    fn tag_name(&self, node: Self::Node) -> Option<&str>;

    /// Attribute value of an element, if present.
    fn attribute(&self, node: Self::Node, name: &str) -> Option<&str>;

    /// Parent element (not the document node).
    fn parent_element(&self, node: Self::Node) -> Option<Self::Node>;

    /// Closest preceding sibling that is an element.
    fn previous_sibling_element(&self, node: Self::Node) -> Option<Self::Node>;

    /// Closest following sibling that is an element.
    fn next_sibling_element(&self, node: Self::Node) -> Option<Self::Node>;

    /// Whether the element has any child elements.
    fn has_child_elements(&self, node: Self::Node) -> bool;
}

/// Selector matching engine.
pub struct SelectorMatcher;

impl SelectorMatcher {
    /// Check whether `node` matches the whole selector, combinators included.
    ///
    /// Parts are matched right to left with backtracking on descendant and
    /// general-sibling combinators.
    pub fn matches<T: SelectorTree>(selector: &Selector, tree: &T, node: T::Node) -> bool {
        match selector.parts.len() {
            0 => false,
            n => Self::matches_from(selector, n - 1, tree, node),
        }
    }

    fn matches_from<T: SelectorTree>(
        selector: &Selector,
        index: usize,
        tree: &T,
        node: T::Node,
    ) -> bool {
        if !Self::part_matches(&selector.parts[index], tree, node) {
            return false;
        }
        if index == 0 {
            return true;
        }

        let next = index - 1;
        match selector.combinators[next] {
            Combinator::Child => tree
                .parent_element(node)
                .is_some_and(|parent| Self::matches_from(selector, next, tree, parent)),
            Combinator::Descendant => {
                let mut ancestor = tree.parent_element(node);
                while let Some(candidate) = ancestor {
                    if Self::matches_from(selector, next, tree, candidate) {
                        return true;
                    }
                    ancestor = tree.parent_element(candidate);
                }
                false
            }
            Combinator::AdjacentSibling => tree
                .previous_sibling_element(node)
                .is_some_and(|sibling| Self::matches_from(selector, next, tree, sibling)),
            Combinator::GeneralSibling => {
                let mut sibling = tree.previous_sibling_element(node);
                while let Some(candidate) = sibling {
                    if Self::matches_from(selector, next, tree, candidate) {
                        return true;
                    }
                    sibling = tree.previous_sibling_element(candidate);
                }
                false
            }
        }
    }

    /// Check if a single compound part matches the element.
    pub fn part_matches<T: SelectorTree>(part: &SelectorPart, tree: &T, node: T::Node) -> bool {
        let Some(tag) = tree.tag_name(node) else {
            return false;
        };

        if let Some(TypeSelector::Type(name)) = &part.type_selector
            && name != tag
        {
            return false;
        }

        if let Some(id) = &part.id
            && tree.attribute(node, "id") != Some(id.as_str())
        {
            return false;
        }

        if !part.classes.is_empty() {
            let class_attr = tree.attribute(node, "class").unwrap_or("");
            for class in &part.classes {
                if !class_attr.split_ascii_whitespace().any(|c| c == class) {
                    return false;
                }
            }
        }

        for attribute in &part.attributes {
            match (tree.attribute(node, &attribute.name), &attribute.value) {
                (None, _) => return false,
                (Some(actual), Some(expected)) if actual != expected => return false,
                _ => {}
            }
        }

        part.pseudo_classes
            .iter()
            .all(|pseudo| Self::pseudo_matches(pseudo, tree, node))
    }

    fn pseudo_matches<T: SelectorTree>(pseudo: &PseudoClass, tree: &T, node: T::Node) -> bool {
        match pseudo {
            PseudoClass::FirstChild => tree.previous_sibling_element(node).is_none(),
            PseudoClass::LastChild => tree.next_sibling_element(node).is_none(),
            PseudoClass::OnlyChild => {
                tree.previous_sibling_element(node).is_none()
                    && tree.next_sibling_element(node).is_none()
            }
            PseudoClass::Empty => !tree.has_child_elements(node),
            PseudoClass::Not(inner) => !Self::part_matches(inner, tree, node),
        }
    }
}
