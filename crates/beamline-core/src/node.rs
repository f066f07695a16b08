//! Positioned occurrences of catalog elements.

use std::fmt;

use crate::{
    identifier::Id,
    position::{Placement, Span},
};

/// One occurrence of an element at a position along the beamline.
///
/// A node refers to its element by name; the definition itself lives in the
/// [`ElementCatalog`](crate::catalog::ElementCatalog). `length` caches the
/// element length so that positions can be computed without the catalog, and
/// is refreshed by the engine whenever an element changes.
///
/// `element_number` is the 1-based occurrence count of `element` in traversal
/// order. Zero means it has not been assigned yet.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedNode {
    element: Id,
    element_number: usize,
    length: f64,
    placement: Placement,
}

impl PositionedNode {
    pub fn new(element: impl Into<Id>, length: f64, placement: Placement) -> Self {
        Self {
            element: element.into(),
            element_number: 0,
            length,
            placement,
        }
    }

    /// Creates a node whose centre sits at `center`.
    pub fn centered(element: impl Into<Id>, length: f64, center: f64) -> Self {
        Self::new(element, length, Placement::at(center))
    }

    pub fn element(&self) -> Id {
        self.element
    }

    pub fn element_number(&self) -> usize {
        self.element_number
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn placement(&self) -> &Placement {
        &self.placement
    }

    pub fn placement_mut(&mut self) -> &mut Placement {
        &mut self.placement
    }

    pub fn set_element_number(&mut self, element_number: usize) {
        self.element_number = element_number;
    }

    pub fn set_length(&mut self, length: f64) {
        self.length = length;
    }

    pub fn span(&self) -> Span {
        self.placement.span(self.length)
    }

    pub fn start(&self) -> f64 {
        self.span().start()
    }

    pub fn center(&self) -> f64 {
        self.span().center()
    }

    pub fn end(&self) -> f64 {
        self.span().end()
    }

    /// Key identifying this occurrence within a lattice.
    pub fn key(&self) -> NodeKey {
        NodeKey::new(self.element, self.element_number)
    }
}

impl fmt::Display for PositionedNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.element, self.element_number)
    }
}

/// `(element name, occurrence number)` pair that addresses one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeKey {
    pub element: Id,
    pub occurrence: usize,
}

impl NodeKey {
    pub fn new(element: impl Into<Id>, occurrence: usize) -> Self {
        Self {
            element: element.into(),
            occurrence,
        }
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.element, self.occurrence)
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;
    use crate::position::Anchor;

    #[test]
    fn test_derived_positions() {
        let node = PositionedNode::new("qf", 0.5, Placement::anchored(Anchor::Start, 2.0));
        assert_approx_eq!(f64, node.start(), 2.0);
        assert_approx_eq!(f64, node.center(), 2.25);
        assert_approx_eq!(f64, node.end(), 2.5);
        assert_eq!(node.element_number(), 0);
    }

    #[test]
    fn test_length_change_keeps_anchor() {
        let mut node = PositionedNode::new("mb", 2.0, Placement::anchored(Anchor::End, 10.0));
        node.set_length(4.0);
        assert_approx_eq!(f64, node.end(), 10.0);
        assert_approx_eq!(f64, node.start(), 6.0);
    }

    #[test]
    fn test_display_and_key() {
        let mut node = PositionedNode::centered("qd", 0.5, 1.0);
        node.set_element_number(3);
        assert_eq!(node.to_string(), "qd[3]");
        assert_eq!(node.key(), NodeKey::new("qd", 3));
    }
}
