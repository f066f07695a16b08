//! Sequence and line views of a node list.
//!
//! A *sequence* holds the physical elements of a lattice, each with an
//! absolute position. A *line* is the same list with every gap between
//! consecutive elements filled by a synthesized drift. The functions here
//! convert between the two views and maintain the invariants they share:
//! nodes are ordered by position, occurrences are numbered per element name
//! and no node starts before its predecessor ends.

use std::collections::HashMap;

use log::{debug, trace};

use beamline_core::{
    ElementError,
    catalog::ElementCatalog,
    element::Element,
    identifier::Id,
    node::PositionedNode,
    position::{Anchor, Placement},
};

use crate::error::{LatticeError, Result};

/// A drift-explicit view of a lattice.
///
/// `drifts` holds the definitions of the drifts synthesized for this line.
/// The other nodes refer to elements of the catalog the line was built from.
#[derive(Debug, Clone, Default)]
pub struct Line {
    nodes: Vec<PositionedNode>,
    drifts: ElementCatalog,
}

impl Line {
    /// Wraps an existing drift-explicit node list.
    pub fn from_nodes(nodes: Vec<PositionedNode>, drifts: ElementCatalog) -> Self {
        Self { nodes, drifts }
    }

    pub fn nodes(&self) -> &[PositionedNode] {
        &self.nodes
    }

    pub fn drifts(&self) -> &ElementCatalog {
        &self.drifts
    }

    pub fn total_length(&self) -> f64 {
        total_length(&self.nodes)
    }

    pub fn into_parts(self) -> (Vec<PositionedNode>, ElementCatalog) {
        (self.nodes, self.drifts)
    }
}

/// Walks position-sorted nodes and reports every gap wider than `tolerance`.
///
/// With a `length`, the walk covers `[0, length]`: the gaps before the first
/// node and after the last one are reported too, and a node reaching outside
/// that range counts as an overlap. `on_gap` receives the index of the node
/// after the gap (`nodes.len()` for the trailing gap), the start of the gap
/// and its length. An overlap wider than `tolerance` aborts the walk.
fn walk_gaps(
    nodes: &[PositionedNode],
    tolerance: f64,
    length: Option<f64>,
    mut on_gap: impl FnMut(usize, f64, f64),
) -> Result<()> {
    let mut previous_end = match (length, nodes.first()) {
        (Some(_), _) => 0.0,
        (None, Some(first)) => first.start(),
        (None, None) => return Ok(()),
    };

    for (index, node) in nodes.iter().enumerate() {
        let gap = node.start() - previous_end;
        if !gap.is_finite() {
            return Err(ElementError::invalid(node.element(), "position is not finite").into());
        }
        if gap > tolerance {
            on_gap(index, previous_end, gap);
        } else if gap < -tolerance {
            return Err(negative_drift(node, -gap));
        }
        previous_end = node.end();
    }

    if let Some(length) = length {
        let gap = length - previous_end;
        if gap > tolerance {
            on_gap(nodes.len(), previous_end, gap);
        } else if let Some(last) = nodes.last().filter(|_| gap < -tolerance) {
            return Err(negative_drift(last, -gap));
        }
    }
    Ok(())
}

fn negative_drift(node: &PositionedNode, overlap: f64) -> LatticeError {
    LatticeError::NegativeDrift {
        node: node.element(),
        occurrence: node.element_number(),
        overlap,
    }
}

/// Fails if any node starts before its predecessor ends by more than `tolerance`.
///
/// `nodes` must already be ordered by position.
///
/// # Errors
///
/// Returns [`LatticeError::NegativeDrift`] naming the first offending node,
/// or [`ElementError::InvalidParameter`] for a node without a finite position.
pub fn check_geometry(nodes: &[PositionedNode], tolerance: f64) -> Result<()> {
    check_geometry_within(nodes, tolerance, None)
}

/// [`check_geometry`], additionally requiring every node to lie inside
/// `[0, length]` when a length is given.
///
/// # Errors
///
/// See [`check_geometry`]. A node reaching past either end is reported as a
/// negative drift.
pub fn check_geometry_within(
    nodes: &[PositionedNode],
    tolerance: f64,
    length: Option<f64>,
) -> Result<()> {
    walk_gaps(nodes, tolerance, length, |_, _, _| {})
}

/// Builds the line view of a position-sorted sequence.
///
/// Every gap wider than `tolerance` becomes a drift named
/// `{drift_prefix}_{n}`, of exactly the gap length and centred on the gap.
/// Names already used in `catalog` are skipped.
///
/// # Errors
///
/// Returns [`LatticeError::NegativeDrift`] when two nodes overlap by more
/// than `tolerance`. Overlaps are never corrected.
pub fn build_line_from_sequence(
    sequence: &[PositionedNode],
    catalog: &ElementCatalog,
    tolerance: f64,
    drift_prefix: &str,
) -> Result<Line> {
    build_line_within(sequence, catalog, tolerance, drift_prefix, None)
}

/// [`build_line_from_sequence`] over `[0, length]` when a length is given.
///
/// The space before the first node and after the last one is filled with
/// drifts too, so the line starts at `s = 0` and ends at `length`.
///
/// # Errors
///
/// See [`check_geometry_within`].
pub fn build_line_within(
    sequence: &[PositionedNode],
    catalog: &ElementCatalog,
    tolerance: f64,
    drift_prefix: &str,
    length: Option<f64>,
) -> Result<Line> {
    let mut gaps = Vec::new();
    walk_gaps(sequence, tolerance, length, |index, start, gap| {
        gaps.push((index, start, gap));
    })?;

    let mut nodes = Vec::with_capacity(sequence.len() + gaps.len());
    let mut drifts = ElementCatalog::new();
    let mut counter = 0;
    let mut pending = gaps.into_iter().peekable();

    for index in 0..=sequence.len() {
        while let Some((_, start, gap)) = pending.next_if(|(at, _, _)| *at == index) {
            let name = loop {
                let candidate = Id::indexed(drift_prefix, counter);
                counter += 1;
                if !catalog.contains(candidate) {
                    break candidate;
                }
            };

            let drift = Element::drift(name, gap)?;
            drifts.insert(drift)?;

            let mut drift_node = PositionedNode::centered(name, gap, start + gap / 2.0);
            drift_node.set_element_number(1);
            trace!(drift:% = name, start, length = gap; "Synthesized drift");
            nodes.push(drift_node);
        }
        if let Some(node) = sequence.get(index) {
            nodes.push(node.clone());
        }
    }

    debug!(
        nodes = sequence.len(),
        drifts = drifts.len();
        "Built line from sequence"
    );
    Ok(Line { nodes, drifts })
}

/// Drops every drift node from a line, preserving order.
///
/// A node is a drift when its element is a drift in either `catalog` or the
/// line's own drift catalog.
pub fn build_sequence_from_line(line: &Line, catalog: &ElementCatalog) -> Vec<PositionedNode> {
    let is_drift = |node: &PositionedNode| {
        let name = node.element();
        catalog
            .get(name)
            .or_else(|| line.drifts.get(name))
            .is_some_and(Element::is_drift)
    };

    line.nodes
        .iter()
        .filter(|node| !is_drift(*node))
        .cloned()
        .collect()
}

/// Sorts nodes by centre position. Nodes at the same position keep their
/// relative order.
pub fn order_by_position(nodes: &mut [PositionedNode]) {
    nodes.sort_by(|a, b| a.center().total_cmp(&b.center()));
}

/// Numbers the occurrences of each element name 1, 2, 3, ... in list order.
pub fn assign_occurrence_numbers(nodes: &mut [PositionedNode]) {
    let mut seen: HashMap<Id, usize> = HashMap::new();
    for node in nodes {
        let count = seen.entry(node.element()).or_default();
        *count += 1;
        node.set_element_number(*count);
    }
}

/// `end` of the last node, or zero for an empty list.
pub fn total_length(nodes: &[PositionedNode]) -> f64 {
    nodes.last().map_or(0.0, PositionedNode::end)
}

/// Copies the current length of each node's element into the node.
///
/// # Errors
///
/// Returns [`ElementError::MissingElement`](beamline_core::ElementError::MissingElement)
/// if a node refers to an element that is not in `catalog`.
pub fn refresh_lengths(nodes: &mut [PositionedNode], catalog: &ElementCatalog) -> Result<()> {
    for node in nodes {
        let length = catalog.require(node.element())?.length();
        node.set_length(length);
    }
    Ok(())
}

/// Fills in the `reference` offset of every node placed relative to another
/// element.
///
/// The reference point is the centre of the first occurrence of the named
/// element, in list order. References may chain; they are resolved in as many
/// passes as needed.
///
/// # Errors
///
/// Returns [`LatticeError::MissingReference`] when the named element has no
/// node in the list, or when references form a cycle.
pub fn resolve_references(nodes: &mut [PositionedNode]) -> Result<()> {
    let mut first_occurrence: HashMap<Id, usize> = HashMap::new();
    for (index, node) in nodes.iter().enumerate() {
        first_occurrence.entry(node.element()).or_insert(index);
    }

    let mut resolved: Vec<bool> = nodes
        .iter()
        .map(|node| node.placement().from().is_none())
        .collect();

    loop {
        let mut progress = false;
        for index in 0..nodes.len() {
            if resolved[index] {
                continue;
            }
            let node = &nodes[index];
            let Some(reference) = node.placement().from() else {
                continue;
            };
            let target = *first_occurrence
                .get(&reference)
                .ok_or(LatticeError::MissingReference {
                    node: node.element(),
                    reference,
                })?;
            if !resolved[target] {
                continue;
            }

            let center = nodes[target].center();
            nodes[index].placement_mut().set_reference(center);
            resolved[index] = true;
            progress = true;
        }

        if !progress {
            break;
        }
    }

    match resolved.iter().position(|done| !done) {
        Some(index) => {
            let node = &nodes[index];
            Err(LatticeError::MissingReference {
                node: node.element(),
                reference: node.placement().from().unwrap_or(node.element()),
            })
        }
        None => Ok(()),
    }
}

/// Lays out a list of element names end to end, starting at `s = 0`.
///
/// This turns a line definition without explicit positions into positioned
/// nodes. Drift entries are kept as nodes.
///
/// # Errors
///
/// Returns [`ElementError::MissingElement`](beamline_core::ElementError::MissingElement)
/// for a name that is not in `catalog`.
pub fn sequence_from_line_layout(
    names: &[Id],
    catalog: &ElementCatalog,
) -> Result<Vec<PositionedNode>> {
    let mut s = 0.0;
    let mut nodes = Vec::with_capacity(names.len());
    for &name in names {
        let length = catalog.require(name)?.length();
        nodes.push(PositionedNode::new(
            name,
            length,
            Placement::anchored(Anchor::Start, s),
        ));
        s += length;
    }
    assign_occurrence_numbers(&mut nodes);
    Ok(nodes)
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use beamline_core::element::ElementKind;

    use super::*;

    const TOL: f64 = 1e-9;

    fn catalog() -> ElementCatalog {
        ElementCatalog::from_elements([
            Element::quadrupole("qf", 1.0, 0.1).expect("valid"),
            Element::quadrupole("qd", 1.0, -0.1).expect("valid"),
            Element::sbend("mb", 4.0, 0.05).expect("valid"),
            Element::marker("ip"),
        ])
        .expect("unique names")
    }

    fn node(name: &str, length: f64, center: f64) -> PositionedNode {
        PositionedNode::centered(name, length, center)
    }

    fn fodo() -> Vec<PositionedNode> {
        let mut nodes = vec![
            node("qf", 1.0, 0.5),
            node("mb", 4.0, 4.0),
            node("qd", 1.0, 7.5),
            node("mb", 4.0, 11.0),
            node("qf", 1.0, 14.5),
        ];
        assign_occurrence_numbers(&mut nodes);
        nodes
    }

    #[test]
    fn test_line_fills_gaps_with_drifts() {
        let line = build_line_from_sequence(&fodo(), &catalog(), TOL, "drift").expect("valid");

        let names: Vec<_> = line.nodes().iter().map(|n| n.element().to_string()).collect();
        assert_eq!(
            names,
            ["qf", "drift_0", "mb", "drift_1", "qd", "drift_2", "mb", "drift_3", "qf"]
        );
        assert_eq!(line.drifts().len(), 4);
        assert_approx_eq!(f64, line.total_length(), 15.0);
        assert!(line.drifts().iter().all(|d| d.kind() == ElementKind::Drift));
    }

    #[test]
    fn test_drift_length_and_midpoint() {
        let sequence = [node("qf", 1.0, 0.5), node("qd", 1.0, 5.5)];
        let line = build_line_from_sequence(&sequence, &catalog(), TOL, "drift").expect("valid");

        let drift = &line.nodes()[1];
        assert_approx_eq!(f64, drift.length(), 4.0);
        assert_approx_eq!(f64, drift.center(), 3.0);
        let definition = line.drifts().require(drift.element()).expect("defined");
        assert_approx_eq!(f64, definition.length(), 4.0);
    }

    #[test]
    fn test_adjacent_nodes_need_no_drift() {
        let sequence = [node("qf", 1.0, 0.5), node("ip", 0.0, 1.0), node("qd", 1.0, 1.5)];
        let line = build_line_from_sequence(&sequence, &catalog(), TOL, "drift").expect("valid");
        assert_eq!(line.nodes().len(), 3);
        assert!(line.drifts().is_empty());
    }

    #[test]
    fn test_round_trip_recovers_sequence() {
        let sequence = fodo();
        let line = build_line_from_sequence(&sequence, &catalog(), TOL, "drift").expect("valid");
        assert_eq!(build_sequence_from_line(&line, &catalog()), sequence);
    }

    #[test]
    fn test_negative_drift_reports_overlap() {
        let mut sequence = vec![node("qf", 1.0, 0.5), node("qd", 1.0, 1.25)];
        assign_occurrence_numbers(&mut sequence);

        let err = build_line_from_sequence(&sequence, &catalog(), TOL, "drift").unwrap_err();
        let LatticeError::NegativeDrift {
            node,
            occurrence,
            overlap,
        } = err
        else {
            panic!("expected negative drift");
        };
        assert_eq!(node, "qd");
        assert_eq!(occurrence, 1);
        assert_approx_eq!(f64, overlap, 0.25, epsilon = 1e-12);
        assert!(check_geometry(&sequence, TOL).is_err());
    }

    #[test]
    fn test_tolerance_boundary() {
        let eps = 0.5 * TOL;
        let overlap = [node("qf", 1.0, 0.5), node("qd", 1.0, 1.5 - eps)];
        assert!(check_geometry(&overlap, TOL).is_ok());

        let gap = [node("qf", 1.0, 0.5), node("qd", 1.0, 1.5 + eps)];
        let line = build_line_from_sequence(&gap, &catalog(), TOL, "drift").expect("valid");
        assert!(line.drifts().is_empty());
    }

    #[test]
    fn test_gap_equal_to_tolerance_is_inclusive() {
        // 0.25 is exact in binary, so the gaps below are exactly the tolerance
        let tolerance = 0.25;

        let overlap = [node("qf", 1.0, 0.5), node("qd", 1.0, 1.25)];
        assert_approx_eq!(f64, overlap[1].start() - overlap[0].end(), -tolerance, ulps = 0);
        assert!(check_geometry(&overlap, tolerance).is_ok());
        let line =
            build_line_from_sequence(&overlap, &catalog(), tolerance, "drift").expect("valid");
        assert!(line.drifts().is_empty());

        let gap = [node("qf", 1.0, 0.5), node("qd", 1.0, 1.75)];
        assert_approx_eq!(f64, gap[1].start() - gap[0].end(), tolerance, ulps = 0);
        let line = build_line_from_sequence(&gap, &catalog(), tolerance, "drift").expect("valid");
        assert!(line.drifts().is_empty());
        assert_eq!(line.nodes().len(), 2);
    }

    #[test]
    fn test_non_finite_position_rejected() {
        let sequence = [node("qf", 1.0, 0.5), node("qd", 1.0, f64::NAN)];
        let err = check_geometry(&sequence, TOL).unwrap_err();
        assert!(matches!(
            err,
            LatticeError::Element(ElementError::InvalidParameter { element, .. }) if element == "qd"
        ));

        let leading = [node("qf", 1.0, f64::INFINITY)];
        assert!(check_geometry_within(&leading, TOL, Some(10.0)).is_err());
    }

    #[test]
    fn test_line_within_length_adds_boundary_drifts() {
        let sequence = [node("qf", 1.0, 2.5), node("qd", 1.0, 5.5)];
        let line = build_line_within(&sequence, &catalog(), TOL, "drift", Some(8.0))
            .expect("valid");

        let spans: Vec<_> = line
            .nodes()
            .iter()
            .map(|n| (n.element().to_string(), n.start(), n.end()))
            .collect();
        assert_eq!(
            spans,
            [
                ("drift_0".to_string(), 0.0, 2.0),
                ("qf".to_string(), 2.0, 3.0),
                ("drift_1".to_string(), 3.0, 5.0),
                ("qd".to_string(), 5.0, 6.0),
                ("drift_2".to_string(), 6.0, 8.0),
            ]
        );
        assert_approx_eq!(f64, line.total_length(), 8.0);
        assert_eq!(build_sequence_from_line(&line, &catalog()), sequence);
    }

    #[test]
    fn test_nodes_outside_length_are_overlaps() {
        let sequence = [node("qf", 1.0, 0.5), node("qd", 1.0, 5.5)];
        let err = check_geometry_within(&sequence, TOL, Some(5.5)).unwrap_err();
        assert!(matches!(
            err,
            LatticeError::NegativeDrift { node, overlap, .. } if node == "qd" && overlap == 0.5
        ));

        let before_origin = [node("qf", 1.0, 0.25)];
        assert!(matches!(
            check_geometry_within(&before_origin, TOL, Some(5.0)),
            Err(LatticeError::NegativeDrift { node, .. }) if node == "qf"
        ));

        let empty = build_line_within(&[], &catalog(), TOL, "drift", Some(3.0)).expect("valid");
        assert_eq!(empty.nodes().len(), 1);
        assert_approx_eq!(f64, empty.total_length(), 3.0);
    }

    #[test]
    fn test_drift_names_skip_catalog_entries() {
        let mut catalog = catalog();
        catalog
            .insert(Element::drift("drift_0", 1.0).expect("valid"))
            .expect("unique");

        let sequence = [node("qf", 1.0, 0.5), node("qd", 1.0, 3.5)];
        let line = build_line_from_sequence(&sequence, &catalog, TOL, "drift").expect("valid");
        assert_eq!(line.nodes()[1].element(), "drift_1");
    }

    #[test]
    fn test_order_by_position_is_stable() {
        let mut nodes = vec![
            node("qd", 1.0, 5.0),
            node("ip", 0.0, 2.0),
            node("qf", 0.0, 2.0),
            node("mb", 4.0, 0.0),
        ];
        order_by_position(&mut nodes);

        let names: Vec<_> = nodes.iter().map(|n| n.element().to_string()).collect();
        assert_eq!(names, ["mb", "ip", "qf", "qd"]);
    }

    #[test]
    fn test_occurrence_numbering_is_idempotent() {
        let mut nodes = fodo();
        let numbers: Vec<_> = nodes.iter().map(PositionedNode::element_number).collect();
        assert_eq!(numbers, [1, 1, 1, 2, 2]);

        assign_occurrence_numbers(&mut nodes);
        assert_eq!(nodes, fodo());
    }

    #[test]
    fn test_total_length() {
        assert_approx_eq!(f64, total_length(&[]), 0.0);
        assert_approx_eq!(f64, total_length(&fodo()), 15.0);
    }

    #[test]
    fn test_resolve_chained_references() {
        let mut nodes = vec![
            PositionedNode::new("qd", 1.0, Placement::at(2.0).relative_to(Id::new("qf"))),
            node("ip", 0.0, 10.0),
            PositionedNode::new("qf", 1.0, Placement::at(-3.0).relative_to(Id::new("ip"))),
        ];
        resolve_references(&mut nodes).expect("resolvable");

        assert_approx_eq!(f64, nodes[2].center(), 7.0);
        assert_approx_eq!(f64, nodes[0].center(), 9.0);
    }

    #[test]
    fn test_resolve_missing_reference() {
        let mut nodes = vec![PositionedNode::new(
            "qd",
            1.0,
            Placement::at(2.0).relative_to(Id::new("nowhere")),
        )];
        let err = resolve_references(&mut nodes).unwrap_err();
        assert!(matches!(
            err,
            LatticeError::MissingReference { reference, .. } if reference == "nowhere"
        ));
    }

    #[test]
    fn test_resolve_cycle_is_missing_reference() {
        let mut nodes = vec![
            PositionedNode::new("qf", 1.0, Placement::at(1.0).relative_to(Id::new("qd"))),
            PositionedNode::new("qd", 1.0, Placement::at(1.0).relative_to(Id::new("qf"))),
        ];
        assert!(matches!(
            resolve_references(&mut nodes),
            Err(LatticeError::MissingReference { .. })
        ));
    }

    #[test]
    fn test_refresh_lengths() {
        let mut nodes = vec![node("qf", 0.0, 0.5)];
        refresh_lengths(&mut nodes, &catalog()).expect("known element");
        assert_approx_eq!(f64, nodes[0].length(), 1.0);

        let mut unknown = vec![node("zz", 1.0, 0.5)];
        let err = refresh_lengths(&mut unknown, &catalog()).unwrap_err();
        assert!(matches!(
            err,
            LatticeError::Element(ElementError::MissingElement(_))
        ));
    }

    #[test]
    fn test_line_layout_accumulates_lengths() {
        let mut catalog = catalog();
        catalog
            .insert(Element::drift("d", 0.5).expect("valid"))
            .expect("unique");
        let names = ["qf", "d", "mb", "d", "qd"].map(Id::new);

        let nodes = sequence_from_line_layout(&names, &catalog).expect("known elements");
        assert_approx_eq!(f64, nodes[2].start(), 1.5);
        assert_approx_eq!(f64, total_length(&nodes), 7.0);
        assert_eq!(nodes[3].element_number(), 2);
    }
}
