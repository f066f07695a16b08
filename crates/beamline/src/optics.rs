//! Contract with external optics engines.
//!
//! Computing Twiss functions is not done here. An [`OpticsEngine`] receives
//! the drift-explicit node list of a lattice together with the element
//! definitions it refers to, and returns one [`OpticsRow`] per node.

use indexmap::IndexMap;

use beamline_core::{catalog::ElementCatalog, node::NodeKey, node::PositionedNode};

/// An external optics calculation.
pub trait OpticsEngine {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Computes optics functions at the exit of every node.
    ///
    /// `nodes` are in longitudinal order and include drifts. Every node's
    /// element is defined in `catalog`.
    fn compute(
        &self,
        nodes: &[PositionedNode],
        catalog: &ElementCatalog,
    ) -> Result<OpticsTable, Self::Error>;
}

/// Closed-orbit coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Orbit {
    pub x: f64,
    pub px: f64,
    pub y: f64,
    pub py: f64,
    pub delta: f64,
    pub ct: f64,
}

/// Optics functions at one node.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OpticsRow {
    /// Longitudinal position, in metres.
    pub s: f64,
    pub beta_x: f64,
    pub beta_y: f64,
    pub alpha_x: f64,
    pub alpha_y: f64,
    pub dispersion_x: f64,
    pub dispersion_y: f64,
    /// Phase advance, in units of 2π.
    pub phase_x: f64,
    pub phase_y: f64,
    pub orbit: Orbit,
}

/// Optics rows keyed by node, in the order the engine produced them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OpticsTable {
    rows: IndexMap<NodeKey, OpticsRow>,
}

impl OpticsTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a row, returning the row previously stored for `key`.
    pub fn insert(&mut self, key: NodeKey, row: OpticsRow) -> Option<OpticsRow> {
        self.rows.insert(key, row)
    }

    pub fn get(&self, key: &NodeKey) -> Option<&OpticsRow> {
        self.rows.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NodeKey, &OpticsRow)> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// One column of the table, e.g. `table.column(|row| row.beta_x)`.
    pub fn column(&self, select: impl Fn(&OpticsRow) -> f64) -> Vec<f64> {
        self.rows.values().map(select).collect()
    }

    /// The table without rows for drift elements.
    ///
    /// Rows whose element is not in `catalog` are kept.
    pub fn without_drifts(&self, catalog: &ElementCatalog) -> Self {
        self.rows
            .iter()
            .filter(|(key, _)| !catalog.get(key.element).is_some_and(|e| e.is_drift()))
            .map(|(key, row)| (*key, *row))
            .collect()
    }
}

impl FromIterator<(NodeKey, OpticsRow)> for OpticsTable {
    fn from_iter<T: IntoIterator<Item = (NodeKey, OpticsRow)>>(iter: T) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use beamline_core::element::Element;

    use super::*;

    #[test]
    fn test_without_drifts() {
        let catalog = ElementCatalog::from_elements([
            Element::quadrupole("qf", 1.0, 0.1).expect("valid"),
            Element::drift("d", 2.0).expect("valid"),
        ])
        .expect("unique");

        let table: OpticsTable = [
            (NodeKey::new("qf", 1), OpticsRow { s: 1.0, ..OpticsRow::default() }),
            (NodeKey::new("d", 1), OpticsRow { s: 3.0, ..OpticsRow::default() }),
            (NodeKey::new("qf", 2), OpticsRow { s: 4.0, ..OpticsRow::default() }),
        ]
        .into_iter()
        .collect();

        let filtered = table.without_drifts(&catalog);
        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered.column(|row| row.s), [1.0, 4.0]);
        assert!(filtered.get(&NodeKey::new("d", 1)).is_none());
    }
}
