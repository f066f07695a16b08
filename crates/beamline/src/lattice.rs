//! The lattice aggregate.
//!
//! [`Lattice`] owns the element catalog and the canonical node list. The node
//! list is the sequence view: physical elements only, ordered by position and
//! free of negative drifts. The line view is generated from it on demand.
//! A lattice built from a line also remembers the line's length, so drifts at
//! either end of the line survive the trip through the sequence view.
//!
//! Every mutating operation builds a new catalog or node list, validates it,
//! and only then replaces the old one. A failed operation leaves the lattice
//! exactly as it was.

use log::{debug, info};

use beamline_core::{
    ElementError,
    catalog::ElementCatalog,
    element::{Attribute, Element},
    identifier::Id,
    node::PositionedNode,
    position::Placement,
};

use crate::{
    adapter::ElementExporter,
    config::LatticeConfig,
    error::{LatticeError, Result},
    expression::{ExpressionStore, attributes_of},
    optics::{OpticsEngine, OpticsTable},
    sequence::{self, Line},
    slicing,
};

/// A validated lattice: element definitions plus their positioned occurrences.
///
/// # Examples
///
/// ```
/// use beamline::{
///     Lattice,
///     catalog::ElementCatalog,
///     config::LatticeConfig,
///     element::Element,
///     node::PositionedNode,
/// };
///
/// let catalog = ElementCatalog::from_elements([
///     Element::quadrupole("qf", 1.0, 0.1).unwrap(),
///     Element::quadrupole("qd", 1.0, -0.1).unwrap(),
/// ])
/// .unwrap();
/// let nodes = vec![
///     PositionedNode::centered("qd", 1.0, 5.5),
///     PositionedNode::centered("qf", 1.0, 0.5),
/// ];
///
/// let lattice = Lattice::new(catalog, nodes, LatticeConfig::default()).unwrap();
/// assert_eq!(lattice.sequence()[0].element(), "qf");
/// assert_eq!(lattice.total_length(), 6.0);
///
/// let line = lattice.line().unwrap();
/// assert_eq!(line.nodes().len(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct Lattice {
    catalog: ElementCatalog,
    nodes: Vec<PositionedNode>,
    config: LatticeConfig,
    /// Explicit extent `[0, length]`; without it the lattice ends at its last node.
    length: Option<f64>,
}

impl Lattice {
    /// Builds a lattice from element definitions and placed nodes.
    ///
    /// Node lengths are taken from the catalog, relative placements are
    /// resolved, drift nodes are dropped, and the remaining nodes are ordered
    /// by position and numbered per element.
    ///
    /// # Errors
    ///
    /// Returns [`LatticeError::MissingReference`] for an unresolvable relative
    /// placement, [`LatticeError::NegativeDrift`] for overlapping nodes, or
    /// [`ElementError::MissingElement`](beamline_core::ElementError::MissingElement)
    /// for a node whose element is not in the catalog.
    pub fn new(
        catalog: ElementCatalog,
        nodes: Vec<PositionedNode>,
        config: LatticeConfig,
    ) -> Result<Self> {
        let nodes = prepare_nodes(&catalog, nodes, &config, None)?;
        info!(
            elements = catalog.len(),
            nodes = nodes.len();
            "Lattice built"
        );
        Ok(Self {
            catalog,
            nodes,
            config,
            length: None,
        })
    }

    /// Builds a lattice from an ordered list of element names laid out end to
    /// end from `s = 0`.
    ///
    /// The lattice keeps the length of the whole line, so leading and trailing
    /// drifts reappear in [`Lattice::line`].
    ///
    /// # Errors
    ///
    /// See [`Lattice::new`].
    pub fn from_line(catalog: ElementCatalog, names: &[Id], config: LatticeConfig) -> Result<Self> {
        let nodes = sequence::sequence_from_line_layout(names, &catalog)?;
        let length = sequence::total_length(&nodes);
        Self::new(catalog, nodes, config)?.with_length(length)
    }

    /// Fixes the extent of the lattice to `[0, length]`.
    ///
    /// # Errors
    ///
    /// Returns [`LatticeError::InvalidLength`] for a negative or non-finite
    /// length, or [`LatticeError::NegativeDrift`] if a node lies outside the
    /// extent.
    pub fn with_length(mut self, length: f64) -> Result<Self> {
        if !length.is_finite() || length < 0.0 {
            return Err(LatticeError::InvalidLength(length));
        }
        sequence::check_geometry_within(&self.nodes, self.config.tolerance(), Some(length))?;
        self.length = Some(length);
        Ok(self)
    }

    /// The explicit length set by [`Lattice::with_length`] or [`Lattice::from_line`].
    pub fn declared_length(&self) -> Option<f64> {
        self.length
    }

    pub fn catalog(&self) -> &ElementCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &LatticeConfig {
        &self.config
    }

    /// The sequence view: physical nodes in longitudinal order.
    pub fn sequence(&self) -> &[PositionedNode] {
        &self.nodes
    }

    /// The line view: the sequence with a drift filling every gap.
    ///
    /// # Errors
    ///
    /// Fails only if the drift definitions cannot be built.
    pub fn line(&self) -> Result<Line> {
        sequence::build_line_within(
            &self.nodes,
            &self.catalog,
            self.config.tolerance(),
            self.config.drift_prefix(),
            self.length,
        )
    }

    /// The declared length, or `end` of the last node.
    pub fn total_length(&self) -> f64 {
        self.length.unwrap_or_else(|| sequence::total_length(&self.nodes))
    }

    /// Occurrences of one element, in longitudinal order.
    pub fn occurrences(&self, name: Id) -> impl Iterator<Item = &PositionedNode> {
        self.nodes.iter().filter(move |node| node.element() == name)
    }

    /// Replaces the node list, validating the new one first.
    ///
    /// # Errors
    ///
    /// See [`Lattice::new`]. The new nodes must also fit the declared length.
    /// On error the current nodes are kept.
    pub fn replace_nodes(&mut self, nodes: Vec<PositionedNode>) -> Result<()> {
        self.nodes = prepare_nodes(&self.catalog, nodes, &self.config, self.length)?;
        debug!(nodes = self.nodes.len(); "Nodes replaced");
        Ok(())
    }

    /// Edits one element definition in place.
    ///
    /// Every occurrence of the element sees the change. Node lengths are
    /// refreshed, relative placements are resolved again, and the nodes are
    /// reordered and re-checked.
    ///
    /// # Errors
    ///
    /// Returns the error of `edit`, [`ElementError::MissingElement`](beamline_core::ElementError::MissingElement)
    /// for an unknown name, or [`LatticeError::NegativeDrift`] when the edit
    /// makes elements overlap. On error the lattice is unchanged.
    pub fn update_element<F>(&mut self, name: Id, edit: F) -> Result<()>
    where
        F: FnOnce(&mut Element) -> Result<()>,
    {
        let mut catalog = self.catalog.clone();
        let element = catalog
            .get_mut(name)
            .ok_or(ElementError::MissingElement(name))?;
        edit(element)?;
        if element.name() != name {
            return Err(ElementError::invalid(name, "element names cannot change").into());
        }

        self.swap_catalog(catalog)
    }

    /// Shorthand for setting one attribute through [`Lattice::update_element`].
    pub fn set_attribute(&mut self, name: Id, attribute: Attribute, value: f64) -> Result<()> {
        self.update_element(name, |element| {
            element.set_attribute(attribute, value)?;
            Ok(())
        })
    }

    /// The thin version of this lattice. See [`slicing::slice_lattice`].
    ///
    /// # Errors
    ///
    /// See [`slicing::slice_lattice`].
    pub fn slice(&self) -> Result<Lattice> {
        slicing::slice_lattice(self)
    }

    /// Pulls driven parameter values from an expression store.
    ///
    /// The store is recomputed first. Every attribute the store has a value
    /// for is written to the catalog, then lengths and geometry are checked
    /// as for [`Lattice::update_element`]. Returns the number of attributes
    /// that changed.
    ///
    /// # Errors
    ///
    /// Returns an error if a value breaks an element invariant or makes
    /// elements overlap. On error the lattice is unchanged.
    pub fn apply_expressions<S>(&mut self, store: &mut S) -> Result<usize>
    where
        S: ExpressionStore + ?Sized,
    {
        store.recompute();

        let mut catalog = self.catalog.clone();
        let mut changed = 0;
        for name in self.catalog.names() {
            let element = catalog
                .get_mut(name)
                .ok_or(ElementError::MissingElement(name))?;
            for attribute in attributes_of(element) {
                let Some(value) = store.get(name, attribute) else {
                    continue;
                };
                if element.attribute(attribute)? != value {
                    element.set_attribute(attribute, value)?;
                    changed += 1;
                }
            }
        }

        if changed > 0 {
            self.swap_catalog(catalog)?;
        }
        info!(changed; "Applied expression values");
        Ok(changed)
    }

    /// Writes every element attribute to an expression store, then recomputes it.
    ///
    /// # Errors
    ///
    /// Fails only if an attribute listed for an element cannot be read back.
    pub fn publish_expressions<S>(&self, store: &mut S) -> Result<()>
    where
        S: ExpressionStore + ?Sized,
    {
        for element in &self.catalog {
            for attribute in attributes_of(element) {
                store.set(element.name(), attribute, element.attribute(attribute)?);
            }
        }
        store.recompute();
        Ok(())
    }

    /// Runs an optics engine over the line view.
    ///
    /// Drift rows are removed from the result unless `include_drifts` is set.
    ///
    /// # Errors
    ///
    /// Returns [`LatticeError::Optics`] wrapping the engine's error.
    pub fn optics<E>(&self, engine: &E, include_drifts: bool) -> Result<OpticsTable>
    where
        E: OpticsEngine + ?Sized,
    {
        let (nodes, drifts) = self.line()?.into_parts();
        let mut catalog = self.catalog.clone();
        catalog.extend(drifts)?;

        let table = engine
            .compute(&nodes, &catalog)
            .map_err(LatticeError::optics)?;
        debug!(rows = table.len(); "Optics computed");

        Ok(if include_drifts {
            table
        } else {
            table.without_drifts(&catalog)
        })
    }

    /// Exports every element definition, in catalog order.
    ///
    /// # Errors
    ///
    /// Returns the first error of `exporter`, typically
    /// [`LatticeError::UnsupportedFeature`].
    pub fn export<E>(&self, exporter: &E) -> Result<Vec<E::Record>>
    where
        E: ElementExporter + ?Sized,
    {
        self.catalog
            .iter()
            .map(|element| exporter.export(element))
            .collect()
    }

    /// Installs a new catalog after preparing the nodes against it.
    fn swap_catalog(&mut self, catalog: ElementCatalog) -> Result<()> {
        let nodes = prepare_nodes(&catalog, self.nodes.clone(), &self.config, self.length)?;

        self.catalog = catalog;
        self.nodes = nodes;
        Ok(())
    }
}

/// Validates a raw node list and brings it into canonical form.
///
/// Safe to run again on canonical nodes: relative placements are resolved
/// from the refreshed lengths each time.
fn prepare_nodes(
    catalog: &ElementCatalog,
    mut nodes: Vec<PositionedNode>,
    config: &LatticeConfig,
    length: Option<f64>,
) -> Result<Vec<PositionedNode>> {
    let is_drift = |name: Id| catalog.get(name).is_some_and(Element::is_drift);

    sequence::refresh_lengths(&mut nodes, catalog)?;
    sequence::resolve_references(&mut nodes)?;
    for node in &mut nodes {
        if !node.center().is_finite() {
            return Err(ElementError::invalid(node.element(), "position is not finite").into());
        }
        // drift nodes are dropped below, so placements relative to them become absolute
        if node.placement().from().is_some_and(is_drift) {
            let placement = node.placement();
            let absolute = Placement::anchored(placement.anchor(), placement.position());
            *node.placement_mut() = absolute;
        }
    }
    nodes.retain(|node| !is_drift(node.element()));
    sequence::order_by_position(&mut nodes);
    sequence::assign_occurrence_numbers(&mut nodes);
    sequence::check_geometry_within(&nodes, config.tolerance(), length)?;
    Ok(nodes)
}
