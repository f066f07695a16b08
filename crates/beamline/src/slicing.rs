//! Thin-element approximations of thick elements.
//!
//! Slicing replaces an element of length `L` by `N` zero-length kicks placed
//! inside its span, each carrying `1/N` of the parent's integrated strength.
//! Bends are additionally bracketed by entrance and exit [`DipoleEdge`]
//! elements that model the fringe fields at the faces.
//!
//! Two placement schemes are supported:
//!
//! * **TEAPOT**: `delta = L / (2N + 2)`, `separation = L·N / (N² − 1)`. The
//!   first kick sits at `-L/2 + delta` from the centre and each following one
//!   `separation` further on. No kick lands on an element face.
//! * **Uniform**: kicks at `-L/2 + i·L/(N − 1)`, the outer two on the faces.
//!
//! A single slice is always placed at the centre.

use std::collections::HashSet;

use log::{debug, info};

use beamline_core::{
    ElementError,
    element::{
        Bend, DipoleEdge, EdgeSide, Element, ElementBody, ElementKind, MAX_SLICES, SliceMethod,
        ThinMultipole, ThinRfMultipole, ThinSolenoid,
    },
    identifier::Id,
    node::PositionedNode,
};

use crate::{error::Result, lattice::Lattice};

/// Thin replacement of one positioned element.
///
/// `nodes` are in longitudinal order; `elements` holds the definition of
/// every node, one per distinct name.
#[derive(Debug, Clone, PartialEq)]
pub struct SlicedElement {
    pub nodes: Vec<PositionedNode>,
    pub elements: Vec<Element>,
}

impl SlicedElement {
    fn unchanged(element: &Element, node: &PositionedNode) -> Self {
        Self {
            nodes: vec![node.clone()],
            elements: vec![element.clone()],
        }
    }
}

/// Kick offsets from the element centre, or `None` when `num_slices` is zero
/// or above [`MAX_SLICES`].
///
/// # Examples
///
/// ```
/// use beamline::{element::SliceMethod, slicing::slice_offsets};
///
/// let teapot = slice_offsets(15.0, 4, SliceMethod::Teapot).unwrap();
/// assert_eq!(teapot, [-6.0, -2.0, 2.0, 6.0]);
///
/// let uniform = slice_offsets(15.0, 3, SliceMethod::Uniform).unwrap();
/// assert_eq!(uniform, [-7.5, 0.0, 7.5]);
/// ```
pub fn slice_offsets(length: f64, num_slices: usize, method: SliceMethod) -> Option<Vec<f64>> {
    let offsets = match (num_slices, method) {
        (0, _) => return None,
        (n, _) if n > MAX_SLICES => return None,
        (1, _) => vec![0.0],
        (n, SliceMethod::Teapot) => {
            let n = n as f64;
            let delta = length / (2.0 * n + 2.0);
            let separation = length * n / (n * n - 1.0);
            (0..num_slices)
                .map(|i| -length / 2.0 + delta + i as f64 * separation)
                .collect()
        }
        (n, SliceMethod::Uniform) => {
            let step = length / (n - 1) as f64;
            (0..n).map(|i| -length / 2.0 + i as f64 * step).collect()
        }
    };
    Some(offsets)
}

/// Returns `true` for elements that slicing would change: thick elements
/// other than drifts.
pub fn is_sliceable(element: &Element) -> bool {
    let kind = element.kind();
    !kind.is_thin() && kind != ElementKind::Drift && element.length() > 0.0
}

/// Slices a positioned element according to its own integration request.
///
/// Elements without a request, drifts and zero-length elements come back
/// unchanged.
///
/// # Errors
///
/// Returns [`ElementError::InvalidParameter`] when a thin element cannot be
/// constructed from the parent's parameters.
pub fn slice_element(element: &Element, node: &PositionedNode) -> Result<SlicedElement> {
    match element.integrator() {
        Some(integrator) => {
            slice_element_with(element, node, integrator.num_slices(), integrator.method())
        }
        None => Ok(SlicedElement::unchanged(element, node)),
    }
}

/// Slices a positioned element into `num_slices` kicks placed by `method`.
///
/// # Errors
///
/// Returns [`ElementError::InvalidParameter`] when `num_slices` is zero.
pub fn slice_element_with(
    element: &Element,
    node: &PositionedNode,
    num_slices: usize,
    method: SliceMethod,
) -> Result<SlicedElement> {
    let offsets = slice_offsets(node.length(), num_slices, method).ok_or_else(|| {
        ElementError::invalid(
            element.name(),
            format!("number of slices must be between 1 and {MAX_SLICES}"),
        )
    })?;
    if !is_sliceable(element) {
        return Ok(SlicedElement::unchanged(element, node));
    }

    let parts = num_slices as f64;
    let radiation_length = element.length() / parts;
    let kick = match element.body() {
        ElementBody::SectorBend(bend) => {
            return slice_bend(element, bend, node, &offsets);
        }
        ElementBody::RectangularBend(bend) => {
            return slice_bend(element, &bend.rectangular_to_sector(), node, &offsets);
        }
        ElementBody::Solenoid(solenoid) => ElementBody::ThinSolenoid(ThinSolenoid::new(
            solenoid.ksi() / parts,
            radiation_length,
        )),
        ElementBody::Quadrupole(field)
        | ElementBody::Sextupole(field)
        | ElementBody::Octupole(field)
        | ElementBody::Multipole(field) => ElementBody::ThinMultipole(
            ThinMultipole::new(divided(field.knl(), parts), divided(field.ksl(), parts))
                .with_radiation_length(radiation_length),
        ),
        ElementBody::HKicker(kicker)
        | ElementBody::VKicker(kicker)
        | ElementBody::TKicker(kicker) => ElementBody::ThinMultipole(
            ThinMultipole::new(vec![-kicker.hkick() / parts], vec![kicker.vkick() / parts])
                .with_radiation_length(radiation_length),
        ),
        ElementBody::RfCavity(cavity) => ElementBody::ThinRfMultipole(ThinRfMultipole::new(
            cavity.field().split(num_slices),
            radiation_length,
        )),
        _ => return Ok(SlicedElement::unchanged(element, node)),
    };

    let mut sliced = SlicedElement {
        nodes: Vec::with_capacity(offsets.len()),
        elements: Vec::with_capacity(offsets.len()),
    };
    push_kicks(&mut sliced, element, node, &offsets, &kick)?;
    debug!(element:% = element.name(), slices = num_slices, method:%; "Sliced element");
    Ok(sliced)
}

/// Slices a bend through its sector equivalent.
///
/// Kick positions follow the node span; strengths and the edge curvature
/// follow the arc length of `sector`.
fn slice_bend(
    element: &Element,
    sector: &Bend,
    node: &PositionedNode,
    offsets: &[f64],
) -> Result<SlicedElement> {
    let parts = offsets.len() as f64;
    let mut knl = vec![sector.angle() / parts];
    if sector.k1() != 0.0 {
        knl.push(sector.k1() * sector.length() / parts);
    }
    let kick = ElementBody::ThinMultipole(
        ThinMultipole::new(knl, Vec::new())
            .with_radiation_length(sector.length() / parts)
            .with_hxl(sector.angle() / parts),
    );

    let mut sliced = SlicedElement {
        nodes: Vec::with_capacity(offsets.len() + 2),
        elements: Vec::with_capacity(offsets.len() + 2),
    };

    let entrance = thin_element(
        element,
        element.name().with_suffix("_den"),
        ElementBody::DipoleEdge(DipoleEdge::for_bend(sector, EdgeSide::Entrance)),
    )?;
    sliced
        .nodes
        .push(PositionedNode::centered(entrance.name(), 0.0, node.start()));
    sliced.elements.push(entrance);

    push_kicks(&mut sliced, element, node, offsets, &kick)?;

    let exit = thin_element(
        element,
        element.name().with_suffix("_dex"),
        ElementBody::DipoleEdge(DipoleEdge::for_bend(sector, EdgeSide::Exit)),
    )?;
    sliced
        .nodes
        .push(PositionedNode::centered(exit.name(), 0.0, node.end()));
    sliced.elements.push(exit);

    debug!(element:% = element.name(), slices = offsets.len(); "Sliced bend");
    Ok(sliced)
}

/// Appends one kick `{parent}..{i}` per offset.
fn push_kicks(
    sliced: &mut SlicedElement,
    parent: &Element,
    node: &PositionedNode,
    offsets: &[f64],
    kick: &ElementBody,
) -> Result<()> {
    let center = node.center();
    for (index, offset) in offsets.iter().enumerate() {
        let name = parent.name().with_suffix(&format!("..{index}"));
        let thin = thin_element(parent, name, kick.clone())?;
        sliced
            .nodes
            .push(PositionedNode::centered(name, 0.0, center + offset));
        sliced.elements.push(thin);
    }
    Ok(())
}

/// A thin element that inherits the parent's aperture.
fn thin_element(parent: &Element, name: Id, body: ElementBody) -> Result<Element> {
    let thin = Element::new(name, body)?;
    Ok(match parent.aperture() {
        Some(aperture) => thin.with_aperture(*aperture),
        None => thin,
    })
}

fn divided(values: Vec<f64>, parts: f64) -> Vec<f64> {
    values.into_iter().map(|value| value / parts).collect()
}

/// Builds the thin version of a lattice.
///
/// Every element with an integration request, or every thick element when
/// the configuration sets a default slice count, is replaced by its thin
/// elements. Kicks of the same parent share their definitions across
/// occurrences. The sliced parents are removed from the catalog, and the
/// result is reordered, renumbered and checked for negative drifts. A declared
/// lattice length carries over to the thin lattice.
///
/// # Errors
///
/// Returns [`LatticeError::NegativeDrift`](crate::LatticeError::NegativeDrift)
/// if the thin nodes overlap their neighbours, or
/// [`ElementError::DuplicateElement`] if a thin element name is already used
/// by a different definition.
pub fn slice_lattice(lattice: &Lattice) -> Result<Lattice> {
    let default_request = lattice.config().slicing().default_integrator();
    let mut catalog = lattice.catalog().clone();
    let mut nodes = Vec::with_capacity(lattice.sequence().len());
    let mut parents: HashSet<Id> = HashSet::new();

    for node in lattice.sequence() {
        let element = lattice.catalog().require(node.element())?;
        let request = element
            .integrator()
            .or(default_request.as_ref())
            .filter(|_| is_sliceable(element));

        let Some(request) = request else {
            nodes.push(PositionedNode::centered(
                node.element(),
                node.length(),
                node.center(),
            ));
            continue;
        };

        let sliced = slice_element_with(element, node, request.num_slices(), request.method())?;
        catalog.extend(sliced.elements)?;
        nodes.extend(sliced.nodes);
        parents.insert(element.name());
    }

    for parent in &parents {
        catalog.remove(*parent);
    }

    let mut thin = Lattice::new(catalog, nodes, lattice.config().clone())?;
    if let Some(length) = lattice.declared_length() {
        thin = thin.with_length(length)?;
    }
    info!(
        parents = parents.len(),
        nodes = thin.sequence().len();
        "Sliced lattice"
    );
    Ok(thin)
}
