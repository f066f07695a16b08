//! Contract with external parametric-expression stores.
//!
//! Lattice parameters are often driven by expressions over named variables
//! ("`k1 = kqf * 1.02`"). Evaluating them is the job of an external store.
//! The lattice only reads the current value of an `(element, attribute)`
//! pair and writes new base values back.

use indexmap::IndexMap;

use beamline_core::{
    element::{Attribute, Element, ElementBody},
    identifier::Id,
};

/// A reactive key-value store addressed by `(element name, attribute)`.
pub trait ExpressionStore {
    /// Current value of an attribute, or `None` when the store does not
    /// drive it.
    fn get(&self, entity: Id, attribute: Attribute) -> Option<f64>;

    /// Writes a base value.
    fn set(&mut self, entity: Id, attribute: Attribute, value: f64);

    /// Re-evaluates every expression that depends on changed base values.
    fn recompute(&mut self);
}

/// A store of plain values with no expressions.
///
/// Useful as a snapshot of lattice parameters, or as a stand-in for a real
/// expression engine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueStore {
    values: IndexMap<(Id, Attribute), f64>,
}

impl ValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Id, Attribute, f64)> + '_ {
        self.values
            .iter()
            .map(|(&(entity, attribute), &value)| (entity, attribute, value))
    }
}

impl ExpressionStore for ValueStore {
    fn get(&self, entity: Id, attribute: Attribute) -> Option<f64> {
        self.values.get(&(entity, attribute)).copied()
    }

    fn set(&mut self, entity: Id, attribute: Attribute, value: f64) {
        self.values.insert((entity, attribute), value);
    }

    fn recompute(&mut self) {}
}

const SCALAR_ATTRIBUTES: [Attribute; 14] = [
    Attribute::Length,
    Attribute::Angle,
    Attribute::E1,
    Attribute::E2,
    Attribute::K1,
    Attribute::SolenoidKs,
    Attribute::Voltage,
    Attribute::Frequency,
    Attribute::Lag,
    Attribute::HKick,
    Attribute::VKick,
    Attribute::Hgap,
    Attribute::Fint,
    Attribute::H,
];

/// Every attribute of `element` that can be both read and set, in a fixed order.
///
/// Multipole coefficients are listed per order up to the highest order the
/// element stores. `K1` is left out for multipoles, where it aliases `Kn(1)`.
pub fn attributes_of(element: &Element) -> Vec<Attribute> {
    let orders = match element.body() {
        ElementBody::Quadrupole(field)
        | ElementBody::Sextupole(field)
        | ElementBody::Octupole(field)
        | ElementBody::Multipole(field) => Some(field.kn().len().max(field.ks().len())),
        ElementBody::ThinMultipole(thin) => Some(thin.knl().len().max(thin.ksl().len())),
        _ => None,
    };

    match orders {
        Some(orders) => std::iter::once(Attribute::Length)
            .chain((0..orders).flat_map(|order| [Attribute::Kn(order), Attribute::Ks(order)]))
            .filter(|attribute| element.is_settable(*attribute))
            .collect(),
        None => SCALAR_ATTRIBUTES
            .into_iter()
            .filter(|attribute| element.is_settable(*attribute))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use beamline_core::element::{DipoleEdge, EdgeSide, RfField};

    use super::*;

    #[test]
    fn test_value_store_roundtrip() {
        let mut store = ValueStore::new();
        let qf = Id::new("qf");
        store.set(qf, Attribute::K1, 0.3);
        store.recompute();

        assert_eq!(store.get(qf, Attribute::K1), Some(0.3));
        assert_eq!(store.get(qf, Attribute::Length), None);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_attributes_of_quadrupole() {
        let qf = Element::quadrupole("qf", 0.5, 0.8).expect("valid");
        assert_eq!(
            attributes_of(&qf),
            [
                Attribute::Length,
                Attribute::Kn(0),
                Attribute::Ks(0),
                Attribute::Kn(1),
                Attribute::Ks(1),
            ]
        );
    }

    #[test]
    fn test_attributes_of_bend_and_cavity() {
        let mb = Element::sbend("mb", 3.0, 0.1).expect("valid");
        let attributes = attributes_of(&mb);
        assert!(attributes.contains(&Attribute::Angle));
        assert!(attributes.contains(&Attribute::K1));
        assert!(!attributes.contains(&Attribute::Voltage));

        let cavity = Element::rf_cavity("acs", 1.0, RfField::new(1.0, 400.0, 0.5)).expect("valid");
        assert_eq!(
            attributes_of(&cavity),
            [
                Attribute::Length,
                Attribute::Voltage,
                Attribute::Frequency,
                Attribute::Lag
            ]
        );
    }

    #[test]
    fn test_thin_elements_expose_no_length() {
        assert!(attributes_of(&Element::marker("ip")).is_empty());

        let edge = Element::new(
            "mb_den",
            ElementBody::DipoleEdge(DipoleEdge::new(EdgeSide::Entrance, 0.02, 0.0)),
        )
        .expect("valid edge");
        assert_eq!(
            attributes_of(&edge),
            [Attribute::E1, Attribute::Hgap, Attribute::Fint, Attribute::H]
        );
    }

    #[test]
    fn test_listed_attributes_accept_their_values() {
        let elements = [
            Element::marker("ip"),
            Element::sbend("mb", 3.0, 0.1).expect("valid"),
            Element::new(
                "mb_dex",
                ElementBody::DipoleEdge(DipoleEdge::new(EdgeSide::Exit, 0.02, 0.01)),
            )
            .expect("valid edge"),
            Element::quadrupole("qf", 0.5, 0.8).expect("valid"),
        ];
        for element in elements {
            for attribute in attributes_of(&element) {
                let value = element.attribute(attribute).expect("readable");
                let mut copy = element.clone();
                assert!(
                    copy.set_attribute(attribute, value).is_ok(),
                    "{attribute} of {} is listed but not settable",
                    element.name()
                );
            }
        }
    }
}
