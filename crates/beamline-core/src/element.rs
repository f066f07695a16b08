//! Lattice elements.
//!
//! An [`Element`] is a named definition of a magnet, cavity or marker. It owns
//! its physical parameters but not its position: placement lives in
//! [`PositionedNode`](crate::node::PositionedNode), and many nodes may refer to
//! one element through its name.
//!
//! Element kinds are a closed set, modelled by the [`ElementBody`] sum type with
//! one payload struct per family. [`ElementKind`] is the payload-free tag used
//! for catalog queries and external records.
//!
//! # Examples
//!
//! ```
//! use beamline_core::element::{Element, ElementKind};
//!
//! let qf = Element::quadrupole("qf", 0.5, 0.8).expect("valid quadrupole");
//! assert_eq!(qf.kind(), ElementKind::Quadrupole);
//! assert_eq!(qf.length(), 0.5);
//!
//! let sbend = Element::sbend("mb", 15.0, 0.3).expect("valid bend");
//! let rbend = sbend.to_rbend();
//! assert_eq!(rbend.kind(), ElementKind::RectangularBend);
//! assert_eq!(rbend.to_sbend(), sbend);
//! ```

mod aperture;
mod attribute;
mod bend;
mod integrator;
mod kicker;
mod multipole;
mod record;
mod rf;
mod solenoid;

pub use aperture::Aperture;
pub use attribute::Attribute;
pub use bend::{Bend, DipoleEdge, EdgeSide, arc_to_chord, chord_to_arc};
pub use integrator::{Integrator, MAX_SLICES, SliceMethod};
pub use kicker::Kicker;
pub use multipole::{MultipoleField, ThinMultipole};
pub use record::{ElementRecord, ParamValue};
pub use rf::{RfCavity, RfField, ThinRfMultipole};
pub use solenoid::{Solenoid, ThinSolenoid};

use std::{f64::consts::TAU, fmt};

use serde::{Deserialize, Serialize};

use crate::{
    error::{ElementError, Result},
    identifier::Id,
    tolerance::params_eq,
};

/// Payload-free tag identifying an element's kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Marker,
    Drift,
    SectorBend,
    RectangularBend,
    DipoleEdge,
    Solenoid,
    Quadrupole,
    Sextupole,
    Octupole,
    Multipole,
    RfCavity,
    HKicker,
    VKicker,
    TKicker,
    ThinMultipole,
    ThinSolenoid,
    ThinRfMultipole,
}

impl ElementKind {
    /// Every kind, in declaration order.
    pub const ALL: [ElementKind; 17] = [
        ElementKind::Marker,
        ElementKind::Drift,
        ElementKind::SectorBend,
        ElementKind::RectangularBend,
        ElementKind::DipoleEdge,
        ElementKind::Solenoid,
        ElementKind::Quadrupole,
        ElementKind::Sextupole,
        ElementKind::Octupole,
        ElementKind::Multipole,
        ElementKind::RfCavity,
        ElementKind::HKicker,
        ElementKind::VKicker,
        ElementKind::TKicker,
        ElementKind::ThinMultipole,
        ElementKind::ThinSolenoid,
        ElementKind::ThinRfMultipole,
    ];

    /// The tag used for this kind in element records.
    pub fn tag(&self) -> &'static str {
        match self {
            ElementKind::Marker => "marker",
            ElementKind::Drift => "drift",
            ElementKind::SectorBend => "sbend",
            ElementKind::RectangularBend => "rbend",
            ElementKind::DipoleEdge => "dipedge",
            ElementKind::Solenoid => "solenoid",
            ElementKind::Quadrupole => "quadrupole",
            ElementKind::Sextupole => "sextupole",
            ElementKind::Octupole => "octupole",
            ElementKind::Multipole => "multipole",
            ElementKind::RfCavity => "rfcavity",
            ElementKind::HKicker => "hkicker",
            ElementKind::VKicker => "vkicker",
            ElementKind::TKicker => "tkicker",
            ElementKind::ThinMultipole => "thin_multipole",
            ElementKind::ThinSolenoid => "thin_solenoid",
            ElementKind::ThinRfMultipole => "thin_rf_multipole",
        }
    }

    /// Looks up a kind by record tag. `kicker` is accepted for `tkicker`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        if tag == "kicker" {
            return Some(ElementKind::TKicker);
        }
        Self::ALL.into_iter().find(|kind| kind.tag() == tag)
    }

    /// Returns `true` for kinds that always have zero length.
    pub fn is_thin(&self) -> bool {
        matches!(
            self,
            ElementKind::Marker
                | ElementKind::DipoleEdge
                | ElementKind::ThinMultipole
                | ElementKind::ThinSolenoid
                | ElementKind::ThinRfMultipole
        )
    }

    /// Returns `true` for the two dipole kinds.
    pub fn is_bend(&self) -> bool {
        matches!(self, ElementKind::SectorBend | ElementKind::RectangularBend)
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Kind-specific parameters of an element.
#[derive(Debug, Clone)]
pub enum ElementBody {
    Marker,
    Drift { length: f64 },
    /// `length` of the bend is its arc length.
    SectorBend(Bend),
    /// `length` of the bend is its chord length.
    RectangularBend(Bend),
    DipoleEdge(DipoleEdge),
    Solenoid(Solenoid),
    Quadrupole(MultipoleField),
    Sextupole(MultipoleField),
    Octupole(MultipoleField),
    Multipole(MultipoleField),
    RfCavity(RfCavity),
    HKicker(Kicker),
    VKicker(Kicker),
    TKicker(Kicker),
    ThinMultipole(ThinMultipole),
    ThinSolenoid(ThinSolenoid),
    ThinRfMultipole(ThinRfMultipole),
}

impl ElementBody {
    pub fn kind(&self) -> ElementKind {
        match self {
            ElementBody::Marker => ElementKind::Marker,
            ElementBody::Drift { .. } => ElementKind::Drift,
            ElementBody::SectorBend(_) => ElementKind::SectorBend,
            ElementBody::RectangularBend(_) => ElementKind::RectangularBend,
            ElementBody::DipoleEdge(_) => ElementKind::DipoleEdge,
            ElementBody::Solenoid(_) => ElementKind::Solenoid,
            ElementBody::Quadrupole(_) => ElementKind::Quadrupole,
            ElementBody::Sextupole(_) => ElementKind::Sextupole,
            ElementBody::Octupole(_) => ElementKind::Octupole,
            ElementBody::Multipole(_) => ElementKind::Multipole,
            ElementBody::RfCavity(_) => ElementKind::RfCavity,
            ElementBody::HKicker(_) => ElementKind::HKicker,
            ElementBody::VKicker(_) => ElementKind::VKicker,
            ElementBody::TKicker(_) => ElementKind::TKicker,
            ElementBody::ThinMultipole(_) => ElementKind::ThinMultipole,
            ElementBody::ThinSolenoid(_) => ElementKind::ThinSolenoid,
            ElementBody::ThinRfMultipole(_) => ElementKind::ThinRfMultipole,
        }
    }

    /// Longitudinal length; zero for thin kinds.
    pub fn length(&self) -> f64 {
        match self {
            ElementBody::Drift { length } => *length,
            ElementBody::SectorBend(bend) | ElementBody::RectangularBend(bend) => bend.length(),
            ElementBody::Solenoid(solenoid) => solenoid.length(),
            ElementBody::Quadrupole(field)
            | ElementBody::Sextupole(field)
            | ElementBody::Octupole(field)
            | ElementBody::Multipole(field) => field.length(),
            ElementBody::RfCavity(cavity) => cavity.length(),
            ElementBody::HKicker(kicker)
            | ElementBody::VKicker(kicker)
            | ElementBody::TKicker(kicker) => kicker.length(),
            ElementBody::Marker
            | ElementBody::DipoleEdge(_)
            | ElementBody::ThinMultipole(_)
            | ElementBody::ThinSolenoid(_)
            | ElementBody::ThinRfMultipole(_) => 0.0,
        }
    }
}

impl PartialEq for ElementBody {
    fn eq(&self, other: &Self) -> bool {
        use ElementBody as B;

        match (self, other) {
            (B::Marker, B::Marker) => true,
            (B::Drift { length: a }, B::Drift { length: b }) => params_eq(*a, *b),
            (B::SectorBend(a), B::SectorBend(b)) | (B::RectangularBend(a), B::RectangularBend(b)) => {
                a == b
            }
            (B::DipoleEdge(a), B::DipoleEdge(b)) => a == b,
            (B::Solenoid(a), B::Solenoid(b)) => a == b,
            (B::Quadrupole(a), B::Quadrupole(b))
            | (B::Sextupole(a), B::Sextupole(b))
            | (B::Octupole(a), B::Octupole(b))
            | (B::Multipole(a), B::Multipole(b)) => a == b,
            (B::RfCavity(a), B::RfCavity(b)) => a == b,
            (B::HKicker(a), B::HKicker(b))
            | (B::VKicker(a), B::VKicker(b))
            | (B::TKicker(a), B::TKicker(b)) => a == b,
            (B::ThinMultipole(a), B::ThinMultipole(b)) => a == b,
            (B::ThinSolenoid(a), B::ThinSolenoid(b)) => a == b,
            (B::ThinRfMultipole(a), B::ThinRfMultipole(b)) => a == b,
            _ => false,
        }
    }
}

/// A named lattice element definition.
///
/// Equality compares the name, kind and every parameter with a relative
/// tolerance of [`PARAMETER_RELATIVE_TOLERANCE`](crate::tolerance::PARAMETER_RELATIVE_TOLERANCE).
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    name: Id,
    body: ElementBody,
    aperture: Option<Aperture>,
    integrator: Option<Integrator>,
}

impl Element {
    /// Creates an element after validating its parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ElementError::InvalidParameter`] when a length is negative or
    /// not finite, a drift or marker carries an impossible length, a bend has
    /// zero length or a full-turn angle, or a single-plane kicker carries a kick
    /// in the other plane.
    pub fn new(name: impl Into<Id>, body: ElementBody) -> Result<Self> {
        let element = Self {
            name: name.into(),
            body,
            aperture: None,
            integrator: None,
        };
        element.validate()?;
        Ok(element)
    }

    pub fn marker(name: impl Into<Id>) -> Self {
        Self {
            name: name.into(),
            body: ElementBody::Marker,
            aperture: None,
            integrator: None,
        }
    }

    pub fn drift(name: impl Into<Id>, length: f64) -> Result<Self> {
        Self::new(name, ElementBody::Drift { length })
    }

    pub fn sbend(name: impl Into<Id>, length: f64, angle: f64) -> Result<Self> {
        Self::new(name, ElementBody::SectorBend(Bend::new(length, angle)))
    }

    pub fn rbend(name: impl Into<Id>, length: f64, angle: f64) -> Result<Self> {
        Self::new(name, ElementBody::RectangularBend(Bend::new(length, angle)))
    }

    pub fn quadrupole(name: impl Into<Id>, length: f64, k1: f64) -> Result<Self> {
        let field = MultipoleField::single(length, 1, k1, 0.0);
        Self::new(name, ElementBody::Quadrupole(field))
    }

    pub fn sextupole(name: impl Into<Id>, length: f64, k2: f64) -> Result<Self> {
        let field = MultipoleField::single(length, 2, k2, 0.0);
        Self::new(name, ElementBody::Sextupole(field))
    }

    pub fn octupole(name: impl Into<Id>, length: f64, k3: f64) -> Result<Self> {
        let field = MultipoleField::single(length, 3, k3, 0.0);
        Self::new(name, ElementBody::Octupole(field))
    }

    pub fn solenoid(name: impl Into<Id>, length: f64, ks: f64) -> Result<Self> {
        Self::new(name, ElementBody::Solenoid(Solenoid::new(length, ks)))
    }

    pub fn rf_cavity(name: impl Into<Id>, length: f64, field: RfField) -> Result<Self> {
        Self::new(name, ElementBody::RfCavity(RfCavity::new(length, field)))
    }

    /// Attaches an aperture (builder style).
    pub fn with_aperture(mut self, aperture: Aperture) -> Self {
        self.aperture = Some(aperture);
        self
    }

    /// Attaches an integration request (builder style).
    pub fn with_integrator(mut self, integrator: Integrator) -> Self {
        self.integrator = Some(integrator);
        self
    }

    pub fn name(&self) -> Id {
        self.name
    }

    pub fn kind(&self) -> ElementKind {
        self.body.kind()
    }

    pub fn body(&self) -> &ElementBody {
        &self.body
    }

    pub fn length(&self) -> f64 {
        self.body.length()
    }

    pub fn aperture(&self) -> Option<&Aperture> {
        self.aperture.as_ref()
    }

    pub fn integrator(&self) -> Option<&Integrator> {
        self.integrator.as_ref()
    }

    /// Replaces or clears the integration request.
    pub fn set_integrator(&mut self, integrator: Option<Integrator>) {
        self.integrator = integrator;
    }

    /// Returns `true` for drift elements.
    pub fn is_drift(&self) -> bool {
        self.kind() == ElementKind::Drift
    }

    /// Returns an equal element under a new name.
    pub fn renamed(&self, name: impl Into<Id>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }

    /// Converts a sector bend to the equivalent rectangular bend.
    ///
    /// Other kinds are returned unchanged.
    pub fn to_rbend(&self) -> Self {
        match &self.body {
            ElementBody::SectorBend(bend) => Self {
                body: ElementBody::RectangularBend(bend.sector_to_rectangular()),
                ..self.clone()
            },
            _ => self.clone(),
        }
    }

    /// Converts a rectangular bend to the equivalent sector bend.
    ///
    /// Other kinds are returned unchanged.
    pub fn to_sbend(&self) -> Self {
        match &self.body {
            ElementBody::RectangularBend(bend) => Self {
                body: ElementBody::SectorBend(bend.rectangular_to_sector()),
                ..self.clone()
            },
            _ => self.clone(),
        }
    }

    /// Reads a scalar parameter.
    ///
    /// # Errors
    ///
    /// Returns [`ElementError::UnsupportedAttribute`] when this kind has no
    /// such parameter.
    pub fn attribute(&self, attribute: Attribute) -> Result<f64> {
        use Attribute as A;
        use ElementBody as B;

        let value = match (&self.body, attribute) {
            (_, A::Length) => Some(self.length()),
            (B::SectorBend(bend) | B::RectangularBend(bend), attribute) => match attribute {
                A::Angle => Some(bend.angle()),
                A::E1 => Some(bend.e1()),
                A::E2 => Some(bend.e2()),
                A::K1 => Some(bend.k1()),
                A::Hgap => Some(bend.hgap()),
                A::Fint => Some(bend.fint()),
                _ => None,
            },
            (B::DipoleEdge(edge), attribute) => match attribute {
                A::H => Some(edge.h()),
                A::E1 => Some(edge.edge_angle()),
                A::Hgap => Some(edge.hgap()),
                A::Fint => Some(edge.fint()),
                _ => None,
            },
            (B::Solenoid(solenoid), A::SolenoidKs) => Some(solenoid.ks()),
            (B::ThinSolenoid(solenoid), A::SolenoidKs) => Some(solenoid.ksi()),
            (
                B::Quadrupole(field) | B::Sextupole(field) | B::Octupole(field) | B::Multipole(field),
                attribute,
            ) => match attribute {
                A::K1 => Some(field.kn_at(1)),
                A::Kn(order) => Some(field.kn_at(order)),
                A::Ks(order) => Some(field.ks_at(order)),
                _ => None,
            },
            (B::ThinMultipole(thin), attribute) => match attribute {
                A::K1 => Some(thin.knl().get(1).copied().unwrap_or(0.0)),
                A::Kn(order) => Some(thin.knl().get(order).copied().unwrap_or(0.0)),
                A::Ks(order) => Some(thin.ksl().get(order).copied().unwrap_or(0.0)),
                _ => None,
            },
            (B::RfCavity(cavity), attribute) => rf_attribute(cavity.field(), attribute),
            (B::ThinRfMultipole(thin), attribute) => rf_attribute(thin.field(), attribute),
            (B::HKicker(kicker) | B::TKicker(kicker), A::HKick) => Some(kicker.hkick()),
            (B::VKicker(kicker) | B::TKicker(kicker), A::VKick) => Some(kicker.vkick()),
            _ => None,
        };

        value.ok_or_else(|| self.unsupported(attribute))
    }

    /// Writes a scalar parameter in place and re-validates the element.
    ///
    /// On error the element is left unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`ElementError::UnsupportedAttribute`] when this kind has no
    /// such parameter, or [`ElementError::InvalidParameter`] when the new value
    /// breaks an element invariant.
    pub fn set_attribute(&mut self, attribute: Attribute, value: f64) -> Result<()> {
        let mut updated = self.body.clone();
        if !apply_attribute(&mut updated, attribute, value) {
            return Err(self.unsupported(attribute));
        }

        validate_body(self.name, &updated)?;
        self.body = updated;
        Ok(())
    }

    /// Whether [`Element::set_attribute`] accepts `attribute` for this kind.
    ///
    /// Thin elements report a zero `Length` but cannot be given one.
    pub fn is_settable(&self, attribute: Attribute) -> bool {
        let mut body = self.body.clone();
        self.attribute(attribute)
            .is_ok_and(|value| apply_attribute(&mut body, attribute, value))
    }

    fn unsupported(&self, attribute: Attribute) -> ElementError {
        ElementError::UnsupportedAttribute {
            element: self.name,
            attribute: attribute.to_string(),
        }
    }

    fn validate(&self) -> Result<()> {
        validate_body(self.name, &self.body)?;
        match &self.aperture {
            Some(aperture) if !aperture.is_valid() => Err(ElementError::invalid(
                self.name,
                format!("aperture {aperture} must have positive dimensions"),
            )),
            _ => Ok(()),
        }
    }
}

fn rf_attribute(field: &RfField, attribute: Attribute) -> Option<f64> {
    match attribute {
        Attribute::Voltage => Some(field.voltage()),
        Attribute::Frequency => Some(field.frequency()),
        Attribute::Lag => Some(field.lag()),
        _ => None,
    }
}

fn apply_attribute(body: &mut ElementBody, attribute: Attribute, value: f64) -> bool {
    use Attribute as A;
    use ElementBody as B;

    match (body, attribute) {
        (B::Drift { length }, A::Length) => *length = value,
        (B::SectorBend(bend) | B::RectangularBend(bend), attribute) => match attribute {
            A::Length => bend.set_length(value),
            A::Angle => bend.set_angle(value),
            A::E1 => bend.set_e1(value),
            A::E2 => bend.set_e2(value),
            A::K1 => bend.set_k1(value),
            A::Hgap => bend.set_hgap(value),
            A::Fint => bend.set_fint(value),
            _ => return false,
        },
        (B::DipoleEdge(edge), attribute) => match attribute {
            A::H => edge.set_h(value),
            A::E1 => edge.set_edge_angle(value),
            A::Hgap => edge.set_hgap(value),
            A::Fint => edge.set_fint(value),
            _ => return false,
        },
        (B::Solenoid(solenoid), attribute) => match attribute {
            A::Length => solenoid.set_length(value),
            A::SolenoidKs => solenoid.set_ks(value),
            _ => return false,
        },
        (B::ThinSolenoid(solenoid), A::SolenoidKs) => solenoid.set_ksi(value),
        (
            B::Quadrupole(field) | B::Sextupole(field) | B::Octupole(field) | B::Multipole(field),
            attribute,
        ) => match attribute {
            A::Length => field.set_length(value),
            A::K1 => field.set_kn(1, value),
            A::Kn(order) => field.set_kn(order, value),
            A::Ks(order) => field.set_ks(order, value),
            _ => return false,
        },
        (B::ThinMultipole(thin), attribute) => match attribute {
            A::K1 => thin.set_knl(1, value),
            A::Kn(order) => thin.set_knl(order, value),
            A::Ks(order) => thin.set_ksl(order, value),
            _ => return false,
        },
        (B::RfCavity(cavity), A::Length) => cavity.set_length(value),
        (B::RfCavity(cavity), attribute) => return apply_rf(cavity.field_mut(), attribute, value),
        (B::ThinRfMultipole(thin), attribute) => {
            return apply_rf(thin.field_mut(), attribute, value);
        }
        (B::HKicker(kicker) | B::VKicker(kicker) | B::TKicker(kicker), A::Length) => {
            kicker.set_length(value)
        }
        (B::HKicker(kicker) | B::TKicker(kicker), A::HKick) => kicker.set_hkick(value),
        (B::VKicker(kicker) | B::TKicker(kicker), A::VKick) => kicker.set_vkick(value),
        _ => return false,
    }
    true
}

fn apply_rf(field: &mut RfField, attribute: Attribute, value: f64) -> bool {
    match attribute {
        Attribute::Voltage => field.set_voltage(value),
        Attribute::Frequency => field.set_frequency(value),
        Attribute::Lag => field.set_lag(value),
        _ => return false,
    }
    true
}

fn validate_body(name: Id, body: &ElementBody) -> Result<()> {
    let length = body.length();
    if !length.is_finite() || length < 0.0 {
        return Err(ElementError::invalid(
            name,
            format!("length must be finite and non-negative, got {length}"),
        ));
    }

    match body {
        ElementBody::SectorBend(bend) | ElementBody::RectangularBend(bend) => {
            if bend.length() == 0.0 {
                return Err(ElementError::invalid(name, "bend length must be positive"));
            }
            if !bend.angle().is_finite() || bend.angle().abs() >= TAU {
                return Err(ElementError::invalid(
                    name,
                    format!("bend angle {} must lie in (-2π, 2π)", bend.angle()),
                ));
            }
        }
        ElementBody::HKicker(kicker) if kicker.vkick() != 0.0 => {
            return Err(ElementError::invalid(
                name,
                "horizontal kicker cannot carry a vertical kick",
            ));
        }
        ElementBody::VKicker(kicker) if kicker.hkick() != 0.0 => {
            return Err(ElementError::invalid(
                name,
                "vertical kicker cannot carry a horizontal kick",
            ));
        }
        _ => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;

    #[test]
    fn test_drift_rejects_negative_length() {
        let err = Element::drift("d", -1.0).unwrap_err();
        assert!(matches!(err, ElementError::InvalidParameter { .. }));
        assert!(Element::drift("d", 0.0).is_ok());
    }

    #[test]
    fn test_bend_rejects_zero_length() {
        assert!(Element::sbend("mb", 0.0, 0.1).is_err());
        assert!(Element::rbend("mb", 1.0, 7.0).is_err());
    }

    #[test]
    fn test_marker_is_thin() {
        let marker = Element::marker("ip");
        assert_eq!(marker.length(), 0.0);
        assert!(marker.kind().is_thin());
    }

    #[test]
    fn test_kicker_plane_validation() {
        let body = ElementBody::HKicker(Kicker::new(0.1, 1e-3, 2e-3));
        assert!(Element::new("mcb", body).is_err());

        let body = ElementBody::VKicker(Kicker::vertical(0.1, 2e-3));
        assert!(Element::new("mcb", body).is_ok());
    }

    #[test]
    fn test_aperture_validation() {
        let element = Element::quadrupole("q", 1.0, 0.1)
            .expect("valid quadrupole")
            .with_aperture(Aperture::Circle { radius: -0.1 });
        assert!(element.validate().is_err());
    }

    #[test]
    fn test_kind_tags_roundtrip() {
        for kind in ElementKind::ALL {
            assert_eq!(ElementKind::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(ElementKind::from_tag("kicker"), Some(ElementKind::TKicker));
        assert_eq!(ElementKind::from_tag("wiggler"), None);
    }

    #[test]
    fn test_quadrupole_integrated_strength() {
        let qf = Element::quadrupole("qf", 0.5, 0.8).expect("valid quadrupole");
        let ElementBody::Quadrupole(field) = qf.body() else {
            panic!("expected quadrupole body");
        };
        assert_approx_eq!(f64, field.knl()[1], 0.4);
    }

    #[test]
    fn test_set_attribute_updates_integrated_view() {
        let mut qf = Element::quadrupole("qf", 0.5, 0.8).expect("valid quadrupole");
        qf.set_attribute(Attribute::Length, 1.0).expect("length is settable");
        qf.set_attribute(Attribute::K1, 0.3).expect("k1 is settable");

        let ElementBody::Quadrupole(field) = qf.body() else {
            panic!("expected quadrupole body");
        };
        assert_approx_eq!(f64, field.knl()[1], 0.3);
        assert_approx_eq!(f64, qf.attribute(Attribute::Kn(1)).expect("readable"), 0.3);
    }

    #[test]
    fn test_set_attribute_rejects_invalid_value_without_mutation() {
        let mut drift = Element::drift("d", 2.0).expect("valid drift");
        let err = drift.set_attribute(Attribute::Length, -1.0).unwrap_err();

        assert!(matches!(err, ElementError::InvalidParameter { .. }));
        assert_approx_eq!(f64, drift.length(), 2.0);
    }

    #[test]
    fn test_unsupported_attribute() {
        let mut marker = Element::marker("m");
        assert!(matches!(
            marker.set_attribute(Attribute::Angle, 0.1),
            Err(ElementError::UnsupportedAttribute { .. })
        ));
        assert!(marker.attribute(Attribute::Voltage).is_err());
        assert_approx_eq!(f64, marker.attribute(Attribute::Length).expect("length"), 0.0);
    }

    #[test]
    fn test_rf_attributes() {
        let mut cavity =
            Element::rf_cavity("acs", 1.7, RfField::new(2.0, 400.0, 0.5)).expect("valid cavity");
        cavity.set_attribute(Attribute::Voltage, 3.0).expect("settable");

        assert_approx_eq!(f64, cavity.attribute(Attribute::Voltage).expect("readable"), 3.0);
        assert_approx_eq!(f64, cavity.attribute(Attribute::Lag).expect("readable"), 0.5);
    }

    #[test]
    fn test_equality_uses_relative_tolerance() {
        let a = Element::quadrupole("q", 1.0, 0.1).expect("valid");
        let b = Element::quadrupole("q", 1.0 + 1e-12, 0.1 * (1.0 + 1e-10)).expect("valid");
        let c = Element::quadrupole("q", 1.0, 0.1001).expect("valid");
        let renamed = a.renamed("q2");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, renamed);
    }

    #[test]
    fn test_bend_conversion_keeps_identity() {
        let sbend = Element::sbend("mb", 15.0, 0.3)
            .expect("valid bend")
            .with_aperture(Aperture::Circle { radius: 0.02 });
        let rbend = sbend.to_rbend();

        assert_eq!(rbend.name(), "mb");
        assert_eq!(rbend.aperture(), sbend.aperture());
        assert!(rbend.length() < sbend.length());
        assert_eq!(rbend.to_sbend(), sbend);
    }

    #[test]
    fn test_non_bend_conversion_is_identity() {
        let quad = Element::quadrupole("q", 1.0, 0.1).expect("valid");
        assert_eq!(quad.to_rbend(), quad);
        assert_eq!(quad.to_sbend(), quad);
    }
}
