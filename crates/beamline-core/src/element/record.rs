//! Flat key-value records for exchanging elements with external tools.
//!
//! A record is the lowest common denominator between this crate and whatever
//! produced the lattice: a name, a kind tag and a bag of parameters. Reading a
//! record is strict. Unknown kinds and unknown parameter keys are errors, so a
//! typo in an input file never silently becomes a default value.
//!
//! # Record keys
//!
//! | kind | keys |
//! |------|------|
//! | `drift` | `length` |
//! | `sbend`, `rbend` | `length`, `angle`, `e1`, `e2`, `k1`, `hgap`, `fint` |
//! | `dipedge` | `side`, `h`, `e1`, `hgap`, `fint` |
//! | `solenoid` | `length`, `ks` |
//! | `quadrupole` / `sextupole` / `octupole` | `length`, `k1`/`k2`/`k3`, `k1s`/`k2s`/`k3s`, or `kn`, `ks` lists |
//! | `multipole` | `length`, `kn`, `ks` |
//! | `rfcavity` | `length`, `volt`, `freq`, `lag` |
//! | `hkicker`, `vkicker` | `length`, `kick` |
//! | `tkicker` | `length`, `hkick`, `vkick` |
//! | `thin_multipole` | `knl`, `ksl`, `lrad`, `hxl` |
//! | `thin_solenoid` | `ksi`, `lrad` |
//! | `thin_rf_multipole` | `volt`, `freq`, `lag`, `lrad` |
//!
//! Every kind also accepts `slices`, `method` and `pass_method` (integration
//! request) and `aperture_type` with `aperture` (aperture shape and
//! dimensions).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{
    Aperture, Bend, DipoleEdge, EdgeSide, Element, ElementBody, ElementKind, Integrator, Kicker,
    MAX_SLICES, MultipoleField, RfCavity, RfField, SliceMethod, Solenoid, ThinMultipole,
    ThinRfMultipole, ThinSolenoid,
};
use crate::{
    error::{ElementError, Result},
    identifier::Id,
};

/// An element as exchanged with external tools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementRecord {
    pub name: String,
    pub kind: String,
    #[serde(flatten)]
    pub params: IndexMap<String, ParamValue>,
}

impl ElementRecord {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            params: IndexMap::new(),
        }
    }

    /// Adds a parameter (builder style).
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// A single record parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Number(f64),
    List(Vec<f64>),
    Text(String),
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Number(value)
    }
}

impl From<Vec<f64>> for ParamValue {
    fn from(values: Vec<f64>) -> Self {
        ParamValue::List(values)
    }
}

impl From<&str> for ParamValue {
    fn from(text: &str) -> Self {
        ParamValue::Text(text.to_string())
    }
}

/// Consumes parameters one key at a time and reports whatever is left over.
struct ParamReader<'a> {
    element: Id,
    remaining: IndexMap<&'a str, &'a ParamValue>,
}

impl<'a> ParamReader<'a> {
    fn new(element: Id, params: &'a IndexMap<String, ParamValue>) -> Self {
        Self {
            element,
            remaining: params.iter().map(|(k, v)| (k.as_str(), v)).collect(),
        }
    }

    fn number(&mut self, key: &str) -> Result<Option<f64>> {
        match self.remaining.shift_remove(key) {
            None => Ok(None),
            Some(ParamValue::Number(value)) => Ok(Some(*value)),
            Some(_) => Err(self.wrong_type(key, "a number")),
        }
    }

    fn number_or_zero(&mut self, key: &str) -> Result<f64> {
        Ok(self.number(key)?.unwrap_or(0.0))
    }

    fn required(&mut self, key: &str) -> Result<f64> {
        self.number(key)?.ok_or_else(|| {
            ElementError::invalid(self.element, format!("missing required parameter `{key}`"))
        })
    }

    fn list(&mut self, key: &str) -> Result<Option<Vec<f64>>> {
        match self.remaining.shift_remove(key) {
            None => Ok(None),
            Some(ParamValue::List(values)) => Ok(Some(values.clone())),
            Some(ParamValue::Number(value)) => Ok(Some(vec![*value])),
            Some(ParamValue::Text(_)) => Err(self.wrong_type(key, "a list of numbers")),
        }
    }

    fn text(&mut self, key: &str) -> Result<Option<&'a str>> {
        match self.remaining.shift_remove(key) {
            None => Ok(None),
            Some(ParamValue::Text(text)) => Ok(Some(text.as_str())),
            Some(_) => Err(self.wrong_type(key, "a string")),
        }
    }

    fn finish(self) -> Result<()> {
        match self.remaining.keys().next() {
            Some(key) => Err(ElementError::UnknownParameter {
                element: self.element,
                key: key.to_string(),
            }),
            None => Ok(()),
        }
    }

    fn wrong_type(&self, key: &str, expected: &str) -> ElementError {
        ElementError::invalid(self.element, format!("parameter `{key}` must be {expected}"))
    }
}

impl TryFrom<&ElementRecord> for Element {
    type Error = ElementError;

    fn try_from(record: &ElementRecord) -> Result<Self> {
        let name = Id::new(&record.name);
        let kind = ElementKind::from_tag(&record.kind)
            .ok_or_else(|| ElementError::UnsupportedKind(record.kind.clone()))?;

        let mut reader = ParamReader::new(name, &record.params);
        let aperture = read_aperture(&mut reader)?;
        let integrator = read_integrator(&mut reader)?;
        let body = read_body(kind, &mut reader)?;
        reader.finish()?;

        let element = Element {
            name,
            body,
            aperture,
            integrator,
        };
        element.validate()?;
        Ok(element)
    }
}

impl TryFrom<ElementRecord> for Element {
    type Error = ElementError;

    fn try_from(record: ElementRecord) -> Result<Self> {
        Element::try_from(&record)
    }
}

fn read_aperture(reader: &mut ParamReader<'_>) -> Result<Option<Aperture>> {
    let shape = reader.text("aperture_type")?;
    let dimensions = reader.list("aperture")?;
    match (shape, dimensions) {
        (None, None) => Ok(None),
        (Some(shape), Some(dimensions)) => Aperture::from_parts(shape, &dimensions)
            .map(Some)
            .ok_or_else(|| {
                ElementError::invalid(
                    reader.element,
                    format!("aperture `{shape}` does not accept {} dimension(s)", dimensions.len()),
                )
            }),
        _ => Err(ElementError::invalid(
            reader.element,
            "`aperture_type` and `aperture` must be given together",
        )),
    }
}

fn read_integrator(reader: &mut ParamReader<'_>) -> Result<Option<Integrator>> {
    let slices = reader.number("slices")?;
    let method = reader.text("method")?;
    let pass_method = reader.text("pass_method")?;
    if slices.is_none() && method.is_none() && pass_method.is_none() {
        return Ok(None);
    }

    let slices = slices.unwrap_or(1.0);
    if slices < 1.0 || slices.fract() != 0.0 || slices > MAX_SLICES as f64 {
        return Err(ElementError::invalid(
            reader.element,
            format!("`slices` must be an integer between 1 and {MAX_SLICES}, got {slices}"),
        ));
    }
    let method = method
        .map(str::parse::<SliceMethod>)
        .transpose()
        .map_err(|err: String| ElementError::invalid(reader.element, err))?
        .unwrap_or_default();

    let integrator = Integrator::new(slices as usize, method)
        .ok_or_else(|| ElementError::invalid(reader.element, "`slices` is out of range"))?;
    Ok(Some(match pass_method {
        Some(pass_method) => integrator.with_pass_method(pass_method),
        None => integrator,
    }))
}

fn read_body(kind: ElementKind, reader: &mut ParamReader<'_>) -> Result<ElementBody> {
    let body = match kind {
        ElementKind::Marker => match reader.number("length")? {
            Some(length) if length != 0.0 => {
                return Err(ElementError::invalid(
                    reader.element,
                    format!("marker must have zero length, got {length}"),
                ));
            }
            _ => ElementBody::Marker,
        },
        ElementKind::Drift => ElementBody::Drift {
            length: reader.required("length")?,
        },
        ElementKind::SectorBend | ElementKind::RectangularBend => {
            let bend = Bend::new(reader.required("length")?, reader.number_or_zero("angle")?)
                .with_edges(reader.number_or_zero("e1")?, reader.number_or_zero("e2")?)
                .with_k1(reader.number_or_zero("k1")?)
                .with_fringe(reader.number_or_zero("hgap")?, reader.number_or_zero("fint")?);
            if kind == ElementKind::SectorBend {
                ElementBody::SectorBend(bend)
            } else {
                ElementBody::RectangularBend(bend)
            }
        }
        ElementKind::DipoleEdge => {
            let side = reader.text("side")?.unwrap_or("entrance");
            let side = EdgeSide::from_tag(side).ok_or_else(|| {
                ElementError::invalid(reader.element, format!("unknown edge side `{side}`"))
            })?;
            let edge = DipoleEdge::new(side, reader.number_or_zero("h")?, reader.number_or_zero("e1")?)
                .with_fringe(reader.number_or_zero("hgap")?, reader.number_or_zero("fint")?);
            ElementBody::DipoleEdge(edge)
        }
        ElementKind::Solenoid => ElementBody::Solenoid(Solenoid::new(
            reader.required("length")?,
            reader.number_or_zero("ks")?,
        )),
        ElementKind::Quadrupole => ElementBody::Quadrupole(read_single_order(reader, 1)?),
        ElementKind::Sextupole => ElementBody::Sextupole(read_single_order(reader, 2)?),
        ElementKind::Octupole => ElementBody::Octupole(read_single_order(reader, 3)?),
        ElementKind::Multipole => ElementBody::Multipole(MultipoleField::new(
            reader.required("length")?,
            reader.list("kn")?.unwrap_or_default(),
            reader.list("ks")?.unwrap_or_default(),
        )),
        ElementKind::RfCavity => {
            let length = reader.required("length")?;
            ElementBody::RfCavity(RfCavity::new(length, read_rf_field(reader)?))
        }
        ElementKind::HKicker => ElementBody::HKicker(Kicker::horizontal(
            reader.number_or_zero("length")?,
            reader.number_or_zero("kick")?,
        )),
        ElementKind::VKicker => ElementBody::VKicker(Kicker::vertical(
            reader.number_or_zero("length")?,
            reader.number_or_zero("kick")?,
        )),
        ElementKind::TKicker => ElementBody::TKicker(Kicker::new(
            reader.number_or_zero("length")?,
            reader.number_or_zero("hkick")?,
            reader.number_or_zero("vkick")?,
        )),
        ElementKind::ThinMultipole => {
            let thin = ThinMultipole::new(
                reader.list("knl")?.unwrap_or_default(),
                reader.list("ksl")?.unwrap_or_default(),
            )
            .with_radiation_length(reader.number_or_zero("lrad")?)
            .with_hxl(reader.number_or_zero("hxl")?);
            ElementBody::ThinMultipole(thin)
        }
        ElementKind::ThinSolenoid => ElementBody::ThinSolenoid(ThinSolenoid::new(
            reader.number_or_zero("ksi")?,
            reader.number_or_zero("lrad")?,
        )),
        ElementKind::ThinRfMultipole => {
            let field = read_rf_field(reader)?;
            ElementBody::ThinRfMultipole(ThinRfMultipole::new(field, reader.number_or_zero("lrad")?))
        }
    };
    Ok(body)
}

fn read_single_order(reader: &mut ParamReader<'_>, order: usize) -> Result<MultipoleField> {
    let length = reader.required("length")?;
    let normal = reader.number(&format!("k{order}"))?;
    let skew = reader.number(&format!("k{order}s"))?;
    let kn = reader.list("kn")?;
    let ks = reader.list("ks")?;

    match (normal.is_some() || skew.is_some(), kn.is_some() || ks.is_some()) {
        (true, true) => Err(ElementError::invalid(
            reader.element,
            format!("give either `k{order}`/`k{order}s` or `kn`/`ks`, not both"),
        )),
        (_, true) => Ok(MultipoleField::new(
            length,
            kn.unwrap_or_default(),
            ks.unwrap_or_default(),
        )),
        _ => Ok(MultipoleField::single(
            length,
            order,
            normal.unwrap_or(0.0),
            skew.unwrap_or(0.0),
        )),
    }
}

fn read_rf_field(reader: &mut ParamReader<'_>) -> Result<RfField> {
    Ok(RfField::new(
        reader.number_or_zero("volt")?,
        reader.number_or_zero("freq")?,
        reader.number_or_zero("lag")?,
    ))
}

/// Collects parameters for [`Element::to_record`], skipping zero defaults.
struct RecordWriter {
    record: ElementRecord,
}

impl RecordWriter {
    fn number(&mut self, key: &str, value: f64) {
        self.record.params.insert(key.to_string(), ParamValue::Number(value));
    }

    fn nonzero(&mut self, key: &str, value: f64) {
        if value != 0.0 {
            self.number(key, value);
        }
    }

    fn list(&mut self, key: &str, values: &[f64]) {
        if !values.is_empty() {
            self.record
                .params
                .insert(key.to_string(), ParamValue::List(values.to_vec()));
        }
    }

    fn text(&mut self, key: &str, value: &str) {
        self.record
            .params
            .insert(key.to_string(), ParamValue::Text(value.to_string()));
    }

    fn rf_field(&mut self, field: &RfField) {
        self.nonzero("volt", field.voltage());
        self.nonzero("freq", field.frequency());
        self.nonzero("lag", field.lag());
    }

    fn single_order(&mut self, field: &MultipoleField, order: usize) {
        self.number("length", field.length());
        let only_main_order = |values: &[f64]| {
            values
                .iter()
                .enumerate()
                .all(|(i, value)| i == order || *value == 0.0)
        };
        if only_main_order(field.kn()) && only_main_order(field.ks()) {
            self.nonzero(&format!("k{order}"), field.kn_at(order));
            self.nonzero(&format!("k{order}s"), field.ks_at(order));
        } else {
            self.list("kn", field.kn());
            self.list("ks", field.ks());
        }
    }
}

impl Element {
    /// Writes this element as a record that [`Element::try_from`] reads back
    /// into an equal element.
    pub fn to_record(&self) -> ElementRecord {
        let mut writer = RecordWriter {
            record: ElementRecord::new(self.name.to_string(), self.kind().tag()),
        };

        match &self.body {
            ElementBody::Marker => {}
            ElementBody::Drift { length } => writer.number("length", *length),
            ElementBody::SectorBend(bend) | ElementBody::RectangularBend(bend) => {
                writer.number("length", bend.length());
                writer.number("angle", bend.angle());
                writer.nonzero("e1", bend.e1());
                writer.nonzero("e2", bend.e2());
                writer.nonzero("k1", bend.k1());
                writer.nonzero("hgap", bend.hgap());
                writer.nonzero("fint", bend.fint());
            }
            ElementBody::DipoleEdge(edge) => {
                writer.text("side", edge.side().tag());
                writer.number("h", edge.h());
                writer.nonzero("e1", edge.edge_angle());
                writer.nonzero("hgap", edge.hgap());
                writer.nonzero("fint", edge.fint());
            }
            ElementBody::Solenoid(solenoid) => {
                writer.number("length", solenoid.length());
                writer.nonzero("ks", solenoid.ks());
            }
            ElementBody::Quadrupole(field) => writer.single_order(field, 1),
            ElementBody::Sextupole(field) => writer.single_order(field, 2),
            ElementBody::Octupole(field) => writer.single_order(field, 3),
            ElementBody::Multipole(field) => {
                writer.number("length", field.length());
                writer.list("kn", field.kn());
                writer.list("ks", field.ks());
            }
            ElementBody::RfCavity(cavity) => {
                writer.number("length", cavity.length());
                writer.rf_field(cavity.field());
            }
            ElementBody::HKicker(kicker) => {
                writer.nonzero("length", kicker.length());
                writer.nonzero("kick", kicker.hkick());
            }
            ElementBody::VKicker(kicker) => {
                writer.nonzero("length", kicker.length());
                writer.nonzero("kick", kicker.vkick());
            }
            ElementBody::TKicker(kicker) => {
                writer.nonzero("length", kicker.length());
                writer.nonzero("hkick", kicker.hkick());
                writer.nonzero("vkick", kicker.vkick());
            }
            ElementBody::ThinMultipole(thin) => {
                writer.list("knl", thin.knl());
                writer.list("ksl", thin.ksl());
                writer.nonzero("lrad", thin.radiation_length());
                writer.nonzero("hxl", thin.hxl());
            }
            ElementBody::ThinSolenoid(thin) => {
                writer.number("ksi", thin.ksi());
                writer.nonzero("lrad", thin.radiation_length());
            }
            ElementBody::ThinRfMultipole(thin) => {
                writer.rf_field(thin.field());
                writer.nonzero("lrad", thin.radiation_length());
            }
        }

        if let Some(aperture) = &self.aperture {
            writer.text("aperture_type", aperture.tag());
            writer.list("aperture", &aperture.dimensions());
        }
        if let Some(integrator) = &self.integrator {
            writer.number("slices", integrator.num_slices() as f64);
            writer.text("method", integrator.method().tag());
            if let Some(pass_method) = integrator.pass_method() {
                writer.text("pass_method", pass_method);
            }
        }

        writer.record
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;

    fn parse(source: &str) -> ElementRecord {
        toml::from_str(source).expect("valid record toml")
    }

    #[test]
    fn test_quadrupole_from_toml() {
        let record = parse(
            r#"
            name = "qf"
            kind = "quadrupole"
            length = 0.5
            k1 = 0.8
            slices = 4
            method = "uniform"
            "#,
        );
        let element = Element::try_from(&record).expect("valid quadrupole");

        assert_eq!(element.kind(), ElementKind::Quadrupole);
        assert_approx_eq!(f64, element.length(), 0.5);
        let integrator = element.integrator().expect("integrator requested");
        assert_eq!(integrator.num_slices(), 4);
        assert_eq!(integrator.method(), SliceMethod::Uniform);
    }

    #[test]
    fn test_unknown_kind_is_named() {
        let record = ElementRecord::new("w1", "wiggler").with_param("length", 2.0);
        let err = Element::try_from(&record).unwrap_err();
        assert_eq!(err, ElementError::UnsupportedKind("wiggler".to_string()));
        assert!(err.to_string().contains("wiggler"));
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let record = ElementRecord::new("d1", "drift")
            .with_param("length", 1.0)
            .with_param("tilt", 0.1);
        let err = Element::try_from(&record).unwrap_err();
        assert!(matches!(err, ElementError::UnknownParameter { ref key, .. } if key == "tilt"));
    }

    #[test]
    fn test_wrong_value_type() {
        let record = ElementRecord::new("d1", "drift").with_param("length", "long");
        assert!(matches!(
            Element::try_from(&record),
            Err(ElementError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_missing_length() {
        let record = ElementRecord::new("mb", "sbend").with_param("angle", 0.1);
        assert!(Element::try_from(&record).is_err());
    }

    #[test]
    fn test_marker_with_length_rejected() {
        let record = ElementRecord::new("ip", "marker").with_param("length", 0.5);
        assert!(matches!(
            Element::try_from(&record),
            Err(ElementError::InvalidParameter { .. })
        ));
        let record = ElementRecord::new("ip", "marker").with_param("length", 0.0);
        assert!(Element::try_from(&record).is_ok());
    }

    #[test]
    fn test_zero_slices_rejected() {
        let record = ElementRecord::new("q", "quadrupole")
            .with_param("length", 1.0)
            .with_param("slices", 0.0);
        assert!(matches!(
            Element::try_from(&record),
            Err(ElementError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_huge_slice_count_rejected() {
        for slices in [1e30, (MAX_SLICES + 1) as f64, f64::INFINITY] {
            let record = ElementRecord::new("q", "quadrupole")
                .with_param("length", 1.0)
                .with_param("slices", slices);
            assert!(matches!(
                Element::try_from(&record),
                Err(ElementError::InvalidParameter { .. })
            ));
        }

        let record = ElementRecord::new("q", "quadrupole")
            .with_param("length", 1.0)
            .with_param("slices", MAX_SLICES as f64);
        let element = Element::try_from(&record).expect("largest slice count");
        assert_eq!(element.integrator().map(Integrator::num_slices), Some(MAX_SLICES));
    }

    #[test]
    fn test_aperture_requires_both_keys() {
        let record = ElementRecord::new("q", "quadrupole")
            .with_param("length", 1.0)
            .with_param("aperture_type", "circle");
        assert!(Element::try_from(&record).is_err());
    }

    #[test]
    fn test_bend_record_roundtrip_keeps_edges_and_aperture() {
        let element = Element::new(
            "mb",
            ElementBody::RectangularBend(Bend::new(6.0, 0.05).with_edges(0.01, 0.02).with_k1(-0.003)),
        )
        .expect("valid bend")
        .with_aperture(Aperture::Ellipse {
            half_x: 0.03,
            half_y: 0.02,
        })
        .with_integrator(Integrator::new(2, SliceMethod::Teapot).expect("valid"));

        let record = element.to_record();
        assert_eq!(record.kind, "rbend");
        assert_eq!(Element::try_from(&record).expect("readable"), element);
    }

    #[test]
    fn test_quadrupole_with_extra_orders_exports_lists() {
        let mut quad = Element::quadrupole("q", 1.0, 0.2).expect("valid");
        quad.set_attribute(crate::element::Attribute::Kn(2), 0.5)
            .expect("settable");

        let record = quad.to_record();
        assert!(record.params.contains_key("kn"));
        assert!(!record.params.contains_key("k1"));
        assert_eq!(Element::try_from(&record).expect("readable"), quad);
    }

    #[test]
    fn test_thin_multipole_record() {
        let record = parse(
            r#"
            name = "mb..0"
            kind = "thin_multipole"
            knl = [0.075]
            lrad = 3.75
            "#,
        );
        let element = Element::try_from(&record).expect("valid thin multipole");
        let ElementBody::ThinMultipole(thin) = element.body() else {
            panic!("expected thin multipole");
        };
        assert_eq!(thin.knl(), &[0.075]);
        assert_approx_eq!(f64, thin.radiation_length(), 3.75);
        assert_eq!(element.length(), 0.0);
    }

    #[test]
    fn test_dipole_edge_side() {
        let record = ElementRecord::new("mb_dex", "dipedge")
            .with_param("side", "exit")
            .with_param("h", 0.02);
        let element = Element::try_from(&record).expect("valid edge");
        let ElementBody::DipoleEdge(edge) = element.body() else {
            panic!("expected dipole edge");
        };
        assert_eq!(edge.side(), EdgeSide::Exit);

        let bad = ElementRecord::new("e", "dipedge").with_param("side", "middle");
        assert!(Element::try_from(&bad).is_err());
    }
}
