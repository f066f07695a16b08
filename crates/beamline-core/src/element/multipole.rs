//! Multipole field coefficients for thick and thin magnets.

use crate::tolerance::{params_eq, slices_eq};

/// Per-length multipole coefficients of a thick magnet.
///
/// `kn[n]` and `ks[n]` are the normal and skew strengths of order `n`
/// (0 = dipole, 1 = quadrupole, ...). Integrated strengths are never stored:
/// [`MultipoleField::knl`] and [`MultipoleField::ksl`] recompute them from the
/// current length on every read, so the two views cannot drift apart.
#[derive(Debug, Clone, Default)]
pub struct MultipoleField {
    length: f64,
    kn: Vec<f64>,
    ks: Vec<f64>,
}

impl MultipoleField {
    pub fn new(length: f64, kn: Vec<f64>, ks: Vec<f64>) -> Self {
        Self { length, kn, ks }
    }

    /// A field with a single normal and skew coefficient at `order`.
    pub fn single(length: f64, order: usize, normal: f64, skew: f64) -> Self {
        let mut field = Self::new(length, Vec::new(), Vec::new());
        field.set_kn(order, normal);
        field.set_ks(order, skew);
        field
    }

    /// Builds a field from integrated strengths by dividing through the length.
    ///
    /// Returns `None` for a zero length, where integrated strengths cannot be
    /// represented per unit length.
    pub fn from_integrated(length: f64, knl: &[f64], ksl: &[f64]) -> Option<Self> {
        if length == 0.0 {
            return None;
        }
        Some(Self::new(
            length,
            knl.iter().map(|k| k / length).collect(),
            ksl.iter().map(|k| k / length).collect(),
        ))
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn kn(&self) -> &[f64] {
        &self.kn
    }

    pub fn ks(&self) -> &[f64] {
        &self.ks
    }

    /// Normal coefficient of `order`, zero when not set.
    pub fn kn_at(&self, order: usize) -> f64 {
        self.kn.get(order).copied().unwrap_or(0.0)
    }

    /// Skew coefficient of `order`, zero when not set.
    pub fn ks_at(&self, order: usize) -> f64 {
        self.ks.get(order).copied().unwrap_or(0.0)
    }

    /// Integrated normal strengths `kn * length`.
    pub fn knl(&self) -> Vec<f64> {
        self.kn.iter().map(|k| k * self.length).collect()
    }

    /// Integrated skew strengths `ks * length`.
    pub fn ksl(&self) -> Vec<f64> {
        self.ks.iter().map(|k| k * self.length).collect()
    }

    pub(crate) fn set_length(&mut self, length: f64) {
        self.length = length;
    }

    pub(crate) fn set_kn(&mut self, order: usize, value: f64) {
        set_coefficient(&mut self.kn, order, value);
    }

    pub(crate) fn set_ks(&mut self, order: usize, value: f64) {
        set_coefficient(&mut self.ks, order, value);
    }
}

impl PartialEq for MultipoleField {
    fn eq(&self, other: &Self) -> bool {
        params_eq(self.length, other.length)
            && slices_eq(&self.kn, &other.kn)
            && slices_eq(&self.ks, &other.ks)
    }
}

/// Zero-length multipole kick.
///
/// Carries integrated strengths directly. `radiation_length` is the length of
/// the thick element the kick stands in for and `hxl` the integrated
/// curvature when it replaces a slice of a bend.
#[derive(Debug, Clone, Default)]
pub struct ThinMultipole {
    knl: Vec<f64>,
    ksl: Vec<f64>,
    radiation_length: f64,
    hxl: f64,
}

impl ThinMultipole {
    pub fn new(knl: Vec<f64>, ksl: Vec<f64>) -> Self {
        Self {
            knl,
            ksl,
            ..Self::default()
        }
    }

    /// Sets the radiation length (builder style).
    pub fn with_radiation_length(mut self, radiation_length: f64) -> Self {
        self.radiation_length = radiation_length;
        self
    }

    /// Sets the integrated curvature (builder style).
    pub fn with_hxl(mut self, hxl: f64) -> Self {
        self.hxl = hxl;
        self
    }

    pub fn knl(&self) -> &[f64] {
        &self.knl
    }

    pub fn ksl(&self) -> &[f64] {
        &self.ksl
    }

    pub fn radiation_length(&self) -> f64 {
        self.radiation_length
    }

    pub fn hxl(&self) -> f64 {
        self.hxl
    }

    pub(crate) fn set_knl(&mut self, order: usize, value: f64) {
        set_coefficient(&mut self.knl, order, value);
    }

    pub(crate) fn set_ksl(&mut self, order: usize, value: f64) {
        set_coefficient(&mut self.ksl, order, value);
    }
}

impl PartialEq for ThinMultipole {
    fn eq(&self, other: &Self) -> bool {
        slices_eq(&self.knl, &other.knl)
            && slices_eq(&self.ksl, &other.ksl)
            && params_eq(self.radiation_length, other.radiation_length)
            && params_eq(self.hxl, other.hxl)
    }
}

fn set_coefficient(values: &mut Vec<f64>, order: usize, value: f64) {
    if order >= values.len() {
        if value == 0.0 {
            return;
        }
        values.resize(order + 1, 0.0);
    }
    values[order] = value;
}
