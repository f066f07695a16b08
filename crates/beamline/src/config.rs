//! Configuration for lattice construction and slicing.
//!
//! All types implement [`serde::Deserialize`] with every field defaulted, so a
//! partial TOML table is a valid configuration.
//!
//! # Example
//!
//! ```
//! # use beamline::config::LatticeConfig;
//! let config = LatticeConfig::default();
//! assert_eq!(config.tolerance(), 1e-9);
//! assert_eq!(config.drift_prefix(), "drift");
//! ```

use serde::Deserialize;

use beamline_core::{
    element::{Integrator, SliceMethod},
    tolerance::GEOMETRY_TOLERANCE,
};

/// Settings shared by every lattice operation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LatticeConfig {
    /// Gap and overlap tolerance, in metres.
    tolerance: f64,

    /// Name prefix for synthesized drifts.
    drift_prefix: String,

    slicing: SlicingConfig,
}

impl Default for LatticeConfig {
    fn default() -> Self {
        Self {
            tolerance: GEOMETRY_TOLERANCE,
            drift_prefix: "drift".to_string(),
            slicing: SlicingConfig::default(),
        }
    }
}

impl LatticeConfig {
    pub fn new(tolerance: f64, drift_prefix: impl Into<String>, slicing: SlicingConfig) -> Self {
        Self {
            tolerance,
            drift_prefix: drift_prefix.into(),
            slicing,
        }
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn drift_prefix(&self) -> &str {
        &self.drift_prefix
    }

    pub fn slicing(&self) -> &SlicingConfig {
        &self.slicing
    }

    /// Returns a copy with a different slicing section (builder style).
    pub fn with_slicing(mut self, slicing: SlicingConfig) -> Self {
        self.slicing = slicing;
        self
    }
}

/// Defaults applied when a lattice is sliced.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SlicingConfig {
    /// Method used for the default request below.
    default_method: SliceMethod,

    /// When set, thick elements without their own integration request are
    /// sliced with this many kicks.
    default_slices: Option<usize>,
}

impl SlicingConfig {
    pub fn new(default_method: SliceMethod, default_slices: Option<usize>) -> Self {
        Self {
            default_method,
            default_slices,
        }
    }

    pub fn default_method(&self) -> SliceMethod {
        self.default_method
    }

    pub fn default_slices(&self) -> Option<usize> {
        self.default_slices
    }

    /// The integration request given to elements that carry none.
    ///
    /// `None` when no default slice count is configured, or when it is outside
    /// `1..=MAX_SLICES`.
    pub fn default_integrator(&self) -> Option<Integrator> {
        self.default_slices
            .and_then(|slices| Integrator::new(slices, self.default_method))
    }
}
