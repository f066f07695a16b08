//! Error types for lattice operations.
//!
//! This module provides [`LatticeError`], returned by every operation that
//! builds, repositions, slices or exports a lattice. Operations that fail
//! leave the lattice they were called on untouched.

use thiserror::Error;

use beamline_core::{ElementError, identifier::Id};

/// The main error type for lattice operations.
#[derive(Debug, Error)]
pub enum LatticeError {
    /// A node starts before the previous node ends, or reaches past the end of
    /// the lattice, by more than the geometry tolerance.
    #[error(
        "negative drift of {overlap:.3e} m at `{node}` (occurrence {occurrence}): elements overlap"
    )]
    NegativeDrift {
        node: Id,
        occurrence: usize,
        /// Overlap length, always positive.
        overlap: f64,
    },

    #[error("lattice length {0} must be finite and not negative")]
    InvalidLength(f64),

    #[error("`{node}` is placed relative to `{reference}`, which is not in the sequence")]
    MissingReference { node: Id, reference: Id },

    #[error(transparent)]
    Element(#[from] ElementError),

    #[error("element `{element}` uses {feature}, which the target cannot represent")]
    UnsupportedFeature { element: Id, feature: String },

    #[error("optics computation failed: {0}")]
    Optics(Box<dyn std::error::Error + Send + Sync>),
}

impl LatticeError {
    /// Wraps an error reported by an optics engine.
    pub fn optics(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Optics(Box::new(err))
    }
}

/// A type alias for `Result<T, LatticeError>`.
pub type Result<T> = std::result::Result<T, LatticeError>;
