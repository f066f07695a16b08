//! Error types for the CLI.

use std::{io, ops::Range, path::PathBuf};

use thiserror::Error;

use beamline::{ElementError, LatticeError};

/// The main error type for CLI operations.
///
/// # Diagnostic Variants
///
/// `Document` keeps the input text and the byte range the TOML parser
/// reported, so it can be rendered with a source snippet.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to parse TOML configuration: {0}")]
    Config(String),

    #[error("Missing configuration file: {0}")]
    MissingConfig(PathBuf),

    #[error("{message}")]
    Document {
        message: String,
        span: Option<Range<usize>>,
        src: String,
    },

    #[error("Invalid lattice layout: {0}")]
    Layout(String),

    #[error(transparent)]
    Lattice(#[from] LatticeError),
}

impl CliError {
    /// Create a new `Document` error from a TOML parse failure.
    pub fn new_document_error(err: &toml::de::Error, src: impl Into<String>) -> Self {
        Self::Document {
            message: err.message().to_string(),
            span: err.span(),
            src: src.into(),
        }
    }
}

impl From<ElementError> for CliError {
    fn from(err: ElementError) -> Self {
        Self::Lattice(err.into())
    }
}
