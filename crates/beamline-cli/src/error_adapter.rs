//! Error adapter for converting CliError to miette diagnostics.
//!
//! This module provides the bridge between the library's standard error types
//! and miette's rich diagnostic formatting used in the CLI. Malformed lattice
//! documents are rendered with a labelled source snippet; every other error
//! gets a stable diagnostic code and, where useful, a hint.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan, SourceSpan};

use beamline::{ElementError, LatticeError};

use crate::CliError;

/// Adapter rendering a [`CliError`] through miette.
pub struct ErrorAdapter<'a>(pub &'a CliError);

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(error_code(self.0)))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let help = match self.0 {
            CliError::Lattice(LatticeError::NegativeDrift { .. }) => {
                "move the element or shorten its predecessor; overlaps are never corrected automatically"
            }
            CliError::Lattice(LatticeError::MissingReference { .. }) => {
                "`from` must name an element placed in the same sequence without a reference cycle"
            }
            CliError::Lattice(LatticeError::Element(ElementError::UnsupportedKind(_))) => {
                "supported kinds: marker, drift, sbend, rbend, dipedge, quadrupole, sextupole, octupole, multipole, solenoid, rfcavity, hkicker, vkicker, tkicker"
            }
            CliError::Layout(_) => "use `line` for end-to-end layouts and `sequence` for explicit positions",
            _ => return None,
        };
        Some(Box::new(help))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        match self.0 {
            CliError::Document { src, .. } => Some(src as &dyn miette::SourceCode),
            _ => None,
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        match self.0 {
            CliError::Document {
                span: Some(span), ..
            } => {
                let span = SourceSpan::new(span.start.into(), span.len());
                Some(Box::new(std::iter::once(
                    LabeledSpan::new_primary_with_span(Some("here".to_string()), span),
                )))
            }
            _ => None,
        }
    }
}

/// Stable diagnostic code for an error.
pub fn error_code(err: &CliError) -> &'static str {
    match err {
        CliError::Io(_) => "beamline::io",
        CliError::Config(_) | CliError::MissingConfig(_) => "beamline::config",
        CliError::Document { .. } | CliError::Layout(_) => "beamline::document",
        CliError::Lattice(err) => match err {
            LatticeError::NegativeDrift { .. } | LatticeError::InvalidLength(_) => {
                "beamline::geometry"
            }
            LatticeError::MissingReference { .. } => "beamline::reference",
            LatticeError::UnsupportedFeature { .. } => "beamline::export",
            LatticeError::Optics(_) => "beamline::optics",
            LatticeError::Element(err) => match err {
                ElementError::InvalidParameter { .. }
                | ElementError::UnknownParameter { .. }
                | ElementError::UnsupportedAttribute { .. } => "beamline::parameter",
                ElementError::UnsupportedKind(_) => "beamline::kind",
                ElementError::DuplicateElement(_) | ElementError::MissingElement(_) => {
                    "beamline::catalog"
                }
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use beamline::identifier::Id;

    use super::*;

    #[test]
    fn test_geometry_code_and_help() {
        let err = CliError::Lattice(LatticeError::NegativeDrift {
            node: Id::new("qd"),
            occurrence: 2,
            overlap: 0.1,
        });
        let adapter = ErrorAdapter(&err);

        assert_eq!(
            adapter.code().map(|code| code.to_string()).as_deref(),
            Some("beamline::geometry")
        );
        assert!(adapter.help().is_some());
        assert!(adapter.to_string().contains("`qd`"));
    }

    #[test]
    fn test_element_codes() {
        let unknown = CliError::from(ElementError::UnknownParameter {
            element: Id::new("qf"),
            key: "k9".to_string(),
        });
        assert_eq!(error_code(&unknown), "beamline::parameter");

        let missing = CliError::from(ElementError::MissingElement(Id::new("qx")));
        assert_eq!(error_code(&missing), "beamline::catalog");

        let io = CliError::from(io::Error::new(io::ErrorKind::NotFound, "gone"));
        assert_eq!(error_code(&io), "beamline::io");
        assert!(ErrorAdapter(&io).help().is_none());
    }

    #[test]
    fn test_document_error_has_label() {
        let err = CliError::Document {
            message: "unknown field `from_element`".to_string(),
            span: Some(10..22),
            src: "[[sequence]]\nfrom_element = 1\n".to_string(),
        };
        let adapter = ErrorAdapter(&err);

        assert!(adapter.source_code().is_some());
        let labels: Vec<_> = adapter.labels().expect("labelled").collect();
        assert_eq!(labels.len(), 1);
        assert!(labels[0].primary());
        assert_eq!(labels[0].offset(), 10);
    }
}
