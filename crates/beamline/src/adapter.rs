//! Import and export of element definitions.
//!
//! Adapters translate between [`Element`] and the parameter records of an
//! external tool. The built-in adapters work on [`ElementRecord`]; adapters
//! for specific tools implement the same traits for their own record types.

use beamline_core::{
    ElementError,
    catalog::ElementCatalog,
    element::{Element, ElementKind, ElementRecord},
};

use crate::error::{LatticeError, Result};

/// Builds elements from external records.
pub trait ElementImporter {
    type Record;

    /// # Errors
    ///
    /// Returns [`ElementError::UnsupportedKind`] for a kind the adapter does
    /// not know, or another [`ElementError`] for malformed parameters.
    fn import(&self, record: &Self::Record) -> std::result::Result<Element, ElementError>;

    /// Imports a batch of records into a new catalog.
    fn import_all<'a>(
        &self,
        records: impl IntoIterator<Item = &'a Self::Record>,
    ) -> std::result::Result<ElementCatalog, ElementError>
    where
        Self::Record: 'a,
    {
        let mut catalog = ElementCatalog::new();
        for record in records {
            catalog.insert(self.import(record)?)?;
        }
        Ok(catalog)
    }
}

/// Turns elements into external records.
pub trait ElementExporter {
    type Record;

    /// # Errors
    ///
    /// Returns [`LatticeError::UnsupportedFeature`] when the element uses
    /// something the target cannot represent. Data is never dropped silently.
    fn export(&self, element: &Element) -> Result<Self::Record>;
}

/// Reads [`ElementRecord`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordImporter;

impl ElementImporter for RecordImporter {
    type Record = ElementRecord;

    fn import(&self, record: &ElementRecord) -> std::result::Result<Element, ElementError> {
        Element::try_from(record)
    }
}

/// Writes [`ElementRecord`]s for a target with limited capabilities.
///
/// By default every kind, aperture and pass-method hint is accepted.
///
/// # Examples
///
/// ```
/// use beamline::{
///     adapter::{ElementExporter, RecordExporter},
///     element::{Aperture, Element, ElementKind},
/// };
///
/// let exporter = RecordExporter::new()
///     .with_kinds([ElementKind::Drift, ElementKind::Quadrupole])
///     .without_apertures();
///
/// let qf = Element::quadrupole("qf", 0.5, 0.8).unwrap();
/// assert!(exporter.export(&qf).is_ok());
///
/// let collimated = qf.with_aperture(Aperture::Circle { radius: 0.02 });
/// assert!(exporter.export(&collimated).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct RecordExporter {
    kinds: Option<Vec<ElementKind>>,
    apertures: bool,
    pass_methods: bool,
}

impl Default for RecordExporter {
    fn default() -> Self {
        Self {
            kinds: None,
            apertures: true,
            pass_methods: true,
        }
    }
}

impl RecordExporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts export to the given kinds (builder style).
    pub fn with_kinds(mut self, kinds: impl IntoIterator<Item = ElementKind>) -> Self {
        self.kinds = Some(kinds.into_iter().collect());
        self
    }

    /// Rejects elements that carry an aperture (builder style).
    pub fn without_apertures(mut self) -> Self {
        self.apertures = false;
        self
    }

    /// Rejects elements that carry a pass-method hint (builder style).
    pub fn without_pass_methods(mut self) -> Self {
        self.pass_methods = false;
        self
    }

    fn unsupported(element: &Element, feature: impl Into<String>) -> LatticeError {
        LatticeError::UnsupportedFeature {
            element: element.name(),
            feature: feature.into(),
        }
    }
}

impl ElementExporter for RecordExporter {
    type Record = ElementRecord;

    fn export(&self, element: &Element) -> Result<ElementRecord> {
        if self
            .kinds
            .as_ref()
            .is_some_and(|kinds| !kinds.contains(&element.kind()))
        {
            return Err(Self::unsupported(
                element,
                format!("element kind `{}`", element.kind()),
            ));
        }
        if !self.apertures && element.aperture().is_some() {
            return Err(Self::unsupported(element, "an aperture"));
        }
        if !self.pass_methods
            && element
                .integrator()
                .and_then(|integrator| integrator.pass_method())
                .is_some()
        {
            return Err(Self::unsupported(element, "a pass-method hint"));
        }
        Ok(element.to_record())
    }
}
