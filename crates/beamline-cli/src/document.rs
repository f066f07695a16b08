//! The TOML lattice document read and written by the CLI.
//!
//! A document lists element definitions under `[[elements]]` and places them
//! either with explicit `[[sequence]]` entries or with a `line` of names laid
//! out end to end. A sequence document may give the total `length`; a line
//! ends where its last entry ends:
//!
//! ```toml
//! line = ["qf", "d", "mb", "d", "qd"]
//!
//! [[elements]]
//! name = "qf"
//! kind = "quadrupole"
//! length = 0.5
//! k1 = 0.8
//! ```

use log::debug;
use serde::{Deserialize, Serialize};

use beamline::{
    Lattice,
    adapter::{ElementExporter, ElementImporter, RecordExporter, RecordImporter},
    catalog::ElementCatalog,
    config::LatticeConfig,
    element::ElementRecord,
    identifier::Id,
    node::PositionedNode,
    position::{Anchor, Placement},
};

use crate::error::CliError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LatticeDocument {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub line: Vec<String>,

    /// Total length in metres, when the lattice extends past its last element.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<f64>,

    #[serde(default)]
    pub elements: Vec<ElementRecord>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sequence: Vec<SequenceEntry>,
}

/// One explicitly placed occurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SequenceEntry {
    pub element: String,

    /// Location of the anchor point, in metres.
    pub at: f64,

    #[serde(default)]
    pub anchor: Anchor,

    /// Element whose first occurrence `at` is measured from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
}

impl SequenceEntry {
    fn to_node(&self) -> PositionedNode {
        let mut placement = Placement::anchored(self.anchor, self.at);
        if let Some(from) = &self.from {
            placement = placement.relative_to(Id::from(from));
        }
        // length is filled in from the catalog when the lattice is built
        PositionedNode::new(Id::from(&self.element), 0.0, placement)
    }
}

impl LatticeDocument {
    /// Parses a document from TOML source.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Document`] with the offending span.
    pub fn parse(src: &str) -> Result<Self, CliError> {
        toml::from_str(src).map_err(|err| CliError::new_document_error(&err, src))
    }

    /// Builds the lattice the document describes.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Layout`] when the document has both `line` and
    /// `sequence`, or the first element or geometry error. An element that
    /// reaches past `length` is a geometry error.
    pub fn build(&self, config: LatticeConfig) -> Result<Lattice, CliError> {
        let catalog = RecordImporter.import_all(&self.elements)?;
        debug!(elements = catalog.len(); "Elements imported");

        let mut lattice = match (self.line.is_empty(), self.sequence.is_empty()) {
            (false, true) => {
                let names: Vec<Id> = self.line.iter().map(Id::from).collect();
                Lattice::from_line(catalog, &names, config)?
            }
            (true, _) => {
                let nodes = self.sequence.iter().map(SequenceEntry::to_node).collect();
                Lattice::new(catalog, nodes, config)?
            }
            (false, false) => {
                return Err(CliError::Layout(
                    "a document places elements with either `line` or `sequence`, not both"
                        .to_string(),
                ));
            }
        };
        if let Some(length) = self.length {
            lattice = lattice.with_length(length)?;
        }
        Ok(lattice)
    }

    /// The sequence view of `lattice` as a document.
    ///
    /// # Errors
    ///
    /// Returns an export error if an element cannot be written as a record.
    pub fn from_sequence(lattice: &Lattice) -> Result<Self, CliError> {
        Ok(Self {
            line: Vec::new(),
            elements: lattice.export(&RecordExporter::new())?,
            sequence: lattice
                .sequence()
                .iter()
                .map(|node| SequenceEntry {
                    element: node.element().to_string(),
                    at: node.center(),
                    anchor: Anchor::Center,
                    from: None,
                })
                .collect(),
            length: lattice.declared_length(),
        })
    }

    /// The line view of `lattice` as a document, with drift definitions.
    ///
    /// Element order follows the line, so the document reads back as the same
    /// lattice, drifts at either end included.
    ///
    /// # Errors
    ///
    /// Returns an export error if an element cannot be written as a record.
    pub fn from_line(lattice: &Lattice) -> Result<Self, CliError> {
        let (nodes, drifts) = lattice.line()?.into_parts();
        let mut catalog: ElementCatalog = lattice.catalog().clone();
        catalog.extend(drifts)?;

        let exporter = RecordExporter::new();
        let elements = catalog
            .iter()
            .map(|element| exporter.export(element))
            .collect::<Result<_, _>>()?;

        Ok(Self {
            line: nodes.iter().map(|node| node.element().to_string()).collect(),
            elements,
            sequence: Vec::new(),
            length: None,
        })
    }

    /// Serializes the document back to TOML.
    ///
    /// # Errors
    ///
    /// Fails only if a parameter value has no TOML representation.
    pub fn to_toml(&self) -> Result<String, CliError> {
        toml::to_string(self).map_err(|err| CliError::Layout(err.to_string()))
    }
}
