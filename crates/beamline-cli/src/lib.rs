//! CLI logic for the Beamline lattice tool.
//!
//! Reads a TOML lattice document, builds the lattice, optionally slices it,
//! and writes either a position table or a normalized document.

pub mod error_adapter;

mod args;
mod config;
mod document;
mod error;

pub use args::{Args, Format, View};
pub use document::{LatticeDocument, SequenceEntry};
pub use error::CliError;

use std::{
    fmt::Write as _,
    fs,
    io::{self, Write as _},
};

use log::info;

use beamline::{Lattice, catalog::ElementCatalog, node::PositionedNode};

/// Run the Beamline CLI application
///
/// # Errors
///
/// Returns `CliError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Malformed lattice documents
/// - Element and geometry errors
pub fn run(args: &Args) -> Result<(), CliError> {
    info!(
        input_path = args.input,
        view:? = args.view,
        slice = args.slice;
        "Processing lattice"
    );

    let app_config = config::load_config(args.config.as_ref())?;

    let source = fs::read_to_string(&args.input)?;
    let document = LatticeDocument::parse(&source)?;
    let mut lattice = document.build(app_config.into_lattice())?;

    if args.slice {
        lattice = lattice.slice()?;
    }

    let output = render(&lattice, args.view, args.format)?;

    match &args.output {
        Some(path) => {
            fs::write(path, output)?;
            info!(output_file = path.as_str(); "Lattice written");
        }
        None => io::stdout().write_all(output.as_bytes())?,
    }

    Ok(())
}

/// Renders one view of a lattice in the requested format.
///
/// # Errors
///
/// Returns an error if the line view cannot be built or an element cannot be
/// exported.
pub fn render(lattice: &Lattice, view: View, format: Format) -> Result<String, CliError> {
    match (view, format) {
        (View::Sequence, Format::Table) => {
            Ok(position_table(lattice.sequence(), lattice.catalog(), None))
        }
        (View::Line, Format::Table) => {
            let line = lattice.line()?;
            Ok(position_table(
                line.nodes(),
                lattice.catalog(),
                Some(line.drifts()),
            ))
        }
        (View::Sequence, Format::Toml) => LatticeDocument::from_sequence(lattice)?.to_toml(),
        (View::Line, Format::Toml) => LatticeDocument::from_line(lattice)?.to_toml(),
    }
}

fn position_table(
    nodes: &[PositionedNode],
    catalog: &ElementCatalog,
    drifts: Option<&ElementCatalog>,
) -> String {
    let mut table = format!(
        "{:<16} {:>4} {:<18} {:>12} {:>12} {:>12} {:>10}\n",
        "name", "occ", "kind", "start", "center", "end", "length"
    );
    for node in nodes {
        let kind = catalog
            .get(node.element())
            .or_else(|| drifts.and_then(|drifts| drifts.get(node.element())))
            .map(|element| element.kind().to_string())
            .unwrap_or_default();
        // writing to a String cannot fail
        let _ = writeln!(
            table,
            "{:<16} {:>4} {:<18} {:>12.6} {:>12.6} {:>12.6} {:>10.6}",
            node.element().to_string(),
            node.element_number(),
            kind,
            node.start(),
            node.center(),
            node.end(),
            node.length(),
        );
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lattice() -> Lattice {
        LatticeDocument::parse(
            r#"
            line = ["qf", "d", "qf"]

            [[elements]]
            name = "qf"
            kind = "quadrupole"
            length = 0.5
            k1 = 1.2
            slices = 2

            [[elements]]
            name = "d"
            kind = "drift"
            length = 1.5
            "#,
        )
        .expect("valid document")
        .build(Default::default())
        .expect("valid lattice")
    }

    #[test]
    fn test_sequence_table() {
        let table = render(&lattice(), View::Sequence, Format::Table).expect("renders");
        let rows: Vec<_> = table.lines().collect();
        assert_eq!(rows.len(), 3);
        assert!(rows[0].starts_with("name"));
        assert!(rows[2].starts_with("qf"));
        assert!(rows[2].contains("quadrupole"));
    }

    #[test]
    fn test_line_table_names_drifts() {
        let table = render(&lattice(), View::Line, Format::Table).expect("renders");
        assert_eq!(table.lines().count(), 4);
        assert!(table.contains("drift_0"));
        assert!(table.contains("drift "));
    }

    #[test]
    fn test_thin_table() {
        let thin = lattice().slice().expect("sliceable");
        let table = render(&thin, View::Sequence, Format::Table).expect("renders");
        assert_eq!(table.lines().count(), 5);
        assert!(table.contains("qf..0"));
        assert!(table.contains("thin_multipole"));
    }

    #[test]
    fn test_toml_output_reads_back() {
        let text = render(&lattice(), View::Line, Format::Toml).expect("renders");
        let document = LatticeDocument::parse(&text).expect("valid document");
        assert_eq!(document.line, ["qf", "drift_0", "qf"]);
    }
}
