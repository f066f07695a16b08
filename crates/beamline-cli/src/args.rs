//! Command-line argument definitions for the Beamline CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments control input/output paths, configuration file
//! selection, the lattice view to print and logging verbosity.

use clap::{Parser, ValueEnum};

/// Command-line arguments for the Beamline lattice tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input lattice file (TOML)
    #[arg(help = "Path to the input file")]
    pub input: String,

    /// Path to the output file; standard output when omitted
    #[arg(short, long)]
    pub output: Option<String>,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Which view of the lattice to print
    #[arg(long, value_enum, default_value_t = View::Sequence)]
    pub view: View,

    /// Replace sliceable elements by their thin-lens kicks first
    #[arg(long)]
    pub slice: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Table)]
    pub format: Format,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

/// Lattice views selectable with `--view`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum View {
    /// Physical elements at absolute positions
    Sequence,
    /// Every element including synthesized drifts
    Line,
}

/// Output formats selectable with `--format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Human-readable position table
    Table,
    /// A lattice document that can be read back as input
    Toml,
}
