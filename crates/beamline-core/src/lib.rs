//! Beamline Core Types and Definitions
//!
//! This crate provides the leaf types of a Beamline lattice. It includes:
//!
//! - **Identifiers**: String-interned element names ([`identifier::Id`])
//! - **Elements**: Element definitions and their per-kind parameters ([`element`] module)
//! - **Positions**: Anchored placements and resolved intervals ([`position`] module)
//! - **Nodes**: Positioned occurrences of elements ([`node::PositionedNode`])
//! - **Catalog**: Name-keyed element storage ([`catalog::ElementCatalog`])
//! - **Tolerances**: Shared float comparison rules ([`tolerance`] module)

pub mod catalog;
pub mod element;
pub mod error;
pub mod identifier;
pub mod node;
pub mod position;
pub mod tolerance;

pub use error::ElementError;
