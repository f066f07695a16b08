//! Beamline - Sequencing, positioning and slicing of accelerator lattices.
//!
//! A [`Lattice`] holds element definitions and their positioned occurrences.
//! It can be viewed as a *sequence* (absolute positions, physical elements
//! only) or as a *line* (every gap filled by an explicit drift), and can be
//! converted to a thin-lens lattice by TEAPOT or uniform slicing. Optics
//! engines, expression stores and element exchange formats connect through
//! the traits in [`optics`], [`expression`] and [`adapter`].
//!
//! # Examples
//!
//! ```
//! use beamline::{
//!     Lattice,
//!     catalog::ElementCatalog,
//!     config::LatticeConfig,
//!     element::{Element, Integrator, SliceMethod},
//!     identifier::Id,
//! };
//!
//! let catalog = ElementCatalog::from_elements([
//!     Element::quadrupole("qf", 1.0, 0.1).unwrap(),
//!     Element::drift("d", 2.0).unwrap(),
//!     Element::sbend("mb", 4.0, 0.05)
//!         .unwrap()
//!         .with_integrator(Integrator::new(4, SliceMethod::Teapot).unwrap()),
//! ])
//! .unwrap();
//!
//! let names = ["qf", "d", "mb", "d"].map(Id::new);
//! let lattice = Lattice::from_line(catalog, &names, LatticeConfig::default()).unwrap();
//! assert_eq!(lattice.sequence().len(), 2);
//!
//! let thin = lattice.slice().unwrap();
//! assert_eq!(thin.total_length(), lattice.total_length());
//! ```

pub mod adapter;
pub mod config;
pub mod expression;
pub mod optics;
pub mod sequence;
pub mod slicing;

mod error;
mod lattice;

pub use beamline_core::{ElementError, catalog, element, identifier, node, position, tolerance};

pub use error::{LatticeError, Result};
pub use lattice::Lattice;
pub use sequence::Line;
