//! # Core Models Module
//!
//! Data structures describing a periodic particle system.
//!
//! ## Key Components
//!
//! - [`periodic_box`] - Cubic and orthorhombic periodic boxes with minimum-image geometry
//! - [`species`] - Molecule templates: atoms, bonded terms and the derived exclusion and
//!   1-4 scaling table
//! - [`atom`] - Structure-of-arrays atom storage with lightweight `AtomRef` cursors and
//!   generation-checked `AtomHandle`s
//! - [`molecule`] - Instances of a species, referencing their atoms by index
//! - [`configuration`] - The owning container: box, atoms, molecules, cell partition and
//!   external potentials
//! - [`ids`] - Arena keys for molecules
//!
//! ## Usage
//!
//! ```ignore
//! use cellforce::core::models::{configuration::Configuration, periodic_box::PeriodicBox};
//!
//! let mut cfg = Configuration::new(PeriodicBox::cubic(20.0)?);
//! let id = cfg.add_molecule(species.clone(), &positions)?;
//! cfg.generate_cells(9.0, 9.0)?;
//! ```

pub mod atom;
pub mod configuration;
pub mod ids;
pub mod molecule;
pub mod periodic_box;
pub mod species;
