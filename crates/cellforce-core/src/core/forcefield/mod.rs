//! # Force Field Module
//!
//! Parameters and functional forms for the interactions evaluated by the engine kernels.
//!
//! ## Overview
//!
//! Two families of interactions are described here:
//!
//! - **Non-bonded pair potentials**: a mixed short-range term (Lennard-Jones 12-6) plus
//!   Coulomb electrostatics, tabulated per pair of atom types in a [`potential_map::PotentialMap`]
//!   and truncated at the pair potential range
//! - **Intramolecular terms**: bond, angle, torsion and improper functional forms, selected
//!   by keyword and evaluated together with their analytic derivatives
//!
//! Atoms may additionally be subject to position-dependent [`external`] potentials.
//!
//! ## Key Components
//!
//! - [`params`] - Atom types and pair potential settings
//! - [`potential_map`] - Type-pair matrix with mixing rules and truncation
//! - [`potentials`] - Raw analytic pair functions
//! - [`intramolecular`] - Bonded functional forms and keyword lookup
//! - [`external`] - External potentials acting on single atoms
//! - [`term`] - Energy accumulators returned by the kernels
//! - [`definition`] - TOML system definitions and their conversion into runtime objects
//!
//! ## Usage
//!
//! ```ignore
//! use cellforce::core::forcefield::definition::SystemDefinition;
//!
//! let system = SystemDefinition::load(path)?.build()?;
//! let map = &system.potential_map;
//! ```

pub mod definition;
pub mod external;
pub mod intramolecular;
pub mod params;
pub mod potential_map;
pub mod potentials;
pub mod term;
