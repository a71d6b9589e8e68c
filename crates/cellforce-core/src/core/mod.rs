//! # Core Module
//!
//! This module provides the fundamental building blocks of cellforce: the data that
//! describes a periodic particle system and the pure functions that score it.
//!
//! ## Architecture
//!
//! - **System Representation** ([`models`]) - Atoms, molecules, species templates, the
//!   periodic box and the configuration that owns them
//! - **Spatial Partition** ([`partition`]) - The cell list used to bound pair searches
//! - **Energy Functions** ([`forcefield`]) - Pair potentials, intramolecular functional forms,
//!   external potentials and the serde definitions they are loaded from
//! - **Utilities** ([`utils`]) - Geometric helpers shared by the kernels
//!
//! Nothing in this layer performs parallel work or logging beyond diagnostics; the
//! [`crate::engine`] layer builds on these types to evaluate energies and forces.

pub mod forcefield;
pub mod models;
pub mod partition;
pub mod utils;
