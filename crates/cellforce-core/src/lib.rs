//! # cellforce Core Library
//!
//! Cell-list accelerated energy and force kernels for classical particle simulations in
//! periodic boxes.
//!
//! ## Architectural Philosophy
//!
//! The library follows a strict three-layer architecture so that each concern can be tested
//! in isolation.
//!
//! - **[`core`]: The Foundation.** Stateless data models (`Configuration`, `Species`,
//!   `PeriodicBox`), the cell-list spatial partition, and the pure mathematics of the
//!   forcefield (pair potentials and intramolecular functional forms).
//!
//! - **[`engine`]: The Logic Core.** The evaluation kernels. Pairwise non-bonded energy over
//!   the cell list, bonded geometry energy and analytic forces, pairwise forces, the combined
//!   per-atom / per-molecule totals, and the process pool that divides work between
//!   cooperating ranks.
//!
//! - **[`workflows`]: The Public API.** Ties `engine` and `core` together into complete
//!   procedures, such as evaluating a full energy and force breakdown for a configuration
//!   with the cell-pair and per-molecule paths cross-checked against each other.

pub mod core;
pub mod engine;
pub mod workflows;
