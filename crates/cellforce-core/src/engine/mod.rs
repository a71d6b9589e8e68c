//! # Engine Module
//!
//! Energy and force kernels for a configuration that has been partitioned into cells,
//! together with the machinery that feeds them and divides their work.
//!
//! ## Overview
//!
//! A kernel evaluation starts from a [`context::KernelContext`], which borrows the
//! configuration, the potential map and the process pool, and checks the prerequisites
//! every kernel relies on (a cell partition whose neighbour range covers the cutoff).
//! Kernels then return this process's partial sums; combining partials across processes
//! is left to the caller through [`process_pool::ProcessPool::all_sum`].
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Cutoff, cell size, division strategy and
//!   intramolecular switches, assembled through a builder
//! - **Context** ([`context`]) - Validated borrow of everything a kernel reads
//! - **Process Pool** ([`process_pool`]) - Rank topology, interleaved work division and
//!   collective reductions behind the `Communicator` trait
//! - **Tasks** ([`tasks`]) - The kernels themselves
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress events
//! - **Error Handling** ([`error`]) - Engine-level error type
//!
//! ## Key Capabilities
//!
//! - **Two independent total-energy paths** (cell pairs and per molecule) that must agree
//! - **Data-parallel evaluation** with rayon when the `parallel` feature is enabled
//! - **Analytic forces** for pair, bonded and external terms

pub mod config;
pub mod context;
pub mod error;
pub mod process_pool;
pub mod progress;
pub mod tasks;
