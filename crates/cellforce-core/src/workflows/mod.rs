//! # Workflows Module
//!
//! High-level procedures that combine the [`crate::engine`] kernels into complete
//! evaluations.
//!
//! ## Overview
//!
//! A workflow takes a configuration and its forcefield, prepares the cell partition,
//! validates the kernel prerequisites, runs each kernel over this process's share of the
//! work and reduces the partial sums across the process pool. Progress is reported through
//! the engine's [`crate::engine::progress::ProgressReporter`].
//!
//! ## Architecture
//!
//! - **Evaluation Workflow** ([`evaluate`]) - Full energy breakdown (pair, bonded and
//!   external), the per-molecule cross-check of the pair total, and optional analytic forces.
//!
//! ## Usage
//!
//! ```ignore
//! use cellforce::core::forcefield::definition::SystemDefinition;
//! use cellforce::engine::config::KernelConfigBuilder;
//! use cellforce::engine::process_pool::ProcessPool;
//! use cellforce::engine::progress::ProgressReporter;
//! use cellforce::workflows::evaluate;
//!
//! let mut system = SystemDefinition::load(path)?.build()?;
//! let config = KernelConfigBuilder::new().cutoff(9.0).build()?;
//! let report = evaluate::run(
//!     &mut system.configuration,
//!     &system.potential_map,
//!     &config,
//!     &ProcessPool::serial(),
//!     &ProgressReporter::new(),
//! )?;
//! println!("total energy: {:.4} kJ/mol", report.total());
//! ```

pub mod evaluate;
