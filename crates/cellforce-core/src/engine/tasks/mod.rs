//! Evaluation kernels over a partitioned configuration.
//!
//! Each submodule owns one kind of contribution: the cutoff-truncated pair potential energy
//! ([`pair_energy`]), bonded terms and their analytic forces ([`geometry`]), pair and
//! combined forces ([`pair_forces`]), and per-atom / per-molecule totals assembled from the
//! other kernels ([`total_energy`]). Kernels borrow the configuration immutably and never
//! perform I/O.

pub mod geometry;
pub mod pair_energy;
pub mod pair_forces;
pub mod total_energy;

#[cfg(test)]
pub(crate) mod fixtures;
