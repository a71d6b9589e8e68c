//! # Spatial Partition Module
//!
//! Divides a periodic box into a regular grid of cells so that the pair search for any atom
//! is bounded to a fixed stencil of neighbouring cells.
//!
//! ## Overview
//!
//! - [`cell`] - A single grid cell holding the indices of the atoms currently inside it
//! - [`cell_array`] - Grid generation, the per-cell neighbour lists (each starting with the
//!   cell itself) and the global list of unique cell pairs used to divide pairwise work
//!
//! Every neighbour entry carries a flag saying whether the minimum image convention is
//! needed for atom pairs drawn from the two cells. Pairs that never straddle the periodic
//! boundary use the cheaper direct separation.
//!
//! The partition is rebuilt or refreshed through
//! [`Configuration`](crate::core::models::configuration::Configuration), which keeps each
//! atom's back-reference to its cell consistent with the cell contents.

pub mod cell;
pub mod cell_array;
