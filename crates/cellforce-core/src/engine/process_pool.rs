use std::fmt;
use std::iter::{Skip, StepBy};
use std::slice::Iter;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error(
        "Invalid process pool topology: rank {rank} of {size} processes in {n_groups} group(s)"
    )]
    InvalidTopology {
        rank: usize,
        size: usize,
        n_groups: usize,
    },
    #[error("Collective reduction failed: {0}")]
    Communication(String),
}

/// How the iterations of a loop are divided among the processes of a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DivisionStrategy {
    /// Each process group takes an interleaved share.
    Groups,
    /// Processes within one group share the group's work.
    GroupProcesses,
    /// Every process in the pool takes an interleaved share.
    #[default]
    Pool,
    /// One process handles the entire loop.
    PoolProcesses,
}

impl DivisionStrategy {
    /// Strategy for nested work inside a loop already divided with `self`.
    pub fn sub_division_strategy(self) -> Self {
        match self {
            DivisionStrategy::Groups => DivisionStrategy::GroupProcesses,
            DivisionStrategy::Pool => DivisionStrategy::PoolProcesses,
            terminal => {
                warn!(strategy = ?terminal, "Division strategy cannot be subdivided further");
                terminal
            }
        }
    }
}

/// Blocking collective operations across the processes of a pool.
pub trait Communicator: fmt::Debug + Send + Sync {
    /// Replaces every element of `values` with its sum over the processes selected by
    /// `strategy`.
    fn all_sum(&self, values: &mut [f64], strategy: DivisionStrategy) -> Result<(), PoolError>;
}

/// Communicator for a pool of one process: reductions are the identity.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialCommunicator;

impl Communicator for SerialCommunicator {
    fn all_sum(&self, _values: &mut [f64], _strategy: DivisionStrategy) -> Result<(), PoolError> {
        Ok(())
    }
}

/// This process's view of a pool of cooperating processes.
///
/// Processes are split into `n_groups` equally sized, contiguous groups. Work is divided
/// statically: each process takes every `stride`-th item from `start`, where both depend on
/// the [`DivisionStrategy`].
#[derive(Debug)]
pub struct ProcessPool {
    rank: usize,
    size: usize,
    n_groups: usize,
    communicator: Box<dyn Communicator>,
}

impl ProcessPool {
    pub fn new(
        rank: usize,
        size: usize,
        n_groups: usize,
        communicator: Box<dyn Communicator>,
    ) -> Result<Self, PoolError> {
        if size == 0 || rank >= size || n_groups == 0 || size % n_groups != 0 {
            return Err(PoolError::InvalidTopology {
                rank,
                size,
                n_groups,
            });
        }
        Ok(Self {
            rank,
            size,
            n_groups,
            communicator,
        })
    }

    /// A pool containing only this process.
    pub fn serial() -> Self {
        Self {
            rank: 0,
            size: 1,
            n_groups: 1,
            communicator: Box::new(SerialCommunicator),
        }
    }

    #[inline]
    pub fn rank(&self) -> usize {
        self.rank
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn n_groups(&self) -> usize {
        self.n_groups
    }

    pub fn group_size(&self) -> usize {
        self.size / self.n_groups
    }

    pub fn group_index(&self) -> usize {
        self.rank / self.group_size()
    }

    pub fn group_rank(&self) -> usize {
        self.rank % self.group_size()
    }

    pub fn is_master(&self) -> bool {
        self.rank == 0
    }

    pub fn interleaved_loop_start(&self, strategy: DivisionStrategy) -> usize {
        match strategy {
            DivisionStrategy::Groups => self.group_index(),
            DivisionStrategy::GroupProcesses => self.group_rank(),
            DivisionStrategy::Pool => self.rank,
            DivisionStrategy::PoolProcesses => 0,
        }
    }

    pub fn interleaved_loop_stride(&self, strategy: DivisionStrategy) -> usize {
        match strategy {
            DivisionStrategy::Groups => self.n_groups,
            DivisionStrategy::GroupProcesses => self.group_size(),
            DivisionStrategy::Pool => self.size,
            DivisionStrategy::PoolProcesses => 1,
        }
    }

    /// Number of divisions `strategy` splits a loop into.
    pub fn strategy_n_divisions(&self, strategy: DivisionStrategy) -> usize {
        self.interleaved_loop_stride(strategy)
    }

    /// This process's share of `items` under `strategy`.
    pub fn interleaved<'s, T>(
        &self,
        items: &'s [T],
        strategy: DivisionStrategy,
    ) -> StepBy<Skip<Iter<'s, T>>> {
        items
            .iter()
            .skip(self.interleaved_loop_start(strategy))
            .step_by(self.interleaved_loop_stride(strategy))
    }

    pub fn all_sum(&self, values: &mut [f64], strategy: DivisionStrategy) -> Result<(), PoolError> {
        self.communicator.all_sum(values, strategy)
    }
}

impl Default for ProcessPool {
    fn default() -> Self {
        Self::serial()
    }
}
