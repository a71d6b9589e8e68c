use super::config::ConfigError;
use super::error::EngineError;
use super::process_pool::ProcessPool;
use crate::core::forcefield::potential_map::PotentialMap;
use crate::core::models::configuration::Configuration;
use crate::core::partition::cell_array::CellArray;

/// Everything a kernel reads during one evaluation.
///
/// Construction checks the prerequisites shared by all kernels: the configuration must
/// have a cell partition, every atom type it uses must be known to the potential map, and
/// the cutoff may not exceed either the partition's neighbour range or the pair potential
/// range.
#[derive(Clone, Copy)]
pub struct KernelContext<'a> {
    pub configuration: &'a Configuration,
    pub potential_map: &'a PotentialMap,
    pub pool: &'a ProcessPool,
    pub cells: &'a CellArray,
    pub cutoff: f64,
}

impl<'a> KernelContext<'a> {
    pub fn new(
        configuration: &'a Configuration,
        potential_map: &'a PotentialMap,
        pool: &'a ProcessPool,
        cutoff: f64,
    ) -> Result<Self, EngineError> {
        let cells = configuration
            .cells()
            .ok_or(EngineError::MissingPrerequisite("cell partition"))?;
        let n_types = potential_map.n_types();
        if let Some(&index) = configuration.used_types().iter().find(|&&t| t >= n_types) {
            return Err(EngineError::UnknownAtomType { index, n_types });
        }
        if !(cutoff > 0.0) {
            return Err(ConfigError::InvalidParameter {
                name: "cutoff",
                value: cutoff,
            }
            .into());
        }
        if cutoff > cells.range() {
            return Err(EngineError::CutoffOutOfRange {
                cutoff,
                range: cells.range(),
                what: "cell partition",
            });
        }
        if cutoff > potential_map.range() {
            return Err(EngineError::CutoffOutOfRange {
                cutoff,
                range: potential_map.range(),
                what: "pair potential",
            });
        }
        Ok(Self {
            configuration,
            potential_map,
            pool,
            cells,
            cutoff,
        })
    }
}
