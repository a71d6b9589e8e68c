use thiserror::Error;

use super::config::ConfigError;
use super::process_pool::PoolError;
use crate::core::models::configuration::ConfigurationError;
use crate::core::models::ids::MoleculeId;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Missing prerequisite: {0}")]
    MissingPrerequisite(&'static str),

    #[error("Cutoff {cutoff} exceeds the {what} range {range}")]
    CutoffOutOfRange {
        cutoff: f64,
        range: f64,
        what: &'static str,
    },

    #[error("Atom type {index} is not defined by the pair potential map ({n_types} types)")]
    UnknownAtomType { index: usize, n_types: usize },

    #[error("Molecule {0:?} not found in configuration")]
    MoleculeNotFound(MoleculeId),

    #[error("Atom index {0} is out of range")]
    AtomOutOfRange(usize),

    #[error("Force vector has {found} entries, expected {expected}")]
    ForceVectorLength { expected: usize, found: usize },

    #[error("Kernel configuration error: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Configuration error: {source}")]
    Configuration {
        #[from]
        source: ConfigurationError,
    },

    #[error("Process pool error: {source}")]
    Pool {
        #[from]
        source: PoolError,
    },
}
