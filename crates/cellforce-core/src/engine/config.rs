use super::process_pool::DivisionStrategy;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for parameter '{name}': {value}")]
    InvalidParameter { name: &'static str, value: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct KernelConfig {
    /// Pair interaction cutoff in Angstroms.
    pub cutoff: f64,
    /// Requested cell size for the partition.
    pub cell_size: f64,
    pub strategy: DivisionStrategy,
    pub include_intra_molecular: bool,
    /// Also evaluate analytic forces alongside the energies.
    pub compute_forces: bool,
}

#[derive(Default)]
pub struct KernelConfigBuilder {
    cutoff: Option<f64>,
    cell_size: Option<f64>,
    strategy: Option<DivisionStrategy>,
    include_intra_molecular: Option<bool>,
    compute_forces: Option<bool>,
}

impl KernelConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cutoff(mut self, cutoff: f64) -> Self {
        self.cutoff = Some(cutoff);
        self
    }
    pub fn cell_size(mut self, size: f64) -> Self {
        self.cell_size = Some(size);
        self
    }
    pub fn strategy(mut self, strategy: DivisionStrategy) -> Self {
        self.strategy = Some(strategy);
        self
    }
    pub fn include_intra_molecular(mut self, include: bool) -> Self {
        self.include_intra_molecular = Some(include);
        self
    }
    pub fn compute_forces(mut self, compute: bool) -> Self {
        self.compute_forces = Some(compute);
        self
    }

    pub fn build(self) -> Result<KernelConfig, ConfigError> {
        let cutoff = self
            .cutoff
            .ok_or(ConfigError::MissingParameter("cutoff"))?;
        if !(cutoff > 0.0) {
            return Err(ConfigError::InvalidParameter {
                name: "cutoff",
                value: cutoff,
            });
        }
        let cell_size = self.cell_size.unwrap_or(cutoff);
        if !(cell_size > 0.0) {
            return Err(ConfigError::InvalidParameter {
                name: "cell_size",
                value: cell_size,
            });
        }
        Ok(KernelConfig {
            cutoff,
            cell_size,
            strategy: self.strategy.unwrap_or_default(),
            include_intra_molecular: self.include_intra_molecular.unwrap_or(true),
            compute_forces: self.compute_forces.unwrap_or(false),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_fails_without_cutoff() {
        let result = KernelConfigBuilder::new().cell_size(5.0).build();
        assert_eq!(result, Err(ConfigError::MissingParameter("cutoff")));
    }

    #[test]
    fn build_applies_defaults() {
        let config = KernelConfigBuilder::new().cutoff(9.0).build().unwrap();
        assert_eq!(config.cutoff, 9.0);
        assert_eq!(config.cell_size, 9.0);
        assert_eq!(config.strategy, DivisionStrategy::Pool);
        assert!(config.include_intra_molecular);
        assert!(!config.compute_forces);
    }

    #[test]
    fn build_honours_overrides() {
        let config = KernelConfigBuilder::new()
            .cutoff(10.0)
            .cell_size(3.5)
            .strategy(DivisionStrategy::Groups)
            .include_intra_molecular(false)
            .compute_forces(true)
            .build()
            .unwrap();
        assert_eq!(config.cell_size, 3.5);
        assert!(config.compute_forces);
        assert_eq!(config.strategy, DivisionStrategy::Groups);
        assert!(!config.include_intra_molecular);
    }

    #[test]
    fn build_rejects_non_positive_values() {
        assert_eq!(
            KernelConfigBuilder::new().cutoff(-1.0).build(),
            Err(ConfigError::InvalidParameter {
                name: "cutoff",
                value: -1.0
            })
        );
        assert_eq!(
            KernelConfigBuilder::new().cutoff(8.0).cell_size(0.0).build(),
            Err(ConfigError::InvalidParameter {
                name: "cell_size",
                value: 0.0
            })
        );
    }
}
