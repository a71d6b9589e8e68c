use crate::cli::EnergyArgs;
use crate::error::{CliError, Result};
use cellforce::engine::config::{KernelConfig, KernelConfigBuilder};
use cellforce::engine::process_pool::DivisionStrategy;
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

/// Kernel settings as read from a configuration file; every key is optional.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct PartialKernelConfig {
    cutoff: Option<f64>,
    cell_size: Option<f64>,
    strategy: Option<String>,
    include_intra_molecular: Option<bool>,
    compute_forces: Option<bool>,
}

fn parse_strategy(value: &str) -> Result<DivisionStrategy> {
    match value {
        "pool" => Ok(DivisionStrategy::Pool),
        "pool-processes" => Ok(DivisionStrategy::PoolProcesses),
        "groups" => Ok(DivisionStrategy::Groups),
        "group-processes" => Ok(DivisionStrategy::GroupProcesses),
        other => Err(CliError::Config(format!(
            "Unknown division strategy '{}'. Expected one of: pool, pool-processes, groups, group-processes.",
            other
        ))),
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str, kind: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| CliError::Config(format!("Invalid {} value for {}: {}", kind, key, value)))
}

impl PartialKernelConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading kernel configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Resolves the final kernel configuration. Command-line flags win over `--set` values,
    /// which win over the file; `default_cutoff` applies when no cutoff is given anywhere.
    pub fn merge_with_cli(mut self, args: &EnergyArgs, default_cutoff: f64) -> Result<KernelConfig> {
        self.apply_set_values(&args.set_values)?;

        let strategy = match (args.strategy, self.strategy.as_deref()) {
            (Some(arg), _) => DivisionStrategy::from(arg),
            (None, Some(value)) => parse_strategy(value)?,
            (None, None) => DivisionStrategy::default(),
        };

        let include_intra = if args.no_intra {
            false
        } else {
            self.include_intra_molecular.unwrap_or(true)
        };

        let mut builder = KernelConfigBuilder::new()
            .cutoff(args.cutoff.or(self.cutoff).unwrap_or(default_cutoff))
            .strategy(strategy)
            .include_intra_molecular(include_intra)
            .compute_forces(args.forces || self.compute_forces.unwrap_or(false));
        if let Some(cell_size) = args.cell_size.or(self.cell_size) {
            builder = builder.cell_size(cell_size);
        }

        builder.build().map_err(|e| CliError::Config(e.to_string()))
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let Some((key, value)) = kv_pair.split_once('=') else {
                return Err(CliError::Argument(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                )));
            };
            match key {
                "cutoff" => self.cutoff = Some(parse_value(key, value, "float")?),
                "cell-size" => self.cell_size = Some(parse_value(key, value, "float")?),
                "strategy" => {
                    parse_strategy(value)?;
                    self.strategy = Some(value.to_string());
                }
                "include-intra-molecular" => {
                    self.include_intra_molecular = Some(parse_value(key, value, "boolean")?)
                }
                "compute-forces" => self.compute_forces = Some(parse_value(key, value, "boolean")?),
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::{TempDir, tempdir};

    fn write_config_file(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("kernel.toml");
        fs::write(&path, content).unwrap();
        path
    }

    fn energy_args(extra: &[&str]) -> EnergyArgs {
        let mut args = vec!["cellforce", "energy", "-i", "system.toml"];
        args.extend_from_slice(extra);
        let Commands::Energy(args) = Cli::parse_from(args).command;
        args
    }

    #[test]
    fn file_values_are_used_when_cli_is_silent() {
        let dir = tempdir().unwrap();
        let path = write_config_file(
            &dir,
            r#"
            cutoff = 9.0
            cell-size = 4.5
            strategy = "groups"
            include-intra-molecular = false
            compute-forces = true
            "#,
        );
        let partial = PartialKernelConfig::from_file(&path).unwrap();
        let config = partial.merge_with_cli(&energy_args(&[]), 12.0).unwrap();

        assert_eq!(config.cutoff, 9.0);
        assert_eq!(config.cell_size, 4.5);
        assert_eq!(config.strategy, DivisionStrategy::Groups);
        assert!(!config.include_intra_molecular);
        assert!(config.compute_forces);
    }

    #[test]
    fn missing_cutoff_falls_back_to_the_pair_potential_range() {
        let config = PartialKernelConfig::default()
            .merge_with_cli(&energy_args(&[]), 10.0)
            .unwrap();
        assert_eq!(config.cutoff, 10.0);
        assert_eq!(config.cell_size, 10.0);
        assert_eq!(config.strategy, DivisionStrategy::Pool);
        assert!(config.include_intra_molecular);
        assert!(!config.compute_forces);
    }

    #[test]
    fn cli_args_override_set_values_and_file_values() {
        let dir = tempdir().unwrap();
        let path = write_config_file(&dir, "cutoff = 9.0\nstrategy = \"groups\"\n");
        let args = energy_args(&[
            "--cutoff",
            "7.5",
            "--strategy",
            "pool-processes",
            "-S",
            "cutoff=8.0",
            "-S",
            "cell-size=3.0",
            "--no-intra",
        ]);
        let config = PartialKernelConfig::from_file(&path)
            .unwrap()
            .merge_with_cli(&args, 12.0)
            .unwrap();
        assert_eq!(config.cutoff, 7.5);
        assert_eq!(config.cell_size, 3.0);
        assert_eq!(config.strategy, DivisionStrategy::PoolProcesses);
        assert!(!config.include_intra_molecular);
    }

    #[test]
    fn invalid_values_are_reported_as_config_errors() {
        let bad_key = energy_args(&["-S", "range=3.0"]);
        let result = PartialKernelConfig::default().merge_with_cli(&bad_key, 10.0);
        assert!(matches!(result, Err(CliError::Config(msg)) if msg.contains("range")));

        let bad_strategy = energy_args(&["-S", "strategy=everyone"]);
        let result = PartialKernelConfig::default().merge_with_cli(&bad_strategy, 10.0);
        assert!(matches!(result, Err(CliError::Config(msg)) if msg.contains("everyone")));

        let bad_cutoff = energy_args(&["--cutoff=-2.0"]);
        let result = PartialKernelConfig::default().merge_with_cli(&bad_cutoff, 10.0);
        assert!(matches!(result, Err(CliError::Config(_))));

        let malformed = energy_args(&["-S", "cutoff"]);
        let result = PartialKernelConfig::default().merge_with_cli(&malformed, 10.0);
        assert!(matches!(result, Err(CliError::Argument(_))));
    }

    #[test]
    fn unknown_file_keys_are_rejected() {
        let dir = tempdir().unwrap();
        let path = write_config_file(&dir, "cutof = 9.0\n");
        let result = PartialKernelConfig::from_file(&path);
        assert!(matches!(result, Err(CliError::FileParsing { .. })));
    }
}
