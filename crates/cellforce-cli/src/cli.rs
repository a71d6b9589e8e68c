use cellforce::engine::process_pool::DivisionStrategy;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "The cellforce developers",
    version,
    about = "cellforce CLI - Evaluate cell-list accelerated non-bonded, bonded and external energies and forces for periodic particle systems.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads for parallel computation.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Evaluate the energy breakdown (and optionally forces) of a system description.
    Energy(EnergyArgs),
}

/// Division of loop iterations among the processes of the pool.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyArg {
    Pool,
    PoolProcesses,
    Groups,
    GroupProcesses,
}

impl From<StrategyArg> for DivisionStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Pool => DivisionStrategy::Pool,
            StrategyArg::PoolProcesses => DivisionStrategy::PoolProcesses,
            StrategyArg::Groups => DivisionStrategy::Groups,
            StrategyArg::GroupProcesses => DivisionStrategy::GroupProcesses,
        }
    }
}

/// Arguments for the `energy` subcommand.
#[derive(Args, Debug)]
pub struct EnergyArgs {
    // --- Core Arguments ---
    /// Path to the system description (box, forcefield, species and molecules) in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Path to an optional kernel configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Write the evaluation report to this path in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    // --- Kernel Overrides ---
    /// Override the pair interaction cutoff in Angstroms.
    /// Defaults to the pair potential range of the system description.
    #[arg(long, value_name = "FLOAT")]
    pub cutoff: Option<f64>,

    /// Override the requested cell size of the partition. Defaults to the cutoff.
    #[arg(long, value_name = "FLOAT")]
    pub cell_size: Option<f64>,

    /// Override the work division strategy.
    #[arg(long, value_enum, value_name = "STRATEGY")]
    pub strategy: Option<StrategyArg>,

    /// Exclude intramolecular pair interactions from the pair potential energy.
    #[arg(long)]
    pub no_intra: bool,

    /// Also evaluate analytic forces.
    #[arg(long)]
    pub forces: bool,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S cell-size=4.5
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}
