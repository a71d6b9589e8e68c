use crate::cli::EnergyArgs;
use crate::config::PartialKernelConfig;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use cellforce::core::forcefield::definition::SystemDefinition;
use cellforce::engine::process_pool::ProcessPool;
use cellforce::engine::progress::ProgressReporter;
use cellforce::workflows::{self, evaluate::EvaluationReport};
use serde::Serialize;
use std::path::Path;
use tracing::{info, warn};

/// On-disk form of an evaluation report. Energies in kJ/mol, forces in kJ/mol/Angstrom.
#[derive(Serialize, Debug)]
#[serde(rename_all = "kebab-case")]
struct ReportFile {
    n_atoms: usize,
    n_molecules: usize,
    n_cells: usize,
    total: f64,
    pair_potential_inter: f64,
    pair_potential_intra: f64,
    geometry: f64,
    extended: f64,
    molecule_path_pair_potential: f64,
    relative_difference: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    forces: Option<Vec<[f64; 3]>>,
}

impl From<&EvaluationReport> for ReportFile {
    fn from(report: &EvaluationReport) -> Self {
        Self {
            n_atoms: report.n_atoms,
            n_molecules: report.n_molecules,
            n_cells: report.n_cells,
            total: report.total(),
            pair_potential_inter: report.pair_potential.inter,
            pair_potential_intra: report.pair_potential.intra,
            geometry: report.geometry,
            extended: report.extended,
            molecule_path_pair_potential: report.molecule_pair_potential.total(),
            relative_difference: report.relative_difference,
            forces: report
                .forces
                .as_ref()
                .map(|forces| forces.iter().map(|f| [f.x, f.y, f.z]).collect()),
        }
    }
}

fn write_report(report: &EvaluationReport, path: &Path) -> Result<()> {
    let content = toml::to_string(&ReportFile::from(report))
        .map_err(|e| CliError::Other(anyhow::anyhow!("Failed to serialize report: {}", e)))?;
    std::fs::write(path, content)?;
    Ok(())
}

pub fn run(args: EnergyArgs) -> Result<()> {
    info!("Loading system description from {:?}", &args.input);
    let definition =
        SystemDefinition::load(&args.input).map_err(|e| CliError::FileParsing {
            path: args.input.clone(),
            source: e.into(),
        })?;
    let mut system = definition.build()?;

    let partial_config = match &args.config {
        Some(path) => PartialKernelConfig::from_file(path)?,
        None => PartialKernelConfig::default(),
    };
    info!("Merging kernel configuration from file and CLI arguments...");
    let config = partial_config.merge_with_cli(&args, system.potential_map.range())?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());
    let pool = ProcessPool::serial();

    println!(
        "Evaluating {} molecule(s) with a {:.3} Å cutoff...",
        system.configuration.n_molecules(),
        config.cutoff
    );
    let report = workflows::evaluate::run(
        &mut system.configuration,
        &system.potential_map,
        &config,
        &pool,
        &reporter,
    )?;

    println!("  Pair potential (inter): {:>16.6} kJ/mol", report.pair_potential.inter);
    println!("  Pair potential (intra): {:>16.6} kJ/mol", report.pair_potential.intra);
    println!("  Geometry:               {:>16.6} kJ/mol", report.geometry);
    println!("  Extended:               {:>16.6} kJ/mol", report.extended);
    println!("  Total:                  {:>16.6} kJ/mol", report.total());
    println!(
        "  Per-molecule check:     {:>16.6} kJ/mol (relative difference {:.3e})",
        report.molecule_pair_potential.total(),
        report.relative_difference
    );
    if !report.paths_agree() {
        warn!("Cell-pair and per-molecule pair potential totals disagree.");
        println!("Warning: the two pair potential totals disagree.");
    }

    if let Some(output) = &args.output {
        info!("Writing evaluation report to {:?}", output);
        write_report(&report, output)?;
        println!("✓ Report written to: {}", output.display());
    }
    Ok(())
}
