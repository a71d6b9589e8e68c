use crate::core::forcefield::potential_map::PotentialMap;
use crate::core::forcefield::term::PairPotentialEnergyValue;
use crate::core::models::configuration::Configuration;
use crate::core::models::molecule::Molecule;
use crate::engine::config::KernelConfig;
use crate::engine::context::KernelContext;
use crate::engine::error::EngineError;
use crate::engine::process_pool::ProcessPool;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::tasks::geometry::GeometryKernel;
use crate::engine::tasks::pair_energy::EnergyKernel;
use crate::engine::tasks::pair_forces::ForceKernel;
use crate::engine::tasks::total_energy::molecule_extended_energy;
use nalgebra::Vector3;
use tracing::{info, instrument, warn};

/// Largest acceptable relative difference between the two pair potential totals.
pub const PATH_AGREEMENT_TOLERANCE: f64 = 1e-8;

/// Energy (and optionally force) breakdown of one configuration, summed over the pool.
#[derive(Debug, Clone)]
pub struct EvaluationReport {
    /// Pair potential energy summed over cell neighbour pairs.
    pub pair_potential: PairPotentialEnergyValue,
    /// Pair potential energy summed molecule by molecule.
    pub molecule_pair_potential: PairPotentialEnergyValue,
    pub relative_difference: f64,
    pub geometry: f64,
    pub extended: f64,
    pub forces: Option<Vec<Vector3<f64>>>,
    pub n_atoms: usize,
    pub n_molecules: usize,
    pub n_cells: usize,
}

impl EvaluationReport {
    pub fn total(&self) -> f64 {
        self.pair_potential.total() + self.geometry + self.extended
    }

    pub fn paths_agree(&self) -> bool {
        self.relative_difference <= PATH_AGREEMENT_TOLERANCE
    }
}

fn relative_difference(a: f64, b: f64) -> f64 {
    let scale = a.abs().max(b.abs());
    if scale == 0.0 { 0.0 } else { (a - b).abs() / scale }
}

#[instrument(skip_all, name = "evaluate_workflow")]
pub fn run(
    configuration: &mut Configuration,
    potential_map: &PotentialMap,
    config: &KernelConfig,
    pool: &ProcessPool,
    reporter: &ProgressReporter,
) -> Result<EvaluationReport, EngineError> {
    // === Phase 0: Partition ===
    reporter.phase("Cell partition", || {
        configuration.generate_cells(config.cell_size, config.cutoff)
    })?;
    let configuration: &Configuration = configuration;
    let context = KernelContext::new(configuration, potential_map, pool, config.cutoff)?;
    info!(
        n_atoms = configuration.n_atoms(),
        n_molecules = configuration.n_molecules(),
        n_cells = context.cells.n_cells(),
        cutoff = config.cutoff,
        "Starting energy evaluation."
    );

    // === Phase 1: Pair potential energy by cell pairs ===
    let pair_potential = reporter.phase("Pair potential energy", || {
        EnergyKernel::new(&context)
            .total_pair_potential_energy(config.include_intra_molecular, config.strategy)
    });

    // === Phase 2: Bonded and external energy over this process's molecules ===
    let (geometry, extended) = reporter.phase("Bonded and external energy", || {
        bonded_and_external_energy(&context, config, reporter)
    });

    let mut sums = [pair_potential.inter, pair_potential.intra, geometry, extended];
    pool.all_sum(&mut sums, config.strategy)?;
    let [inter, intra, geometry, extended] = sums;
    let pair_potential = PairPotentialEnergyValue::new(inter, intra);

    // === Phase 3: Cross-check against the per-molecule path ===
    let molecule_pair_potential = reporter.phase("Per-molecule pair potential energy", || {
        EnergyKernel::new(&context)
            .total_molecule_pair_potential_energy(config.include_intra_molecular)
    });
    let difference = relative_difference(pair_potential.total(), molecule_pair_potential.total());
    if difference > PATH_AGREEMENT_TOLERANCE {
        warn!(
            cell_pairs = pair_potential.total(),
            molecules = molecule_pair_potential.total(),
            difference,
            "Pair potential totals from the two paths disagree."
        );
    }

    // === Phase 4: Forces (optional) ===
    let forces = if config.compute_forces {
        Some(reporter.phase("Forces", || compute_forces(&context, config))?)
    } else {
        None
    };

    let report = EvaluationReport {
        pair_potential,
        molecule_pair_potential,
        relative_difference: difference,
        geometry,
        extended,
        forces,
        n_atoms: configuration.n_atoms(),
        n_molecules: configuration.n_molecules(),
        n_cells: context.cells.n_cells(),
    };
    info!(total = report.total(), "Evaluation complete.");
    Ok(report)
}

fn bonded_and_external_energy(
    context: &KernelContext<'_>,
    config: &KernelConfig,
    reporter: &ProgressReporter,
) -> (f64, f64) {
    let configuration = context.configuration;
    let molecules: Vec<&Molecule> = configuration.molecules().map(|(_, m)| m).collect();
    let share: Vec<&&Molecule> = context.pool.interleaved(&molecules, config.strategy).collect();
    let geometry_kernel = GeometryKernel::new(configuration);

    reporter.report(Progress::TaskStart {
        total_steps: share.len() as u64,
    });
    let mut geometry = 0.0;
    let mut extended = 0.0;
    for molecule in share {
        geometry += geometry_kernel.molecule_geometry_energy(molecule);
        extended += molecule_extended_energy(configuration, molecule);
        reporter.report(Progress::TaskIncrement);
    }
    reporter.report(Progress::TaskFinish);
    (geometry, extended)
}

fn compute_forces(
    context: &KernelContext<'_>,
    config: &KernelConfig,
) -> Result<Vec<Vector3<f64>>, EngineError> {
    let n_atoms = context.configuration.n_atoms();
    let mut forces = vec![Vector3::zeros(); n_atoms];
    ForceKernel::new(context).total_forces(
        config.include_intra_molecular,
        config.strategy,
        &mut forces,
    )?;

    let mut flat: Vec<f64> = forces.iter().flat_map(|f| [f.x, f.y, f.z]).collect();
    context.pool.all_sum(&mut flat, config.strategy)?;
    Ok(flat
        .chunks_exact(3)
        .map(|c| Vector3::new(c[0], c[1], c[2]))
        .collect())
}
