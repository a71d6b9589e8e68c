use cellforce::core::forcefield::definition::{System, SystemDefinition};
use cellforce::core::forcefield::term::PairPotentialEnergyValue;
use cellforce::engine::config::KernelConfigBuilder;
use cellforce::engine::context::KernelContext;
use cellforce::engine::process_pool::{DivisionStrategy, ProcessPool, SerialCommunicator};
use cellforce::engine::progress::ProgressReporter;
use cellforce::engine::tasks::pair_energy::EnergyKernel;
use cellforce::workflows::evaluate;
use std::fmt::Write;

const BOX_LENGTH: f64 = 18.0;
const RANGE: f64 = 6.0;

const HEADER: &str = r#"
[box]
lengths = [18.0, 18.0, 18.0]

[pair-potential]
range = 6.0

[[atom-types]]
name = "CH"
charge = 0.25
short-range = { form = "lennard-jones", epsilon = 0.5, sigma = 3.1 }

[[atom-types]]
name = "CX"
charge = -0.25
short-range = { form = "lennard-jones", epsilon = 0.3, sigma = 2.8 }

[[species]]
name = "butane"
atoms = [
    { name = "C1", type = "CH" },
    { name = "C2", type = "CX" },
    { name = "C3", type = "CX" },
    { name = "C4", type = "CH" },
    { name = "C5", type = "CH" },
]
bonds = [
    { atoms = [0, 1], form = "harmonic", params = [2000.0, 1.3] },
    { atoms = [1, 2], form = "harmonic", params = [2000.0, 1.3] },
    { atoms = [2, 3], form = "harmonic", params = [2000.0, 1.3] },
    { atoms = [3, 4], form = "harmonic", params = [2000.0, 1.3] },
]
angles = [
    { atoms = [0, 1, 2], form = "harmonic", params = [400.0, 112.0] },
    { atoms = [1, 2, 3], form = "harmonic", params = [400.0, 112.0] },
    { atoms = [2, 3, 4], form = "harmonic", params = [400.0, 112.0] },
]
torsions = [
    { atoms = [0, 1, 2, 3], form = "cos3", params = [5.0, -1.0, 3.0] },
    { atoms = [1, 2, 3, 4], form = "cos3", params = [5.0, -1.0, 3.0], elec-scale = 0.8, vdw-scale = 0.3 },
]
"#;

/// Offsets of a zig-zag chain.
const CHAIN: [[f64; 3]; 5] = [
    [0.0, 0.0, 0.0],
    [0.9, 0.7, 0.0],
    [1.8, 0.0, 0.5],
    [2.7, 0.7, 0.3],
    [3.6, 0.1, 0.8],
];

fn build_system(n_molecules: usize) -> System {
    let mut toml = HEADER.to_string();
    let sites_per_axis = [3usize, 4, 4];
    let spacing = [
        BOX_LENGTH / sites_per_axis[0] as f64,
        BOX_LENGTH / sites_per_axis[1] as f64,
        BOX_LENGTH / sites_per_axis[2] as f64,
    ];
    for m in 0..n_molecules {
        let site = [
            m % sites_per_axis[0],
            (m / sites_per_axis[0]) % sites_per_axis[1],
            m / (sites_per_axis[0] * sites_per_axis[1]),
        ];
        let jitter = 0.13 * (m % 5) as f64;
        let positions: Vec<String> = CHAIN
            .iter()
            .map(|offset| {
                let p: Vec<String> = (0..3)
                    .map(|k| {
                        format!(
                            "{:.4}",
                            site[k] as f64 * spacing[k] + offset[k] + jitter + 0.5
                        )
                    })
                    .collect();
                format!("[{}]", p.join(", "))
            })
            .collect();
        write!(
            toml,
            "\n[[molecules]]\nspecies = \"butane\"\npositions = [{}]\n",
            positions.join(", ")
        )
        .unwrap();
    }
    let definition: SystemDefinition = toml::from_str(&toml).unwrap();
    let mut system = definition.build().unwrap();
    system.configuration.generate_cells(RANGE, RANGE).unwrap();
    system
}

fn relative_difference(a: f64, b: f64) -> f64 {
    (a - b).abs() / a.abs().max(b.abs()).max(f64::MIN_POSITIVE)
}

#[test]
fn cell_pair_and_molecule_paths_agree_for_any_molecule_count() {
    for n_molecules in [1, 2, 7, 24] {
        let system = build_system(n_molecules);
        let pool = ProcessPool::serial();
        let context =
            KernelContext::new(&system.configuration, &system.potential_map, &pool, RANGE)
                .unwrap();
        let kernel = EnergyKernel::new(&context);

        for include_intra in [true, false] {
            let cells = kernel.total_pair_potential_energy(include_intra, DivisionStrategy::Pool);
            let molecules = kernel.total_molecule_pair_potential_energy(include_intra);
            assert!(
                relative_difference(cells.total(), molecules.total()) < 1e-8,
                "{} molecules, intra {}: {} vs {}",
                n_molecules,
                include_intra,
                cells.total(),
                molecules.total()
            );
            if !include_intra {
                assert_eq!(cells.intra, 0.0);
            }
        }
        if n_molecules == 1 {
            let single = kernel.total_pair_potential_energy(true, DivisionStrategy::Pool);
            assert_eq!(single.inter, 0.0);
            assert!(single.intra != 0.0);
        }
    }
}

#[test]
fn rank_partials_sum_to_the_serial_total() {
    let system = build_system(18);
    let serial_pool = ProcessPool::serial();
    let serial = EnergyKernel::new(
        &KernelContext::new(&system.configuration, &system.potential_map, &serial_pool, RANGE)
            .unwrap(),
    )
    .total_pair_potential_energy(true, DivisionStrategy::Pool);

    let size = 3;
    let partials: PairPotentialEnergyValue = (0..size)
        .map(|rank| {
            let pool = ProcessPool::new(rank, size, 1, Box::new(SerialCommunicator)).unwrap();
            let context =
                KernelContext::new(&system.configuration, &system.potential_map, &pool, RANGE)
                    .unwrap();
            EnergyKernel::new(&context).total_pair_potential_energy(true, DivisionStrategy::Pool)
        })
        .sum();

    assert!(relative_difference(partials.inter, serial.inter) < 1e-10);
    assert!(relative_difference(partials.intra, serial.intra) < 1e-10);
}

#[test]
fn group_leaders_together_cover_the_whole_pair_list() {
    let system = build_system(10);
    let serial_pool = ProcessPool::serial();
    let serial = EnergyKernel::new(
        &KernelContext::new(&system.configuration, &system.potential_map, &serial_pool, RANGE)
            .unwrap(),
    )
    .total_pair_potential_energy(true, DivisionStrategy::Pool);

    let (size, n_groups) = (4, 2);
    let leaders: f64 = (0..size)
        .filter_map(|rank| {
            let pool =
                ProcessPool::new(rank, size, n_groups, Box::new(SerialCommunicator)).unwrap();
            if pool.group_rank() != 0 {
                return None;
            }
            let context =
                KernelContext::new(&system.configuration, &system.potential_map, &pool, RANGE)
                    .unwrap();
            Some(
                EnergyKernel::new(&context)
                    .total_pair_potential_energy(true, DivisionStrategy::Groups)
                    .total(),
            )
        })
        .sum();

    assert!(relative_difference(leaders, serial.total()) < 1e-10);
}

#[test]
fn workflow_forces_balance_without_external_potentials() {
    let mut system = build_system(9);
    let config = KernelConfigBuilder::new()
        .cutoff(RANGE)
        .compute_forces(true)
        .build()
        .unwrap();
    let report = evaluate::run(
        &mut system.configuration,
        &system.potential_map,
        &config,
        &ProcessPool::serial(),
        &ProgressReporter::new(),
    )
    .unwrap();

    assert_eq!(report.n_molecules, 9);
    assert_eq!(report.n_atoms, 45);
    assert!(report.paths_agree());
    assert!(report.geometry > 0.0);
    assert_eq!(report.extended, 0.0);

    let forces = report.forces.unwrap();
    assert_eq!(forces.len(), 45);
    let net = forces.iter().fold(nalgebra::Vector3::zeros(), |acc, f| acc + f);
    let scale: f64 = forces.iter().map(|f| f.norm()).sum();
    assert!(net.norm() < 1e-10 * scale + 1e-9, "net force {}", net);
}
