use super::geometry::GeometryKernel;
use super::pair_energy::EnergyKernel;
use crate::core::forcefield::term::{EnergyResult, PairPotentialEnergyValue};
use crate::core::models::atom::AtomRef;
use crate::core::models::configuration::Configuration;
use crate::core::models::molecule::Molecule;
use crate::engine::context::KernelContext;
use crate::engine::error::EngineError;
use std::ops::{BitOr, BitOrAssign};

/// Contributions to leave out of a combined energy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct EnergyFlags(u8);

impl EnergyFlags {
    pub const EXCLUDE_PAIR_POTENTIAL: Self = Self(1);
    pub const EXCLUDE_INTRA_MOLECULAR_PAIR_POTENTIAL: Self = Self(1 << 1);
    pub const EXCLUDE_GEOMETRY: Self = Self(1 << 2);
    pub const EXCLUDE_EXTENDED: Self = Self(1 << 3);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for EnergyFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for EnergyFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Energy of an atom in every external potential that targets it.
pub fn atom_extended_energy(configuration: &Configuration, atom: AtomRef<'_>) -> f64 {
    let potentials = configuration.external_potentials();
    atom.targeted_potentials()
        .iter()
        .filter_map(|&index| potentials.get(index))
        .map(|potential| potential.energy(atom.position(), configuration.periodic_box()))
        .sum()
}

pub fn molecule_extended_energy(configuration: &Configuration, molecule: &Molecule) -> f64 {
    molecule
        .atoms()
        .iter()
        .map(|&index| atom_extended_energy(configuration, configuration.atoms().atom(index)))
        .sum()
}

/// Combined energy of one atom with the rest of the system.
pub fn atom_total_energy(
    context: &KernelContext<'_>,
    atom: AtomRef<'_>,
    flags: EnergyFlags,
) -> Result<EnergyResult, EngineError> {
    let pair_potential = if flags.contains(EnergyFlags::EXCLUDE_PAIR_POTENTIAL) {
        PairPotentialEnergyValue::default()
    } else {
        let include_intra = !flags.contains(EnergyFlags::EXCLUDE_INTRA_MOLECULAR_PAIR_POTENTIAL);
        EnergyKernel::new(context).atom_pair_potential_energy(atom, include_intra)
    };
    let geometry = if flags.contains(EnergyFlags::EXCLUDE_GEOMETRY) {
        0.0
    } else {
        GeometryKernel::new(context.configuration).atom_geometry_energy(atom)?
    };
    let extended = if flags.contains(EnergyFlags::EXCLUDE_EXTENDED) {
        0.0
    } else {
        atom_extended_energy(context.configuration, atom)
    };
    Ok(EnergyResult::new(pair_potential, geometry, extended))
}

/// Combined energy of one molecule with the rest of the system.
///
/// Intramolecular pairs are seen from both of their atoms, so their contribution is
/// doubled relative to the system total.
pub fn molecule_total_energy(
    context: &KernelContext<'_>,
    molecule: &Molecule,
    flags: EnergyFlags,
) -> Result<EnergyResult, EngineError> {
    let pair_potential = if flags.contains(EnergyFlags::EXCLUDE_PAIR_POTENTIAL) {
        PairPotentialEnergyValue::default()
    } else {
        let include_intra = !flags.contains(EnergyFlags::EXCLUDE_INTRA_MOLECULAR_PAIR_POTENTIAL);
        EnergyKernel::new(context).molecule_pair_potential_energy(molecule, include_intra)
    };
    let geometry = if flags.contains(EnergyFlags::EXCLUDE_GEOMETRY) {
        0.0
    } else {
        GeometryKernel::new(context.configuration).molecule_geometry_energy(molecule)
    };
    let extended = if flags.contains(EnergyFlags::EXCLUDE_EXTENDED) {
        0.0
    } else {
        molecule_extended_energy(context.configuration, molecule)
    };
    Ok(EnergyResult::new(pair_potential, geometry, extended))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::forcefield::external::ExternalPotential;
    use crate::engine::tasks::fixtures::chain_fluid;
    use nalgebra::Point3;

    const TOLERANCE: f64 = 1e-9;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE * (1.0 + a.abs().max(b.abs()))
    }

    #[test]
    fn flags_combine_with_bitor() {
        let flags = EnergyFlags::EXCLUDE_GEOMETRY | EnergyFlags::EXCLUDE_EXTENDED;
        assert!(flags.contains(EnergyFlags::EXCLUDE_GEOMETRY));
        assert!(flags.contains(EnergyFlags::EXCLUDE_EXTENDED));
        assert!(!flags.contains(EnergyFlags::EXCLUDE_PAIR_POTENTIAL));
        assert!(flags.contains(EnergyFlags::empty()));

        let mut all = EnergyFlags::empty();
        all |= EnergyFlags::EXCLUDE_PAIR_POTENTIAL;
        all |= flags;
        assert!(all.contains(flags | EnergyFlags::EXCLUDE_PAIR_POTENTIAL));
        assert!(!all.contains(EnergyFlags::EXCLUDE_INTRA_MOLECULAR_PAIR_POTENTIAL));
    }

    #[test]
    fn molecule_total_matches_individual_kernels() {
        let fixture = chain_fluid(8, 20.0, 6.0, 21);
        let context = fixture.context();
        let cfg = &fixture.configuration;
        let molecule = cfg.molecule(cfg.molecule_ids()[2]).unwrap();

        let result = molecule_total_energy(&context, molecule, EnergyFlags::empty()).unwrap();
        let pair = EnergyKernel::new(&context).molecule_pair_potential_energy(molecule, true);
        let geometry = GeometryKernel::new(cfg).molecule_geometry_energy(molecule);
        assert!(f64_approx_equal(result.pair_potential.inter, pair.inter));
        assert!(f64_approx_equal(result.pair_potential.intra, pair.intra));
        assert_eq!(result.geometry, geometry);
        assert_eq!(result.extended, 0.0);
        assert!(f64_approx_equal(result.total(), pair.total() + geometry));
    }

    #[test]
    fn flags_remove_contributions() {
        let fixture = chain_fluid(8, 20.0, 6.0, 21);
        let context = fixture.context();
        let cfg = &fixture.configuration;
        let atom = cfg.atoms().atom(5);

        let full = atom_total_energy(&context, atom, EnergyFlags::empty()).unwrap();
        let no_pair =
            atom_total_energy(&context, atom, EnergyFlags::EXCLUDE_PAIR_POTENTIAL).unwrap();
        assert_eq!(no_pair.pair_potential, PairPotentialEnergyValue::default());
        assert_eq!(no_pair.geometry, full.geometry);

        let no_intra = atom_total_energy(
            &context,
            atom,
            EnergyFlags::EXCLUDE_INTRA_MOLECULAR_PAIR_POTENTIAL,
        )
        .unwrap();
        assert_eq!(no_intra.pair_potential.intra, 0.0);
        assert!(f64_approx_equal(
            no_intra.pair_potential.inter,
            full.pair_potential.inter
        ));

        let geometry_only = atom_total_energy(
            &context,
            atom,
            EnergyFlags::EXCLUDE_PAIR_POTENTIAL | EnergyFlags::EXCLUDE_EXTENDED,
        )
        .unwrap();
        assert_eq!(geometry_only.total(), full.geometry);
    }

    #[test]
    fn extended_energy_counts_targeted_atoms_only() {
        let mut fixture = chain_fluid(3, 20.0, 6.0, 8);
        let wall = fixture
            .configuration
            .add_external_potential(ExternalPotential::Spherical {
                origin: [0.0, 0.0, 0.0],
                radius: 0.5,
                k: 10.0,
            });
        let first = fixture.configuration.molecule_ids()[0];
        fixture.configuration.target_molecule(first, wall).unwrap();

        let context = fixture.context();
        let cfg = &fixture.configuration;
        let first = cfg.molecule(first).unwrap();
        let second = cfg.molecule(cfg.molecule_ids()[1]).unwrap();

        let expected: f64 = first
            .atoms()
            .iter()
            .map(|&i| {
                let d = cfg
                    .periodic_box()
                    .minimum_distance(&Point3::origin(), cfg.atoms().position(i));
                if d > 0.5 { 5.0 * (d - 0.5).powi(2) } else { 0.0 }
            })
            .sum();
        assert!(expected > 0.0);
        assert!(f64_approx_equal(
            molecule_extended_energy(cfg, first),
            expected
        ));
        assert_eq!(molecule_extended_energy(cfg, second), 0.0);

        let result = molecule_total_energy(&context, first, EnergyFlags::empty()).unwrap();
        assert!(f64_approx_equal(result.extended, expected));
    }
}
