use crate::core::forcefield::potential_map::PotentialMap;
use crate::core::forcefield::term::PairPotentialEnergyValue;
use crate::core::models::atom::{AtomRef, AtomStore};
use crate::core::models::configuration::Configuration;
use crate::core::models::molecule::Molecule;
use crate::core::models::periodic_box::PeriodicBox;
use crate::core::models::species::ScaledInteraction;
use crate::core::partition::cell::Cell;
use crate::core::partition::cell_array::{CellArray, CellNeighbourPair};
use crate::engine::context::KernelContext;
use crate::engine::process_pool::{DivisionStrategy, ProcessPool};
use itertools::{Itertools, iproduct};
use std::collections::BTreeMap;
use tracing::instrument;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Cutoff-truncated pair potential energy over the cell partition.
pub struct EnergyKernel<'a> {
    configuration: &'a Configuration,
    atoms: &'a AtomStore,
    cells: &'a CellArray,
    periodic_box: &'a PeriodicBox,
    potential_map: &'a PotentialMap,
    pool: &'a ProcessPool,
    cutoff_squared: f64,
}

impl<'a> EnergyKernel<'a> {
    pub fn new(context: &KernelContext<'a>) -> Self {
        Self {
            configuration: context.configuration,
            atoms: context.configuration.atoms(),
            cells: context.cells,
            periodic_box: context.configuration.periodic_box(),
            potential_map: context.potential_map,
            pool: context.pool,
            cutoff_squared: context.cutoff * context.cutoff,
        }
    }

    #[inline]
    fn distance_squared(&self, i: AtomRef<'_>, j: AtomRef<'_>, apply_mim: bool) -> f64 {
        if apply_mim {
            self.periodic_box
                .minimum_distance_squared(i.position(), j.position())
        } else {
            (j.position() - i.position()).norm_squared()
        }
    }

    /// Energy of one pair at squared separation `r_squared`, booked as inter- or
    /// intra-molecular.
    #[inline]
    fn pair_energy(
        &self,
        i: AtomRef<'_>,
        j: AtomRef<'_>,
        r_squared: f64,
        include_intra: bool,
    ) -> PairPotentialEnergyValue {
        if r_squared > self.cutoff_squared {
            return PairPotentialEnergyValue::default();
        }
        let molecule = i.molecule();
        if molecule != j.molecule() {
            let e = self.potential_map.energy(i, j, r_squared.sqrt());
            return PairPotentialEnergyValue::new(e, 0.0);
        }
        if !include_intra {
            return PairPotentialEnergyValue::default();
        }
        let Some(mol) = self.configuration.molecule(molecule) else {
            return PairPotentialEnergyValue::default();
        };
        let e = match mol.species().scaling(i.species_index(), j.species_index()) {
            ScaledInteraction::Excluded => return PairPotentialEnergyValue::default(),
            ScaledInteraction::NotScaled => self.potential_map.energy(i, j, r_squared.sqrt()),
            ScaledInteraction::Scaled { elec, vdw } => {
                self.potential_map
                    .energy_scaled(i, j, r_squared.sqrt(), elec, vdw)
            }
        };
        PairPotentialEnergyValue::new(0.0, e)
    }

    /// Every unique pair of atoms within `cell`.
    pub fn cell_energy(&self, cell: &Cell, include_intra: bool) -> PairPotentialEnergyValue {
        cell.atoms()
            .iter()
            .tuple_combinations()
            .map(|(&i, &j)| {
                let (ai, aj) = (self.atoms.atom(i), self.atoms.atom(j));
                self.pair_energy(ai, aj, self.distance_squared(ai, aj, false), include_intra)
            })
            .sum()
    }

    /// Every pair with one atom in each of two distinct cells.
    pub fn cell_to_cell_energy(
        &self,
        a: &Cell,
        b: &Cell,
        apply_mim: bool,
        include_intra: bool,
    ) -> PairPotentialEnergyValue {
        iproduct!(a.atoms(), b.atoms())
            .map(|(&i, &j)| {
                let (ai, aj) = (self.atoms.atom(i), self.atoms.atom(j));
                self.pair_energy(ai, aj, self.distance_squared(ai, aj, apply_mim), include_intra)
            })
            .sum()
    }

    fn neighbour_pair_energy(
        &self,
        pair: &CellNeighbourPair,
        include_intra: bool,
    ) -> PairPotentialEnergyValue {
        let master = &self.cells.cells()[pair.master];
        if pair.is_self_pair() {
            self.cell_energy(master, include_intra)
        } else {
            let neighbour = &self.cells.cells()[pair.neighbour];
            self.cell_to_cell_energy(master, neighbour, pair.requires_mim, include_intra)
        }
    }

    /// Energy of `central` atoms of one cell with every atom in that cell's neighbourhood,
    /// skipping self-interaction. Pairs among the central atoms are visited in both orders.
    fn cell_group_energy(
        &self,
        cell: usize,
        central: &[usize],
        include_intra: bool,
    ) -> PairPotentialEnergyValue {
        let neighbours = self.cells.neighbours(cell);

        #[cfg(not(feature = "parallel"))]
        let iterator = neighbours.iter();

        #[cfg(feature = "parallel")]
        let iterator = neighbours.par_iter();

        iterator
            .map(|neighbour| {
                let others = self.cells.cells()[neighbour.cell].atoms();
                iproduct!(central, others)
                    .filter(|&(i, j)| i != j)
                    .map(|(&i, &j)| {
                        let (ai, aj) = (self.atoms.atom(i), self.atoms.atom(j));
                        let r_squared = self.distance_squared(ai, aj, neighbour.requires_mim);
                        self.pair_energy(ai, aj, r_squared, include_intra)
                    })
                    .sum::<PairPotentialEnergyValue>()
            })
            .sum()
    }

    /// Energy of one atom with the rest of the system.
    pub fn atom_pair_potential_energy(
        &self,
        atom: AtomRef<'_>,
        include_intra: bool,
    ) -> PairPotentialEnergyValue {
        match atom.cell_location() {
            Some(location) => self.cell_group_energy(location.cell, &[atom.index()], include_intra),
            None => PairPotentialEnergyValue::default(),
        }
    }

    /// Energy of one molecule with the rest of the system.
    ///
    /// Intramolecular pairs are counted from both ends.
    pub fn molecule_pair_potential_energy(
        &self,
        molecule: &Molecule,
        include_intra: bool,
    ) -> PairPotentialEnergyValue {
        let mut by_cell: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for &atom in molecule.atoms() {
            if let Some(location) = self.atoms.location(atom) {
                by_cell.entry(location.cell).or_default().push(atom);
            }
        }
        by_cell
            .iter()
            .map(|(&cell, central)| self.cell_group_energy(cell, central, include_intra))
            .sum()
    }

    /// This process's share of the total pair potential energy, summed over its interleaved
    /// slice of the cell neighbour pair list.
    #[instrument(skip_all, name = "total_pair_potential_energy")]
    pub fn total_pair_potential_energy(
        &self,
        include_intra: bool,
        strategy: DivisionStrategy,
    ) -> PairPotentialEnergyValue {
        let share: Vec<&CellNeighbourPair> = self
            .pool
            .interleaved(self.cells.cell_neighbour_pairs(), strategy)
            .collect();

        #[cfg(not(feature = "parallel"))]
        let iterator = share.iter();

        #[cfg(feature = "parallel")]
        let iterator = share.par_iter();

        iterator
            .map(|pair| self.neighbour_pair_energy(pair, include_intra))
            .sum()
    }

    /// Total pair potential energy summed molecule by molecule, then halved because every
    /// pair is seen from both of its atoms.
    #[instrument(skip_all, name = "total_molecule_pair_potential_energy")]
    pub fn total_molecule_pair_potential_energy(
        &self,
        include_intra: bool,
    ) -> PairPotentialEnergyValue {
        let sum: PairPotentialEnergyValue = self
            .configuration
            .molecules()
            .map(|(_, molecule)| self.molecule_pair_potential_energy(molecule, include_intra))
            .sum();
        sum * 0.5
    }
}
