use super::geometry::GeometryKernel;
use crate::core::forcefield::potential_map::PotentialMap;
use crate::core::models::atom::{AtomRef, AtomStore};
use crate::core::models::configuration::Configuration;
use crate::core::models::molecule::Molecule;
use crate::core::models::periodic_box::PeriodicBox;
use crate::core::models::species::ScaledInteraction;
use crate::core::partition::cell_array::{CellArray, CellNeighbourPair};
use crate::engine::context::KernelContext;
use crate::engine::error::EngineError;
use crate::engine::process_pool::{DivisionStrategy, ProcessPool};
use itertools::{Itertools, iproduct};
use nalgebra::Vector3;
use tracing::instrument;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Analytic forces, accumulated into a caller-owned vector indexed by global atom index.
///
/// Every method adds to the vector and never clears it.
pub struct ForceKernel<'a> {
    configuration: &'a Configuration,
    atoms: &'a AtomStore,
    cells: &'a CellArray,
    periodic_box: &'a PeriodicBox,
    potential_map: &'a PotentialMap,
    pool: &'a ProcessPool,
    geometry: GeometryKernel<'a>,
    cutoff_squared: f64,
}

impl<'a> ForceKernel<'a> {
    pub fn new(context: &KernelContext<'a>) -> Self {
        Self {
            configuration: context.configuration,
            atoms: context.configuration.atoms(),
            cells: context.cells,
            periodic_box: context.configuration.periodic_box(),
            potential_map: context.potential_map,
            pool: context.pool,
            geometry: GeometryKernel::new(context.configuration),
            cutoff_squared: context.cutoff * context.cutoff,
        }
    }

    fn check_length(&self, forces: &[Vector3<f64>]) -> Result<(), EngineError> {
        if forces.len() == self.atoms.len() {
            Ok(())
        } else {
            Err(EngineError::ForceVectorLength {
                expected: self.atoms.len(),
                found: forces.len(),
            })
        }
    }

    /// Force on `i` due to `j`, or `None` when the pair does not interact.
    fn pair_force(
        &self,
        i: AtomRef<'_>,
        j: AtomRef<'_>,
        apply_mim: bool,
        include_intra: bool,
    ) -> Option<Vector3<f64>> {
        let v_ij = if apply_mim {
            self.periodic_box.minimum_vector(i.position(), j.position())
        } else {
            j.position() - i.position()
        };
        let r_squared = v_ij.norm_squared();
        if r_squared > self.cutoff_squared {
            return None;
        }
        let r = r_squared.sqrt();

        let magnitude = if i.molecule() != j.molecule() {
            self.potential_map.force(i, j, r)
        } else {
            if !include_intra {
                return None;
            }
            let molecule = self.configuration.molecule(i.molecule())?;
            match molecule.species().scaling(i.species_index(), j.species_index()) {
                ScaledInteraction::Excluded => return None,
                ScaledInteraction::NotScaled => self.potential_map.force(i, j, r),
                ScaledInteraction::Scaled { elec, vdw } => {
                    self.potential_map.force_scaled(i, j, r, elec, vdw)
                }
            }
        };
        Some(v_ij * (-magnitude / r))
    }

    #[inline]
    fn accumulate_pair(
        &self,
        i: usize,
        j: usize,
        apply_mim: bool,
        include_intra: bool,
        forces: &mut [Vector3<f64>],
    ) {
        if let Some(f_i) =
            self.pair_force(self.atoms.atom(i), self.atoms.atom(j), apply_mim, include_intra)
        {
            forces[i] += f_i;
            forces[j] -= f_i;
        }
    }

    fn neighbour_pair_forces(
        &self,
        pair: &CellNeighbourPair,
        include_intra: bool,
        forces: &mut [Vector3<f64>],
    ) {
        let master = self.cells.cells()[pair.master].atoms();
        if pair.is_self_pair() {
            for (&i, &j) in master.iter().tuple_combinations() {
                self.accumulate_pair(i, j, false, include_intra, forces);
            }
        } else {
            let neighbour = self.cells.cells()[pair.neighbour].atoms();
            for (&i, &j) in iproduct!(master, neighbour) {
                self.accumulate_pair(i, j, pair.requires_mim, include_intra, forces);
            }
        }
    }

    /// This process's share of the pair potential forces, over its interleaved slice of the
    /// cell neighbour pair list.
    #[instrument(skip_all, name = "total_pair_potential_forces")]
    pub fn total_pair_potential_forces(
        &self,
        include_intra: bool,
        strategy: DivisionStrategy,
        forces: &mut [Vector3<f64>],
    ) -> Result<(), EngineError> {
        self.check_length(forces)?;
        let n_atoms = forces.len();
        let share: Vec<&CellNeighbourPair> = self
            .pool
            .interleaved(self.cells.cell_neighbour_pairs(), strategy)
            .collect();

        #[cfg(not(feature = "parallel"))]
        let partial = {
            let mut partial = vec![Vector3::zeros(); n_atoms];
            for pair in &share {
                self.neighbour_pair_forces(pair, include_intra, &mut partial);
            }
            partial
        };

        #[cfg(feature = "parallel")]
        let partial = share
            .par_iter()
            .fold(
                || vec![Vector3::zeros(); n_atoms],
                |mut acc, pair| {
                    self.neighbour_pair_forces(pair, include_intra, &mut acc);
                    acc
                },
            )
            .reduce(
                || vec![Vector3::zeros(); n_atoms],
                |mut a, b| {
                    a.iter_mut().zip(b).for_each(|(x, y)| *x += y);
                    a
                },
            );

        forces
            .iter_mut()
            .zip(partial)
            .for_each(|(f, p)| *f += p);
        Ok(())
    }

    /// Bonded forces of one molecule and, when `include_pair` is set, the forces between its
    /// own atoms with exclusions and 1-4 scaling applied.
    pub fn molecule_intramolecular_forces(
        &self,
        molecule: &Molecule,
        include_pair: bool,
        forces: &mut [Vector3<f64>],
    ) -> Result<(), EngineError> {
        self.geometry.molecule_geometry_forces(molecule, forces)?;
        if include_pair {
            for (&i, &j) in molecule.atoms().iter().tuple_combinations() {
                self.accumulate_pair(i, j, true, true, forces);
            }
        }
        Ok(())
    }

    /// Forces from the external potentials targeting each atom of the molecule.
    pub fn molecule_extended_forces(
        &self,
        molecule: &Molecule,
        forces: &mut [Vector3<f64>],
    ) -> Result<(), EngineError> {
        self.check_length(forces)?;
        let potentials = self.configuration.external_potentials();
        for &index in molecule.atoms() {
            let atom = self.atoms.atom(index);
            for &target in atom.targeted_potentials() {
                if let Some(potential) = potentials.get(target) {
                    forces[index] += potential.force(atom.position(), self.periodic_box);
                }
            }
        }
        Ok(())
    }

    /// This process's share of every force contribution: pair forces over its cell pairs,
    /// then bonded and external forces over its interleaved share of molecules.
    #[instrument(skip_all, name = "total_forces")]
    pub fn total_forces(
        &self,
        include_intra: bool,
        strategy: DivisionStrategy,
        forces: &mut [Vector3<f64>],
    ) -> Result<(), EngineError> {
        self.total_pair_potential_forces(include_intra, strategy, forces)?;
        let molecules: Vec<&Molecule> = self.configuration.molecules().map(|(_, m)| m).collect();
        for molecule in self.pool.interleaved(&molecules, strategy) {
            self.molecule_intramolecular_forces(molecule, false, forces)?;
            self.molecule_extended_forces(molecule, forces)?;
        }
        Ok(())
    }
}
