use super::atom::{AtomStore, CellLocation, NewAtom};
use super::ids::MoleculeId;
use super::molecule::Molecule;
use super::periodic_box::PeriodicBox;
use super::species::Species;
use crate::core::forcefield::external::ExternalPotential;
use crate::core::partition::cell_array::{CellArray, PartitionError};
use nalgebra::Point3;
use slotmap::SlotMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, trace};

#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Species '{species}' has {expected} atoms but {found} positions were given")]
    AtomCountMismatch {
        species: String,
        expected: usize,
        found: usize,
    },
    #[error("Atom index {0} is out of range")]
    AtomOutOfRange(usize),
    #[error("Molecule {0:?} does not exist in this configuration")]
    UnknownMolecule(MoleculeId),
    #[error("External potential index {0} is out of range")]
    UnknownPotential(usize),
    #[error("Cell partition error: {0}")]
    Partition(#[from] PartitionError),
}

/// A periodic box full of molecules.
///
/// Owns the atom store, the molecule arena, the optional cell partition and the list of
/// external potentials. Positions are always stored folded into the box.
#[derive(Debug, Clone)]
pub struct Configuration {
    periodic_box: PeriodicBox,
    atoms: AtomStore,
    molecules: SlotMap<MoleculeId, Molecule>,
    used_types: Vec<usize>,
    cells: Option<CellArray>,
    external_potentials: Vec<ExternalPotential>,
}

impl Configuration {
    pub fn new(periodic_box: PeriodicBox) -> Self {
        Self {
            periodic_box,
            atoms: AtomStore::new(),
            molecules: SlotMap::with_key(),
            used_types: Vec::new(),
            cells: None,
            external_potentials: Vec::new(),
        }
    }

    #[inline]
    pub fn periodic_box(&self) -> &PeriodicBox {
        &self.periodic_box
    }

    #[inline]
    pub fn atoms(&self) -> &AtomStore {
        &self.atoms
    }

    #[inline]
    pub fn n_atoms(&self) -> usize {
        self.atoms.len()
    }

    pub fn n_molecules(&self) -> usize {
        self.molecules.len()
    }

    pub fn molecule(&self, id: MoleculeId) -> Option<&Molecule> {
        self.molecules.get(id)
    }

    /// Molecules in insertion order.
    pub fn molecules(&self) -> impl Iterator<Item = (MoleculeId, &Molecule)> {
        self.molecules.iter()
    }

    pub fn molecule_ids(&self) -> Vec<MoleculeId> {
        self.molecules.keys().collect()
    }

    /// Master type indices present in the configuration, indexed by local type.
    pub fn used_types(&self) -> &[usize] {
        &self.used_types
    }

    #[inline]
    pub fn cells(&self) -> Option<&CellArray> {
        self.cells.as_ref()
    }

    pub fn external_potentials(&self) -> &[ExternalPotential] {
        &self.external_potentials
    }

    fn local_type_for(&mut self, master_type: usize) -> usize {
        match self.used_types.iter().position(|&t| t == master_type) {
            Some(local) => local,
            None => {
                self.used_types.push(master_type);
                self.used_types.len() - 1
            }
        }
    }

    /// Instantiates `species` with the given positions, one per species atom.
    ///
    /// If cells have already been generated the new atoms are placed immediately.
    pub fn add_molecule(
        &mut self,
        species: Arc<Species>,
        positions: &[Point3<f64>],
    ) -> Result<MoleculeId, ConfigurationError> {
        if positions.len() != species.n_atoms() {
            return Err(ConfigurationError::AtomCountMismatch {
                species: species.name().to_string(),
                expected: species.n_atoms(),
                found: positions.len(),
            });
        }

        let local_types: Vec<usize> = species
            .atoms()
            .iter()
            .map(|a| self.local_type_for(a.master_type))
            .collect();

        let offset = self.atoms.len();
        let periodic_box = &self.periodic_box;
        let atoms = &mut self.atoms;
        let id = self.molecules.insert_with_key(move |id| {
            for (n, (atom, position)) in species.atoms().iter().zip(positions).enumerate() {
                atoms.push(NewAtom {
                    molecule: id,
                    species_index: n,
                    master_type: atom.master_type,
                    local_type: local_types[n],
                    charge: atom.charge,
                    position: periodic_box.fold(position),
                });
            }
            Molecule::new(species, offset)
        });

        if let Some(cells) = self.cells.as_mut() {
            for index in offset..self.atoms.len() {
                relocate(cells, &mut self.atoms, index);
            }
        }

        trace!(molecule = ?id, offset, "Added molecule");
        Ok(id)
    }

    /// Moves an atom, folding the new position into the box.
    ///
    /// The cell partition is not touched; call [`Self::update_cell_locations`] before the
    /// next evaluation.
    pub fn set_atom_position(
        &mut self,
        index: usize,
        position: Point3<f64>,
    ) -> Result<(), ConfigurationError> {
        if index >= self.atoms.len() {
            return Err(ConfigurationError::AtomOutOfRange(index));
        }
        let folded = self.periodic_box.fold(&position);
        self.atoms.set_position(index, folded);
        Ok(())
    }

    /// Builds the cell partition and assigns every atom to its cell.
    pub fn generate_cells(
        &mut self,
        cell_size: f64,
        pair_potential_range: f64,
    ) -> Result<(), ConfigurationError> {
        let mut cells = CellArray::generate(&self.periodic_box, cell_size, pair_potential_range)?;
        for index in 0..self.atoms.len() {
            self.atoms.set_location(index, None);
            relocate(&mut cells, &mut self.atoms, index);
        }
        debug!(
            n_cells = cells.n_cells(),
            n_atoms = self.atoms.len(),
            "Cell partition generated"
        );
        self.cells = Some(cells);
        Ok(())
    }

    /// Reassigns atoms whose positions have left their current cell. Returns how many moved.
    pub fn update_cell_locations(&mut self) -> usize {
        let Some(cells) = self.cells.as_mut() else {
            return 0;
        };
        let mut moved = 0;
        for index in 0..self.atoms.len() {
            if relocate(cells, &mut self.atoms, index) {
                moved += 1;
            }
        }
        trace!(moved, "Updated cell locations");
        moved
    }

    pub fn add_external_potential(&mut self, potential: ExternalPotential) -> usize {
        self.external_potentials.push(potential);
        self.external_potentials.len() - 1
    }

    pub fn target_atom(&mut self, atom: usize, potential: usize) -> Result<(), ConfigurationError> {
        if potential >= self.external_potentials.len() {
            return Err(ConfigurationError::UnknownPotential(potential));
        }
        if atom >= self.atoms.len() {
            return Err(ConfigurationError::AtomOutOfRange(atom));
        }
        self.atoms.add_targeted_potential(atom, potential);
        Ok(())
    }

    pub fn target_molecule(
        &mut self,
        molecule: MoleculeId,
        potential: usize,
    ) -> Result<(), ConfigurationError> {
        if potential >= self.external_potentials.len() {
            return Err(ConfigurationError::UnknownPotential(potential));
        }
        let mol = self
            .molecules
            .get(molecule)
            .ok_or(ConfigurationError::UnknownMolecule(molecule))?;
        for &atom in mol.atoms() {
            self.atoms.add_targeted_potential(atom, potential);
        }
        Ok(())
    }

    /// Removes all atoms and molecules. The box, external potentials and cell geometry are kept.
    pub fn clear(&mut self) {
        self.atoms.clear();
        self.molecules.clear();
        self.used_types.clear();
        if let Some(cells) = self.cells.as_mut() {
            cells.clear_atoms();
        }
    }
}

/// Puts atom `index` in the cell that contains its position. Returns whether it moved.
fn relocate(cells: &mut CellArray, atoms: &mut AtomStore, index: usize) -> bool {
    let target = cells.cell_index_for(atoms.position(index));
    if let Some(current) = atoms.location(index) {
        if current.cell == target {
            return false;
        }
        if let Some(displaced) = cells.cell_mut(current.cell).remove_atom_at(current.slot) {
            atoms.set_location(displaced, Some(current));
        }
    }
    let slot = cells.cell_mut(target).add_atom(index);
    atoms.set_location(
        index,
        Some(CellLocation {
            cell: target,
            slot,
        }),
    );
    true
}
