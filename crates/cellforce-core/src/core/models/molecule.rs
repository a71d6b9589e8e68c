use super::species::Species;
use std::sync::Arc;

/// One instance of a [`Species`] in a configuration.
///
/// The molecule's atoms occupy a contiguous block of the atom store starting at
/// [`Molecule::offset`], in species order, so species atom `n` is global atom
/// `offset + n`.
#[derive(Debug, Clone)]
pub struct Molecule {
    species: Arc<Species>,
    atoms: Vec<usize>,
    offset: usize,
}

impl Molecule {
    pub(crate) fn new(species: Arc<Species>, offset: usize) -> Self {
        let atoms = (offset..offset + species.n_atoms()).collect();
        Self {
            species,
            atoms,
            offset,
        }
    }

    pub fn species(&self) -> &Species {
        &self.species
    }

    pub fn shared_species(&self) -> &Arc<Species> {
        &self.species
    }

    /// Global atom indices, in species order.
    pub fn atoms(&self) -> &[usize] {
        &self.atoms
    }

    pub fn n_atoms(&self) -> usize {
        self.atoms.len()
    }

    /// Global index of species atom `species_index`.
    #[inline]
    pub fn atom(&self, species_index: usize) -> usize {
        self.atoms[species_index]
    }

    pub fn offset(&self) -> usize {
        self.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atoms_follow_offset_in_species_order() {
        let mut species = Species::new("triatomic");
        for name in ["A", "B", "C"] {
            species.add_atom(name, 0, 0.0);
        }
        let mol = Molecule::new(Arc::new(species), 7);
        assert_eq!(mol.atoms(), &[7, 8, 9]);
        assert_eq!(mol.atom(2), 9);
        assert_eq!(mol.offset(), 7);
        assert_eq!(mol.n_atoms(), 3);
        assert_eq!(mol.species().name(), "triatomic");
    }
}
