use super::ids::MoleculeId;
use nalgebra::Point3;

/// Where an atom currently sits in the cell partition: the cell index and its slot in
/// that cell's atom list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellLocation {
    pub cell: usize,
    pub slot: usize,
}

/// Data needed to append one atom to an [`AtomStore`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewAtom {
    pub molecule: MoleculeId,
    pub species_index: usize,
    pub master_type: usize,
    pub local_type: usize,
    pub charge: f64,
    pub position: Point3<f64>,
}

/// A detached reference to an atom that must be revalidated through
/// [`AtomStore::resolve`] before use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AtomHandle {
    index: usize,
    generation: u64,
}

impl AtomHandle {
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Structure-of-arrays storage for every atom in a configuration.
///
/// Atom identity is the stable integer index into these arrays. The store's generation is
/// bumped by every structural change (insertion, clearing) so that outstanding
/// [`AtomHandle`]s from before the change fail to resolve. Position updates and cell moves
/// do not change identity and leave handles valid.
#[derive(Debug, Clone, Default)]
pub struct AtomStore {
    positions: Vec<Point3<f64>>,
    molecules: Vec<MoleculeId>,
    species_indices: Vec<usize>,
    master_types: Vec<usize>,
    local_types: Vec<usize>,
    charges: Vec<f64>,
    locations: Vec<Option<CellLocation>>,
    targeted_potentials: Vec<Vec<usize>>,
    generation: u64,
}

impl AtomStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn push(&mut self, atom: NewAtom) -> usize {
        let index = self.positions.len();
        self.positions.push(atom.position);
        self.molecules.push(atom.molecule);
        self.species_indices.push(atom.species_index);
        self.master_types.push(atom.master_type);
        self.local_types.push(atom.local_type);
        self.charges.push(atom.charge);
        self.locations.push(None);
        self.targeted_potentials.push(Vec::new());
        self.generation += 1;
        index
    }

    pub fn clear(&mut self) {
        self.positions.clear();
        self.molecules.clear();
        self.species_indices.clear();
        self.master_types.clear();
        self.local_types.clear();
        self.charges.clear();
        self.locations.clear();
        self.targeted_potentials.clear();
        self.generation += 1;
    }

    /// Cursor over atom `index`. Panics if the index is out of range, like slice indexing.
    #[inline]
    pub fn atom(&self, index: usize) -> AtomRef<'_> {
        assert!(index < self.len(), "atom index {} out of range", index);
        AtomRef { store: self, index }
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<AtomRef<'_>> {
        (index < self.len()).then_some(AtomRef { store: self, index })
    }

    pub fn handle(&self, index: usize) -> Option<AtomHandle> {
        (index < self.len()).then_some(AtomHandle {
            index,
            generation: self.generation,
        })
    }

    /// Resolves a handle, failing if the store has been structurally modified since the
    /// handle was taken.
    pub fn resolve(&self, handle: AtomHandle) -> Option<AtomRef<'_>> {
        if handle.generation != self.generation {
            return None;
        }
        self.get(handle.index)
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = AtomRef<'_>> + '_ {
        (0..self.len()).map(move |index| AtomRef { store: self, index })
    }

    #[inline]
    pub fn positions(&self) -> &[Point3<f64>] {
        &self.positions
    }

    #[inline]
    pub fn position(&self, index: usize) -> &Point3<f64> {
        &self.positions[index]
    }

    pub(crate) fn set_position(&mut self, index: usize, position: Point3<f64>) {
        self.positions[index] = position;
    }

    #[inline]
    pub fn location(&self, index: usize) -> Option<CellLocation> {
        self.locations[index]
    }

    pub(crate) fn set_location(&mut self, index: usize, location: Option<CellLocation>) {
        self.locations[index] = location;
    }

    pub(crate) fn add_targeted_potential(&mut self, index: usize, potential: usize) {
        let targets = &mut self.targeted_potentials[index];
        if !targets.contains(&potential) {
            targets.push(potential);
        }
    }
}

/// Lightweight cursor over one atom in an [`AtomStore`].
#[derive(Debug, Clone, Copy)]
pub struct AtomRef<'a> {
    store: &'a AtomStore,
    index: usize,
}

impl PartialEq for AtomRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.store, other.store) && self.index == other.index
    }
}

impl Eq for AtomRef<'_> {}

impl<'a> AtomRef<'a> {
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn position(&self) -> &'a Point3<f64> {
        &self.store.positions[self.index]
    }

    #[inline]
    pub fn molecule(&self) -> MoleculeId {
        self.store.molecules[self.index]
    }

    #[inline]
    pub fn species_index(&self) -> usize {
        self.store.species_indices[self.index]
    }

    #[inline]
    pub fn master_type(&self) -> usize {
        self.store.master_types[self.index]
    }

    #[inline]
    pub fn local_type(&self) -> usize {
        self.store.local_types[self.index]
    }

    #[inline]
    pub fn charge(&self) -> f64 {
        self.store.charges[self.index]
    }

    #[inline]
    pub fn cell_location(&self) -> Option<CellLocation> {
        self.store.locations[self.index]
    }

    pub fn targeted_potentials(&self) -> &'a [usize] {
        &self.store.targeted_potentials[self.index]
    }

    pub fn handle(&self) -> AtomHandle {
        AtomHandle {
            index: self.index,
            generation: self.store.generation,
        }
    }
}
