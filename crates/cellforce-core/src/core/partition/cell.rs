use nalgebra::Point3;

#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    index: usize,
    grid_reference: [i32; 3],
    centre: Point3<f64>,
    atoms: Vec<usize>,
}

impl Cell {
    pub fn new(index: usize, grid_reference: [i32; 3], centre: Point3<f64>) -> Self {
        Self {
            index,
            grid_reference,
            centre,
            atoms: Vec::new(),
        }
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn grid_reference(&self) -> [i32; 3] {
        self.grid_reference
    }

    pub fn centre(&self) -> &Point3<f64> {
        &self.centre
    }

    /// Indices of the atoms currently in this cell. Order is unspecified.
    #[inline]
    pub fn atoms(&self) -> &[usize] {
        &self.atoms
    }

    pub fn n_atoms(&self) -> usize {
        self.atoms.len()
    }

    /// Appends an atom and returns its slot.
    pub(crate) fn add_atom(&mut self, atom: usize) -> usize {
        self.atoms.push(atom);
        self.atoms.len() - 1
    }

    /// Removes the atom in `slot` by swapping the last atom into its place. Returns the
    /// atom that now occupies `slot`, if any, so its back-reference can be updated.
    pub(crate) fn remove_atom_at(&mut self, slot: usize) -> Option<usize> {
        self.atoms.swap_remove(slot);
        self.atoms.get(slot).copied()
    }

    pub(crate) fn clear_atoms(&mut self) {
        self.atoms.clear();
    }
}
