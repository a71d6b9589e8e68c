use super::cell::Cell;
use crate::core::models::periodic_box::PeriodicBox;
use nalgebra::{Point3, Vector3};
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, warn};

const MIN_CELLS_PER_SIDE: usize = 3;
const CUBIC_TOLERANCE: f64 = 0.01;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PartitionError {
    #[error("Cell size must be positive, got {0}")]
    InvalidCellSize(f64),
    #[error("Pair potential range must be positive, got {0}")]
    InvalidRange(f64),
    #[error("Pair potential range {range} exceeds half the shortest box axis ({half_axis})")]
    RangeTooLarge { range: f64, half_axis: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellNeighbour {
    pub cell: usize,
    pub requires_mim: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellNeighbourPair {
    pub master: usize,
    pub neighbour: usize,
    pub requires_mim: bool,
}

impl CellNeighbourPair {
    #[inline]
    pub fn is_self_pair(&self) -> bool {
        self.master == self.neighbour
    }
}

#[inline]
fn corners() -> impl Iterator<Item = [i32; 3]> {
    (0..8).map(|c: i32| [c & 1, (c >> 1) & 1, (c >> 2) & 1])
}

/// Regular grid partition of a periodic box.
#[derive(Debug, Clone)]
pub struct CellArray {
    periodic_box: PeriodicBox,
    range: f64,
    divisions: [usize; 3],
    real_cell_size: Vector3<f64>,
    fractional_cell_size: Vector3<f64>,
    extents: [i32; 3],
    cells: Vec<Cell>,
    neighbours: Vec<Vec<CellNeighbour>>,
    neighbour_pairs: Vec<CellNeighbourPair>,
}

impl CellArray {
    /// Partitions `periodic_box` into cells no smaller than `cell_size` (within tolerance)
    /// and builds neighbour lists covering `pair_potential_range`.
    pub fn generate(
        periodic_box: &PeriodicBox,
        cell_size: f64,
        pair_potential_range: f64,
    ) -> Result<Self, PartitionError> {
        if !(cell_size > 0.0) {
            return Err(PartitionError::InvalidCellSize(cell_size));
        }
        if !(pair_potential_range > 0.0) {
            return Err(PartitionError::InvalidRange(pair_potential_range));
        }
        let half_axis = 0.5 * periodic_box.shortest_axis_length();
        if pair_potential_range > half_axis {
            return Err(PartitionError::RangeTooLarge {
                range: pair_potential_range,
                half_axis,
            });
        }

        let (divisions, real_cell_size) = Self::divide(periodic_box, cell_size);
        let fractional_cell_size = Vector3::new(
            1.0 / divisions[0] as f64,
            1.0 / divisions[1] as f64,
            1.0 / divisions[2] as f64,
        );
        debug!(
            "Cell divisions ({}, {}, {}) with real size ({:.4}, {:.4}, {:.4})",
            divisions[0],
            divisions[1],
            divisions[2],
            real_cell_size.x,
            real_cell_size.y,
            real_cell_size.z
        );

        let mut cells = Vec::with_capacity(divisions.iter().product());
        for x in 0..divisions[0] {
            for y in 0..divisions[1] {
                for z in 0..divisions[2] {
                    let frac_centre = Point3::new(
                        (x as f64 + 0.5) * fractional_cell_size.x,
                        (y as f64 + 0.5) * fractional_cell_size.y,
                        (z as f64 + 0.5) * fractional_cell_size.z,
                    );
                    cells.push(Cell::new(
                        cells.len(),
                        [x as i32, y as i32, z as i32],
                        periodic_box.to_real(&frac_centre),
                    ));
                }
            }
        }

        let mut extents = [0i32; 3];
        for n in 0..3 {
            let mut extent = 1;
            while (extent as f64) * real_cell_size[n] < pair_potential_range {
                extent += 1;
            }
            if (extent * 2 + 1) as usize > divisions[n] {
                extent = (divisions[n] / 2) as i32;
            }
            extents[n] = extent;
        }
        debug!(
            "Cell extents ({}, {}, {}) cover range {}",
            extents[0], extents[1], extents[2], pair_potential_range
        );

        let mut array = Self {
            periodic_box: periodic_box.clone(),
            range: pair_potential_range,
            divisions,
            real_cell_size,
            fractional_cell_size,
            extents,
            cells,
            neighbours: Vec::new(),
            neighbour_pairs: Vec::new(),
        };
        array.build_neighbours();
        Ok(array)
    }

    fn divide(periodic_box: &PeriodicBox, cell_size: f64) -> ([usize; 3], Vector3<f64>) {
        let lengths = periodic_box.axis_lengths();
        let initial = [0, 1, 2].map(|k| (lengths[k] / cell_size).floor() as usize);
        let min_axis = lengths.imin();

        let mut divisions = [0usize; 3];
        let mut real = Vector3::zeros();

        let smallest = initial.iter().copied().min().unwrap_or(0);
        if smallest < MIN_CELLS_PER_SIDE {
            warn!(
                "Box only allows {} whole cells of size {} along an axis, using the minimum of {}",
                smallest, cell_size, MIN_CELLS_PER_SIDE
            );
            divisions[min_axis] = MIN_CELLS_PER_SIDE;
        } else {
            divisions[min_axis] = initial[min_axis];
        }
        real[min_axis] = lengths[min_axis] / divisions[min_axis] as f64;

        for n in 1..3 {
            let el = (min_axis + n) % 3;
            let x = lengths[el] / real[min_axis];
            let whole = x.floor();
            let remainder = x - whole;
            let count = if remainder > 1.0 - CUBIC_TOLERANCE {
                whole + 1.0
            } else if remainder < CUBIC_TOLERANCE || remainder < 0.5 {
                whole
            } else if lengths[el] / (whole + 1.0) < cell_size {
                whole
            } else {
                whole + 1.0
            };
            divisions[el] = count as usize;
            real[el] = lengths[el] / count;
        }

        (divisions, real)
    }

    #[inline]
    fn wrapped_index(&self, grid: [i32; 3]) -> usize {
        let [nx, ny, nz] = self.divisions.map(|d| d as i32);
        let x = grid[0].rem_euclid(nx);
        let y = grid[1].rem_euclid(ny);
        let z = grid[2].rem_euclid(nz);
        (x * ny * nz + y * nz + z) as usize
    }

    /// Minimum image equivalent of an integer grid delta.
    fn mim_grid_delta(&self, mut delta: [i32; 3]) -> [i32; 3] {
        for k in 0..3 {
            let div = self.divisions[k] as i32;
            let half = self.divisions[k] as f64 * 0.5;
            if delta[k] as f64 > half {
                delta[k] -= div;
            } else if (delta[k] as f64) < -half {
                delta[k] += div;
            }
        }
        delta
    }

    fn grid_distance(&self, delta: [i32; 3]) -> f64 {
        Vector3::new(
            delta[0] as f64 * self.real_cell_size.x,
            delta[1] as f64 * self.real_cell_size.y,
            delta[2] as f64 * self.real_cell_size.z,
        )
        .norm()
    }

    fn mim_required_between(&self, a: [i32; 3], b: [i32; 3]) -> bool {
        for i in corners() {
            for j in corners() {
                let delta = [
                    b[0] + j[0] - a[0] - i[0],
                    b[1] + j[1] - a[1] - i[1],
                    b[2] + j[2] - a[2] - i[2],
                ];
                if self.grid_distance(delta) < self.range {
                    continue;
                }
                if self.grid_distance(self.mim_grid_delta(delta)) < self.range {
                    return true;
                }
            }
        }
        false
    }

    fn build_neighbours(&mut self) {
        let [ex, ey, ez] = self.extents;
        let mut offsets = Vec::new();
        let mut seen = HashSet::new();
        for x in -ex..=ex {
            for y in -ey..=ey {
                for z in -ez..=ez {
                    if x == 0 && y == 0 && z == 0 {
                        continue;
                    }
                    let close = corners().any(|i| {
                        corners().any(|j| {
                            let delta = [x + j[0] - i[0], y + j[1] - i[1], z + j[2] - i[2]];
                            self.grid_distance(self.mim_grid_delta(delta)) < self.range
                        })
                    });
                    if close && seen.insert(self.wrapped_index([x, y, z])) {
                        offsets.push([x, y, z]);
                    }
                }
            }
        }
        debug!("Neighbour stencil holds {} cells", offsets.len());

        let mut neighbours = Vec::with_capacity(self.cells.len());
        for cell in &self.cells {
            let grid = cell.grid_reference();
            let mut list = Vec::with_capacity(offsets.len() + 1);
            list.push(CellNeighbour {
                cell: cell.index(),
                requires_mim: false,
            });
            for offset in &offsets {
                let index = self.wrapped_index([
                    grid[0] + offset[0],
                    grid[1] + offset[1],
                    grid[2] + offset[2],
                ]);
                if list.iter().any(|n: &CellNeighbour| n.cell == index) {
                    continue;
                }
                let requires_mim =
                    self.mim_required_between(grid, self.cells[index].grid_reference());
                list.push(CellNeighbour {
                    cell: index,
                    requires_mim,
                });
            }
            neighbours.push(list);
        }

        let mut pairs = Vec::new();
        for (master, list) in neighbours.iter().enumerate() {
            for nbr in list {
                if master <= nbr.cell {
                    pairs.push(CellNeighbourPair {
                        master,
                        neighbour: nbr.cell,
                        requires_mim: nbr.requires_mim,
                    });
                }
            }
        }

        self.neighbours = neighbours;
        self.neighbour_pairs = pairs;
    }

    pub fn periodic_box(&self) -> &PeriodicBox {
        &self.periodic_box
    }

    pub fn range(&self) -> f64 {
        self.range
    }

    pub fn divisions(&self) -> [usize; 3] {
        self.divisions
    }

    pub fn real_cell_size(&self) -> Vector3<f64> {
        self.real_cell_size
    }

    pub fn extents(&self) -> [i32; 3] {
        self.extents
    }

    #[inline]
    pub fn n_cells(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    #[inline]
    pub fn cell(&self, index: usize) -> Option<&Cell> {
        self.cells.get(index)
    }

    /// Cell at a grid reference, wrapped periodically.
    pub fn cell_at(&self, x: i32, y: i32, z: i32) -> &Cell {
        &self.cells[self.wrapped_index([x, y, z])]
    }

    /// Index of the cell containing `r`, folding it into the box first.
    pub fn cell_index_for(&self, r: &Point3<f64>) -> usize {
        let frac = self
            .periodic_box
            .fold_fractional(&self.periodic_box.to_fractional(r));
        let mut grid = [0i32; 3];
        for k in 0..3 {
            grid[k] = ((frac[k] / self.fractional_cell_size[k]) as usize % self.divisions[k]) as i32;
        }
        self.wrapped_index(grid)
    }

    pub fn cell_for(&self, r: &Point3<f64>) -> &Cell {
        &self.cells[self.cell_index_for(r)]
    }

    /// Neighbours of `cell`, starting with the cell itself.
    #[inline]
    pub fn neighbours(&self, cell: usize) -> &[CellNeighbour] {
        &self.neighbours[cell]
    }

    /// Every unordered neighbouring cell pair once, self pairs included.
    #[inline]
    pub fn cell_neighbour_pairs(&self) -> &[CellNeighbourPair] {
        &self.neighbour_pairs
    }

    pub fn minimum_image_required(&self, a: usize, b: usize) -> bool {
        self.neighbours[a]
            .iter()
            .find(|n| n.cell == b)
            .is_some_and(|n| n.requires_mim)
    }

    pub(crate) fn cell_mut(&mut self, index: usize) -> &mut Cell {
        &mut self.cells[index]
    }

    pub(crate) fn clear_atoms(&mut self) {
        for cell in &mut self.cells {
            cell.clear_atoms();
        }
    }
}
