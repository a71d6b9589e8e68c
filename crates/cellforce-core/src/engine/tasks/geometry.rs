use crate::core::forcefield::intramolecular::{AngleForm, BondForm, TorsionForm};
use crate::core::models::atom::{AtomRef, AtomStore};
use crate::core::models::configuration::Configuration;
use crate::core::models::molecule::Molecule;
use crate::core::models::periodic_box::PeriodicBox;
use crate::core::models::species::{SpeciesAngle, SpeciesBond, SpeciesImproper, SpeciesTorsion};
use crate::core::utils::geometry::{angle_in_degrees, torsion_in_degrees};
use crate::engine::error::EngineError;
use nalgebra::Vector3;
use tracing::instrument;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

const DEGENERATE_EPSILON: f64 = 1e-12;

/// Forces on the two atoms of a bond, `v_ij` pointing from atom i to atom j.
pub fn bond_forces(form: &BondForm, v_ij: &Vector3<f64>) -> [Vector3<f64>; 2] {
    let r = v_ij.norm();
    if r < DEGENERATE_EPSILON {
        return [Vector3::zeros(); 2];
    }
    let f_i = v_ij * (form.derivative(r) / r);
    [f_i, -f_i]
}

/// Forces on the atoms of an angle `i-j-k` with vertex `j`, given `v_ji = r_i - r_j`
/// and `v_jk = r_k - r_j`. Returned in the order i, j, k.
pub fn angle_forces(
    form: &AngleForm,
    v_ji: &Vector3<f64>,
    v_jk: &Vector3<f64>,
) -> [Vector3<f64>; 3] {
    let (r_ji, r_jk) = (v_ji.norm(), v_jk.norm());
    if r_ji < DEGENERATE_EPSILON || r_jk < DEGENERATE_EPSILON {
        return [Vector3::zeros(); 3];
    }
    let (u_ji, u_jk) = (v_ji / r_ji, v_jk / r_jk);
    let cos_theta = u_ji.dot(&u_jk).clamp(-1.0, 1.0);
    let sin_theta = (1.0 - cos_theta * cos_theta).sqrt();
    if sin_theta < DEGENERATE_EPSILON {
        return [Vector3::zeros(); 3];
    }
    let du_dtheta = form.derivative(cos_theta.acos().to_degrees());

    // dU/dr = dU/dtheta * (-1/sin(theta)) * d(cos theta)/dr, and F = -dU/dr.
    let scale = du_dtheta / sin_theta;
    let f_i = (u_jk - u_ji * cos_theta) * (scale / r_ji);
    let f_k = (u_ji - u_jk * cos_theta) * (scale / r_jk);
    [f_i, -(f_i + f_k), f_k]
}

/// Dihedral energy for bond vectors `b1 = r_j - r_i`, `b2 = r_k - r_j`, `b3 = r_l - r_k`.
#[inline]
pub fn dihedral_energy(
    form: &TorsionForm,
    b1: &Vector3<f64>,
    b2: &Vector3<f64>,
    b3: &Vector3<f64>,
) -> f64 {
    form.energy(torsion_in_degrees(b1, b2, b3))
}

/// Dihedral forces on atoms i, j, k, l for the same bond vectors as [`dihedral_energy`].
///
/// Gradients of phi are taken through the plane normals `m = b1 x b2` and `n = b2 x b3`.
pub fn dihedral_forces(
    form: &TorsionForm,
    b1: &Vector3<f64>,
    b2: &Vector3<f64>,
    b3: &Vector3<f64>,
) -> [Vector3<f64>; 4] {
    let m = b1.cross(b2);
    let n = b2.cross(b3);
    let (m_sq, n_sq) = (m.norm_squared(), n.norm_squared());
    let b2_sq = b2.norm_squared();
    if m_sq < DEGENERATE_EPSILON || n_sq < DEGENERATE_EPSILON || b2_sq < DEGENERATE_EPSILON {
        return [Vector3::zeros(); 4];
    }
    let b2_len = b2_sq.sqrt();
    let du_dphi = form.derivative(torsion_in_degrees(b1, b2, b3));

    let dphi_di = m * (-b2_len / m_sq);
    let dphi_dl = n * (b2_len / n_sq);
    let p = b1.dot(b2) / b2_sq;
    let q = b3.dot(b2) / b2_sq;
    let dphi_dj = dphi_dl * q - dphi_di * (1.0 + p);
    let dphi_dk = dphi_di * p - dphi_dl * (1.0 + q);

    [
        dphi_di * -du_dphi,
        dphi_dj * -du_dphi,
        dphi_dk * -du_dphi,
        dphi_dl * -du_dphi,
    ]
}

/// Bonded (bond, angle, torsion and improper) energies and forces of molecules.
pub struct GeometryKernel<'a> {
    configuration: &'a Configuration,
    atoms: &'a AtomStore,
    periodic_box: &'a PeriodicBox,
}

impl<'a> GeometryKernel<'a> {
    pub fn new(configuration: &'a Configuration) -> Self {
        Self {
            configuration,
            atoms: configuration.atoms(),
            periodic_box: configuration.periodic_box(),
        }
    }

    #[inline]
    fn vector(&self, molecule: &Molecule, from: usize, to: usize) -> Vector3<f64> {
        self.periodic_box.minimum_vector(
            self.atoms.position(molecule.atom(from)),
            self.atoms.position(molecule.atom(to)),
        )
    }

    fn dihedral_vectors(
        &self,
        molecule: &Molecule,
        [i, j, k, l]: [usize; 4],
    ) -> [Vector3<f64>; 3] {
        [
            self.vector(molecule, i, j),
            self.vector(molecule, j, k),
            self.vector(molecule, k, l),
        ]
    }

    pub fn bond_energy(&self, molecule: &Molecule, bond: &SpeciesBond) -> f64 {
        bond.form.energy(self.vector(molecule, bond.i, bond.j).norm())
    }

    pub fn angle_energy(&self, molecule: &Molecule, angle: &SpeciesAngle) -> f64 {
        let theta = angle_in_degrees(
            &self.vector(molecule, angle.j, angle.i),
            &self.vector(molecule, angle.j, angle.k),
        );
        angle.form.energy(theta)
    }

    pub fn torsion_energy(&self, molecule: &Molecule, torsion: &SpeciesTorsion) -> f64 {
        let [b1, b2, b3] =
            self.dihedral_vectors(molecule, [torsion.i, torsion.j, torsion.k, torsion.l]);
        dihedral_energy(&torsion.form, &b1, &b2, &b3)
    }

    pub fn improper_energy(&self, molecule: &Molecule, improper: &SpeciesImproper) -> f64 {
        let [b1, b2, b3] =
            self.dihedral_vectors(molecule, [improper.i, improper.j, improper.k, improper.l]);
        dihedral_energy(&improper.form, &b1, &b2, &b3)
    }

    /// Sum of every bonded term of the molecule's species.
    pub fn molecule_geometry_energy(&self, molecule: &Molecule) -> f64 {
        let species = molecule.species();
        let bonds: f64 = species
            .bonds()
            .iter()
            .map(|b| self.bond_energy(molecule, b))
            .sum();
        let angles: f64 = species
            .angles()
            .iter()
            .map(|a| self.angle_energy(molecule, a))
            .sum();
        let torsions: f64 = species
            .torsions()
            .iter()
            .map(|t| self.torsion_energy(molecule, t))
            .sum();
        let impropers: f64 = species
            .impropers()
            .iter()
            .map(|t| self.improper_energy(molecule, t))
            .sum();
        bonds + angles + torsions + impropers
    }

    /// Bonded energy seen by one atom: every term it takes part in, in full.
    ///
    /// A term shared by several atoms contributes to each of them.
    pub fn atom_geometry_energy(&self, atom: AtomRef<'_>) -> Result<f64, EngineError> {
        let molecule = self
            .configuration
            .molecule(atom.molecule())
            .ok_or(EngineError::MoleculeNotFound(atom.molecule()))?;
        let species = molecule.species();
        let n = atom.species_index();

        let bonds: f64 = species
            .bonds_of(n)
            .iter()
            .map(|&t| self.bond_energy(molecule, &species.bonds()[t]))
            .sum();
        let angles: f64 = species
            .angles_of(n)
            .iter()
            .map(|&t| self.angle_energy(molecule, &species.angles()[t]))
            .sum();
        let torsions: f64 = species
            .torsions_of(n)
            .iter()
            .map(|&t| self.torsion_energy(molecule, &species.torsions()[t]))
            .sum();
        let impropers: f64 = species
            .impropers_of(n)
            .iter()
            .map(|&t| self.improper_energy(molecule, &species.impropers()[t]))
            .sum();
        Ok(bonds + angles + torsions + impropers)
    }

    /// Adds the molecule's bonded forces into `forces`, indexed by global atom index.
    ///
    /// Terms are applied one after another since neighbouring terms share atoms.
    pub fn molecule_geometry_forces(
        &self,
        molecule: &Molecule,
        forces: &mut [Vector3<f64>],
    ) -> Result<(), EngineError> {
        if forces.len() != self.atoms.len() {
            return Err(EngineError::ForceVectorLength {
                expected: self.atoms.len(),
                found: forces.len(),
            });
        }
        let species = molecule.species();
        let offset = molecule.offset();

        for bond in species.bonds() {
            let [f_i, f_j] = bond_forces(&bond.form, &self.vector(molecule, bond.i, bond.j));
            forces[offset + bond.i] += f_i;
            forces[offset + bond.j] += f_j;
        }

        for angle in species.angles() {
            let [f_i, f_j, f_k] = angle_forces(
                &angle.form,
                &self.vector(molecule, angle.j, angle.i),
                &self.vector(molecule, angle.j, angle.k),
            );
            forces[offset + angle.i] += f_i;
            forces[offset + angle.j] += f_j;
            forces[offset + angle.k] += f_k;
        }

        let dihedrals = species
            .torsions()
            .iter()
            .map(|t| ([t.i, t.j, t.k, t.l], &t.form))
            .chain(
                species
                    .impropers()
                    .iter()
                    .map(|t| ([t.i, t.j, t.k, t.l], &t.form)),
            );
        for (indices, form) in dihedrals {
            let [b1, b2, b3] = self.dihedral_vectors(molecule, indices);
            let contributions = dihedral_forces(form, &b1, &b2, &b3);
            for (index, f) in indices.iter().zip(contributions) {
                forces[offset + index] += f;
            }
        }
        Ok(())
    }

    /// Bonded energy of every molecule in the configuration.
    #[instrument(skip_all, name = "total_geometry_energy")]
    pub fn total_geometry_energy(&self) -> f64 {
        let molecules: Vec<&Molecule> = self.configuration.molecules().map(|(_, m)| m).collect();

        #[cfg(not(feature = "parallel"))]
        let iterator = molecules.iter();

        #[cfg(feature = "parallel")]
        let iterator = molecules.par_iter();

        iterator
            .map(|molecule| self.molecule_geometry_energy(molecule))
            .sum()
    }
}
