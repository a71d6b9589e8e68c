use crate::core::forcefield::intramolecular::{AngleForm, BondForm, TorsionForm};
use std::collections::HashMap;
use thiserror::Error;

pub const DEFAULT_ELEC_14_SCALE: f64 = 0.5;
pub const DEFAULT_VDW_14_SCALE: f64 = 0.5;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SpeciesError {
    #[error("Species '{species}': {term} references atom {index}, but only {n_atoms} atoms exist")]
    AtomIndexOutOfRange {
        species: String,
        term: &'static str,
        index: usize,
        n_atoms: usize,
    },
    #[error("Species '{species}': {term} references atom {index} more than once")]
    RepeatedAtom {
        species: String,
        term: &'static str,
        index: usize,
    },
}

/// How the non-bonded interaction between two atoms of the same molecule is treated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScaledInteraction {
    NotScaled,
    Excluded,
    Scaled { elec: f64, vdw: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpeciesAtom {
    pub name: String,
    pub master_type: usize,
    pub charge: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpeciesBond {
    pub i: usize,
    pub j: usize,
    pub form: BondForm,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpeciesAngle {
    pub i: usize,
    pub j: usize,
    pub k: usize,
    pub form: AngleForm,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpeciesTorsion {
    pub i: usize,
    pub j: usize,
    pub k: usize,
    pub l: usize,
    pub form: TorsionForm,
    pub elec_14_scale: f64,
    pub vdw_14_scale: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpeciesImproper {
    pub i: usize,
    pub j: usize,
    pub k: usize,
    pub l: usize,
    pub form: TorsionForm,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct AtomTerms {
    bonds: Vec<usize>,
    angles: Vec<usize>,
    torsions: Vec<usize>,
    impropers: Vec<usize>,
}

/// Template for a molecule: its atoms, bonded terms and the intramolecular scaling table
/// derived from them.
///
/// Scaling rules, applied as terms are added:
/// - atoms sharing a bond or an angle are `Excluded`;
/// - the first and last atoms of a torsion are `Scaled` with that torsion's 1-4 factors,
///   while its inner pairs are `Excluded`;
/// - `Excluded` takes precedence over `Scaled` whatever the order the terms arrive in: an
///   exclusion is never downgraded, and an exclusion from a later term (including the inner
///   pair of a later torsion, as happens in small rings) replaces an earlier 1-4 scaling;
/// - among torsions scaling the same pair, the first one added fixes the factors.
#[derive(Debug, Clone, PartialEq)]
pub struct Species {
    name: String,
    atoms: Vec<SpeciesAtom>,
    bonds: Vec<SpeciesBond>,
    angles: Vec<SpeciesAngle>,
    torsions: Vec<SpeciesTorsion>,
    impropers: Vec<SpeciesImproper>,
    atom_terms: Vec<AtomTerms>,
    scaling: HashMap<(usize, usize), ScaledInteraction>,
}

impl Species {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            atoms: Vec::new(),
            bonds: Vec::new(),
            angles: Vec::new(),
            torsions: Vec::new(),
            impropers: Vec::new(),
            atom_terms: Vec::new(),
            scaling: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn n_atoms(&self) -> usize {
        self.atoms.len()
    }

    pub fn atoms(&self) -> &[SpeciesAtom] {
        &self.atoms
    }

    pub fn bonds(&self) -> &[SpeciesBond] {
        &self.bonds
    }

    pub fn angles(&self) -> &[SpeciesAngle] {
        &self.angles
    }

    pub fn torsions(&self) -> &[SpeciesTorsion] {
        &self.torsions
    }

    pub fn impropers(&self) -> &[SpeciesImproper] {
        &self.impropers
    }

    pub fn add_atom(&mut self, name: impl Into<String>, master_type: usize, charge: f64) -> usize {
        self.atoms.push(SpeciesAtom {
            name: name.into(),
            master_type,
            charge,
        });
        self.atom_terms.push(AtomTerms::default());
        self.atoms.len() - 1
    }

    fn validate(&self, term: &'static str, indices: &[usize]) -> Result<(), SpeciesError> {
        for (n, &index) in indices.iter().enumerate() {
            if index >= self.atoms.len() {
                return Err(SpeciesError::AtomIndexOutOfRange {
                    species: self.name.clone(),
                    term,
                    index,
                    n_atoms: self.atoms.len(),
                });
            }
            if indices[..n].contains(&index) {
                return Err(SpeciesError::RepeatedAtom {
                    species: self.name.clone(),
                    term,
                    index,
                });
            }
        }
        Ok(())
    }

    fn set_scaling(&mut self, a: usize, b: usize, interaction: ScaledInteraction) {
        let key = (a.min(b), a.max(b));
        match self.scaling.get(&key) {
            Some(ScaledInteraction::Excluded) => {}
            Some(ScaledInteraction::Scaled { .. })
                if interaction != ScaledInteraction::Excluded => {}
            _ => {
                self.scaling.insert(key, interaction);
            }
        }
    }

    pub fn add_bond(&mut self, i: usize, j: usize, form: BondForm) -> Result<usize, SpeciesError> {
        self.validate("bond", &[i, j])?;
        let index = self.bonds.len();
        self.bonds.push(SpeciesBond { i, j, form });
        for atom in [i, j] {
            self.atom_terms[atom].bonds.push(index);
        }
        self.set_scaling(i, j, ScaledInteraction::Excluded);
        Ok(index)
    }

    pub fn add_angle(
        &mut self,
        i: usize,
        j: usize,
        k: usize,
        form: AngleForm,
    ) -> Result<usize, SpeciesError> {
        self.validate("angle", &[i, j, k])?;
        let index = self.angles.len();
        self.angles.push(SpeciesAngle { i, j, k, form });
        for atom in [i, j, k] {
            self.atom_terms[atom].angles.push(index);
        }
        self.set_scaling(i, j, ScaledInteraction::Excluded);
        self.set_scaling(j, k, ScaledInteraction::Excluded);
        self.set_scaling(i, k, ScaledInteraction::Excluded);
        Ok(index)
    }

    pub fn add_torsion(
        &mut self,
        [i, j, k, l]: [usize; 4],
        form: TorsionForm,
    ) -> Result<usize, SpeciesError> {
        self.add_scaled_torsion([i, j, k, l], form, DEFAULT_ELEC_14_SCALE, DEFAULT_VDW_14_SCALE)
    }

    pub fn add_scaled_torsion(
        &mut self,
        [i, j, k, l]: [usize; 4],
        form: TorsionForm,
        elec_14_scale: f64,
        vdw_14_scale: f64,
    ) -> Result<usize, SpeciesError> {
        self.validate("torsion", &[i, j, k, l])?;
        let index = self.torsions.len();
        self.torsions.push(SpeciesTorsion {
            i,
            j,
            k,
            l,
            form,
            elec_14_scale,
            vdw_14_scale,
        });
        for atom in [i, j, k, l] {
            self.atom_terms[atom].torsions.push(index);
        }
        for (a, b) in [(i, j), (i, k), (j, k), (j, l), (k, l)] {
            self.set_scaling(a, b, ScaledInteraction::Excluded);
        }
        self.set_scaling(
            i,
            l,
            ScaledInteraction::Scaled {
                elec: elec_14_scale,
                vdw: vdw_14_scale,
            },
        );
        Ok(index)
    }

    /// Impropers contribute geometry energy only and leave the scaling table untouched.
    pub fn add_improper(
        &mut self,
        [i, j, k, l]: [usize; 4],
        form: TorsionForm,
    ) -> Result<usize, SpeciesError> {
        self.validate("improper", &[i, j, k, l])?;
        let index = self.impropers.len();
        self.impropers.push(SpeciesImproper { i, j, k, l, form });
        for atom in [i, j, k, l] {
            self.atom_terms[atom].impropers.push(index);
        }
        Ok(index)
    }

    /// Treatment of the non-bonded interaction between species atoms `i` and `j`.
    #[inline]
    pub fn scaling(&self, i: usize, j: usize) -> ScaledInteraction {
        self.scaling
            .get(&(i.min(j), i.max(j)))
            .copied()
            .unwrap_or(ScaledInteraction::NotScaled)
    }

    pub fn bonds_of(&self, atom: usize) -> &[usize] {
        &self.atom_terms[atom].bonds
    }

    pub fn angles_of(&self, atom: usize) -> &[usize] {
        &self.atom_terms[atom].angles
    }

    pub fn torsions_of(&self, atom: usize) -> &[usize] {
        &self.atom_terms[atom].torsions
    }

    pub fn impropers_of(&self, atom: usize) -> &[usize] {
        &self.atom_terms[atom].impropers
    }
}
