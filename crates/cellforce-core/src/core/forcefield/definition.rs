use super::external::ExternalPotential;
use super::intramolecular::{AngleForm, BondForm, FormError, TorsionForm};
use super::params::{AtomType, PairPotentialSettings};
use super::potential_map::{ForcefieldError, PotentialMap};
use crate::core::models::configuration::{Configuration, ConfigurationError};
use crate::core::models::periodic_box::{BoxError, PeriodicBox};
use crate::core::models::species::{DEFAULT_ELEC_14_SCALE, DEFAULT_VDW_14_SCALE, Species, SpeciesError};
use nalgebra::Point3;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ParamLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
}

#[derive(Debug, Error)]
pub enum DefinitionError {
    #[error("Unknown species '{0}'")]
    UnknownSpecies(String),
    #[error("Duplicate species '{0}'")]
    DuplicateSpecies(String),
    #[error("Unknown external potential '{0}'")]
    UnknownPotential(String),
    #[error("{kind} in species '{species}' needs {expected} atom indices, got {found}")]
    TermArity {
        species: String,
        kind: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("Invalid functional form in species '{species}': {source}")]
    Form {
        species: String,
        #[source]
        source: FormError,
    },
    #[error(transparent)]
    Species(#[from] SpeciesError),
    #[error(transparent)]
    Forcefield(#[from] ForcefieldError),
    #[error(transparent)]
    Box(#[from] BoxError),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BoxDefinition {
    pub lengths: [f64; 3],
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SpeciesAtomDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub atom_type: String,
    /// Overrides the atom type's charge.
    pub charge: Option<f64>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TermDefinition {
    pub atoms: Vec<usize>,
    pub form: String,
    #[serde(default)]
    pub params: Vec<f64>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct TorsionDefinition {
    pub atoms: Vec<usize>,
    pub form: String,
    #[serde(default)]
    pub params: Vec<f64>,
    #[serde(default = "default_elec_scale")]
    pub elec_scale: f64,
    #[serde(default = "default_vdw_scale")]
    pub vdw_scale: f64,
}

fn default_elec_scale() -> f64 {
    DEFAULT_ELEC_14_SCALE
}

fn default_vdw_scale() -> f64 {
    DEFAULT_VDW_14_SCALE
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SpeciesDefinition {
    pub name: String,
    pub atoms: Vec<SpeciesAtomDefinition>,
    #[serde(default)]
    pub bonds: Vec<TermDefinition>,
    #[serde(default)]
    pub angles: Vec<TermDefinition>,
    #[serde(default)]
    pub torsions: Vec<TorsionDefinition>,
    #[serde(default)]
    pub impropers: Vec<TermDefinition>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct MoleculeDefinition {
    pub species: String,
    pub positions: Vec<[f64; 3]>,
    /// Names of external potentials acting on every atom of the molecule.
    #[serde(default)]
    pub potentials: Vec<String>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct NamedExternalPotential {
    pub name: String,
    #[serde(flatten)]
    pub potential: ExternalPotential,
}

/// Complete description of a system: box, forcefield, species templates and molecules.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct SystemDefinition {
    #[serde(rename = "box")]
    pub periodic_box: BoxDefinition,
    pub pair_potential: PairPotentialSettings,
    pub atom_types: Vec<AtomType>,
    #[serde(default)]
    pub species: Vec<SpeciesDefinition>,
    #[serde(default)]
    pub molecules: Vec<MoleculeDefinition>,
    #[serde(default)]
    pub external_potentials: Vec<NamedExternalPotential>,
}

/// Everything built from a [`SystemDefinition`], ready for evaluation once cells are generated.
#[derive(Debug, Clone)]
pub struct System {
    pub potential_map: PotentialMap,
    pub species: Vec<Arc<Species>>,
    pub configuration: Configuration,
}

fn expect_atoms<const N: usize>(
    species: &str,
    kind: &'static str,
    atoms: &[usize],
) -> Result<[usize; N], DefinitionError> {
    atoms.try_into().map_err(|_| DefinitionError::TermArity {
        species: species.to_string(),
        kind,
        expected: N,
        found: atoms.len(),
    })
}

impl SystemDefinition {
    pub fn load(path: &Path) -> Result<Self, ParamLoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| ParamLoadError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ParamLoadError::Toml {
            path: path.to_string_lossy().to_string(),
            source: e,
        })
    }

    fn build_species(
        def: &SpeciesDefinition,
        potential_map: &PotentialMap,
    ) -> Result<Species, DefinitionError> {
        let form_error = |source| DefinitionError::Form {
            species: def.name.clone(),
            source,
        };
        let mut species = Species::new(def.name.clone());

        for atom in &def.atoms {
            let type_index = potential_map.type_index(&atom.atom_type)?;
            let charge = match atom.charge {
                Some(q) => q,
                None => potential_map
                    .atom_type(type_index)
                    .map_or(0.0, |t| t.charge),
            };
            species.add_atom(atom.name.clone(), type_index, charge);
        }

        for term in &def.bonds {
            let [i, j] = expect_atoms::<2>(&def.name, "bond", &term.atoms)?;
            let form = BondForm::from_keyword(&term.form, &term.params).map_err(form_error)?;
            species.add_bond(i, j, form)?;
        }
        for term in &def.angles {
            let [i, j, k] = expect_atoms::<3>(&def.name, "angle", &term.atoms)?;
            let form = AngleForm::from_keyword(&term.form, &term.params).map_err(form_error)?;
            species.add_angle(i, j, k, form)?;
        }
        for term in &def.torsions {
            let atoms = expect_atoms::<4>(&def.name, "torsion", &term.atoms)?;
            let form = TorsionForm::from_keyword(&term.form, &term.params).map_err(form_error)?;
            species.add_scaled_torsion(atoms, form, term.elec_scale, term.vdw_scale)?;
        }
        for term in &def.impropers {
            let atoms = expect_atoms::<4>(&def.name, "improper", &term.atoms)?;
            let form = TorsionForm::from_keyword(&term.form, &term.params).map_err(form_error)?;
            species.add_improper(atoms, form)?;
        }
        Ok(species)
    }

    pub fn build(&self) -> Result<System, DefinitionError> {
        let potential_map = PotentialMap::new(self.atom_types.clone(), self.pair_potential)?;

        let [a, b, c] = self.periodic_box.lengths;
        let periodic_box = if a == b && b == c {
            PeriodicBox::cubic(a)?
        } else {
            PeriodicBox::orthorhombic(a, b, c)?
        };

        let mut species = Vec::with_capacity(self.species.len());
        let mut species_by_name = HashMap::new();
        for def in &self.species {
            if species_by_name.contains_key(def.name.as_str()) {
                return Err(DefinitionError::DuplicateSpecies(def.name.clone()));
            }
            species_by_name.insert(def.name.as_str(), species.len());
            species.push(Arc::new(Self::build_species(def, &potential_map)?));
        }

        let mut configuration = Configuration::new(periodic_box);
        let mut potentials_by_name = HashMap::new();
        for named in &self.external_potentials {
            let index = configuration.add_external_potential(named.potential.clone());
            potentials_by_name.insert(named.name.as_str(), index);
        }

        for mol in &self.molecules {
            let &index = species_by_name
                .get(mol.species.as_str())
                .ok_or_else(|| DefinitionError::UnknownSpecies(mol.species.clone()))?;
            let positions: Vec<Point3<f64>> =
                mol.positions.iter().map(|&p| Point3::from(p)).collect();
            let id = configuration.add_molecule(species[index].clone(), &positions)?;
            for name in &mol.potentials {
                let &potential = potentials_by_name
                    .get(name.as_str())
                    .ok_or_else(|| DefinitionError::UnknownPotential(name.clone()))?;
                configuration.target_molecule(id, potential)?;
            }
        }

        debug!(
            n_species = species.len(),
            n_molecules = configuration.n_molecules(),
            n_atoms = configuration.n_atoms(),
            "Built system from definition"
        );

        Ok(System {
            potential_map,
            species,
            configuration,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::species::ScaledInteraction;
    use std::fs;
    use tempfile::tempdir;

    const BUTANE_LIKE: &str = r#"
        [box]
        lengths = [30.0, 30.0, 30.0]

        [pair-potential]
        range = 10.0
        short-range-truncation = { scheme = "shifted" }

        [[atom-types]]
        name = "CH3"
        charge = 0.1
        short-range = { form = "lennard-jones", epsilon = 0.8, sigma = 3.75 }

        [[atom-types]]
        name = "CH2"
        charge = -0.1
        short-range = { form = "lennard-jones", epsilon = 0.4, sigma = 3.95 }

        [[species]]
        name = "butane"
        atoms = [
            { name = "C1", type = "CH3" },
            { name = "C2", type = "CH2" },
            { name = "C3", type = "CH2" },
            { name = "C4", type = "CH3", charge = 0.2 },
        ]
        bonds = [
            { atoms = [0, 1], form = "harmonic", params = [1000.0, 1.54] },
            { atoms = [1, 2], form = "harmonic", params = [1000.0, 1.54] },
            { atoms = [2, 3], form = "harmonic", params = [1000.0, 1.54] },
        ]
        angles = [
            { atoms = [0, 1, 2], form = "harmonic", params = [500.0, 114.0] },
            { atoms = [1, 2, 3], form = "harmonic", params = [500.0, 114.0] },
        ]
        torsions = [
            { atoms = [0, 1, 2, 3], form = "cos3", params = [2.9, -0.6, 13.3], elec-scale = 0.5, vdw-scale = 0.25 },
        ]

        [[external-potentials]]
        name = "wall"
        form = "spherical"
        origin = [15.0, 15.0, 15.0]
        radius = 12.0
        k = 100.0

        [[molecules]]
        species = "butane"
        positions = [[1.0, 1.0, 1.0], [2.5, 1.0, 1.0], [3.0, 2.4, 1.0], [4.5, 2.4, 1.0]]
        potentials = ["wall"]

        [[molecules]]
        species = "butane"
        positions = [[10.0, 1.0, 1.0], [11.5, 1.0, 1.0], [12.0, 2.4, 1.0], [13.5, 2.4, 1.0]]
    "#;

    fn write_definition(content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("system.toml");
        fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn load_and_build_complete_system() {
        let (_dir, path) = write_definition(BUTANE_LIKE);
        let def = SystemDefinition::load(&path).unwrap();
        let system = def.build().unwrap();

        assert_eq!(system.species.len(), 1);
        let butane = &system.species[0];
        assert_eq!(butane.n_atoms(), 4);
        assert_eq!(butane.bonds().len(), 3);
        assert_eq!(butane.angles().len(), 2);
        assert_eq!(butane.torsions().len(), 1);
        assert_eq!(butane.atoms()[0].charge, 0.1);
        assert_eq!(butane.atoms()[3].charge, 0.2);
        assert_eq!(
            butane.scaling(0, 3),
            ScaledInteraction::Scaled {
                elec: 0.5,
                vdw: 0.25
            }
        );

        let cfg = &system.configuration;
        assert_eq!(cfg.n_molecules(), 2);
        assert_eq!(cfg.n_atoms(), 8);
        assert_eq!(cfg.external_potentials().len(), 1);
        assert_eq!(cfg.atoms().atom(0).targeted_potentials(), &[0]);
        assert!(cfg.atoms().atom(4).targeted_potentials().is_empty());
        assert_eq!(system.potential_map.range(), 10.0);
    }

    #[test]
    fn load_fails_for_missing_file() {
        let dir = tempdir().unwrap();
        let result = SystemDefinition::load(&dir.path().join("missing.toml"));
        assert!(matches!(result, Err(ParamLoadError::Io { .. })));
    }

    #[test]
    fn load_fails_for_malformed_toml() {
        let (_dir, path) = write_definition("this is not toml");
        let result = SystemDefinition::load(&path);
        assert!(matches!(result, Err(ParamLoadError::Toml { .. })));
    }

    #[test]
    fn build_reports_unknown_functional_form_by_name() {
        let content = BUTANE_LIKE.replace(r#"form = "cos3""#, r#"form = "ryckaert""#);
        let def: SystemDefinition = toml::from_str(&content).unwrap();
        let err = def.build().unwrap_err();
        match err {
            DefinitionError::Form { species, source } => {
                assert_eq!(species, "butane");
                assert!(source.to_string().contains("ryckaert"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn build_rejects_unknown_species_and_potential() {
        let content = BUTANE_LIKE.replacen(r#"species = "butane""#, r#"species = "pentane""#, 1);
        let def: SystemDefinition = toml::from_str(&content).unwrap();
        assert!(matches!(
            def.build(),
            Err(DefinitionError::UnknownSpecies(name)) if name == "pentane"
        ));

        let content = BUTANE_LIKE.replace(r#"potentials = ["wall"]"#, r#"potentials = ["floor"]"#);
        let def: SystemDefinition = toml::from_str(&content).unwrap();
        assert!(matches!(
            def.build(),
            Err(DefinitionError::UnknownPotential(name)) if name == "floor"
        ));
    }

    #[test]
    fn build_rejects_wrong_term_arity() {
        let content = BUTANE_LIKE.replace("atoms = [0, 1, 2, 3]", "atoms = [0, 1, 2]");
        let def: SystemDefinition = toml::from_str(&content).unwrap();
        assert!(matches!(
            def.build(),
            Err(DefinitionError::TermArity {
                kind: "torsion",
                expected: 4,
                found: 3,
                ..
            })
        ));
    }

    #[test]
    fn build_rejects_position_count_mismatch() {
        let content = BUTANE_LIKE.replace(
            "[[10.0, 1.0, 1.0], [11.5, 1.0, 1.0], [12.0, 2.4, 1.0], [13.5, 2.4, 1.0]]",
            "[[10.0, 1.0, 1.0]]",
        );
        let def: SystemDefinition = toml::from_str(&content).unwrap();
        assert!(matches!(
            def.build(),
            Err(DefinitionError::Configuration(
                ConfigurationError::AtomCountMismatch { .. }
            ))
        ));
    }
}
