use crate::core::forcefield::intramolecular::{AngleForm, BondForm, TorsionForm};
use crate::core::forcefield::params::{AtomType, PairPotentialSettings, ShortRangeForm};
use crate::core::forcefield::potential_map::PotentialMap;
use crate::core::models::configuration::Configuration;
use crate::core::models::periodic_box::PeriodicBox;
use crate::core::models::species::Species;
use crate::engine::context::KernelContext;
use crate::engine::process_pool::ProcessPool;
use nalgebra::{Point3, Vector3};
use std::sync::Arc;

pub(crate) fn lcg(seed: &mut u64) -> f64 {
    *seed = seed
        .wrapping_mul(6364136223846793005)
        .wrapping_add(1442695040888963407);
    (*seed >> 11) as f64 / (1u64 << 53) as f64
}

pub(crate) fn atom_types() -> Vec<AtomType> {
    vec![
        AtomType {
            name: "CX".to_string(),
            charge: 0.25,
            short_range: ShortRangeForm::LennardJones {
                epsilon: 0.6,
                sigma: 2.2,
            },
        },
        AtomType {
            name: "OX".to_string(),
            charge: -0.5,
            short_range: ShortRangeForm::LennardJones {
                epsilon: 0.9,
                sigma: 2.0,
            },
        },
    ]
}

/// Four-atom chain with two bonds, two angles, one torsion and one improper.
///
/// Atoms 0 and 3 form the only scaled (1-4) pair.
pub(crate) fn chain_species() -> Arc<Species> {
    let mut species = Species::new("chain");
    species.add_atom("C1", 0, 0.25);
    species.add_atom("O2", 1, -0.5);
    species.add_atom("C3", 0, 0.25);
    species.add_atom("C4", 0, 0.0);
    species
        .add_bond(0, 1, BondForm::Harmonic { k: 1200.0, eq: 1.5 })
        .unwrap();
    species
        .add_bond(1, 2, BondForm::Harmonic { k: 1200.0, eq: 1.5 })
        .unwrap();
    species
        .add_bond(2, 3, BondForm::Morse {
            d: 300.0,
            alpha: 2.0,
            eq: 1.5,
        })
        .unwrap();
    species
        .add_angle(0, 1, 2, AngleForm::Harmonic { k: 400.0, eq: 109.5 })
        .unwrap();
    species
        .add_angle(1, 2, 3, AngleForm::Harmonic { k: 400.0, eq: 109.5 })
        .unwrap();
    species
        .add_torsion(
            [0, 1, 2, 3],
            TorsionForm::Cos3 {
                k1: 3.0,
                k2: -1.0,
                k3: 6.0,
            },
        )
        .unwrap();
    species
        .add_improper(
            [1, 0, 2, 3],
            TorsionForm::Cosine {
                k: 2.0,
                n: 2.0,
                eq: 0.0,
                s: -1.0,
            },
        )
        .unwrap();
    Arc::new(species)
}

/// Template coordinates of the chain, roughly at its equilibrium geometry.
pub(crate) fn chain_template() -> [Vector3<f64>; 4] {
    [
        Vector3::new(0.0, 0.0, 0.0),
        Vector3::new(1.45, 0.3, 0.0),
        Vector3::new(1.95, 1.7, 0.2),
        Vector3::new(3.4, 1.9, 0.9),
    ]
}

pub(crate) struct Fixture {
    pub configuration: Configuration,
    pub potential_map: PotentialMap,
    pub pool: ProcessPool,
    pub cutoff: f64,
}

impl Fixture {
    pub fn context(&self) -> KernelContext<'_> {
        KernelContext::new(
            &self.configuration,
            &self.potential_map,
            &self.pool,
            self.cutoff,
        )
        .unwrap()
    }
}

/// Closest approach allowed between atoms of different chains in [`chain_fluid`].
pub(crate) const MIN_SEPARATION: f64 = 2.2;

const MAX_PLACEMENT_ATTEMPTS: usize = 10_000;

/// `n_molecules` chains at pseudo-random places in a cubic box, partitioned for `cutoff`.
///
/// Candidate placements bringing any atom within [`MIN_SEPARATION`] of an already placed
/// chain are rejected.
pub(crate) fn chain_fluid(n_molecules: usize, box_length: f64, cutoff: f64, seed: u64) -> Fixture {
    let mut seed = seed;
    let species = chain_species();
    let periodic_box = PeriodicBox::cubic(box_length).unwrap();
    let mut placed: Vec<Point3<f64>> = Vec::new();
    let mut configuration = Configuration::new(periodic_box.clone());
    for _ in 0..n_molecules {
        let mut attempts = 0;
        let positions = loop {
            attempts += 1;
            assert!(
                attempts <= MAX_PLACEMENT_ATTEMPTS,
                "could not place {n_molecules} chains in a box of {box_length}"
            );
            let centre = Vector3::new(
                lcg(&mut seed) * box_length,
                lcg(&mut seed) * box_length,
                lcg(&mut seed) * box_length,
            );
            let candidate: Vec<Point3<f64>> = chain_template()
                .iter()
                .map(|v| Point3::from(centre + v))
                .collect();
            let clear = candidate.iter().all(|p| {
                placed.iter().all(|q| {
                    periodic_box.minimum_distance_squared(p, q) >= MIN_SEPARATION * MIN_SEPARATION
                })
            });
            if clear {
                break candidate;
            }
        };
        placed.extend_from_slice(&positions);
        configuration.add_molecule(species.clone(), &positions).unwrap();
    }
    configuration.generate_cells(cutoff, cutoff).unwrap();
    let potential_map =
        PotentialMap::new(atom_types(), PairPotentialSettings::with_range(cutoff)).unwrap();
    Fixture {
        configuration,
        potential_map,
        pool: ProcessPool::serial(),
        cutoff,
    }
}

pub(crate) fn relative_difference(a: f64, b: f64) -> f64 {
    let scale = a.abs().max(b.abs());
    if scale == 0.0 { 0.0 } else { (a - b).abs() / scale }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_fluid_keeps_different_chains_apart() {
        let fixture = chain_fluid(40, 30.0, 6.0, 17);
        let cfg = &fixture.configuration;
        let molecules: Vec<_> = cfg.molecules().map(|(_, m)| m).collect();
        for (a, first) in molecules.iter().enumerate() {
            for second in &molecules[a + 1..] {
                for &i in first.atoms() {
                    for &j in second.atoms() {
                        let d = cfg
                            .periodic_box()
                            .minimum_distance(cfg.atoms().position(i), cfg.atoms().position(j));
                        assert!(d >= MIN_SEPARATION - 1e-9, "atoms {i} and {j} at {d}");
                    }
                }
            }
        }
    }
}
