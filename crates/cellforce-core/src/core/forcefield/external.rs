use crate::core::models::periodic_box::PeriodicBox;
use nalgebra::{Point3, Vector3};
use serde::Deserialize;

/// Position-dependent potential acting on individual atoms, independent of any partner.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(tag = "form", rename_all = "kebab-case")]
pub enum ExternalPotential {
    /// Harmonic wall confining targets to a sphere: zero inside `radius`,
    /// `0.5 k (d - radius)^2` outside, with `d` the minimum-image distance from `origin`.
    Spherical {
        origin: [f64; 3],
        radius: f64,
        k: f64,
    },
}

impl ExternalPotential {
    pub fn energy(&self, r: &Point3<f64>, periodic_box: &PeriodicBox) -> f64 {
        match self {
            ExternalPotential::Spherical { origin, radius, k } => {
                let d = periodic_box.minimum_distance(&Point3::from(*origin), r);
                if d <= *radius {
                    0.0
                } else {
                    0.5 * k * (d - radius).powi(2)
                }
            }
        }
    }

    pub fn force(&self, r: &Point3<f64>, periodic_box: &PeriodicBox) -> Vector3<f64> {
        match self {
            ExternalPotential::Spherical { origin, radius, k } => {
                let v = periodic_box.minimum_vector(&Point3::from(*origin), r);
                let d = v.norm();
                if d <= *radius {
                    Vector3::zeros()
                } else {
                    v * (-k * (d - radius) / d)
                }
            }
        }
    }
}
