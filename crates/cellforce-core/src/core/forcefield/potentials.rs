pub const COULOMB_CONSTANT: f64 = 138.935458; // In kJ·Å/(mol·e²)

#[inline]
pub fn lennard_jones_12_6(dist: f64, epsilon: f64, sigma: f64) -> f64 {
    let sr6 = (sigma / dist).powi(6);
    4.0 * epsilon * (sr6 * sr6 - sr6)
}

/// `dU/dr` of [`lennard_jones_12_6`].
#[inline]
pub fn lennard_jones_12_6_derivative(dist: f64, epsilon: f64, sigma: f64) -> f64 {
    let sr6 = (sigma / dist).powi(6);
    -24.0 * epsilon * (2.0 * sr6 * sr6 - sr6) / dist
}

#[inline]
pub fn coulomb(dist: f64, qq: f64, dielectric: f64) -> f64 {
    COULOMB_CONSTANT * qq / (dielectric * dist)
}

#[inline]
pub fn coulomb_derivative(dist: f64, qq: f64, dielectric: f64) -> f64 {
    -COULOMB_CONSTANT * qq / (dielectric * dist * dist)
}

/// Shifted-force Coulomb: energy and force both vanish at `cutoff`.
#[inline]
pub fn coulomb_shifted(dist: f64, qq: f64, dielectric: f64, cutoff: f64) -> f64 {
    COULOMB_CONSTANT * qq / dielectric * (1.0 / dist + dist / (cutoff * cutoff) - 2.0 / cutoff)
}

#[inline]
pub fn coulomb_shifted_derivative(dist: f64, qq: f64, dielectric: f64, cutoff: f64) -> f64 {
    COULOMB_CONSTANT * qq / dielectric * (1.0 / (cutoff * cutoff) - 1.0 / (dist * dist))
}

/// Smooth switch that takes a short-range energy to zero over the last `width` Angstroms
/// before `cutoff`. Returns the multiplier and its derivative.
#[inline]
pub fn cosine_switch(dist: f64, cutoff: f64, width: f64) -> (f64, f64) {
    let start = cutoff - width;
    if dist <= start {
        return (1.0, 0.0);
    }
    let x = std::f64::consts::PI * (dist - start) / width;
    (
        0.5 * (1.0 + x.cos()),
        -0.5 * std::f64::consts::PI / width * x.sin(),
    )
}
