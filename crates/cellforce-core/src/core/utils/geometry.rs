use nalgebra::Vector3;

/// Angle in degrees between two vectors sharing a vertex, `v_ji = r_i - r_j` and
/// `v_jk = r_k - r_j`.
pub fn angle_in_degrees(v_ji: &Vector3<f64>, v_jk: &Vector3<f64>) -> f64 {
    let cos_theta = v_ji.normalize().dot(&v_jk.normalize()).clamp(-1.0, 1.0);
    cos_theta.acos().to_degrees()
}

/// Signed dihedral angle in degrees, in `(-180, 180]`, for the bond vectors
/// `v_ij = r_j - r_i`, `v_jk = r_k - r_j` and `v_kl = r_l - r_k`.
pub fn torsion_in_degrees(v_ij: &Vector3<f64>, v_jk: &Vector3<f64>, v_kl: &Vector3<f64>) -> f64 {
    let n1 = v_ij.cross(v_jk);
    let n2 = v_jk.cross(v_kl);
    let y = v_jk.norm() * v_ij.dot(&n2);
    let x = n1.dot(&n2);
    y.atan2(x).to_degrees()
}
