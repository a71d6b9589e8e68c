use nalgebra::{Matrix3, Point3, Vector3};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum BoxError {
    #[error("Box axis lengths must be positive and finite, got ({a}, {b}, {c})")]
    InvalidLength { a: f64, b: f64, c: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoxKind {
    Cubic,
    Orthorhombic,
}

/// A periodic simulation cell with mutually orthogonal axes.
///
/// All positions handed to the box are in Angstroms. Fractional coordinates run over
/// `[0, 1)` along each axis once folded.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodicBox {
    kind: BoxKind,
    lengths: Vector3<f64>,
    reciprocal: Vector3<f64>,
}

impl PeriodicBox {
    pub fn cubic(a: f64) -> Result<Self, BoxError> {
        Self::with_lengths(BoxKind::Cubic, a, a, a)
    }

    pub fn orthorhombic(a: f64, b: f64, c: f64) -> Result<Self, BoxError> {
        Self::with_lengths(BoxKind::Orthorhombic, a, b, c)
    }

    fn with_lengths(kind: BoxKind, a: f64, b: f64, c: f64) -> Result<Self, BoxError> {
        let valid = |x: f64| x.is_finite() && x > 0.0;
        if !(valid(a) && valid(b) && valid(c)) {
            return Err(BoxError::InvalidLength { a, b, c });
        }
        Ok(Self {
            kind,
            lengths: Vector3::new(a, b, c),
            reciprocal: Vector3::new(1.0 / a, 1.0 / b, 1.0 / c),
        })
    }

    #[inline]
    pub fn kind(&self) -> BoxKind {
        self.kind
    }

    #[inline]
    pub fn axis_lengths(&self) -> Vector3<f64> {
        self.lengths
    }

    pub fn shortest_axis_length(&self) -> f64 {
        self.lengths.min()
    }

    pub fn volume(&self) -> f64 {
        self.lengths.x * self.lengths.y * self.lengths.z
    }

    /// Axis vectors as matrix columns.
    pub fn axes(&self) -> Matrix3<f64> {
        Matrix3::from_diagonal(&self.lengths)
    }

    #[inline]
    pub fn to_fractional(&self, r: &Point3<f64>) -> Point3<f64> {
        Point3::from(r.coords.component_mul(&self.reciprocal))
    }

    #[inline]
    pub fn to_real(&self, frac: &Point3<f64>) -> Point3<f64> {
        Point3::from(frac.coords.component_mul(&self.lengths))
    }

    /// Folds a fractional coordinate into `[0, 1)` along every axis.
    #[inline]
    pub fn fold_fractional(&self, frac: &Point3<f64>) -> Point3<f64> {
        Point3::from(frac.coords.map(|x| {
            let folded = x - x.floor();
            // floor() can leave exactly 1.0 for tiny negative inputs
            if folded >= 1.0 { 0.0 } else { folded }
        }))
    }

    #[inline]
    pub fn fold(&self, r: &Point3<f64>) -> Point3<f64> {
        self.to_real(&self.fold_fractional(&self.to_fractional(r)))
    }

    /// Vector from `r1` to the nearest periodic image of `r2`.
    #[inline]
    pub fn minimum_vector(&self, r1: &Point3<f64>, r2: &Point3<f64>) -> Vector3<f64> {
        let mut d = r2 - r1;
        for k in 0..3 {
            d[k] -= self.lengths[k] * (d[k] * self.reciprocal[k]).round();
        }
        d
    }

    #[inline]
    pub fn minimum_distance_squared(&self, r1: &Point3<f64>, r2: &Point3<f64>) -> f64 {
        self.minimum_vector(r1, r2).norm_squared()
    }

    #[inline]
    pub fn minimum_distance(&self, r1: &Point3<f64>, r2: &Point3<f64>) -> f64 {
        self.minimum_vector(r1, r2).norm()
    }
}
