use phf::{Map, phf_map};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum FormError {
    #[error("Unknown {kind} functional form '{name}'")]
    UnknownForm { kind: &'static str, name: String },

    #[error("{kind} form '{form}' expects {expected} parameter(s), got {found}")]
    ParameterCount {
        kind: &'static str,
        form: &'static str,
        expected: Arity,
        found: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    AtLeast(usize),
}

impl std::fmt::Display for Arity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Arity::Exactly(n) => write!(f, "{}", n),
            Arity::AtLeast(n) => write!(f, "at least {}", n),
        }
    }
}

impl Arity {
    fn check(
        self,
        kind: &'static str,
        form: &'static str,
        params: &[f64],
    ) -> Result<(), FormError> {
        let ok = match self {
            Arity::Exactly(n) => params.len() == n,
            Arity::AtLeast(n) => params.len() >= n,
        };
        if ok {
            Ok(())
        } else {
            Err(FormError::ParameterCount {
                kind,
                form,
                expected: self,
                found: params.len(),
            })
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BondKeyword {
    None,
    Harmonic,
    Morse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AngleKeyword {
    None,
    Harmonic,
    Cosine,
    Cos2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TorsionKeyword {
    None,
    Cosine,
    Cos3,
    Cos3C,
    Cos4,
    CosN,
    CosNC,
    UffCosine,
    FourierN,
}

static BOND_KEYWORDS: Map<&'static str, BondKeyword> = phf_map! {
    "none" => BondKeyword::None,
    "harmonic" => BondKeyword::Harmonic,
    "morse" => BondKeyword::Morse,
};

static ANGLE_KEYWORDS: Map<&'static str, AngleKeyword> = phf_map! {
    "none" => AngleKeyword::None,
    "harmonic" => AngleKeyword::Harmonic,
    "cos" => AngleKeyword::Cosine,
    "cos2" => AngleKeyword::Cos2,
};

static TORSION_KEYWORDS: Map<&'static str, TorsionKeyword> = phf_map! {
    "none" => TorsionKeyword::None,
    "cos" => TorsionKeyword::Cosine,
    "cos3" => TorsionKeyword::Cos3,
    "cos3c" => TorsionKeyword::Cos3C,
    "cos4" => TorsionKeyword::Cos4,
    "cosn" => TorsionKeyword::CosN,
    "cosnc" => TorsionKeyword::CosNC,
    "uffcosine" => TorsionKeyword::UffCosine,
    "fouriern" => TorsionKeyword::FourierN,
};

/// Functional form of a bond stretch. Distances in Angstroms.
#[derive(Debug, Clone, PartialEq)]
pub enum BondForm {
    None,
    /// `U = 0.5 k (r - eq)^2`
    Harmonic { k: f64, eq: f64 },
    /// `U = D (1 - exp(-alpha (r - eq)))^2`
    Morse { d: f64, alpha: f64, eq: f64 },
}

impl BondForm {
    const KIND: &'static str = "bond";

    pub fn from_keyword(name: &str, params: &[f64]) -> Result<Self, FormError> {
        let keyword = BOND_KEYWORDS
            .get(name.to_ascii_lowercase().as_str())
            .copied()
            .ok_or_else(|| FormError::UnknownForm {
                kind: Self::KIND,
                name: name.to_string(),
            })?;
        let form = match keyword {
            BondKeyword::None => {
                Arity::Exactly(0).check(Self::KIND, "None", params)?;
                BondForm::None
            }
            BondKeyword::Harmonic => {
                Arity::Exactly(2).check(Self::KIND, "Harmonic", params)?;
                BondForm::Harmonic {
                    k: params[0],
                    eq: params[1],
                }
            }
            BondKeyword::Morse => {
                Arity::Exactly(3).check(Self::KIND, "Morse", params)?;
                BondForm::Morse {
                    d: params[0],
                    alpha: params[1],
                    eq: params[2],
                }
            }
        };
        Ok(form)
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            BondForm::None => "None",
            BondForm::Harmonic { .. } => "Harmonic",
            BondForm::Morse { .. } => "Morse",
        }
    }

    pub fn energy(&self, r: f64) -> f64 {
        match *self {
            BondForm::None => 0.0,
            BondForm::Harmonic { k, eq } => {
                let delta = r - eq;
                0.5 * k * delta * delta
            }
            BondForm::Morse { d, alpha, eq } => {
                let x = 1.0 - (-alpha * (r - eq)).exp();
                d * x * x
            }
        }
    }

    /// `dU/dr`.
    pub fn derivative(&self, r: f64) -> f64 {
        match *self {
            BondForm::None => 0.0,
            BondForm::Harmonic { k, eq } => k * (r - eq),
            BondForm::Morse { d, alpha, eq } => {
                let e = (-alpha * (r - eq)).exp();
                2.0 * d * alpha * e * (1.0 - e)
            }
        }
    }
}

/// Functional form of an angle bend. Angles are supplied in degrees; equilibrium
/// parameters are in degrees and force constants are per radian.
#[derive(Debug, Clone, PartialEq)]
pub enum AngleForm {
    None,
    /// `U = 0.5 k (theta - eq)^2`
    Harmonic { k: f64, eq: f64 },
    /// `U = k (1 + s cos(n theta - eq))`
    Cosine { k: f64, n: f64, eq: f64, s: f64 },
    /// `U = k (C0 + C1 cos(theta) + C2 cos(2 theta))`
    Cos2 { k: f64, c0: f64, c1: f64, c2: f64 },
}

impl AngleForm {
    const KIND: &'static str = "angle";

    pub fn from_keyword(name: &str, params: &[f64]) -> Result<Self, FormError> {
        let keyword = ANGLE_KEYWORDS
            .get(name.to_ascii_lowercase().as_str())
            .copied()
            .ok_or_else(|| FormError::UnknownForm {
                kind: Self::KIND,
                name: name.to_string(),
            })?;
        let form = match keyword {
            AngleKeyword::None => {
                Arity::Exactly(0).check(Self::KIND, "None", params)?;
                AngleForm::None
            }
            AngleKeyword::Harmonic => {
                Arity::Exactly(2).check(Self::KIND, "Harmonic", params)?;
                AngleForm::Harmonic {
                    k: params[0],
                    eq: params[1],
                }
            }
            AngleKeyword::Cosine => {
                Arity::Exactly(4).check(Self::KIND, "Cos", params)?;
                AngleForm::Cosine {
                    k: params[0],
                    n: params[1],
                    eq: params[2],
                    s: params[3],
                }
            }
            AngleKeyword::Cos2 => {
                Arity::Exactly(4).check(Self::KIND, "Cos2", params)?;
                AngleForm::Cos2 {
                    k: params[0],
                    c0: params[1],
                    c1: params[2],
                    c2: params[3],
                }
            }
        };
        Ok(form)
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            AngleForm::None => "None",
            AngleForm::Harmonic { .. } => "Harmonic",
            AngleForm::Cosine { .. } => "Cos",
            AngleForm::Cos2 { .. } => "Cos2",
        }
    }

    pub fn energy(&self, theta_degrees: f64) -> f64 {
        let theta = theta_degrees.to_radians();
        match *self {
            AngleForm::None => 0.0,
            AngleForm::Harmonic { k, eq } => {
                let delta = theta - eq.to_radians();
                0.5 * k * delta * delta
            }
            AngleForm::Cosine { k, n, eq, s } => k * (1.0 + s * (n * theta - eq.to_radians()).cos()),
            AngleForm::Cos2 { k, c0, c1, c2 } => {
                k * (c0 + c1 * theta.cos() + c2 * (2.0 * theta).cos())
            }
        }
    }

    /// `dU/dtheta` per radian.
    pub fn derivative(&self, theta_degrees: f64) -> f64 {
        let theta = theta_degrees.to_radians();
        match *self {
            AngleForm::None => 0.0,
            AngleForm::Harmonic { k, eq } => k * (theta - eq.to_radians()),
            AngleForm::Cosine { k, n, eq, s } => -k * n * s * (n * theta - eq.to_radians()).sin(),
            AngleForm::Cos2 { k, c1, c2, .. } => {
                -k * (c1 * theta.sin() + 2.0 * c2 * (2.0 * theta).sin())
            }
        }
    }
}

/// Functional form shared by torsions and impropers. Dihedral angles are supplied in
/// degrees.
#[derive(Debug, Clone, PartialEq)]
pub enum TorsionForm {
    None,
    /// `U = k (1 + s cos(n phi - eq))`
    Cosine { k: f64, n: f64, eq: f64, s: f64 },
    /// `U = 0.5 (k1 (1 + cos phi) + k2 (1 - cos 2phi) + k3 (1 + cos 3phi))`
    Cos3 { k1: f64, k2: f64, k3: f64 },
    /// `Cos3` plus a constant `k0`.
    Cos3C { k0: f64, k1: f64, k2: f64, k3: f64 },
    /// `Cos3` plus `0.5 k4 (1 - cos 4phi)`.
    Cos4 { k1: f64, k2: f64, k3: f64, k4: f64 },
    /// `U = sum_{n>=1} k_n (1 + cos(n phi))`
    CosN(Vec<f64>),
    /// `U = sum_{n>=0} k_n (1 + cos(n phi))`
    CosNC(Vec<f64>),
    /// `U = 0.5 k (1 - cos(n eq) cos(n phi))`
    UffCosine { k: f64, n: f64, eq: f64 },
    /// `U = k (C0 + sum_{n>=1} C_n cos(n phi))`
    FourierN { k: f64, coefficients: Vec<f64> },
}

impl TorsionForm {
    const KIND: &'static str = "torsion";

    pub fn from_keyword(name: &str, params: &[f64]) -> Result<Self, FormError> {
        let keyword = TORSION_KEYWORDS
            .get(name.to_ascii_lowercase().as_str())
            .copied()
            .ok_or_else(|| FormError::UnknownForm {
                kind: Self::KIND,
                name: name.to_string(),
            })?;
        let form = match keyword {
            TorsionKeyword::None => {
                Arity::Exactly(0).check(Self::KIND, "None", params)?;
                TorsionForm::None
            }
            TorsionKeyword::Cosine => {
                Arity::Exactly(4).check(Self::KIND, "Cos", params)?;
                TorsionForm::Cosine {
                    k: params[0],
                    n: params[1],
                    eq: params[2],
                    s: params[3],
                }
            }
            TorsionKeyword::Cos3 => {
                Arity::Exactly(3).check(Self::KIND, "Cos3", params)?;
                TorsionForm::Cos3 {
                    k1: params[0],
                    k2: params[1],
                    k3: params[2],
                }
            }
            TorsionKeyword::Cos3C => {
                Arity::Exactly(4).check(Self::KIND, "Cos3C", params)?;
                TorsionForm::Cos3C {
                    k0: params[0],
                    k1: params[1],
                    k2: params[2],
                    k3: params[3],
                }
            }
            TorsionKeyword::Cos4 => {
                Arity::Exactly(4).check(Self::KIND, "Cos4", params)?;
                TorsionForm::Cos4 {
                    k1: params[0],
                    k2: params[1],
                    k3: params[2],
                    k4: params[3],
                }
            }
            TorsionKeyword::CosN => {
                Arity::AtLeast(1).check(Self::KIND, "CosN", params)?;
                TorsionForm::CosN(params.to_vec())
            }
            TorsionKeyword::CosNC => {
                Arity::AtLeast(1).check(Self::KIND, "CosNC", params)?;
                TorsionForm::CosNC(params.to_vec())
            }
            TorsionKeyword::UffCosine => {
                Arity::Exactly(3).check(Self::KIND, "UFFCosine", params)?;
                TorsionForm::UffCosine {
                    k: params[0],
                    n: params[1],
                    eq: params[2],
                }
            }
            TorsionKeyword::FourierN => {
                Arity::AtLeast(2).check(Self::KIND, "FourierN", params)?;
                TorsionForm::FourierN {
                    k: params[0],
                    coefficients: params[1..].to_vec(),
                }
            }
        };
        Ok(form)
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            TorsionForm::None => "None",
            TorsionForm::Cosine { .. } => "Cos",
            TorsionForm::Cos3 { .. } => "Cos3",
            TorsionForm::Cos3C { .. } => "Cos3C",
            TorsionForm::Cos4 { .. } => "Cos4",
            TorsionForm::CosN(_) => "CosN",
            TorsionForm::CosNC(_) => "CosNC",
            TorsionForm::UffCosine { .. } => "UFFCosine",
            TorsionForm::FourierN { .. } => "FourierN",
        }
    }

    pub fn energy(&self, phi_degrees: f64) -> f64 {
        let phi = phi_degrees.to_radians();
        match self {
            TorsionForm::None => 0.0,
            TorsionForm::Cosine { k, n, eq, s } => k * (1.0 + s * (n * phi - eq.to_radians()).cos()),
            TorsionForm::Cos3 { k1, k2, k3 } => cos3_energy(*k1, *k2, *k3, phi),
            TorsionForm::Cos3C { k0, k1, k2, k3 } => k0 + cos3_energy(*k1, *k2, *k3, phi),
            TorsionForm::Cos4 { k1, k2, k3, k4 } => {
                cos3_energy(*k1, *k2, *k3, phi) + 0.5 * k4 * (1.0 - (4.0 * phi).cos())
            }
            TorsionForm::CosN(ks) => ks
                .iter()
                .enumerate()
                .map(|(i, k)| k * (1.0 + ((i + 1) as f64 * phi).cos()))
                .sum(),
            TorsionForm::CosNC(ks) => ks
                .iter()
                .enumerate()
                .map(|(n, k)| k * (1.0 + (n as f64 * phi).cos()))
                .sum(),
            TorsionForm::UffCosine { k, n, eq } => {
                0.5 * k * (1.0 - (n * eq.to_radians()).cos() * (n * phi).cos())
            }
            TorsionForm::FourierN { k, coefficients } => {
                k * coefficients
                    .iter()
                    .enumerate()
                    .map(|(n, c)| c * (n as f64 * phi).cos())
                    .sum::<f64>()
            }
        }
    }

    /// `dU/dphi` per radian.
    pub fn derivative(&self, phi_degrees: f64) -> f64 {
        let phi = phi_degrees.to_radians();
        match self {
            TorsionForm::None => 0.0,
            TorsionForm::Cosine { k, n, eq, s } => -k * n * s * (n * phi - eq.to_radians()).sin(),
            TorsionForm::Cos3 { k1, k2, k3 } | TorsionForm::Cos3C { k1, k2, k3, .. } => {
                cos3_derivative(*k1, *k2, *k3, phi)
            }
            TorsionForm::Cos4 { k1, k2, k3, k4 } => {
                cos3_derivative(*k1, *k2, *k3, phi) + 2.0 * k4 * (4.0 * phi).sin()
            }
            TorsionForm::CosN(ks) => ks
                .iter()
                .enumerate()
                .map(|(i, k)| {
                    let n = (i + 1) as f64;
                    -k * n * (n * phi).sin()
                })
                .sum(),
            TorsionForm::CosNC(ks) => ks
                .iter()
                .enumerate()
                .map(|(n, k)| {
                    let n = n as f64;
                    -k * n * (n * phi).sin()
                })
                .sum(),
            TorsionForm::UffCosine { k, n, eq } => {
                0.5 * k * n * (n * eq.to_radians()).cos() * (n * phi).sin()
            }
            TorsionForm::FourierN { k, coefficients } => {
                -k * coefficients
                    .iter()
                    .enumerate()
                    .map(|(n, c)| {
                        let n = n as f64;
                        c * n * (n * phi).sin()
                    })
                    .sum::<f64>()
            }
        }
    }
}

#[inline]
fn cos3_energy(k1: f64, k2: f64, k3: f64, phi: f64) -> f64 {
    0.5 * (k1 * (1.0 + phi.cos()) + k2 * (1.0 - (2.0 * phi).cos()) + k3 * (1.0 + (3.0 * phi).cos()))
}

#[inline]
fn cos3_derivative(k1: f64, k2: f64, k3: f64, phi: f64) -> f64 {
    0.5 * (-k1 * phi.sin() + 2.0 * k2 * (2.0 * phi).sin() - 3.0 * k3 * (3.0 * phi).sin())
}
