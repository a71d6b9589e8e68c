use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
#[serde(tag = "form", rename_all = "kebab-case")]
pub enum ShortRangeForm {
    #[default]
    None,
    /// Lennard-Jones 12-6, mixed with Lorentz-Berthelot rules.
    LennardJones { epsilon: f64, sigma: f64 },
    /// Lennard-Jones 12-6, mixed with geometric means for both parameters.
    LennardJonesGeometric { epsilon: f64, sigma: f64 },
}

impl ShortRangeForm {
    pub fn name(&self) -> &'static str {
        match self {
            ShortRangeForm::None => "none",
            ShortRangeForm::LennardJones { .. } => "lennard-jones",
            ShortRangeForm::LennardJonesGeometric { .. } => "lennard-jones-geometric",
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AtomType {
    pub name: String,
    #[serde(default)]
    pub charge: f64,
    #[serde(default, rename = "short-range")]
    pub short_range: ShortRangeForm,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(tag = "scheme", rename_all = "kebab-case")]
pub enum ShortRangeTruncation {
    None,
    /// Energy and force shifted so both vanish at the range.
    Shifted,
    /// Energy smoothly switched off over `width` Angstroms before the range.
    Cosine { width: f64 },
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum CoulombTruncation {
    None,
    Shifted,
}

fn default_dielectric() -> f64 {
    1.0
}

fn default_include_charges() -> bool {
    true
}

fn default_short_range_truncation() -> ShortRangeTruncation {
    ShortRangeTruncation::Shifted
}

fn default_coulomb_truncation() -> CoulombTruncation {
    CoulombTruncation::Shifted
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct PairPotentialSettings {
    pub range: f64,
    #[serde(default = "default_short_range_truncation")]
    pub short_range_truncation: ShortRangeTruncation,
    #[serde(default = "default_coulomb_truncation")]
    pub coulomb_truncation: CoulombTruncation,
    #[serde(default = "default_dielectric")]
    pub dielectric: f64,
    #[serde(default = "default_include_charges")]
    pub include_charges: bool,
}

impl PairPotentialSettings {
    pub fn with_range(range: f64) -> Self {
        Self {
            range,
            short_range_truncation: default_short_range_truncation(),
            coulomb_truncation: default_coulomb_truncation(),
            dielectric: default_dielectric(),
            include_charges: default_include_charges(),
        }
    }
}
