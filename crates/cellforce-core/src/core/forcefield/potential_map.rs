use super::params::{
    AtomType, CoulombTruncation, PairPotentialSettings, ShortRangeForm, ShortRangeTruncation,
};
use super::potentials;
use crate::core::models::atom::AtomRef;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ForcefieldError {
    #[error("Cannot combine short-range forms '{form_a}' ({type_a}) and '{form_b}' ({type_b})")]
    IncompatibleForms {
        type_a: String,
        form_a: &'static str,
        type_b: String,
        form_b: &'static str,
    },
    #[error("Pair potential range must be positive, got {0}")]
    InvalidRange(f64),
    #[error("Cosine truncation width {width} must lie within (0, {range}]")]
    InvalidTruncationWidth { width: f64, range: f64 },
    #[error("Dielectric constant must be positive, got {0}")]
    InvalidDielectric(f64),
    #[error("Duplicate atom type '{0}'")]
    DuplicateAtomType(String),
    #[error("Unknown atom type '{0}'")]
    UnknownAtomType(String),
}

/// Mixed short-range parameters for an ordered pair of atom types.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PairInteraction {
    None,
    LennardJones { epsilon: f64, sigma: f64 },
}

impl PairInteraction {
    fn combine(a: &AtomType, b: &AtomType) -> Result<Self, ForcefieldError> {
        use ShortRangeForm::*;
        let pair = match (&a.short_range, &b.short_range) {
            (None, _) | (_, None) => PairInteraction::None,
            (
                LennardJones {
                    epsilon: ea,
                    sigma: sa,
                },
                LennardJones {
                    epsilon: eb,
                    sigma: sb,
                },
            ) => PairInteraction::LennardJones {
                epsilon: (ea * eb).sqrt(),
                sigma: 0.5 * (sa + sb),
            },
            (
                LennardJonesGeometric {
                    epsilon: ea,
                    sigma: sa,
                },
                LennardJonesGeometric {
                    epsilon: eb,
                    sigma: sb,
                },
            ) => PairInteraction::LennardJones {
                epsilon: (ea * eb).sqrt(),
                sigma: (sa * sb).sqrt(),
            },
            (form_a, form_b) => {
                return Err(ForcefieldError::IncompatibleForms {
                    type_a: a.name.clone(),
                    form_a: form_a.name(),
                    type_b: b.name.clone(),
                    form_b: form_b.name(),
                });
            }
        };
        Ok(pair)
    }

    #[inline]
    fn energy(&self, r: f64) -> f64 {
        match *self {
            PairInteraction::None => 0.0,
            PairInteraction::LennardJones { epsilon, sigma } => {
                potentials::lennard_jones_12_6(r, epsilon, sigma)
            }
        }
    }

    #[inline]
    fn derivative(&self, r: f64) -> f64 {
        match *self {
            PairInteraction::None => 0.0,
            PairInteraction::LennardJones { epsilon, sigma } => {
                potentials::lennard_jones_12_6_derivative(r, epsilon, sigma)
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct PairEntry {
    interaction: PairInteraction,
    energy_at_range: f64,
    derivative_at_range: f64,
}

/// Symmetric type-pair matrix of analytic pair potentials.
///
/// Every pair energy is the sum of a mixed short-range term and a Coulomb term from the
/// product of the two atom charges, each truncated according to the
/// [`PairPotentialSettings`]. Callers are expected to reject separations beyond
/// [`PotentialMap::range`] before evaluating.
#[derive(Debug, Clone)]
pub struct PotentialMap {
    types: Vec<AtomType>,
    settings: PairPotentialSettings,
    entries: Vec<PairEntry>,
}

impl PotentialMap {
    pub fn new(
        types: Vec<AtomType>,
        settings: PairPotentialSettings,
    ) -> Result<Self, ForcefieldError> {
        if !(settings.range > 0.0) {
            return Err(ForcefieldError::InvalidRange(settings.range));
        }
        if !(settings.dielectric > 0.0) {
            return Err(ForcefieldError::InvalidDielectric(settings.dielectric));
        }
        if let ShortRangeTruncation::Cosine { width } = settings.short_range_truncation {
            if !(width > 0.0 && width <= settings.range) {
                return Err(ForcefieldError::InvalidTruncationWidth {
                    width,
                    range: settings.range,
                });
            }
        }
        for (i, ty) in types.iter().enumerate() {
            if types[..i].iter().any(|other| other.name == ty.name) {
                return Err(ForcefieldError::DuplicateAtomType(ty.name.clone()));
            }
        }

        let n = types.len();
        let mut entries = Vec::with_capacity(n * n);
        for a in &types {
            for b in &types {
                let interaction = PairInteraction::combine(a, b)?;
                entries.push(PairEntry {
                    interaction,
                    energy_at_range: interaction.energy(settings.range),
                    derivative_at_range: interaction.derivative(settings.range),
                });
            }
        }

        Ok(Self {
            types,
            settings,
            entries,
        })
    }

    #[inline]
    pub fn range(&self) -> f64 {
        self.settings.range
    }

    pub fn settings(&self) -> &PairPotentialSettings {
        &self.settings
    }

    pub fn n_types(&self) -> usize {
        self.types.len()
    }

    pub fn atom_type(&self, index: usize) -> Option<&AtomType> {
        self.types.get(index)
    }

    pub fn type_index(&self, name: &str) -> Result<usize, ForcefieldError> {
        self.types
            .iter()
            .position(|t| t.name == name)
            .ok_or_else(|| ForcefieldError::UnknownAtomType(name.to_string()))
    }

    pub fn interaction(&self, type_i: usize, type_j: usize) -> PairInteraction {
        self.entry(type_i, type_j).interaction
    }

    #[inline]
    fn entry(&self, type_i: usize, type_j: usize) -> &PairEntry {
        &self.entries[type_i * self.types.len() + type_j]
    }

    pub fn short_range_energy(&self, type_i: usize, type_j: usize, r: f64) -> f64 {
        let entry = self.entry(type_i, type_j);
        let rc = self.settings.range;
        match self.settings.short_range_truncation {
            ShortRangeTruncation::None => entry.interaction.energy(r),
            ShortRangeTruncation::Shifted => {
                entry.interaction.energy(r)
                    - entry.energy_at_range
                    - (r - rc) * entry.derivative_at_range
            }
            ShortRangeTruncation::Cosine { width } => {
                let (switch, _) = potentials::cosine_switch(r, rc, width);
                entry.interaction.energy(r) * switch
            }
        }
    }

    pub fn short_range_derivative(&self, type_i: usize, type_j: usize, r: f64) -> f64 {
        let entry = self.entry(type_i, type_j);
        let rc = self.settings.range;
        match self.settings.short_range_truncation {
            ShortRangeTruncation::None => entry.interaction.derivative(r),
            ShortRangeTruncation::Shifted => {
                entry.interaction.derivative(r) - entry.derivative_at_range
            }
            ShortRangeTruncation::Cosine { width } => {
                let (switch, dswitch) = potentials::cosine_switch(r, rc, width);
                entry.interaction.derivative(r) * switch + entry.interaction.energy(r) * dswitch
            }
        }
    }

    pub fn coulomb_energy(&self, qq: f64, r: f64) -> f64 {
        if !self.settings.include_charges {
            return 0.0;
        }
        match self.settings.coulomb_truncation {
            CoulombTruncation::None => potentials::coulomb(r, qq, self.settings.dielectric),
            CoulombTruncation::Shifted => potentials::coulomb_shifted(
                r,
                qq,
                self.settings.dielectric,
                self.settings.range,
            ),
        }
    }

    pub fn coulomb_derivative(&self, qq: f64, r: f64) -> f64 {
        if !self.settings.include_charges {
            return 0.0;
        }
        match self.settings.coulomb_truncation {
            CoulombTruncation::None => {
                potentials::coulomb_derivative(r, qq, self.settings.dielectric)
            }
            CoulombTruncation::Shifted => potentials::coulomb_shifted_derivative(
                r,
                qq,
                self.settings.dielectric,
                self.settings.range,
            ),
        }
    }

    #[inline]
    pub fn energy(&self, i: AtomRef<'_>, j: AtomRef<'_>, r: f64) -> f64 {
        self.short_range_energy(i.master_type(), j.master_type(), r)
            + self.coulomb_energy(i.charge() * j.charge(), r)
    }

    #[inline]
    pub fn energy_scaled(
        &self,
        i: AtomRef<'_>,
        j: AtomRef<'_>,
        r: f64,
        elec_scale: f64,
        vdw_scale: f64,
    ) -> f64 {
        self.short_range_energy(i.master_type(), j.master_type(), r) * vdw_scale
            + self.coulomb_energy(i.charge() * j.charge(), r) * elec_scale
    }

    /// Radial force magnitude `-dU/dr`; positive values push the pair apart.
    #[inline]
    pub fn force(&self, i: AtomRef<'_>, j: AtomRef<'_>, r: f64) -> f64 {
        -(self.short_range_derivative(i.master_type(), j.master_type(), r)
            + self.coulomb_derivative(i.charge() * j.charge(), r))
    }

    #[inline]
    pub fn force_scaled(
        &self,
        i: AtomRef<'_>,
        j: AtomRef<'_>,
        r: f64,
        elec_scale: f64,
        vdw_scale: f64,
    ) -> f64 {
        -(self.short_range_derivative(i.master_type(), j.master_type(), r) * vdw_scale
            + self.coulomb_derivative(i.charge() * j.charge(), r) * elec_scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::forcefield::params::PairPotentialSettings;

    const TOLERANCE: f64 = 1e-9;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    fn lj_type(name: &str, epsilon: f64, sigma: f64) -> AtomType {
        AtomType {
            name: name.to_string(),
            charge: 0.0,
            short_range: ShortRangeForm::LennardJones { epsilon, sigma },
        }
    }

    #[test]
    fn lorentz_berthelot_mixing_is_applied() {
        let map = PotentialMap::new(
            vec![lj_type("A", 0.25, 3.0), lj_type("B", 1.0, 4.0)],
            PairPotentialSettings::with_range(10.0),
        )
        .unwrap();
        assert_eq!(
            map.interaction(0, 1),
            PairInteraction::LennardJones {
                epsilon: 0.5,
                sigma: 3.5
            }
        );
        assert_eq!(map.interaction(0, 1), map.interaction(1, 0));
    }

    #[test]
    fn geometric_mixing_uses_geometric_sigma() {
        let geometric = |name: &str, epsilon: f64, sigma: f64| AtomType {
            name: name.to_string(),
            charge: 0.0,
            short_range: ShortRangeForm::LennardJonesGeometric { epsilon, sigma },
        };
        let map = PotentialMap::new(
            vec![geometric("A", 1.0, 2.0), geometric("B", 4.0, 8.0)],
            PairPotentialSettings::with_range(10.0),
        )
        .unwrap();
        assert_eq!(
            map.interaction(0, 1),
            PairInteraction::LennardJones {
                epsilon: 2.0,
                sigma: 4.0
            }
        );
    }

    #[test]
    fn mixing_incompatible_forms_is_an_error() {
        let result = PotentialMap::new(
            vec![
                lj_type("A", 0.4, 3.0),
                AtomType {
                    name: "B".to_string(),
                    charge: 0.0,
                    short_range: ShortRangeForm::LennardJonesGeometric {
                        epsilon: 0.1,
                        sigma: 3.0,
                    },
                },
            ],
            PairPotentialSettings::with_range(10.0),
        );
        assert!(matches!(
            result,
            Err(ForcefieldError::IncompatibleForms { .. })
        ));
    }

    #[test]
    fn untyped_partner_switches_off_short_range() {
        let map = PotentialMap::new(
            vec![
                lj_type("A", 0.4, 3.0),
                AtomType {
                    name: "H".to_string(),
                    charge: 0.4,
                    short_range: ShortRangeForm::None,
                },
            ],
            PairPotentialSettings::with_range(10.0),
        )
        .unwrap();
        assert_eq!(map.interaction(0, 1), PairInteraction::None);
        assert_eq!(map.short_range_energy(0, 1, 2.0), 0.0);
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let mut settings = PairPotentialSettings::with_range(0.0);
        assert_eq!(
            PotentialMap::new(vec![], settings).unwrap_err(),
            ForcefieldError::InvalidRange(0.0)
        );
        settings.range = 8.0;
        settings.short_range_truncation = ShortRangeTruncation::Cosine { width: 9.0 };
        assert!(matches!(
            PotentialMap::new(vec![], settings),
            Err(ForcefieldError::InvalidTruncationWidth { .. })
        ));
        settings.short_range_truncation = ShortRangeTruncation::None;
        settings.dielectric = 0.0;
        assert!(matches!(
            PotentialMap::new(vec![], settings),
            Err(ForcefieldError::InvalidDielectric(_))
        ));
    }

    #[test]
    fn duplicate_type_names_are_rejected() {
        let result = PotentialMap::new(
            vec![lj_type("A", 0.4, 3.0), lj_type("A", 0.5, 3.0)],
            PairPotentialSettings::with_range(10.0),
        );
        assert_eq!(
            result.unwrap_err(),
            ForcefieldError::DuplicateAtomType("A".to_string())
        );
    }

    #[test]
    fn shifted_short_range_vanishes_at_range() {
        let map = PotentialMap::new(
            vec![lj_type("A", 0.65, 3.2)],
            PairPotentialSettings::with_range(9.0),
        )
        .unwrap();
        assert!(map.short_range_energy(0, 0, 9.0).abs() < 1e-12);
        assert!(map.short_range_derivative(0, 0, 9.0).abs() < 1e-12);
    }

    #[test]
    fn untruncated_short_range_matches_plain_lennard_jones() {
        let mut settings = PairPotentialSettings::with_range(9.0);
        settings.short_range_truncation = ShortRangeTruncation::None;
        let map = PotentialMap::new(vec![lj_type("A", 0.65, 3.2)], settings).unwrap();
        assert!(f64_approx_equal(
            map.short_range_energy(0, 0, 4.0),
            potentials::lennard_jones_12_6(4.0, 0.65, 3.2)
        ));
    }

    #[test]
    fn truncated_derivatives_match_finite_differences() {
        let schemes = [
            ShortRangeTruncation::None,
            ShortRangeTruncation::Shifted,
            ShortRangeTruncation::Cosine { width: 2.0 },
        ];
        for scheme in schemes {
            let mut settings = PairPotentialSettings::with_range(9.0);
            settings.short_range_truncation = scheme;
            let map = PotentialMap::new(vec![lj_type("A", 0.65, 3.2)], settings).unwrap();
            for r in [3.1, 5.0, 7.5, 8.2] {
                let h = 1e-6;
                let numeric = (map.short_range_energy(0, 0, r + h)
                    - map.short_range_energy(0, 0, r - h))
                    / (2.0 * h);
                assert!(
                    (numeric - map.short_range_derivative(0, 0, r)).abs() < 1e-5,
                    "{:?} at {}",
                    scheme,
                    r
                );
            }
        }
    }

    #[test]
    fn coulomb_can_be_switched_off() {
        let mut settings = PairPotentialSettings::with_range(9.0);
        settings.include_charges = false;
        let map = PotentialMap::new(vec![], settings).unwrap();
        assert_eq!(map.coulomb_energy(1.0, 3.0), 0.0);
        assert_eq!(map.coulomb_derivative(1.0, 3.0), 0.0);
    }

    #[test]
    fn type_index_reports_unknown_names() {
        let map = PotentialMap::new(
            vec![lj_type("A", 0.4, 3.0)],
            PairPotentialSettings::with_range(10.0),
        )
        .unwrap();
        assert_eq!(map.type_index("A"), Ok(0));
        assert_eq!(
            map.type_index("Z"),
            Err(ForcefieldError::UnknownAtomType("Z".to_string()))
        );
        assert_eq!(map.n_types(), 1);
        assert_eq!(map.atom_type(0).map(|t| t.name.as_str()), Some("A"));
    }
}
