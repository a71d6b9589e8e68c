use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

/// Non-bonded energy split into inter- and intra-molecular parts.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PairPotentialEnergyValue {
    pub inter: f64,
    pub intra: f64,
}

impl PairPotentialEnergyValue {
    pub fn new(inter: f64, intra: f64) -> Self {
        Self { inter, intra }
    }

    #[inline]
    pub fn inter_molecular(&self) -> f64 {
        self.inter
    }

    #[inline]
    pub fn intra_molecular(&self) -> f64 {
        self.intra
    }

    #[inline]
    pub fn total(&self) -> f64 {
        self.inter + self.intra
    }
}

impl Add for PairPotentialEnergyValue {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            inter: self.inter + rhs.inter,
            intra: self.intra + rhs.intra,
        }
    }
}

impl Sub for PairPotentialEnergyValue {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            inter: self.inter - rhs.inter,
            intra: self.intra - rhs.intra,
        }
    }
}

impl Mul<f64> for PairPotentialEnergyValue {
    type Output = Self;

    fn mul(self, factor: f64) -> Self::Output {
        Self {
            inter: self.inter * factor,
            intra: self.intra * factor,
        }
    }
}

impl AddAssign for PairPotentialEnergyValue {
    fn add_assign(&mut self, rhs: Self) {
        self.inter += rhs.inter;
        self.intra += rhs.intra;
    }
}

impl SubAssign for PairPotentialEnergyValue {
    fn sub_assign(&mut self, rhs: Self) {
        self.inter -= rhs.inter;
        self.intra -= rhs.intra;
    }
}

impl Sum for PairPotentialEnergyValue {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), |acc, x| acc + x)
    }
}

/// Energy of one atom or molecule, broken down by contribution.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EnergyResult {
    pub pair_potential: PairPotentialEnergyValue,
    pub geometry: f64,
    pub extended: f64,
}

impl EnergyResult {
    pub fn new(pair_potential: PairPotentialEnergyValue, geometry: f64, extended: f64) -> Self {
        Self {
            pair_potential,
            geometry,
            extended,
        }
    }

    #[inline]
    pub fn total(&self) -> f64 {
        self.pair_potential.total() + self.geometry + self.extended
    }
}

impl Add for EnergyResult {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            pair_potential: self.pair_potential + rhs.pair_potential,
            geometry: self.geometry + rhs.geometry,
            extended: self.extended + rhs.extended,
        }
    }
}

impl AddAssign for EnergyResult {
    fn add_assign(&mut self, rhs: Self) {
        self.pair_potential += rhs.pair_potential;
        self.geometry += rhs.geometry;
        self.extended += rhs.extended;
    }
}
