//! Fixed-length vectors of resource units.

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::ops::Index;

/// One entry per resource type, counted in whole units.
///
/// Every vector in a running system has the same length: the number of
/// resource types the bank was built with. Arithmetic helpers assume equal
/// lengths; callers at the system boundary check it first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceVector(Vec<u32>);

impl ResourceVector {
    pub fn new(units: Vec<u32>) -> Self {
        Self(units)
    }

    /// A vector of `len` zeroes.
    pub fn zeros(len: usize) -> Self {
        Self(vec![0; len])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&n| n == 0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &u32> {
        self.0.iter()
    }

    /// True when every entry is less than or equal to the matching entry of `other`.
    pub fn fits_within(&self, other: &ResourceVector) -> bool {
        self.0.iter().zip(&other.0).all(|(a, b)| a <= b)
    }

    pub fn add_assign(&mut self, other: &ResourceVector) {
        for (a, b) in self.0.iter_mut().zip(&other.0) {
            *a += *b;
        }
    }

    /// Entrywise subtraction. Panics on underflow in debug builds, which can only
    /// happen if a caller skipped the `fits_within` check.
    pub fn sub_assign(&mut self, other: &ResourceVector) {
        for (a, b) in self.0.iter_mut().zip(&other.0) {
            *a -= *b;
        }
    }

    /// Entrywise `self - other`, or `None` if any entry would go negative.
    pub fn checked_sub(&self, other: &ResourceVector) -> Option<ResourceVector> {
        self.0
            .iter()
            .zip(&other.0)
            .map(|(a, b)| a.checked_sub(*b))
            .collect::<Option<Vec<_>>>()
            .map(Self)
    }

    /// Entrywise `self + other`, or `None` if any entry would overflow.
    pub fn checked_plus(&self, other: &ResourceVector) -> Option<ResourceVector> {
        self.0
            .iter()
            .zip(&other.0)
            .map(|(a, b)| a.checked_add(*b))
            .collect::<Option<Vec<_>>>()
            .map(Self)
    }

    /// Entrywise `self + other`, clamped at `u32::MAX`.
    pub fn saturating_plus(&self, other: &ResourceVector) -> ResourceVector {
        Self(
            self.0
                .iter()
                .zip(&other.0)
                .map(|(a, b)| a.saturating_add(*b))
                .collect(),
        )
    }

    /// Entrywise `self + other`.
    pub fn plus(&self, other: &ResourceVector) -> ResourceVector {
        let mut sum = self.clone();
        sum.add_assign(other);
        sum
    }
}

impl From<Vec<u32>> for ResourceVector {
    fn from(units: Vec<u32>) -> Self {
        Self(units)
    }
}

impl<const N: usize> From<[u32; N]> for ResourceVector {
    fn from(units: [u32; N]) -> Self {
        Self(units.to_vec())
    }
}

impl Index<usize> for ResourceVector {
    type Output = u32;

    fn index(&self, index: usize) -> &u32 {
        &self.0[index]
    }
}

impl Display for ResourceVector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[")?;
        for (i, n) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", n)?;
        }
        write!(f, "]")
    }
}
