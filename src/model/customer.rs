use serde::{Deserialize, Serialize};

use std::fmt::Display;

/// Type-safe identifier for customers.
///
/// Customers are numbered densely from zero, so the inner value doubles as the
/// row index into the bank's allocation and maximum matrices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CustomerId(pub usize);

impl CustomerId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl From<usize> for CustomerId {
    fn from(id: usize) -> Self {
        Self(id)
    }
}

impl Display for CustomerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "customer_{}", self.0)
    }
}
