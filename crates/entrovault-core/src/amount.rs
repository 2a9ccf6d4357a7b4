//! # Fee Amounts
//!
//! `Amount` is the unit in which entropy requests are paid for. It is an
//! unsigned integer; floats never appear in fee accounting.

use serde::{Deserialize, Serialize};

/// A non-negative fee amount in the smallest native unit.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Amount(pub u64);

impl Amount {
    /// The zero amount.
    pub const ZERO: Amount = Amount(0);

    /// The raw value.
    pub fn value(&self) -> u64 {
        self.0
    }

    /// Checked addition; `None` on overflow.
    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    /// Whether this amount covers `required`.
    pub fn covers(&self, required: Amount) -> bool {
        *self >= required
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Amount {
    fn from(value: u64) -> Self {
        Self(value)
    }
}
