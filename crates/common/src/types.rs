use serde::{Deserialize, Serialize};

/// Unique identifier for an aggregate instance.
///
/// Identifiers are opaque integers chosen by the caller (an order is created
/// as "order 1", "order 2", ...). The newtype keeps them from being mixed up
/// with quantities or amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AggregateId(u64);

impl AggregateId {
    /// Creates an aggregate ID from a raw value.
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for AggregateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for AggregateId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

impl From<u64> for AggregateId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<AggregateId> for u64 {
    fn from(id: AggregateId) -> Self {
        id.0
    }
}
