use std::cmp::Ordering;
use std::fmt::{self, Display};

use crate::{
    error::{KeyError, KeyResult},
    key::ShardKey,
    key_type::ShardKeyType,
};

/// A half-open `[low, high)` range of same-typed shard keys.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct ShardRange {
    low: ShardKey,
    high: ShardKey,
}

impl ShardRange {
    /// Construct a range. Fails when the boundary types differ or
    /// `low` sorts after `high`.
    pub fn new(low: ShardKey, high: ShardKey) -> KeyResult<Self> {
        if low.compare(&high)? == Ordering::Greater {
            return Err(KeyError::InvalidRange(format!(
                "low {low} exceeds high {high}"
            )));
        }
        Ok(Self { low, high })
    }

    /// The full key space of a type: min value up to the max sentinel.
    pub fn full(key_type: ShardKeyType) -> Self {
        Self {
            low: ShardKey::min_value(key_type),
            high: ShardKey::max_sentinel(key_type),
        }
    }

    pub const fn key_type(&self) -> ShardKeyType {
        self.low.key_type()
    }

    pub const fn low(&self) -> &ShardKey {
        &self.low
    }

    pub const fn high(&self) -> &ShardKey {
        &self.high
    }

    /// Whether the key falls inside the range: `low <= key < high`.
    pub fn contains(&self, key: &ShardKey) -> KeyResult<bool> {
        Ok(self.low.compare(key)? != Ordering::Greater
            && key.compare(&self.high)? == Ordering::Less)
    }

    /// Split into `[low, at)` and `[at, high)`. The split point must
    /// lie strictly inside the range.
    pub fn split_at(&self, at: &ShardKey) -> KeyResult<(Self, Self)> {
        if !self.contains(at)? || at.compare(&self.low)? == Ordering::Equal {
            return Err(KeyError::InvalidRange(format!(
                "split point {at} is not strictly inside {self}"
            )));
        }
        Ok((
            Self {
                low: self.low.clone(),
                high: at.clone(),
            },
            Self {
                low: at.clone(),
                high: self.high.clone(),
            },
        ))
    }
}

impl Display for ShardRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.low, self.high)
    }
}
