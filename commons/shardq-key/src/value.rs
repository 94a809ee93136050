use bytes::Bytes;
use chrono::{DateTime, FixedOffset, TimeDelta, Utc};
use uuid::Uuid;

use crate::key_type::ShardKeyType;

/// A native value paired with the key type it belongs to.
///
/// Constructed at the call boundary from the caller's own types; the
/// codec turns it into the canonical byte form and back.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ShardKeyValue {
    None,
    Int32(i32),
    Int64(i64),
    Guid(Uuid),
    Binary(Bytes),
    DateTime(DateTime<Utc>),
    TimeSpan(TimeDelta),
    DateTimeOffset(DateTime<FixedOffset>),
}

impl ShardKeyValue {
    /// The key type this value belongs to.
    pub const fn key_type(&self) -> ShardKeyType {
        match self {
            Self::None => ShardKeyType::None,
            Self::Int32(_) => ShardKeyType::Int32,
            Self::Int64(_) => ShardKeyType::Int64,
            Self::Guid(_) => ShardKeyType::Guid,
            Self::Binary(_) => ShardKeyType::Binary,
            Self::DateTime(_) => ShardKeyType::DateTime,
            Self::TimeSpan(_) => ShardKeyType::TimeSpan,
            Self::DateTimeOffset(_) => ShardKeyType::DateTimeOffset,
        }
    }

    /// Variant name, used in type-mismatch diagnostics.
    pub const fn variant_name(&self) -> &'static str {
        self.key_type().name()
    }
}

impl From<i32> for ShardKeyValue {
    fn from(v: i32) -> Self {
        Self::Int32(v)
    }
}

impl From<i64> for ShardKeyValue {
    fn from(v: i64) -> Self {
        Self::Int64(v)
    }
}

impl From<Uuid> for ShardKeyValue {
    fn from(v: Uuid) -> Self {
        Self::Guid(v)
    }
}

impl From<Bytes> for ShardKeyValue {
    fn from(v: Bytes) -> Self {
        Self::Binary(v)
    }
}

impl From<Vec<u8>> for ShardKeyValue {
    fn from(v: Vec<u8>) -> Self {
        Self::Binary(Bytes::from(v))
    }
}

impl From<DateTime<Utc>> for ShardKeyValue {
    fn from(v: DateTime<Utc>) -> Self {
        Self::DateTime(v)
    }
}

impl From<TimeDelta> for ShardKeyValue {
    fn from(v: TimeDelta) -> Self {
        Self::TimeSpan(v)
    }
}

impl From<DateTime<FixedOffset>> for ShardKeyValue {
    fn from(v: DateTime<FixedOffset>) -> Self {
        Self::DateTimeOffset(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_maps_to_its_key_type() {
        assert_eq!(ShardKeyValue::None.key_type(), ShardKeyType::None);
        assert_eq!(
            ShardKeyValue::from(7i32).key_type(),
            ShardKeyType::Int32
        );
        assert_eq!(
            ShardKeyValue::from(7i64).key_type(),
            ShardKeyType::Int64
        );
        assert_eq!(
            ShardKeyValue::from(Uuid::nil()).key_type(),
            ShardKeyType::Guid
        );
        assert_eq!(
            ShardKeyValue::from(vec![1u8, 2, 3]).key_type(),
            ShardKeyType::Binary
        );
        assert_eq!(
            ShardKeyValue::from(Utc::now()).key_type(),
            ShardKeyType::DateTime
        );
        assert_eq!(
            ShardKeyValue::from(TimeDelta::seconds(5)).key_type(),
            ShardKeyType::TimeSpan
        );
    }
}
