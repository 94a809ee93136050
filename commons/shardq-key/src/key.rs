use bytes::Bytes;
use std::cmp::Ordering;
use std::fmt::{self, Display};

use crate::{
    codec,
    error::{KeyError, KeyResult},
    key_type::ShardKeyType,
    value::ShardKeyValue,
};

/// A typed shard key in canonical encoded form.
///
/// Immutable after construction; range operations hand out new
/// instances. Keys of different types are not comparable, so `Ord` is
/// not implemented; use [`ShardKey::compare`].
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct ShardKey {
    key_type: ShardKeyType,
    payload: KeyPayload,
}

/// The max sentinel stands for an open upper range boundary. It is not
/// a byte pattern; no concrete key ever equals it.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
enum KeyPayload {
    Value(Bytes),
    MaxSentinel,
}

impl ShardKey {
    /// Construct from a native value, validating it against the
    /// declared type.
    pub fn new(key_type: ShardKeyType, value: ShardKeyValue) -> KeyResult<Self> {
        let raw = codec::encode(key_type, &value)?;
        Ok(Self {
            key_type,
            payload: KeyPayload::Value(raw),
        })
    }

    /// Construct from a native value, inferring the type tag. Binary
    /// length and time-range violations still fail.
    pub fn from_value(value: ShardKeyValue) -> KeyResult<Self> {
        Self::new(value.key_type(), value)
    }

    /// Rehydrate a key from persisted canonical bytes, validating the
    /// payload against the type's contract.
    pub fn from_raw(key_type: ShardKeyType, raw: impl Into<Bytes>) -> KeyResult<Self> {
        let raw = raw.into();
        codec::decode(key_type, &raw)?;
        Ok(Self {
            key_type,
            payload: KeyPayload::Value(raw),
        })
    }

    /// The smallest key of the given type: all-zero bytes of the
    /// type's fixed length, or the empty payload for `Binary`.
    pub fn min_value(key_type: ShardKeyType) -> Self {
        let len = if key_type.is_fixed_width() {
            key_type.byte_len()
        } else {
            0
        };
        Self {
            key_type,
            payload: KeyPayload::Value(Bytes::from(vec![0u8; len])),
        }
    }

    /// The open upper range boundary for the given type.
    pub const fn max_sentinel(key_type: ShardKeyType) -> Self {
        Self {
            key_type,
            payload: KeyPayload::MaxSentinel,
        }
    }

    pub const fn key_type(&self) -> ShardKeyType {
        self.key_type
    }

    pub const fn is_max_sentinel(&self) -> bool {
        matches!(self.payload, KeyPayload::MaxSentinel)
    }

    pub fn is_min(&self) -> bool {
        match &self.payload {
            KeyPayload::Value(raw) => raw.iter().all(|b| *b == 0) && {
                self.key_type.is_fixed_width() || raw.is_empty()
            },
            KeyPayload::MaxSentinel => false,
        }
    }

    /// Canonical bytes, or `None` for the max sentinel.
    pub fn raw_bytes(&self) -> Option<&[u8]> {
        match &self.payload {
            KeyPayload::Value(raw) => Some(raw),
            KeyPayload::MaxSentinel => None,
        }
    }

    /// Decode back to the native value. The max sentinel has no value
    /// and yields `Ok(None)`.
    pub fn value(&self) -> KeyResult<Option<ShardKeyValue>> {
        match &self.payload {
            KeyPayload::Value(raw) => codec::decode(self.key_type, raw).map(Some),
            KeyPayload::MaxSentinel => Ok(None),
        }
    }

    /// Total order over same-typed keys, consistent with the native
    /// value ordering. Fails with [`KeyError::TypeMismatch`] when the
    /// types differ.
    pub fn compare(&self, other: &Self) -> KeyResult<Ordering> {
        if self.key_type != other.key_type {
            return Err(KeyError::TypeMismatch {
                expected: self.key_type,
                actual: other.key_type.name(),
            });
        }
        Ok(match (&self.payload, &other.payload) {
            (KeyPayload::MaxSentinel, KeyPayload::MaxSentinel) => Ordering::Equal,
            (KeyPayload::MaxSentinel, KeyPayload::Value(_)) => Ordering::Greater,
            (KeyPayload::Value(_), KeyPayload::MaxSentinel) => Ordering::Less,
            (KeyPayload::Value(a), KeyPayload::Value(b)) => a.cmp(b),
        })
    }

    /// The immediate successor in canonical byte order.
    ///
    /// Fixed-width keys increment with carry; overflow yields the max
    /// sentinel. A `Binary` key below the maximum length appends a zero
    /// byte, which is the next byte string under standard ordering.
    pub fn next_key(&self) -> Self {
        let raw = match &self.payload {
            KeyPayload::MaxSentinel => return self.clone(),
            KeyPayload::Value(raw) => raw,
        };

        if !self.key_type.is_fixed_width() && raw.len() < self.key_type.byte_len() {
            let mut next = Vec::with_capacity(raw.len() + 1);
            next.extend_from_slice(raw);
            next.push(0);
            return Self {
                key_type: self.key_type,
                payload: KeyPayload::Value(Bytes::from(next)),
            };
        }

        let mut next = raw.to_vec();
        for byte in next.iter_mut().rev() {
            let (incremented, overflowed) = byte.overflowing_add(1);
            *byte = incremented;
            if !overflowed {
                return Self {
                    key_type: self.key_type,
                    payload: KeyPayload::Value(Bytes::from(next)),
                };
            }
        }
        Self::max_sentinel(self.key_type)
    }
}

impl Display for ShardKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[", self.key_type)?;
        match &self.payload {
            KeyPayload::MaxSentinel => f.write_str("max")?,
            KeyPayload::Value(raw) => {
                for byte in raw.iter() {
                    write!(f, "{byte:02x}")?;
                }
            }
        }
        f.write_str("]")
    }
}
