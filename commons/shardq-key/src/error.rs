use crate::key_type::ShardKeyType;
use thiserror::Error;

/// Errors raised at the key encoding and decoding boundary.
///
/// All of these indicate caller or data faults and are surfaced as-is,
/// never retried.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum KeyError {
    #[error("{expected} shard key does not accept {actual} values")]
    TypeMismatch {
        expected: ShardKeyType,
        actual: &'static str,
    },

    #[error("binary shard key of {len} bytes exceeds the {max}-byte maximum")]
    LengthViolation { len: usize, max: usize },

    #[error("malformed {key_type} key payload: {detail}")]
    MalformedKey {
        key_type: ShardKeyType,
        detail: String,
    },

    #[error("{0} value is outside the canonical encodable range")]
    ValueOutOfRange(ShardKeyType),

    #[error("invalid shard range: {0}")]
    InvalidRange(String),
}

impl KeyError {
    pub(crate) fn malformed<T: ToString>(key_type: ShardKeyType, detail: T) -> Self {
        Self::MalformedKey {
            key_type,
            detail: detail.to_string(),
        }
    }

    pub(crate) fn bad_len(key_type: ShardKeyType, expected: usize, found: usize) -> Self {
        Self::malformed(
            key_type,
            format!("expected {expected} bytes, found {found}"),
        )
    }
}

/// Result type for key operations.
pub type KeyResult<T> = Result<T, KeyError>;
