use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// Data type held by a shard key.
///
/// Each type carries a stable integer code and a byte-length contract for
/// its canonical encoding. Codes are persisted in shard-map metadata and
/// must never be renumbered.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum ShardKeyType {
    /// No key / unbounded.
    #[default]
    None,
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer.
    Int64,
    /// 128-bit unique identifier.
    Guid,
    /// Variable-length byte string, up to [`Self::MAX_BINARY_LEN`] bytes.
    Binary,
    /// UTC instant.
    DateTime,
    /// Signed duration.
    TimeSpan,
    /// Instant with a UTC offset attached.
    DateTimeOffset,
}

impl ShardKeyType {
    /// Maximum payload length for `Binary` keys.
    pub const MAX_BINARY_LEN: usize = 128;

    pub const ALL: [Self; 8] = [
        Self::None,
        Self::Int32,
        Self::Int64,
        Self::Guid,
        Self::Binary,
        Self::DateTime,
        Self::TimeSpan,
        Self::DateTimeOffset,
    ];

    /// Stable integer code used wherever the type tag is serialized.
    pub const fn code(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Int32 => 1,
            Self::Int64 => 2,
            Self::Guid => 3,
            Self::Binary => 4,
            Self::DateTime => 5,
            Self::TimeSpan => 6,
            Self::DateTimeOffset => 7,
        }
    }

    /// Resolve a persisted code back to the type tag.
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::None),
            1 => Some(Self::Int32),
            2 => Some(Self::Int64),
            3 => Some(Self::Guid),
            4 => Some(Self::Binary),
            5 => Some(Self::DateTime),
            6 => Some(Self::TimeSpan),
            7 => Some(Self::DateTimeOffset),
            _ => None,
        }
    }

    /// Expected payload length in bytes. For the variable-width `Binary`
    /// type this is the declared maximum; for `None` it is zero.
    pub const fn byte_len(self) -> usize {
        match self {
            Self::None => 0,
            Self::Int32 => 4,
            Self::Int64 | Self::DateTime | Self::TimeSpan => 8,
            Self::Guid | Self::DateTimeOffset => 16,
            Self::Binary => Self::MAX_BINARY_LEN,
        }
    }

    pub const fn is_fixed_width(self) -> bool {
        !matches!(self, Self::Binary)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Int32 => "Int32",
            Self::Int64 => "Int64",
            Self::Guid => "Guid",
            Self::Binary => "Binary",
            Self::DateTime => "DateTime",
            Self::TimeSpan => "TimeSpan",
            Self::DateTimeOffset => "DateTimeOffset",
        }
    }
}

impl Display for ShardKeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// Serialized as the stable code, not the variant name.
impl Serialize for ShardKeyType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u8(self.code())
    }
}

impl<'de> Deserialize<'de> for ShardKeyType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let code = u8::deserialize(deserializer)?;
        Self::from_code(code).ok_or_else(|| {
            serde::de::Error::custom(format!("unknown shard key type code {code}"))
        })
    }
}
