use std::fmt::{self, Display};
use std::str::FromStr;

/// Failure-tolerance contract for one fan-out execution.
///
/// Bound when the execution is created and immutable for its duration.
/// Codes are stable; the policy itself is never persisted.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum MultiShardExecutionPolicy {
    /// Any shard failure discards all results and surfaces an
    /// aggregate failure carrying the triggering shard's error.
    #[default]
    CompleteResults,
    /// Best effort: failed shards are reported alongside the rows of
    /// the shards that succeeded.
    PartialResults,
}

impl MultiShardExecutionPolicy {
    pub const fn code(self) -> u8 {
        match self {
            Self::CompleteResults => 0,
            Self::PartialResults => 1,
        }
    }

    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::CompleteResults),
            1 => Some(Self::PartialResults),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::CompleteResults => "CompleteResults",
            Self::PartialResults => "PartialResults",
        }
    }
}

impl Display for MultiShardExecutionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MultiShardExecutionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CompleteResults" | "complete" => Ok(Self::CompleteResults),
            "PartialResults" | "partial" => Ok(Self::PartialResults),
            other => Err(format!("unknown execution policy '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(MultiShardExecutionPolicy::CompleteResults.code(), 0);
        assert_eq!(MultiShardExecutionPolicy::PartialResults.code(), 1);
        for policy in [
            MultiShardExecutionPolicy::CompleteResults,
            MultiShardExecutionPolicy::PartialResults,
        ] {
            assert_eq!(
                MultiShardExecutionPolicy::from_code(policy.code()),
                Some(policy)
            );
        }
        assert_eq!(MultiShardExecutionPolicy::from_code(2), None);
    }

    #[test]
    fn parses_both_spellings() {
        assert_eq!(
            "complete".parse::<MultiShardExecutionPolicy>().unwrap(),
            MultiShardExecutionPolicy::CompleteResults
        );
        assert_eq!(
            "PartialResults".parse::<MultiShardExecutionPolicy>().unwrap(),
            MultiShardExecutionPolicy::PartialResults
        );
        assert!("best-effort".parse::<MultiShardExecutionPolicy>().is_err());
    }
}
