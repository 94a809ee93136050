use thiserror::Error;

use crate::{executor::ShardExecutionError, target::ShardTarget};

/// One shard's failure with its identity attached.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("{target} failed: {error}")]
pub struct ShardFailure {
    pub target: ShardTarget,
    pub error: ShardExecutionError,
}

impl ShardFailure {
    pub fn new(target: ShardTarget, error: ShardExecutionError) -> Self {
        Self { target, error }
    }
}

/// Aggregate failure of a fan-out execution; the only error surfaced
/// to the coordinator's caller.
///
/// Under `CompleteResults` it carries exactly the triggering shard's
/// failure and later failures are discarded. Under `PartialResults` it
/// is never returned; failures travel inside the success envelope
/// instead.
#[derive(Debug, Error)]
#[error("multi-shard execution failed on {} shard(s); first: {}", .failures.len(), first_cause(.failures))]
pub struct MultiShardAggregateError {
    pub failures: Vec<ShardFailure>,
}

impl MultiShardAggregateError {
    pub fn new(failures: Vec<ShardFailure>) -> Self {
        Self { failures }
    }

    /// The representative cause: the first failure observed.
    pub fn cause(&self) -> Option<&ShardFailure> {
        self.failures.first()
    }
}

fn first_cause(failures: &[ShardFailure]) -> String {
    failures
        .first()
        .map_or_else(|| "unknown".to_string(), ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregate_reports_the_first_cause() {
        let err = MultiShardAggregateError::new(vec![
            ShardFailure::new(
                ShardTarget::new(3, "db-3"),
                ShardExecutionError::Connect("refused".into()),
            ),
            ShardFailure::new(
                ShardTarget::new(5, "db-5"),
                ShardExecutionError::Cancelled,
            ),
        ]);
        assert_eq!(err.cause().unwrap().target.id, 3);
        let msg = err.to_string();
        assert!(msg.contains("2 shard(s)"), "{msg}");
        assert!(msg.contains("shard 3"), "{msg}");
    }
}
