//! Policy-driven fan-out query execution across database shards.
//!
//! The coordinator dispatches one query independently to every target
//! shard through a caller-supplied [`ShardExecutor`], then assembles
//! the per-shard outcomes under the bound
//! [`MultiShardExecutionPolicy`].

pub mod error;
pub mod execution;
pub mod executor;
pub mod policy;
pub mod query;
pub mod result;
pub mod target;

pub use error::{MultiShardAggregateError, ShardFailure};
pub use execution::{ExecutionState, MultiShardExecution};
pub use executor::{ShardExecutionError, ShardExecutor};
pub use policy::MultiShardExecutionPolicy;
pub use query::QuerySpec;
pub use result::{MultiShardResult, ShardRows};
pub use target::{ShardId, ShardTarget};

use envconfig::Envconfig;

/// Coordinator tuning. Sourced from the environment in services,
/// overridable in code when embedding.
#[derive(Envconfig, Clone, Debug)]
pub struct CoordinatorConfig {
    /// Deadline for one shard's execution.
    #[envconfig(from = "SHARDQ_SHARD_TIMEOUT_MS", default = "30000")]
    pub shard_timeout_ms: u64,
    /// How long to wait for cancelled shard executions to settle
    /// before their tasks are aborted.
    #[envconfig(from = "SHARDQ_CANCEL_GRACE_MS", default = "250")]
    pub cancel_grace_ms: u64,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            shard_timeout_ms: 30_000,
            cancel_grace_ms: 250,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = CoordinatorConfig::default();
        assert_eq!(config.shard_timeout_ms, 30_000);
        assert_eq!(config.cancel_grace_ms, 250);
    }
}
