use async_trait::async_trait;
use thiserror::Error;

use crate::{query::QuerySpec, target::ShardTarget};

/// Failure of a single shard execution. Recoverable at the coordinator
/// level: the active policy decides whether it fails the whole
/// execution or is reported alongside partial results.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ShardExecutionError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("query timed out after {0} ms")]
    Timeout(u64),

    #[error("execution cancelled")]
    Cancelled,
}

/// Seam to the external connection and transport layer: executes one
/// query against one shard, returning its rows in source order.
///
/// Implementations must be safe to call concurrently, one in-flight
/// call per target shard.
#[async_trait]
pub trait ShardExecutor<R>: Send + Sync {
    async fn execute(
        &self,
        target: &ShardTarget,
        query: &QuerySpec,
    ) -> Result<Vec<R>, ShardExecutionError>;
}
