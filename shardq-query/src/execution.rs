use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{
    CoordinatorConfig,
    error::{MultiShardAggregateError, ShardFailure},
    executor::{ShardExecutionError, ShardExecutor},
    policy::MultiShardExecutionPolicy,
    query::QuerySpec,
    result::{MultiShardResult, ShardRows},
    target::ShardTarget,
};

/// Lifecycle of one fan-out execution. States advance strictly in
/// order; `Finalized` is terminal.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ExecutionState {
    Created,
    Dispatched,
    Collecting,
    Finalized,
}

enum ShardOutcome<R> {
    Rows(ShardRows<R>),
    Failed(ShardFailure),
    Cancelled,
}

/// One fan-out execution: a query, its target shards, and the bound
/// policy. [`execute`](Self::execute) consumes the execution, so a
/// finalized execution cannot be re-run.
pub struct MultiShardExecution<R> {
    executor: Arc<dyn ShardExecutor<R>>,
    query: QuerySpec,
    targets: Vec<ShardTarget>,
    policy: MultiShardExecutionPolicy,
    config: CoordinatorConfig,
    state: ExecutionState,
}

impl<R: Send + 'static> MultiShardExecution<R> {
    pub fn new(
        executor: Arc<dyn ShardExecutor<R>>,
        query: QuerySpec,
        targets: Vec<ShardTarget>,
        policy: MultiShardExecutionPolicy,
    ) -> Self {
        Self {
            executor,
            query,
            targets,
            policy,
            config: CoordinatorConfig::default(),
            state: ExecutionState::Created,
        }
    }

    pub fn with_config(mut self, config: CoordinatorConfig) -> Self {
        self.config = config;
        self
    }

    pub const fn state(&self) -> ExecutionState {
        self.state
    }

    pub const fn policy(&self) -> MultiShardExecutionPolicy {
        self.policy
    }

    pub fn targets(&self) -> &[ShardTarget] {
        &self.targets
    }

    fn transition(&mut self, next: ExecutionState) {
        debug_assert!(matches!(
            (self.state, next),
            (ExecutionState::Created, ExecutionState::Dispatched)
                | (ExecutionState::Dispatched, ExecutionState::Collecting)
                | (ExecutionState::Collecting, ExecutionState::Finalized)
        ));
        debug!(from = ?self.state, to = ?next, "execution state transition");
        self.state = next;
    }

    /// Run the execution to completion: spawn one task per target
    /// shard, drain completions through a single collection point, and
    /// assemble the outcome under the bound policy.
    pub async fn execute(
        mut self,
    ) -> Result<MultiShardResult<R>, MultiShardAggregateError> {
        let shard_count = self.targets.len();
        debug!(
            shards = shard_count,
            policy = %self.policy,
            "dispatching fan-out query"
        );
        self.transition(ExecutionState::Dispatched);

        let token = CancellationToken::new();
        let (tx, rx) =
            flume::bounded::<(usize, ShardOutcome<R>)>(shard_count.max(1));
        let mut handles = Vec::with_capacity(shard_count);
        for (idx, target) in self.targets.iter().enumerate() {
            let executor = Arc::clone(&self.executor);
            let query = self.query.clone();
            let target = target.clone();
            let cancel = token.child_token();
            let tx = tx.clone();
            let timeout_ms = self.config.shard_timeout_ms;
            handles.push(tokio::spawn(async move {
                let outcome =
                    run_one(&*executor, &target, &query, &cancel, timeout_ms)
                        .await;
                let _ = tx.send_async((idx, outcome)).await;
            }));
        }
        drop(tx);

        self.transition(ExecutionState::Collecting);
        // The drain loop is the sole owner of the outcome slots, so
        // concurrent completions cannot interleave. Slots are indexed
        // by dispatch order; completion order does not matter.
        let mut slots: Vec<Option<ShardOutcome<R>>> =
            std::iter::repeat_with(|| None).take(shard_count).collect();
        let mut short_circuit: Option<ShardFailure> = None;
        while let Ok((idx, outcome)) = rx.recv_async().await {
            if let ShardOutcome::Failed(failure) = &outcome {
                warn!(%failure, "shard execution failed");
                if self.policy == MultiShardExecutionPolicy::CompleteResults {
                    short_circuit = Some(failure.clone());
                    break;
                }
            }
            slots[idx] = Some(outcome);
        }

        if let Some(cause) = short_circuit {
            // First failure wins: cancel the rest, discard collected
            // successes, keep only the triggering shard's error.
            token.cancel();
            self.drain_with_grace(&rx).await;
            for handle in &handles {
                handle.abort();
            }
            self.transition(ExecutionState::Finalized);
            debug!(
                shard = cause.target.id,
                "execution finalized with aggregate failure"
            );
            return Err(MultiShardAggregateError::new(vec![cause]));
        }

        // Channel closed: every task reported, or died without
        // reporting. A missing slot is a failure, not a silent gap.
        let mut shard_rows = Vec::new();
        let mut failures = Vec::new();
        for (idx, slot) in slots.into_iter().enumerate() {
            match slot {
                Some(ShardOutcome::Rows(rows)) => shard_rows.push(rows),
                Some(ShardOutcome::Failed(failure)) => failures.push(failure),
                Some(ShardOutcome::Cancelled) => {}
                None => failures.push(ShardFailure::new(
                    self.targets[idx].clone(),
                    ShardExecutionError::Query(
                        "shard task terminated before reporting".into(),
                    ),
                )),
            }
        }

        if self.policy == MultiShardExecutionPolicy::CompleteResults
            && !failures.is_empty()
        {
            token.cancel();
            for handle in &handles {
                handle.abort();
            }
            let cause = failures.swap_remove(0);
            self.transition(ExecutionState::Finalized);
            return Err(MultiShardAggregateError::new(vec![cause]));
        }

        self.transition(ExecutionState::Finalized);
        debug!(
            succeeded = shard_rows.len(),
            failed = failures.len(),
            "execution finalized"
        );
        Ok(MultiShardResult::new(shard_rows, failures))
    }

    /// Best-effort settling after cancellation: wait up to the grace
    /// period for in-flight tasks to acknowledge, never indefinitely.
    async fn drain_with_grace(
        &self,
        rx: &flume::Receiver<(usize, ShardOutcome<R>)>,
    ) {
        let grace = Duration::from_millis(self.config.cancel_grace_ms);
        let settled = tokio::time::timeout(grace, async {
            while rx.recv_async().await.is_ok() {}
        })
        .await;
        if settled.is_err() {
            warn!(
                grace_ms = self.config.cancel_grace_ms,
                "cancelled shard executions did not settle within the grace period"
            );
        }
    }
}

async fn run_one<R>(
    executor: &dyn ShardExecutor<R>,
    target: &ShardTarget,
    query: &QuerySpec,
    cancel: &CancellationToken,
    timeout_ms: u64,
) -> ShardOutcome<R> {
    let dispatched_at = Instant::now();
    debug!(%target, "dispatching shard query");
    let deadline = Duration::from_millis(timeout_ms);
    tokio::select! {
        _ = cancel.cancelled() => {
            debug!(%target, "shard execution cancelled");
            ShardOutcome::Cancelled
        }
        res = tokio::time::timeout(deadline, executor.execute(target, query)) => {
            match res {
                Ok(Ok(rows)) => {
                    debug!(
                        %target,
                        rows = rows.len(),
                        elapsed_ms = dispatched_at.elapsed().as_millis() as u64,
                        "shard execution succeeded"
                    );
                    ShardOutcome::Rows(ShardRows {
                        target: target.clone(),
                        rows,
                    })
                }
                Ok(Err(error)) => {
                    ShardOutcome::Failed(ShardFailure::new(target.clone(), error))
                }
                Err(_) => ShardOutcome::Failed(ShardFailure::new(
                    target.clone(),
                    ShardExecutionError::Timeout(timeout_ms),
                )),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::ShardId;
    use async_trait::async_trait;

    struct EchoExecutor;

    #[async_trait]
    impl ShardExecutor<u64> for EchoExecutor {
        async fn execute(
            &self,
            target: &ShardTarget,
            _query: &QuerySpec,
        ) -> Result<Vec<u64>, ShardExecutionError> {
            Ok(vec![target.id])
        }
    }

    fn execution(
        targets: Vec<ShardTarget>,
        policy: MultiShardExecutionPolicy,
    ) -> MultiShardExecution<u64> {
        MultiShardExecution::new(
            Arc::new(EchoExecutor),
            QuerySpec::new("select 1"),
            targets,
            policy,
        )
    }

    #[test]
    fn starts_in_created() {
        let exec = execution(vec![], MultiShardExecutionPolicy::PartialResults);
        assert_eq!(exec.state(), ExecutionState::Created);
        assert_eq!(exec.policy(), MultiShardExecutionPolicy::PartialResults);
        assert!(exec.targets().is_empty());
    }

    #[tokio::test]
    async fn empty_target_set_is_an_empty_success() {
        for policy in [
            MultiShardExecutionPolicy::CompleteResults,
            MultiShardExecutionPolicy::PartialResults,
        ] {
            let result = execution(vec![], policy).execute().await.unwrap();
            assert_eq!(result.row_count(), 0);
            assert!(result.failures().is_empty());
            assert!(result.is_complete());
        }
    }

    #[tokio::test]
    async fn rows_are_grouped_in_dispatch_order() {
        let targets = vec![
            ShardTarget::new(7, "db-7"),
            ShardTarget::new(3, "db-3"),
        ];
        let result = execution(targets, MultiShardExecutionPolicy::CompleteResults)
            .execute()
            .await
            .unwrap();
        let ids: Vec<ShardId> =
            result.shard_rows().iter().map(|s| s.target.id).collect();
        assert_eq!(ids, vec![7, 3]);
    }
}
