//! Parallel execution of independent test groups.
//!
//! Groups run as concurrent tasks, each buffering its own output. If any
//! group fails because of resource contention, every task is aborted (their
//! child processes are killed on drop), the partial results are thrown away
//! and the groups are run again one at a time. Only the serial results are
//! reported.

use crate::classifier::{classify, ContentionPatterns, FailureCategory};
use crate::logging::LogLevel;
use crate::state::run::{attempt_step, StepAttempt};
use crate::steps::{Step, StepContext};
use std::sync::Arc;
use tokio::task::JoinSet;

/// How a batch was executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchMode {
    Parallel,
    /// Parallel run abandoned after contention; results are from the
    /// serial re-run.
    SerialFallback,
    Serial,
}

/// One attempt per group, in declared group order.
#[derive(Debug)]
pub struct TestBatchReport {
    pub attempts: Vec<StepAttempt>,
    pub mode: BatchMode,
}

pub struct ParallelExecutionManager {
    enabled: bool,
    patterns: ContentionPatterns,
}

enum ParallelOutcome {
    Completed(Vec<StepAttempt>),
    Contention { group: String },
}

impl ParallelExecutionManager {
    pub fn new(enabled: bool, patterns: ContentionPatterns) -> Self {
        Self { enabled, patterns }
    }

    pub async fn run(&self, groups: &[Arc<dyn Step>], ctx: &StepContext) -> TestBatchReport {
        if !self.enabled || groups.len() < 2 {
            return TestBatchReport {
                attempts: run_serial(groups, ctx).await,
                mode: BatchMode::Serial,
            };
        }

        match self.run_parallel(groups, ctx).await {
            ParallelOutcome::Completed(attempts) => TestBatchReport {
                attempts,
                mode: BatchMode::Parallel,
            },
            ParallelOutcome::Contention { group } => {
                crate::log_event!(
                    ctx.logger,
                    LogLevel::Warn,
                    group.as_str(),
                    "resource contention detected, falling back to serial execution"
                );
                TestBatchReport {
                    attempts: run_serial(groups, ctx).await,
                    mode: BatchMode::SerialFallback,
                }
            }
        }
    }

    async fn run_parallel(&self, groups: &[Arc<dyn Step>], ctx: &StepContext) -> ParallelOutcome {
        let mut workers = JoinSet::new();
        for (index, group) in groups.iter().enumerate() {
            let group = Arc::clone(group);
            let ctx = ctx.clone();
            workers.spawn(async move { (index, attempt_step(group.as_ref(), &ctx, 1).await) });
        }

        let mut slots: Vec<Option<StepAttempt>> = vec![None; groups.len()];
        let mut contended = None;

        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok((index, attempt)) => {
                    let category = classify(
                        attempt.output.exit_code,
                        &attempt.output.output,
                        &self.patterns,
                    );
                    if category == Some(FailureCategory::Contention) {
                        tracing::debug!(group = %attempt.name, "contention in parallel worker");
                        contended = Some(attempt.name.to_string());
                        break;
                    }
                    slots[index] = Some(attempt);
                }
                Err(err) => {
                    // A worker that panicked leaves no usable result.
                    tracing::warn!("parallel test worker failed: {err}");
                    contended = Some("test".to_string());
                    break;
                }
            }
        }

        if let Some(group) = contended {
            workers.abort_all();
            while workers.join_next().await.is_some() {}
            return ParallelOutcome::Contention { group };
        }

        ParallelOutcome::Completed(slots.into_iter().flatten().collect())
    }
}

async fn run_serial(groups: &[Arc<dyn Step>], ctx: &StepContext) -> Vec<StepAttempt> {
    let mut attempts = Vec::with_capacity(groups.len());
    for group in groups {
        attempts.push(attempt_step(group.as_ref(), ctx, 1).await);
    }
    attempts
}
