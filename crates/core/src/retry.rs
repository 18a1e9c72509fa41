//! Flaky-step retry.
//!
//! Only assertion-style failures (exit code exactly 1) of a retryable step
//! are retried, once. Timeouts and infrastructure failures never are.

use crate::logging::LogLevel;
use crate::state::run::{attempt_step, StepAttempt};
use crate::steps::{Step, StepContext};

/// The only exit code that triggers a retry.
pub const RETRYABLE_EXIT_CODE: i32 = 1;

pub fn should_retry(attempt: &StepAttempt) -> bool {
    !attempt.output.skipped && attempt.output.exit_code == RETRYABLE_EXIT_CODE
}

/// Run `step`, retrying it once if it is retryable and failed with exit 1.
///
/// Returns every attempt in order; the last one is authoritative.
pub async fn run_with_retry(step: &dyn Step, ctx: &StepContext) -> Vec<StepAttempt> {
    let first = attempt_step(step, ctx, 1).await;
    if !step.retryable() || !should_retry(&first) {
        return vec![first];
    }

    crate::log_event!(
        ctx.logger,
        LogLevel::Warn,
        step.name().as_str(),
        "step failed with exit code {}, retrying once",
        first.output.exit_code
    );

    let second = attempt_step(step, ctx, 2).await;
    vec![first, second]
}
