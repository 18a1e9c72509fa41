//! Pipeline run lifecycle.
//!
//! Free functions over a [`PipelineRun`] that perform status transitions
//! and emit the matching log entries.

use crate::exit_code::ExitCodeRegistry;
use crate::logging::logger::duration_ms;
use crate::logging::{LogLevel, LogRecord, StructuredLogger};
use crate::steps::{Step, StepContext, StepOutput};
use chrono::{DateTime, Utc};
use lp_protocol::exit_models::ExitCode;
use lp_protocol::run_models::{PipelineRun, RunStatus, StepName, StepOutcome, StepResult};
use std::time::Duration;
use tokio::time::Instant;

/// A step attempt that has started but not been sealed.
#[derive(Debug, Clone, Copy)]
pub struct StepStart {
    pub name: StepName,
    pub attempt: u8,
    pub started_at: DateTime<Utc>,
    clock: Instant,
}

/// A finished attempt, ready to be sealed into the run.
#[derive(Debug, Clone)]
pub struct StepAttempt {
    pub name: StepName,
    pub attempt: u8,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub duration: Duration,
    pub output: StepOutput,
}

impl StepAttempt {
    pub fn outcome(&self) -> StepOutcome {
        if self.output.skipped {
            StepOutcome::Skipped
        } else if self.output.is_success() {
            StepOutcome::Success
        } else {
            StepOutcome::Failure
        }
    }

    /// An attempt that never ran.
    pub fn skipped(name: StepName) -> Self {
        begin_step(name, 1).finish(StepOutput::skipped())
    }
}

impl StepStart {
    pub fn finish(self, output: StepOutput) -> StepAttempt {
        StepAttempt {
            name: self.name,
            attempt: self.attempt,
            started_at: self.started_at,
            ended_at: Utc::now(),
            duration: self.clock.elapsed(),
            output,
        }
    }
}

/// Create a new run in `Running` status.
pub fn create_run(run_id: impl Into<String>) -> PipelineRun {
    PipelineRun {
        run_id: run_id.into(),
        start_time: Utc::now(),
        steps_executed: Vec::new(),
        exit_code: ExitCode::Success.code(),
        status: RunStatus::Running,
    }
}

/// Announce the run.
pub fn start_run(run: &PipelineRun, logger: &StructuredLogger) {
    logger.info(
        "init",
        format!("pipeline {} started at {}", run.run_id, run.start_time.to_rfc3339()),
    );
}

/// Record the start of a step attempt.
pub fn begin_step(name: StepName, attempt: u8) -> StepStart {
    StepStart {
        name,
        attempt,
        started_at: Utc::now(),
        clock: Instant::now(),
    }
}

/// Run one attempt of `step` and time it.
pub async fn attempt_step(step: &dyn Step, ctx: &StepContext, attempt: u8) -> StepAttempt {
    let start = begin_step(step.name(), attempt);
    if attempt == 1 {
        ctx.logger.info(step.name().as_str(), "step started");
    }
    let output = step.run(ctx).await;
    start.finish(output)
}

/// Append the attempt to the run and log its outcome.
pub fn seal_step(
    run: &mut PipelineRun,
    attempt: StepAttempt,
    logger: &StructuredLogger,
) -> StepResult {
    let outcome = attempt.outcome();
    let step = attempt.name.as_str();
    let result = StepResult {
        name: attempt.name,
        order: attempt.name.order(),
        started_at: attempt.started_at,
        ended_at: attempt.ended_at,
        duration_ms: duration_ms(attempt.duration),
        attempt: attempt.attempt,
        outcome,
        triggering_exit_code: match outcome {
            StepOutcome::Skipped => None,
            _ => Some(attempt.output.exit_code),
        },
    };

    let record = match outcome {
        StepOutcome::Success => LogRecord::new(LogLevel::Success, step, "step passed")
            .with_exit_code(attempt.output.exit_code),
        StepOutcome::Failure => LogRecord::new(
            LogLevel::Error,
            step,
            format!(
                "step failed with exit code {} (attempt {})",
                attempt.output.exit_code, attempt.attempt
            ),
        )
        .with_exit_code(attempt.output.exit_code),
        StepOutcome::Skipped => LogRecord::new(LogLevel::Info, step, "step skipped"),
    };
    logger.emit(
        record
            .with_duration(attempt.duration)
            .with_source(crate::source_context!()),
    );

    run.steps_executed.push(result.clone());
    result
}

/// Stop the run early (fatal env-check failure).
pub fn abort_run(run: &mut PipelineRun, logger: &StructuredLogger, reason: &str) {
    run.status = RunStatus::Aborted;
    logger.error("aborted", reason);
}

/// Mark the run as stopped by the timeout guard.
pub fn time_out_run(run: &mut PipelineRun) {
    run.status = RunStatus::TimedOut;
}

/// Resolve the final exit code and emit the summary entry.
///
/// Returns the code the process should exit with.
pub fn complete_run(
    run: &mut PipelineRun,
    registry: &ExitCodeRegistry,
    logger: &StructuredLogger,
    total: Duration,
) -> i32 {
    let code = registry.resolve();
    run.exit_code = code;
    if run.status == RunStatus::Running {
        run.status = if code == 0 {
            RunStatus::Success
        } else {
            RunStatus::Failed
        };
    }

    let cause = ExitCode::from_code(code)
        .map(|exit| exit.cause())
        .unwrap_or("unknown failure");
    let level = if code == 0 {
        LogLevel::Success
    } else {
        LogLevel::Error
    };

    logger.emit(
        LogRecord::new(
            level,
            "complete",
            format!(
                "pipeline finished with exit code {code}: {cause} ({} steps recorded)",
                run.steps_executed.len()
            ),
        )
        .with_duration(total)
        .with_exit_code(code)
        .with_source(crate::source_context!()),
    );

    code
}
