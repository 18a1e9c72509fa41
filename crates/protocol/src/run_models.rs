//! Pipeline run models.
//!
//! This module defines the structures for tracking one orchestrator
//! invocation and the steps it executed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::exit_models::ExitCode;

/// A named unit of pipeline work.
///
/// The pipeline order is fixed: see [`StepName::PIPELINE`]. `Deploy` is not
/// part of the pipeline sequence; it runs from its own command.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, TS)]
#[serde(rename_all = "kebab-case")]
pub enum StepName {
    EnvCheck,
    Lint,
    TestUnit,
    TestIntegration,
    TestE2e,
    Build,
    Cleanup,
    Deploy,
}

impl StepName {
    /// Steps of a pipeline run, in execution order.
    pub const PIPELINE: [StepName; 7] = [
        StepName::EnvCheck,
        StepName::Lint,
        StepName::TestUnit,
        StepName::TestIntegration,
        StepName::TestE2e,
        StepName::Build,
        StepName::Cleanup,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StepName::EnvCheck => "env-check",
            StepName::Lint => "lint",
            StepName::TestUnit => "test-unit",
            StepName::TestIntegration => "test-integration",
            StepName::TestE2e => "test-e2e",
            StepName::Build => "build",
            StepName::Cleanup => "cleanup",
            StepName::Deploy => "deploy",
        }
    }

    /// One-based position in the pipeline sequence (`init` is 0).
    pub fn order(&self) -> usize {
        match self {
            StepName::EnvCheck => 1,
            StepName::Lint => 2,
            StepName::TestUnit => 3,
            StepName::TestIntegration => 4,
            StepName::TestE2e => 5,
            StepName::Build => 6,
            StepName::Cleanup => 7,
            StepName::Deploy => 8,
        }
    }

    /// Exit code reported when this step fails, if failing it is a
    /// pipeline failure at all.
    pub fn failure_code(&self) -> Option<ExitCode> {
        match self {
            StepName::EnvCheck => Some(ExitCode::Environment),
            StepName::Lint => Some(ExitCode::Lint),
            StepName::TestUnit | StepName::TestIntegration | StepName::TestE2e => {
                Some(ExitCode::Test)
            }
            StepName::Build => Some(ExitCode::Build),
            StepName::Cleanup | StepName::Deploy => None,
        }
    }

    pub fn is_test(&self) -> bool {
        matches!(
            self,
            StepName::TestUnit | StepName::TestIntegration | StepName::TestE2e
        )
    }
}

impl fmt::Display for StepName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a single step attempt.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, TS)]
#[serde(rename_all = "lowercase")]
pub enum StepOutcome {
    Success,
    Failure,
    Skipped,
}

/// The record of one step attempt. A retried step produces two.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct StepResult {
    pub name: StepName,
    /// Position of the step in the fixed sequence.
    pub order: usize,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub duration_ms: u64,
    /// 1 for the first attempt, 2 for a retry.
    pub attempt: u8,
    pub outcome: StepOutcome,
    /// Raw exit status of the invoked tool; absent for skipped steps.
    pub triggering_exit_code: Option<i32>,
}

/// Lifecycle status of a pipeline run.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Success,
    Failed,
    /// Stopped early: fatal environment failure or user interrupt.
    Aborted,
    TimedOut,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunStatus::Running)
    }
}

/// One orchestrator invocation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct PipelineRun {
    /// Correlation id, assigned at start and never changed.
    pub run_id: String,
    pub start_time: DateTime<Utc>,
    /// Step attempts, in fixed step order.
    pub steps_executed: Vec<StepResult>,
    pub exit_code: i32,
    pub status: RunStatus,
}

impl PipelineRun {
    /// Results recorded for a given step (two for a retried step).
    pub fn results_for(&self, name: StepName) -> Vec<&StepResult> {
        self.steps_executed
            .iter()
            .filter(|result| result.name == name)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_order_is_sequential() {
        let orders: Vec<usize> = StepName::PIPELINE.iter().map(StepName::order).collect();
        assert_eq!(orders, vec![1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_failure_codes() {
        assert_eq!(StepName::EnvCheck.failure_code(), Some(ExitCode::Environment));
        assert_eq!(StepName::TestE2e.failure_code(), Some(ExitCode::Test));
        assert_eq!(StepName::Cleanup.failure_code(), None);
    }

    #[test]
    fn test_step_name_display_matches_serde() {
        for step in StepName::PIPELINE {
            let json = serde_json::to_value(step).unwrap();
            assert_eq!(json, step.to_string());
        }
    }
}
