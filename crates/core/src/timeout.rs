//! Wall-clock budget for a pipeline run.
//!
//! The guard is polled at step boundaries only. A step that hangs past the
//! budget is not interrupted; the overrun is detected when it returns.

use crate::exit_code::ExitCodeRegistry;
use crate::logging::{LogLevel, StructuredLogger};
use lp_protocol::exit_models::ExitCode;
use std::time::Duration;
use tokio::time::Instant;

/// Result of polling the guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutCheck {
    Within,
    Exceeded { elapsed: Duration },
}

impl TimeoutCheck {
    pub fn is_exceeded(&self) -> bool {
        matches!(self, TimeoutCheck::Exceeded { .. })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TimeoutGuard {
    start: Instant,
    budget: Duration,
}

impl TimeoutGuard {
    /// Start the clock now.
    pub fn start(budget: Duration) -> Self {
        Self {
            start: Instant::now(),
            budget,
        }
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Compare elapsed time against the budget.
    ///
    /// On overrun, reports a timeout to the registry (which keeps any
    /// earlier substantive failure) and logs an error with both values.
    pub fn check(
        &self,
        registry: &ExitCodeRegistry,
        logger: &StructuredLogger,
        step: &str,
    ) -> TimeoutCheck {
        let elapsed = self.elapsed();
        if elapsed < self.budget {
            return TimeoutCheck::Within;
        }

        registry.report_code(ExitCode::Timeout);
        crate::log_event!(
            logger,
            LogLevel::Error,
            step,
            "pipeline timed out: elapsed {:.1}s, budget {}s",
            elapsed.as_secs_f64(),
            self.budget.as_secs()
        );

        TimeoutCheck::Exceeded { elapsed }
    }
}
