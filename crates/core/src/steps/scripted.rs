//! Deterministic step for dry runs and tests.

use crate::steps::base::{Step, StepContext, StepOutput};
use async_trait::async_trait;
use lp_protocol::run_models::StepName;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Replays a queue of outputs, one per call. Once a single output is left
/// it is returned for every further call.
///
/// Retry and parallel eligibility follow the step name the same way the
/// real pipeline assigns them.
pub struct ScriptedStep {
    name: StepName,
    outputs: Mutex<VecDeque<StepOutput>>,
    delay: Duration,
    calls: AtomicUsize,
}

impl ScriptedStep {
    pub fn new(name: StepName, outputs: Vec<StepOutput>) -> Self {
        Self {
            name,
            outputs: Mutex::new(outputs.into()),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn succeeding(name: StepName) -> Self {
        Self::new(name, vec![StepOutput::success()])
    }

    pub fn failing(name: StepName, exit_code: i32, output: &str) -> Self {
        Self::new(name, vec![StepOutput::failure(exit_code, output)])
    }

    /// Sleep (on the tokio clock) before returning each output.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// How many times the step has been run.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_output(&self) -> StepOutput {
        let mut outputs = self
            .outputs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if outputs.len() > 1 {
            outputs.pop_front().unwrap_or_else(StepOutput::success)
        } else {
            outputs.front().cloned().unwrap_or_else(StepOutput::success)
        }
    }
}

#[async_trait]
impl Step for ScriptedStep {
    fn name(&self) -> StepName {
        self.name
    }

    async fn run(&self, ctx: &StepContext) -> StepOutput {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let output = self.next_output();
        if ctx.verbose && !output.output.is_empty() {
            eprintln!("{}", output.output_lossy());
        }
        output
    }

    fn retryable(&self) -> bool {
        self.name == StepName::TestE2e
    }

    fn parallelizable(&self) -> bool {
        matches!(self.name, StepName::TestUnit | StepName::TestIntegration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::StructuredLogger;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_replays_queue_then_repeats_last() {
        let ctx = StepContext::new(".", Arc::new(StructuredLogger::new("run-test")));
        let step = ScriptedStep::new(
            StepName::TestE2e,
            vec![StepOutput::failure(1, "flaky"), StepOutput::success()],
        );

        assert_eq!(step.run(&ctx).await.exit_code, 1);
        assert_eq!(step.run(&ctx).await.exit_code, 0);
        assert_eq!(step.run(&ctx).await.exit_code, 0);
        assert_eq!(step.calls(), 3);
    }

    #[tokio::test]
    async fn test_empty_queue_succeeds() {
        let ctx = StepContext::new(".", Arc::new(StructuredLogger::new("run-test")));
        let step = ScriptedStep::new(StepName::Build, Vec::new());
        assert!(step.run(&ctx).await.is_success());
    }

    #[test]
    fn test_eligibility_follows_name() {
        assert!(ScriptedStep::succeeding(StepName::TestE2e).retryable());
        assert!(!ScriptedStep::succeeding(StepName::TestE2e).parallelizable());
        assert!(ScriptedStep::succeeding(StepName::TestUnit).parallelizable());
        assert!(!ScriptedStep::succeeding(StepName::Build).retryable());
    }
}
