//! Steps backed by a single configured shell command.

use crate::steps::base::{Step, StepContext, StepOutput};
use crate::steps::runner::CommandRunner;
use async_trait::async_trait;
use lp_protocol::run_models::StepName;

/// Runs one shell command; a missing command makes the step a skip.
pub struct CommandStep {
    name: StepName,
    command: Option<String>,
    retryable: bool,
}

impl CommandStep {
    pub fn new(name: StepName, command: Option<String>) -> Self {
        Self {
            name,
            command,
            retryable: false,
        }
    }

    /// Mark the step as eligible for the flaky-step retry.
    pub fn with_retry(mut self) -> Self {
        self.retryable = true;
        self
    }

    pub fn command(&self) -> Option<&str> {
        self.command.as_deref()
    }
}

#[async_trait]
impl Step for CommandStep {
    fn name(&self) -> StepName {
        self.name
    }

    async fn run(&self, ctx: &StepContext) -> StepOutput {
        match self.command.as_deref() {
            Some(command) => CommandRunner::run(command, ctx).await,
            None => StepOutput::skipped(),
        }
    }

    fn retryable(&self) -> bool {
        self.retryable
    }
}

/// A unit or integration test command.
///
/// Test groups share no state, so the engine may run them concurrently.
pub struct TestGroupStep {
    inner: CommandStep,
}

impl TestGroupStep {
    pub fn new(name: StepName, command: Option<String>) -> Self {
        Self {
            inner: CommandStep::new(name, command),
        }
    }
}

#[async_trait]
impl Step for TestGroupStep {
    fn name(&self) -> StepName {
        self.inner.name()
    }

    async fn run(&self, ctx: &StepContext) -> StepOutput {
        self.inner.run(ctx).await
    }

    fn parallelizable(&self) -> bool {
        true
    }
}
