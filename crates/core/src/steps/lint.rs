//! Lint with auto-fix and re-check.

use crate::logging::LogLevel;
use crate::steps::base::{Step, StepContext, StepOutput};
use crate::steps::runner::CommandRunner;
use async_trait::async_trait;
use lp_protocol::config_models::LintCommands;
use lp_protocol::run_models::StepName;

/// Runs the lint check. When it fails, auto-fix is enabled and a fix
/// command is configured, runs the fix and checks again; the re-check
/// decides the outcome.
pub struct LintStep {
    commands: LintCommands,
}

impl LintStep {
    pub fn new(commands: LintCommands) -> Self {
        Self { commands }
    }
}

#[async_trait]
impl Step for LintStep {
    fn name(&self) -> StepName {
        StepName::Lint
    }

    async fn run(&self, ctx: &StepContext) -> StepOutput {
        let Some(check) = self.commands.check.as_deref() else {
            return StepOutput::skipped();
        };

        let first = CommandRunner::run(check, ctx).await;
        if first.is_success() || !ctx.auto_fix {
            return first;
        }
        let Some(fix) = self.commands.fix.as_deref() else {
            return first;
        };

        crate::log_event!(
            ctx.logger,
            LogLevel::Warn,
            "lint",
            "lint failed with exit code {}, running auto-fix",
            first.exit_code
        );

        let fixed = CommandRunner::run(fix, ctx).await;
        if !fixed.is_success() {
            ctx.logger.warn(
                "lint",
                format!("auto-fix exited with code {}", fixed.exit_code),
            );
        }

        CommandRunner::run(check, ctx).await
    }
}
