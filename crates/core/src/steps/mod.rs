//! Pipeline steps.
//!
//! Every step implements [`Step`]; the engine folds over an ordered list of
//! them. Concrete steps:
//! - [`EnvCheckStep`]: env file selection and validation
//! - [`LintStep`]: check, auto-fix, re-check
//! - [`TestGroupStep`]: unit/integration tests, parallelizable
//! - [`CommandStep`]: any other configured command (e2e, build)
//! - [`CleanupStep`]: log retention
//! - [`ScriptedStep`]: deterministic replay for dry runs and tests

pub mod base;
pub mod cleanup;
pub mod command;
pub mod env_check;
pub mod lint;
pub mod runner;
pub mod scripted;

pub use base::{Step, StepContext, StepError, StepOutput};
pub use cleanup::CleanupStep;
pub use command::{CommandStep, TestGroupStep};
pub use env_check::EnvCheckStep;
pub use lint::LintStep;
pub use runner::{CommandEvent, CommandRunner, SPAWN_FAILURE_EXIT_CODE};
pub use scripted::ScriptedStep;

use crate::config::AppConfig;
use lp_protocol::run_models::StepName;
use std::sync::Arc;

/// The pipeline's steps, in execution order, built from configuration.
pub fn pipeline_steps(config: &AppConfig) -> Vec<Arc<dyn Step>> {
    let pipeline = &config.pipeline;
    vec![
        Arc::new(EnvCheckStep::new(config.settings.clone())),
        Arc::new(LintStep::new(pipeline.lint.clone())),
        Arc::new(TestGroupStep::new(
            StepName::TestUnit,
            pipeline.test_unit.clone(),
        )),
        Arc::new(TestGroupStep::new(
            StepName::TestIntegration,
            pipeline.test_integration.clone(),
        )),
        Arc::new(CommandStep::new(StepName::TestE2e, pipeline.test_e2e.clone()).with_retry()),
        Arc::new(CommandStep::new(StepName::Build, pipeline.build.clone())),
        Arc::new(CleanupStep::new(
            config.log_dir(),
            config.settings.log_retention_days,
        )),
    ]
}

/// Steps for `--dry-run`: every step succeeds without running anything.
pub fn dry_run_steps() -> Vec<Arc<dyn Step>> {
    StepName::PIPELINE
        .iter()
        .map(|name| Arc::new(ScriptedStep::succeeding(*name)) as Arc<dyn Step>)
        .collect()
}
