//! Pipeline execution engine.
//!
//! The PipelineEngine folds over an ordered list of steps. For each one it
//! polls the timeout guard, runs the step (through the retry policy or the
//! parallel execution manager where the step allows it), seals the results
//! into the run, reports failures to the exit-code registry and polls the
//! guard again.

use crate::classifier::ContentionPatterns;
use crate::config::AppConfig;
use crate::exit_code::ExitCodeRegistry;
use crate::logging::{default_log_path, new_id, StructuredLogger};
use crate::parallel::ParallelExecutionManager;
use crate::retry::run_with_retry;
use crate::state::run::{
    abort_run, attempt_step, complete_run, create_run, seal_step, start_run, time_out_run,
    StepAttempt,
};
use crate::steps::{dry_run_steps, pipeline_steps, Step, StepContext};
use crate::timeout::TimeoutGuard;
use anyhow::{Context, Result};
use chrono::Utc;
use lp_protocol::run_models::{PipelineRun, StepName, StepOutcome};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Flags for a single pipeline invocation.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Run the lint fix command and re-check on lint failure.
    pub auto_fix: bool,
    /// Echo raw tool output to stderr.
    pub verbose: bool,
    /// Record every test step as skipped.
    pub skip_tests: bool,
    /// Replace every step with one that succeeds immediately.
    pub dry_run: bool,
    /// Log file override; defaults to `<log_dir>/<start time>/pipeline.log`.
    pub log_file: Option<PathBuf>,
    /// Echo log entries to stdout.
    pub stdout: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            auto_fix: true,
            verbose: false,
            skip_tests: false,
            dry_run: false,
            log_file: None,
            stdout: true,
        }
    }
}

/// The main pipeline execution engine.
pub struct PipelineEngine {
    steps: Vec<Arc<dyn Step>>,
    ctx: StepContext,
    registry: Arc<ExitCodeRegistry>,
    parallel: ParallelExecutionManager,
    budget: Duration,
    skip_tests: bool,
}

impl PipelineEngine {
    /// Create an engine over explicit steps with default settings: a 300s
    /// budget, parallel tests enabled with the built-in contention patterns.
    pub fn new(steps: Vec<Arc<dyn Step>>, ctx: StepContext) -> Self {
        Self {
            steps,
            ctx,
            registry: Arc::new(ExitCodeRegistry::new()),
            parallel: ParallelExecutionManager::new(true, ContentionPatterns::default()),
            budget: Duration::from_secs(300),
            skip_tests: false,
        }
    }

    /// Build the engine for a project: assigns the run id, opens the log
    /// file and creates the configured steps.
    pub fn from_config(config: &AppConfig, options: &RunOptions) -> Result<Self> {
        let run_id = new_id();
        let log_path = options
            .log_file
            .clone()
            .unwrap_or_else(|| default_log_path(&config.log_dir(), Utc::now()));

        let logger = StructuredLogger::new(run_id)
            .with_stdout(options.stdout)
            .with_log_file(&log_path)
            .with_context(|| format!("failed to open log file {}", log_path.display()))?;

        let steps = if options.dry_run {
            dry_run_steps()
        } else {
            pipeline_steps(config)
        };

        let ctx = StepContext::new(config.root.clone(), Arc::new(logger))
            .with_verbose(options.verbose)
            .with_auto_fix(options.auto_fix);

        Ok(Self::new(steps, ctx)
            .with_budget(Duration::from_secs(config.settings.timeout_seconds))
            .with_parallel(ParallelExecutionManager::new(
                config.settings.parallel_tests,
                ContentionPatterns::with_extra(&config.pipeline.contention_patterns),
            ))
            .with_skip_tests(options.skip_tests))
    }

    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.budget = budget;
        self
    }

    pub fn with_parallel(mut self, parallel: ParallelExecutionManager) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_skip_tests(mut self, skip_tests: bool) -> Self {
        self.skip_tests = skip_tests;
        self
    }

    pub fn logger(&self) -> Arc<StructuredLogger> {
        Arc::clone(&self.ctx.logger)
    }

    pub fn registry(&self) -> Arc<ExitCodeRegistry> {
        Arc::clone(&self.registry)
    }

    /// Execute every step and return the finished run.
    ///
    /// Never fails: step problems are recorded as results and exit codes.
    /// `run.exit_code` is the code the process should exit with.
    pub async fn run(&self) -> PipelineRun {
        let logger = Arc::clone(&self.ctx.logger);
        let mut run = create_run(logger.run_id().unwrap_or_default());
        start_run(&run, &logger);

        let guard = TimeoutGuard::start(self.budget);
        let mut index = 0;

        while index < self.steps.len() {
            let step = Arc::clone(&self.steps[index]);

            if guard
                .check(&self.registry, &logger, step.name().as_str())
                .is_exceeded()
            {
                time_out_run(&mut run);
                break;
            }

            // Consecutive parallelizable steps form one batch.
            let batch: Vec<Arc<dyn Step>> = if step.parallelizable() {
                self.steps[index..]
                    .iter()
                    .take_while(|candidate| candidate.parallelizable())
                    .cloned()
                    .collect()
            } else {
                vec![Arc::clone(&step)]
            };
            index += batch.len();

            let attempts = self.execute(&step, &batch).await;
            if self.record(&mut run, attempts) {
                abort_run(
                    &mut run,
                    &logger,
                    "environment validation failed, aborting pipeline",
                );
                break;
            }

            if guard
                .check(&self.registry, &logger, step.name().as_str())
                .is_exceeded()
            {
                time_out_run(&mut run);
                break;
            }
        }

        complete_run(&mut run, &self.registry, &logger, guard.elapsed());
        run
    }

    async fn execute(&self, step: &Arc<dyn Step>, batch: &[Arc<dyn Step>]) -> Vec<StepAttempt> {
        if self.skip_tests && step.name().is_test() {
            return batch
                .iter()
                .map(|skipped| StepAttempt::skipped(skipped.name()))
                .collect();
        }

        if step.parallelizable() {
            let report = self.parallel.run(batch, &self.ctx).await;
            tracing::debug!(mode = ?report.mode, "test batch finished");
            return report.attempts;
        }

        if step.retryable() {
            return run_with_retry(step.as_ref(), &self.ctx).await;
        }

        vec![attempt_step(step.as_ref(), &self.ctx, 1).await]
    }

    /// Seal attempts into the run and report final failures.
    ///
    /// Only the last attempt of each step counts towards the exit code.
    /// Returns true when the failure is fatal for the run.
    fn record(&self, run: &mut PipelineRun, attempts: Vec<StepAttempt>) -> bool {
        let mut fatal = false;
        let is_final: Vec<bool> = attempts
            .iter()
            .enumerate()
            .map(|(position, attempt)| {
                attempts[position + 1..]
                    .iter()
                    .all(|later| later.name != attempt.name)
            })
            .collect();

        for (attempt, is_final) in attempts.into_iter().zip(is_final) {
            let name = attempt.name;
            let result = seal_step(run, attempt, &self.ctx.logger);

            if !is_final || result.outcome != StepOutcome::Failure {
                continue;
            }
            if let Some(code) = name.failure_code() {
                self.registry.report_code(code);
            }
            if name == StepName::EnvCheck {
                fatal = true;
            }
        }

        fatal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::steps::{ScriptedStep, StepOutput};
    use lp_protocol::run_models::RunStatus;

    fn engine_with(steps: Vec<Arc<dyn Step>>) -> PipelineEngine {
        let ctx = StepContext::new(
            ".",
            Arc::new(StructuredLogger::new("run-20260101-000000-abc123")),
        );
        PipelineEngine::new(steps, ctx)
    }

    fn all_succeeding() -> Vec<Arc<dyn Step>> {
        dry_run_steps()
    }

    fn replace(steps: &mut [Arc<dyn Step>], step: ScriptedStep) {
        let name = step.name();
        if let Some(slot) = steps.iter_mut().find(|s| s.name() == name) {
            *slot = Arc::new(step);
        }
    }

    #[tokio::test]
    async fn test_pipeline_engine_all_steps_pass() {
        let engine = engine_with(all_succeeding());

        let run = engine.run().await;

        assert_eq!(run.exit_code, 0);
        assert_eq!(run.status, RunStatus::Success);
        assert_eq!(run.steps_executed.len(), 7);
        let orders: Vec<usize> = run.steps_executed.iter().map(|r| r.order).collect();
        assert_eq!(orders, vec![1, 2, 3, 4, 5, 6, 7]);
    }

    #[tokio::test]
    async fn test_pipeline_engine_continues_after_quality_failure() {
        let mut steps = all_succeeding();
        replace(&mut steps, ScriptedStep::failing(StepName::Lint, 1, "lint error"));
        replace(&mut steps, ScriptedStep::failing(StepName::Build, 2, "compile error"));
        let engine = engine_with(steps);

        let run = engine.run().await;

        assert_eq!(run.exit_code, 1);
        assert_eq!(run.status, RunStatus::Failed);
        assert_eq!(run.steps_executed.len(), 7);
    }

    #[tokio::test]
    async fn test_pipeline_engine_env_check_failure_aborts() {
        let mut steps = all_succeeding();
        replace(
            &mut steps,
            ScriptedStep::failing(StepName::EnvCheck, 4, "missing DATABASE_URL"),
        );
        let engine = engine_with(steps);

        let run = engine.run().await;

        assert_eq!(run.exit_code, 4);
        assert_eq!(run.status, RunStatus::Aborted);
        assert_eq!(run.steps_executed.len(), 1);
    }

    #[tokio::test]
    async fn test_pipeline_engine_skip_tests() {
        let engine = engine_with(all_succeeding()).with_skip_tests(true);

        let run = engine.run().await;

        assert_eq!(run.exit_code, 0);
        let skipped: Vec<StepName> = run
            .steps_executed
            .iter()
            .filter(|r| r.outcome == StepOutcome::Skipped)
            .map(|r| r.name)
            .collect();
        assert_eq!(
            skipped,
            vec![StepName::TestUnit, StepName::TestIntegration, StepName::TestE2e]
        );
    }

    #[tokio::test]
    async fn test_pipeline_engine_retried_failure_counts_once() {
        let mut steps = all_succeeding();
        replace(
            &mut steps,
            ScriptedStep::new(
                StepName::TestE2e,
                vec![StepOutput::failure(1, "flaky"), StepOutput::failure(1, "flaky")],
            ),
        );
        let engine = engine_with(steps);

        let run = engine.run().await;

        assert_eq!(run.exit_code, 2);
        assert_eq!(run.results_for(StepName::TestE2e).len(), 2);
    }

    #[tokio::test]
    async fn test_pipeline_engine_summary_entry() {
        let engine = engine_with(all_succeeding());
        let logger = engine.logger();

        engine.run().await;

        let summary = logger.entries().pop().unwrap();
        assert_eq!(summary.step, "complete");
        assert_eq!(summary.exit_code, Some(0));
        assert!(summary.duration_ms.is_some());
        assert!(summary.source.is_some());
    }
}
