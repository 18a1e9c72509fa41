//! Log retention as a pipeline step.

use crate::logging::retention::{cleanup_logs, retention_window};
use crate::steps::base::{Step, StepContext, StepOutput};
use async_trait::async_trait;
use lp_protocol::run_models::StepName;
use std::path::PathBuf;
use std::time::SystemTime;

/// Removes expired log files. Always succeeds; problems become warnings.
pub struct CleanupStep {
    log_dir: PathBuf,
    retention_days: u64,
}

impl CleanupStep {
    /// `log_dir` is resolved against the project root when relative.
    pub fn new(log_dir: PathBuf, retention_days: u64) -> Self {
        Self {
            log_dir,
            retention_days,
        }
    }
}

#[async_trait]
impl Step for CleanupStep {
    fn name(&self) -> StepName {
        StepName::Cleanup
    }

    async fn run(&self, ctx: &StepContext) -> StepOutput {
        let dir = ctx.project_root.join(&self.log_dir);
        let window = retention_window(self.retention_days);

        let report = match tokio::task::spawn_blocking(move || {
            cleanup_logs(&dir, window, SystemTime::now())
        })
        .await
        {
            Ok(report) => report,
            Err(err) => {
                ctx.logger
                    .warn("cleanup", format!("log retention task failed: {err}"));
                return StepOutput::success();
            }
        };

        for failure in &report.failures {
            ctx.logger.warn("cleanup", failure.clone());
        }

        StepOutput::new(
            0,
            format!(
                "removed {} expired log files and {} empty directories",
                report.removed_files.len(),
                report.removed_dirs.len()
            ),
        )
    }
}
