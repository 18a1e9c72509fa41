//! The deploy step: git operations with bounded retry, then one record.

use crate::deploy::store::{DeploymentStateStore, StoreResult};
use crate::logging::{LogLevel, LogRecord};
use crate::steps::{CommandRunner, StepContext};
use chrono::Utc;
use lp_protocol::config_models::DeployCommands;
use lp_protocol::deployment_models::{CurrentDeployment, DeploymentRecord, DeploymentStatus};
use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;

/// Exit code of `localpipe deploy` when the deployment failed. Kept
/// outside the pipeline's 0-5 range so the two contracts never collide.
pub const DEPLOY_FAILURE_EXIT_CODE: i32 = 6;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(2);

const UNKNOWN_COMMIT: &str = "unknown";

/// Result of a deploy: the attempt as recorded and the full record after it.
#[derive(Debug, Clone)]
pub struct DeployReport {
    pub deployment: CurrentDeployment,
    pub record: DeploymentRecord,
}

impl DeployReport {
    pub fn succeeded(&self) -> bool {
        self.deployment.status == DeploymentStatus::Success
    }

    pub fn exit_code(&self) -> i32 {
        if self.succeeded() {
            0
        } else {
            DEPLOY_FAILURE_EXIT_CODE
        }
    }
}

pub struct DeployStep {
    commands: DeployCommands,
    commit: Option<String>,
    store: DeploymentStateStore,
    max_attempts: u32,
    backoff: Duration,
}

impl DeployStep {
    pub fn new(commands: DeployCommands, store: DeploymentStateStore) -> Self {
        Self {
            commands,
            commit: None,
            store,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: DEFAULT_BACKOFF,
        }
    }

    /// Deploy this commit instead of resolving it with `commit_command`.
    pub fn with_commit(mut self, commit: Option<String>) -> Self {
        self.commit = commit;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Run the deployment and record its terminal outcome exactly once.
    ///
    /// Only an unusable state file is an error; a failed deployment is a
    /// successful call with a failure status. The state file is read before
    /// any command runs, so a corrupt record never hides a real push.
    pub async fn execute(&self, ctx: &StepContext) -> StoreResult<DeployReport> {
        let started = Instant::now();
        if let Err(err) = self.store.load() {
            ctx.logger.error("deploy", format!("{err}, not deploying"));
            return Err(err);
        }
        let deployment_id = Uuid::new_v4();

        let (commit_sha, attempts, status) = match self.resolve_commit(ctx).await {
            Some(commit_sha) => {
                let (attempts, status) = self.run_git_operations(ctx).await;
                (commit_sha, attempts, status)
            }
            None => (UNKNOWN_COMMIT.to_string(), 0, DeploymentStatus::Failure),
        };

        let deployment = CurrentDeployment {
            deployment_id,
            timestamp: Utc::now(),
            commit_sha,
            status,
            git_operations_attempts: attempts,
        };
        let record = self.store.record(&deployment)?;

        let message = match status {
            DeploymentStatus::Success => format!(
                "deployed {} as {} after {} attempt(s)",
                deployment.commit_sha, deployment.deployment_id, attempts
            ),
            DeploymentStatus::Failure => format!(
                "deployment {} of {} failed after {} attempt(s)",
                deployment.deployment_id, deployment.commit_sha, attempts
            ),
        };
        let (level, code) = match status {
            DeploymentStatus::Success => (LogLevel::Success, 0),
            DeploymentStatus::Failure => (LogLevel::Error, DEPLOY_FAILURE_EXIT_CODE),
        };
        ctx.logger.emit(
            LogRecord::new(level, "deploy", message)
                .with_duration(started.elapsed())
                .with_exit_code(code)
                .with_source(crate::source_context!()),
        );

        Ok(DeployReport { deployment, record })
    }

    async fn resolve_commit(&self, ctx: &StepContext) -> Option<String> {
        if let Some(commit) = self.commit.as_deref().map(str::trim) {
            if !commit.is_empty() {
                return Some(commit.to_string());
            }
        }

        let output = CommandRunner::run(&self.commands.commit_command, ctx).await;
        let sha = output
            .output_lossy()
            .lines()
            .map(str::trim)
            .rfind(|line| !line.is_empty())
            .map(str::to_string);

        match (output.is_success(), sha) {
            (true, Some(sha)) => Some(sha),
            _ => {
                ctx.logger.error(
                    "deploy",
                    format!(
                        "could not resolve commit with '{}' (exit code {})",
                        self.commands.commit_command, output.exit_code
                    ),
                );
                None
            }
        }
    }

    /// Run the configured git operations, retrying the whole sequence.
    /// Returns the number of attempts made and the final status.
    async fn run_git_operations(&self, ctx: &StepContext) -> (u32, DeploymentStatus) {
        // Nothing was deployed, so the rollback target must not move.
        if self.commands.git_operations.is_empty() {
            ctx.logger.error("deploy", "no git operations configured");
            return (0, DeploymentStatus::Failure);
        }

        for attempt in 1..=self.max_attempts {
            match self.run_sequence(ctx).await {
                Ok(()) => return (attempt, DeploymentStatus::Success),
                Err((operation, exit_code)) => {
                    ctx.logger.warn(
                        "deploy",
                        format!(
                            "git operation '{operation}' failed with exit code {exit_code} (attempt {attempt}/{})",
                            self.max_attempts
                        ),
                    );
                }
            }
            if attempt < self.max_attempts && !self.backoff.is_zero() {
                tokio::time::sleep(self.backoff).await;
            }
        }

        (self.max_attempts, DeploymentStatus::Failure)
    }

    async fn run_sequence(&self, ctx: &StepContext) -> Result<(), (String, i32)> {
        for operation in &self.commands.git_operations {
            let output = CommandRunner::run(operation, ctx).await;
            if !output.is_success() {
                return Err((operation.clone(), output.exit_code));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deploy::store::StoreError;
    use crate::logging::StructuredLogger;
    use std::sync::Arc;

    fn ctx(dir: &std::path::Path) -> StepContext {
        StepContext::new(dir, Arc::new(StructuredLogger::new("run-test")))
    }

    fn commands(operations: &[&str]) -> DeployCommands {
        DeployCommands {
            git_operations: operations.iter().map(|op| op.to_string()).collect(),
            commit_command: "echo 0123abcd".to_string(),
        }
    }

    #[tokio::test]
    async fn test_successful_deploy_is_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let store = DeploymentStateStore::new(dir.path().join("state.json"));
        let step = DeployStep::new(commands(&["true", "true"]), store).with_backoff(Duration::ZERO);

        let report = step.execute(&ctx(dir.path())).await.unwrap();

        assert!(report.succeeded());
        assert_eq!(report.exit_code(), 0);
        assert_eq!(report.deployment.commit_sha, "0123abcd");
        assert_eq!(report.deployment.git_operations_attempts, 1);
        assert_eq!(
            report.record.last_known_good.unwrap().deployment_id,
            report.deployment.deployment_id
        );
    }

    #[tokio::test]
    async fn test_transient_failure_is_retried() {
        let dir = tempfile::tempdir().unwrap();
        let store = DeploymentStateStore::new(dir.path().join("state.json"));
        // Fails until the marker exists; the first attempt creates it.
        let flaky = "if [ -f pushed ]; then true; else touch pushed; false; fi";
        let step = DeployStep::new(commands(&[flaky]), store).with_backoff(Duration::ZERO);

        let report = step.execute(&ctx(dir.path())).await.unwrap();

        assert!(report.succeeded());
        assert_eq!(report.deployment.git_operations_attempts, 2);
    }

    #[tokio::test]
    async fn test_persistent_failure_keeps_last_known_good() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let ctx = ctx(dir.path());

        let good = DeployStep::new(commands(&["true"]), DeploymentStateStore::new(&path))
            .execute(&ctx)
            .await
            .unwrap();

        let bad = DeployStep::new(commands(&["exit 1"]), DeploymentStateStore::new(&path))
            .with_commit(Some("feedbeef".to_string()))
            .with_backoff(Duration::ZERO)
            .execute(&ctx)
            .await
            .unwrap();

        assert!(!bad.succeeded());
        assert_eq!(bad.exit_code(), DEPLOY_FAILURE_EXIT_CODE);
        assert_eq!(bad.deployment.git_operations_attempts, DEFAULT_MAX_ATTEMPTS);
        assert_eq!(bad.deployment.commit_sha, "feedbeef");
        assert_eq!(
            bad.record.last_known_good.unwrap().deployment_id,
            good.deployment.deployment_id
        );

        let retry_warnings = ctx
            .logger
            .entries()
            .iter()
            .filter(|e| e.level == LogLevel::Warn && e.step == "deploy")
            .count();
        assert_eq!(retry_warnings, 3);
    }

    #[tokio::test]
    async fn test_unresolvable_commit_fails_without_git_operations() {
        let dir = tempfile::tempdir().unwrap();
        let store = DeploymentStateStore::new(dir.path().join("state.json"));
        let mut commands = commands(&["touch should-not-exist"]);
        commands.commit_command = "exit 128".to_string();

        let report = DeployStep::new(commands, store)
            .execute(&ctx(dir.path()))
            .await
            .unwrap();

        assert!(!report.succeeded());
        assert_eq!(report.deployment.commit_sha, "unknown");
        assert_eq!(report.deployment.git_operations_attempts, 0);
        assert!(!dir.path().join("should-not-exist").exists());
    }

    #[tokio::test]
    async fn test_corrupt_state_file_stops_before_git_operations() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{ not json").unwrap();

        let result = DeployStep::new(commands(&["touch pushed"]), DeploymentStateStore::new(&path))
            .execute(&ctx(dir.path()))
            .await;

        assert!(matches!(result, Err(StoreError::Parse { .. })));
        assert!(!dir.path().join("pushed").exists());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ not json");
    }

    #[tokio::test]
    async fn test_empty_git_operations_keep_last_known_good() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let ctx = ctx(dir.path());

        let good = DeployStep::new(commands(&["true"]), DeploymentStateStore::new(&path))
            .execute(&ctx)
            .await
            .unwrap();
        let empty = DeployStep::new(commands(&[]), DeploymentStateStore::new(&path))
            .execute(&ctx)
            .await
            .unwrap();

        assert!(!empty.succeeded());
        assert_eq!(empty.exit_code(), DEPLOY_FAILURE_EXIT_CODE);
        assert_eq!(empty.deployment.git_operations_attempts, 0);
        assert_eq!(
            empty.record.last_known_good.unwrap().deployment_id,
            good.deployment.deployment_id
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_between_attempts() {
        let dir = tempfile::tempdir().unwrap();
        let store = DeploymentStateStore::new(dir.path().join("state.json"));
        let step = DeployStep::new(commands(&["exit 1"]), store)
            .with_commit(Some("abc".to_string()))
            .with_max_attempts(2)
            .with_backoff(Duration::from_secs(30));

        let before = Instant::now();
        let report = step.execute(&ctx(dir.path())).await.unwrap();

        assert_eq!(report.deployment.git_operations_attempts, 2);
        assert!(before.elapsed() >= Duration::from_secs(30));
    }
}
