//! Base `Step` trait and supporting types.

use crate::logging::StructuredLogger;
use async_trait::async_trait;
use lp_protocol::run_models::StepName;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use thiserror::Error;

/// What a step produced: the raw exit status and its combined output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutput {
    pub exit_code: i32,
    pub output: Vec<u8>,
    /// The step had nothing to do (no command configured).
    pub skipped: bool,
}

impl StepOutput {
    pub fn new(exit_code: i32, output: impl Into<Vec<u8>>) -> Self {
        Self {
            exit_code,
            output: output.into(),
            skipped: false,
        }
    }

    pub fn success() -> Self {
        Self::new(0, Vec::new())
    }

    pub fn failure(exit_code: i32, output: impl Into<Vec<u8>>) -> Self {
        Self::new(exit_code, output)
    }

    pub fn skipped() -> Self {
        Self {
            exit_code: 0,
            output: Vec::new(),
            skipped: true,
        }
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }

    pub fn output_lossy(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }
}

#[derive(Error, Debug)]
pub enum StepError {
    #[error("Failed to spawn command '{command}': {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },
    #[error("Failed to capture {0} of child process")]
    MissingPipe(&'static str),
    #[error("Failed to wait for command '{command}': {source}")]
    Wait {
        command: String,
        source: std::io::Error,
    },
}

/// Shared state handed to every step of a run.
///
/// Cheap to clone so parallel test groups can each own a copy.
#[derive(Clone)]
pub struct StepContext {
    /// Working directory for every command.
    pub project_root: PathBuf,
    pub logger: Arc<StructuredLogger>,
    /// Echo raw tool output to stderr.
    pub verbose: bool,
    /// Run the lint fix command and re-check when lint fails.
    pub auto_fix: bool,
    /// Variables loaded by env-check, passed to every later command.
    pub env: Arc<RwLock<BTreeMap<String, String>>>,
}

impl StepContext {
    pub fn new(project_root: impl Into<PathBuf>, logger: Arc<StructuredLogger>) -> Self {
        Self {
            project_root: project_root.into(),
            logger,
            verbose: false,
            auto_fix: true,
            env: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_auto_fix(mut self, auto_fix: bool) -> Self {
        self.auto_fix = auto_fix;
        self
    }

    /// Snapshot of the loaded environment.
    pub fn env_vars(&self) -> BTreeMap<String, String> {
        self.env
            .read()
            .map(|env| env.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    pub fn extend_env(&self, vars: BTreeMap<String, String>) {
        let mut env = self
            .env
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        env.extend(vars);
    }
}

/// One named unit of pipeline work.
///
/// Steps never return errors: anything that goes wrong is expressed as a
/// non-zero exit code and output text, so the engine can always record a
/// result and move on.
#[async_trait]
pub trait Step: Send + Sync {
    fn name(&self) -> StepName;

    async fn run(&self, ctx: &StepContext) -> StepOutput;

    /// Eligible for the flaky-step retry policy.
    fn retryable(&self) -> bool {
        false
    }

    /// May run concurrently with other parallelizable steps.
    fn parallelizable(&self) -> bool {
        false
    }
}
