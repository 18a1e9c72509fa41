//! Project configuration models for `.localpipe/`.
//!
//! Two files make up a project's configuration:
//! - `config.toml`: orchestrator settings ([`PipelineSettings`])
//! - `pipeline.yaml`: the opaque command behind each step ([`PipelineDefinition`])
//!
//! Every field has a default so that a missing file, or a file that sets only
//! a few keys, is valid.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use ts_rs::TS;

/// Orchestrator settings from `.localpipe/config.toml`.
///
/// # Example
///
/// ```toml
/// timeout_seconds = 300
/// parallel_tests = true
/// log_dir = "logs"
/// log_retention_days = 30
/// env_selector = "LOCALPIPE_ENV"
/// required_env = ["DATABASE_URL"]
/// required_tools = ["git", "cargo"]
///
/// [env_files]
/// development = ".env.development"
/// production = ".env.production"
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[serde(default)]
pub struct PipelineSettings {
    /// Wall-clock budget for a whole run.
    pub timeout_seconds: u64,

    /// Run unit and integration tests concurrently when possible.
    pub parallel_tests: bool,

    /// Root directory for per-run log directories.
    #[ts(type = "string")]
    pub log_dir: PathBuf,

    /// Log files older than this are removed by the cleanup step.
    pub log_retention_days: u64,

    /// Name of the environment variable that selects the env file.
    pub env_selector: String,

    pub env_files: EnvFiles,

    /// Variables that must be defined once the env file is loaded.
    pub required_env: Vec<String>,

    /// Executables that must resolve on `PATH`.
    pub required_tools: Vec<String>,

    /// Location of the deployment state document.
    #[ts(type = "string")]
    pub state_file: PathBuf,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            timeout_seconds: 300,
            parallel_tests: true,
            log_dir: PathBuf::from("logs"),
            log_retention_days: 30,
            env_selector: "LOCALPIPE_ENV".to_string(),
            env_files: EnvFiles::default(),
            required_env: Vec::new(),
            required_tools: Vec::new(),
            state_file: PathBuf::from(".localpipe/deployment-state.json"),
        }
    }
}

/// The two selectable environment files.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[serde(default)]
pub struct EnvFiles {
    #[ts(type = "string")]
    pub development: PathBuf,
    #[ts(type = "string")]
    pub production: PathBuf,
}

impl Default for EnvFiles {
    fn default() -> Self {
        Self {
            development: PathBuf::from(".env.development"),
            production: PathBuf::from(".env.production"),
        }
    }
}

/// Step commands from `.localpipe/pipeline.yaml`.
///
/// A step without a command is recorded as skipped.
///
/// # Example
///
/// ```yaml
/// lint:
///   check: "cargo clippy -- -D warnings"
///   fix: "cargo clippy --fix --allow-dirty"
/// test-unit: "cargo test --lib"
/// test-integration: "cargo test --test '*'"
/// test-e2e: "./scripts/e2e.sh"
/// build: "cargo build --release"
/// deploy:
///   git-operations:
///     - "git push origin HEAD:deploy"
/// contention-patterns:
///   - "database is locked"
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq, TS)]
#[serde(default, rename_all = "kebab-case")]
pub struct PipelineDefinition {
    pub lint: LintCommands,
    pub test_unit: Option<String>,
    pub test_integration: Option<String>,
    pub test_e2e: Option<String>,
    pub build: Option<String>,
    pub deploy: DeployCommands,

    /// Extra substrings (case-insensitive) that mark a test failure as
    /// resource contention rather than an assertion failure.
    pub contention_patterns: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq, TS)]
#[serde(default)]
pub struct LintCommands {
    pub check: Option<String>,
    /// Auto-fix command run before re-checking a failed lint.
    pub fix: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[serde(default, rename_all = "kebab-case")]
pub struct DeployCommands {
    /// Git commands run in order; the whole sequence is retried on failure.
    pub git_operations: Vec<String>,

    /// Command whose trimmed stdout is the deployed commit sha.
    pub commit_command: String,
}

impl Default for DeployCommands {
    fn default() -> Self {
        Self {
            git_operations: Vec::new(),
            commit_command: "git rev-parse HEAD".to_string(),
        }
    }
}
