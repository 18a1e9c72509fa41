//! Test fixtures for projects, steps and engines.

#![allow(dead_code)]

use lp_core::engine::PipelineEngine;
use lp_core::logging::StructuredLogger;
use lp_core::steps::{ScriptedStep, Step, StepContext, StepOutput};
use lp_protocol::run_models::StepName;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

pub const TEST_RUN_ID: &str = "run-20260309-140507-t3st01";

/// Create a temporary project with a `.localpipe/` configuration whose
/// commands are plain shell built-ins.
///
/// Returns a TempDir that must be kept alive for the test duration.
pub fn create_test_project(pipeline_yaml: &str) -> std::io::Result<TempDir> {
    let temp_dir = tempfile::tempdir()?;
    let root = temp_dir.path();

    std::fs::create_dir_all(root.join(".localpipe"))?;
    std::fs::write(
        root.join(".localpipe/config.toml"),
        "timeout_seconds = 60\nlog_dir = \"logs\"\n",
    )?;
    std::fs::write(root.join(".localpipe/pipeline.yaml"), pipeline_yaml)?;
    std::fs::write(root.join(".env.development"), "APP_MODE=test\n")?;

    Ok(temp_dir)
}

/// A pipeline definition where every step succeeds.
pub const PASSING_PIPELINE: &str = r#"
lint:
  check: "true"
test-unit: "echo unit ok"
test-integration: "echo integration ok"
test-e2e: "echo e2e ok"
build: "echo built"
deploy:
  commit-command: "echo 0123abcd"
  git-operations:
    - "true"
"#;

/// Scripted replacements for every pipeline step, all succeeding.
pub fn succeeding_steps() -> Vec<ScriptedStep> {
    StepName::PIPELINE
        .iter()
        .map(|name| ScriptedStep::succeeding(*name))
        .collect()
}

/// Replace the scripted step with the same name.
pub fn with_step(mut steps: Vec<ScriptedStep>, replacement: ScriptedStep) -> Vec<ScriptedStep> {
    let name = replacement.name();
    if let Some(slot) = steps.iter_mut().find(|step| step.name() == name) {
        *slot = replacement;
    }
    steps
}

/// Outputs for a step that fails with `code` and then succeeds.
pub fn fail_then_succeed(code: i32) -> Vec<StepOutput> {
    vec![StepOutput::failure(code, "first attempt failed"), StepOutput::success()]
}

/// Create an engine over scripted steps, logging to memory only.
pub fn create_engine(steps: Vec<ScriptedStep>) -> PipelineEngine {
    let steps: Vec<Arc<dyn Step>> = steps
        .into_iter()
        .map(|step| Arc::new(step) as Arc<dyn Step>)
        .collect();
    PipelineEngine::new(steps, create_context(Path::new(".")))
}

pub fn create_context(root: &Path) -> StepContext {
    StepContext::new(root, Arc::new(StructuredLogger::new(TEST_RUN_ID)))
}
