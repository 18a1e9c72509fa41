//! Environment validation.
//!
//! Picks the env file from the selector variable, loads it into the run
//! context and checks that required variables and tools are present. A
//! failure here is fatal for the run.

use crate::config::{load_env_file, select_env_file};
use crate::logging::LogLevel;
use crate::steps::base::{Step, StepContext, StepOutput};
use async_trait::async_trait;
use lp_protocol::config_models::PipelineSettings;
use lp_protocol::exit_models::ExitCode;
use lp_protocol::run_models::StepName;
use std::collections::BTreeMap;

pub struct EnvCheckStep {
    settings: PipelineSettings,
    /// Value of the selector variable; read from the process when `None`.
    selector_override: Option<String>,
}

impl EnvCheckStep {
    pub fn new(settings: PipelineSettings) -> Self {
        Self {
            settings,
            selector_override: None,
        }
    }

    pub fn with_selector(mut self, value: impl Into<String>) -> Self {
        self.selector_override = Some(value.into());
        self
    }

    fn selector_value(&self) -> Option<String> {
        self.selector_override
            .clone()
            .or_else(|| std::env::var(&self.settings.env_selector).ok())
    }

    /// Problems found, empty when the environment is usable.
    fn validate(&self, ctx: &StepContext) -> Vec<String> {
        let mut problems = Vec::new();

        let selector = self.selector_value();
        let env_path = ctx
            .project_root
            .join(select_env_file(&self.settings, selector.as_deref()));

        let loaded = if env_path.exists() {
            match load_env_file(&env_path) {
                Ok(vars) => {
                    ctx.logger.info(
                        "env-check",
                        format!("loaded {} variables from {}", vars.len(), env_path.display()),
                    );
                    vars
                }
                Err(err) => {
                    problems.push(err.to_string());
                    BTreeMap::new()
                }
            }
        } else {
            ctx.logger.warn(
                "env-check",
                format!("env file {} not found", env_path.display()),
            );
            BTreeMap::new()
        };

        for name in &self.settings.required_env {
            if !loaded.contains_key(name) && std::env::var_os(name).is_none() {
                problems.push(format!("required variable {name} is not set"));
            }
        }

        for tool in &self.settings.required_tools {
            if let Err(err) = which::which(tool) {
                problems.push(format!("required tool {tool} not found: {err}"));
            }
        }

        ctx.extend_env(loaded);
        problems
    }
}

#[async_trait]
impl Step for EnvCheckStep {
    fn name(&self) -> StepName {
        StepName::EnvCheck
    }

    async fn run(&self, ctx: &StepContext) -> StepOutput {
        let problems = self.validate(ctx);
        if problems.is_empty() {
            return StepOutput::success();
        }

        for problem in &problems {
            crate::log_event!(ctx.logger, LogLevel::Error, "env-check", "{problem}");
        }

        StepOutput::failure(ExitCode::Environment.code(), problems.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::StructuredLogger;
    use std::fs;
    use std::sync::Arc;

    fn ctx(dir: &std::path::Path) -> StepContext {
        StepContext::new(dir, Arc::new(StructuredLogger::new("run-test")))
    }

    #[tokio::test]
    async fn test_loads_selected_env_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".env.production"), "LP_ENV_CHECK_PROD=1\n").unwrap();
        fs::write(dir.path().join(".env.development"), "LP_ENV_CHECK_DEV=1\n").unwrap();

        let settings = PipelineSettings {
            required_env: vec!["LP_ENV_CHECK_PROD".to_string()],
            ..PipelineSettings::default()
        };
        let ctx = ctx(dir.path());

        let output = EnvCheckStep::new(settings)
            .with_selector("production")
            .run(&ctx)
            .await;

        assert!(output.is_success(), "{}", output.output_lossy());
        let env = ctx.env_vars();
        assert_eq!(env["LP_ENV_CHECK_PROD"], "1");
        assert!(!env.contains_key("LP_ENV_CHECK_DEV"));
    }

    #[tokio::test]
    async fn test_missing_required_variable_fails_with_environment_code() {
        let dir = tempfile::tempdir().unwrap();
        let settings = PipelineSettings {
            required_env: vec!["LP_ENV_CHECK_SURELY_UNSET_VARIABLE".to_string()],
            ..PipelineSettings::default()
        };
        let ctx = ctx(dir.path());

        let output = EnvCheckStep::new(settings)
            .with_selector("development")
            .run(&ctx)
            .await;

        assert_eq!(output.exit_code, 4);
        assert!(output
            .output_lossy()
            .contains("LP_ENV_CHECK_SURELY_UNSET_VARIABLE"));
        let errors: Vec<_> = ctx
            .logger
            .entries()
            .into_iter()
            .filter(|entry| entry.level == LogLevel::Error)
            .collect();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].source.is_some());
    }

    #[tokio::test]
    async fn test_missing_tool_fails() {
        let dir = tempfile::tempdir().unwrap();
        let settings = PipelineSettings {
            required_tools: vec!["sh".to_string(), "lp-no-such-tool-xyz".to_string()],
            ..PipelineSettings::default()
        };

        let output = EnvCheckStep::new(settings).run(&ctx(dir.path())).await;

        assert_eq!(output.exit_code, 4);
        let text = output.output_lossy();
        assert!(text.contains("lp-no-such-tool-xyz"));
        assert!(!text.contains("tool sh "));
    }

    #[tokio::test]
    async fn test_malformed_env_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".env.development"), "not a pair\n").unwrap();

        let output = EnvCheckStep::new(PipelineSettings::default())
            .with_selector("development")
            .run(&ctx(dir.path()))
            .await;

        assert_eq!(output.exit_code, 4);
    }

    #[tokio::test]
    async fn test_missing_env_file_is_a_warning_only() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ctx(dir.path());

        let output = EnvCheckStep::new(PipelineSettings::default())
            .with_selector("development")
            .run(&ctx)
            .await;

        assert!(output.is_success());
        assert_eq!(ctx.logger.entries()[0].level, LogLevel::Warn);
    }
}
