//! Configuration file loader for the `.localpipe/` directory.
//!
//! This module loads and parses the project configuration:
//! - `config.toml`: Orchestrator settings
//! - `pipeline.yaml` (or `pipeline.yml`): Step commands

use crate::config::error::ConfigError;
use crate::config::error::ConfigResult;
use crate::config::models::{AppConfig, CONFIG_DIR};
use lp_protocol::config_models::{PipelineDefinition, PipelineSettings};
use std::path::Path;

/// Loads all configuration from the `.localpipe/` directory under `root`.
///
/// If the directory or any file is missing, defaults are used for the
/// missing part rather than returning an error.
///
/// # Errors
///
/// Returns `ConfigError` if:
/// - Files exist but cannot be read
/// - Files have invalid TOML or YAML syntax
/// - `timeout_seconds` is zero
pub fn load_config(root: &Path) -> ConfigResult<AppConfig> {
    let lp_dir = root.join(CONFIG_DIR);

    if !lp_dir.exists() {
        tracing::debug!(path = %lp_dir.display(), "no config directory, using defaults");
        return Ok(AppConfig::with_root(root));
    }

    let settings = load_settings(&lp_dir)?;
    let pipeline = load_pipeline_definition(&lp_dir)?;

    Ok(AppConfig {
        root: root.to_path_buf(),
        settings,
        pipeline,
    })
}

/// Loads orchestrator settings from `config.toml`.
fn load_settings(lp_dir: &Path) -> ConfigResult<PipelineSettings> {
    let config_path = lp_dir.join("config.toml");

    if !config_path.exists() {
        return Ok(PipelineSettings::default());
    }

    let content =
        std::fs::read_to_string(&config_path).map_err(|source| ConfigError::FileRead {
            path: config_path.clone(),
            source,
        })?;

    let settings: PipelineSettings =
        toml::from_str(&content).map_err(|source| ConfigError::TomlParse {
            path: config_path.clone(),
            source,
        })?;

    if settings.timeout_seconds == 0 {
        return Err(ConfigError::InvalidConfig {
            path: config_path,
            reason: "timeout_seconds must be greater than zero".to_string(),
        });
    }

    Ok(settings)
}

/// Loads step commands from `pipeline.yaml`, falling back to `pipeline.yml`.
fn load_pipeline_definition(lp_dir: &Path) -> ConfigResult<PipelineDefinition> {
    let Some(path) = ["pipeline.yaml", "pipeline.yml"]
        .iter()
        .map(|name| lp_dir.join(name))
        .find(|candidate| candidate.exists())
    else {
        return Ok(PipelineDefinition::default());
    };

    let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::FileRead {
        path: path.clone(),
        source,
    })?;

    // An empty file is a valid, empty definition.
    if content.trim().is_empty() {
        return Ok(PipelineDefinition::default());
    }

    serde_yaml::from_str(&content).map_err(|source| ConfigError::YamlParse { path, source })
}
