//! Errors raised while reading `.localpipe/` and env files.
//!
//! A missing file is never an error; only files that exist but cannot be
//! read or parsed are.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read {path:?}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// `config.toml` is not valid TOML for [`PipelineSettings`](lp_protocol::config_models::PipelineSettings).
    #[error("Invalid settings in {path:?}: {source}")]
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// `pipeline.yaml` does not describe a pipeline definition.
    #[error("Invalid pipeline definition in {path:?}: {source}")]
    YamlParse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    /// A line of an env file is not `KEY=VALUE`.
    #[error("Invalid line {line} in env file {path}: {content}")]
    EnvLine {
        path: PathBuf,
        line: usize,
        content: String,
    },

    /// A setting parsed but has an unusable value.
    #[error("Invalid value in {path:?}: {reason}")]
    InvalidConfig { path: PathBuf, reason: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;
