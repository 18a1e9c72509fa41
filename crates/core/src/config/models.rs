//! Configuration models that aggregate all settings.
//!
//! This module provides the unified `AppConfig` structure that combines
//! the orchestrator settings and the step definitions into a single
//! configuration object rooted at a project directory.

use lp_protocol::config_models::{PipelineDefinition, PipelineSettings};
use std::path::{Path, PathBuf};

/// Name of the project configuration directory.
pub const CONFIG_DIR: &str = ".localpipe";

/// Unified application configuration loaded from `.localpipe/`.
///
/// # Example
///
/// ```rust,no_run
/// use lp_core::config::loader::load_config;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("."))?;
/// println!("Budget: {}s", config.settings.timeout_seconds);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Project root every relative path is resolved against.
    pub root: PathBuf,

    /// Settings from `config.toml`.
    pub settings: PipelineSettings,

    /// Step commands from `pipeline.yaml`.
    pub pipeline: PipelineDefinition,
}

impl AppConfig {
    /// Default configuration rooted at `root`.
    pub fn with_root(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            settings: PipelineSettings::default(),
            pipeline: PipelineDefinition::default(),
        }
    }

    /// Resolve a configured path against the project root.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    pub fn log_dir(&self) -> PathBuf {
        self.resolve(&self.settings.log_dir)
    }

    pub fn state_file(&self) -> PathBuf {
        self.resolve(&self.settings.state_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_relative_and_absolute() {
        let config = AppConfig::with_root(Path::new("/srv/project"));

        assert_eq!(config.log_dir(), PathBuf::from("/srv/project/logs"));
        assert_eq!(
            config.state_file(),
            PathBuf::from("/srv/project/.localpipe/deployment-state.json")
        );
        assert_eq!(config.resolve(Path::new("/tmp/x")), PathBuf::from("/tmp/x"));
    }
}
