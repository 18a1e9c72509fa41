//! Subcommand handlers. Each returns the process exit code.

pub mod deploy;
pub mod init;
pub mod run;
pub mod state;

use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use lp_core::config::{load_config, AppConfig};
use std::path::Path;

pub(crate) fn project_config(project: &Path) -> Result<AppConfig> {
    load_config(project)
        .wrap_err_with(|| format!("failed to load configuration from {}", project.display()))
}
