//! Environment file selection and parsing.
//!
//! The selector variable named by `env_selector` picks one of two env files:
//! `production` selects the production file, any other value (or none) the
//! development file.

use crate::config::error::{ConfigError, ConfigResult};
use lp_protocol::config_models::PipelineSettings;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Pick the env file for the given selector value.
pub fn select_env_file(settings: &PipelineSettings, selector_value: Option<&str>) -> PathBuf {
    match selector_value.map(str::trim) {
        Some(value) if value.eq_ignore_ascii_case("production") => {
            settings.env_files.production.clone()
        }
        _ => settings.env_files.development.clone(),
    }
}

/// Parse a `KEY=VALUE` env file.
///
/// Blank lines and `#` comments are skipped, an `export ` prefix is accepted
/// and one pair of matching surrounding quotes is stripped from values.
pub fn load_env_file(path: &Path) -> ConfigResult<BTreeMap<String, String>> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    parse_env(&content, path)
}

fn parse_env(content: &str, path: &Path) -> ConfigResult<BTreeMap<String, String>> {
    let mut vars = BTreeMap::new();

    for (index, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let line = line.strip_prefix("export ").unwrap_or(line);
        let Some((key, value)) = line.split_once('=') else {
            return Err(ConfigError::EnvLine {
                path: path.to_path_buf(),
                line: index + 1,
                content: raw.to_string(),
            });
        };

        let key = key.trim();
        if key.is_empty() || key.contains(char::is_whitespace) {
            return Err(ConfigError::EnvLine {
                path: path.to_path_buf(),
                line: index + 1,
                content: raw.to_string(),
            });
        }

        vars.insert(key.to_string(), unquote(value.trim()).to_string());
    }

    Ok(vars)
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}
