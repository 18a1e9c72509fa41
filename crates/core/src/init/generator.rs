//! `.localpipe/` scaffolding.

use super::error::{InitError, InitResult};
use super::templates::{get_template, list_templates};
use crate::config::models::CONFIG_DIR;
use std::fs;
use std::path::{Path, PathBuf};

/// Options for initializing a `.localpipe` directory.
#[derive(Debug, Clone)]
pub struct InitOptions {
    /// Project root where `.localpipe/` will be created.
    pub target_dir: PathBuf,

    /// Overwrite existing template files.
    pub force: bool,
}

/// Write every embedded template into `<target_dir>/.localpipe/`.
///
/// Returns the paths written.
///
/// # Errors
///
/// - `DirectoryExists` if `.localpipe/` exists and `force` is not set
/// - `TemplateNotFound` if an embedded template cannot be read
/// - `DirectoryCreate` / `FileWrite` on file system failures
pub fn generate_localpipe_structure(options: &InitOptions) -> InitResult<Vec<PathBuf>> {
    let lp_dir = options.target_dir.join(CONFIG_DIR);

    if lp_dir.exists() && !options.force {
        return Err(InitError::DirectoryExists(lp_dir));
    }

    fs::create_dir_all(&lp_dir).map_err(|source| InitError::DirectoryCreate {
        path: lp_dir.clone(),
        source,
    })?;

    list_templates()
        .iter()
        .map(|template| write_template_file(&lp_dir, template))
        .collect()
}

fn write_template_file(lp_dir: &Path, template_path: &str) -> InitResult<PathBuf> {
    let content = get_template(template_path)
        .ok_or_else(|| InitError::TemplateNotFound(template_path.to_string()))?;

    let target_path = lp_dir.join(template_path);

    if let Some(parent) = target_path.parent() {
        fs::create_dir_all(parent).map_err(|source| InitError::DirectoryCreate {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    fs::write(&target_path, content).map_err(|source| InitError::FileWrite {
        path: target_path.clone(),
        source,
    })?;

    Ok(target_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config;
    use tempfile::tempdir;

    #[test]
    fn test_generate_structure_is_loadable() {
        let dir = tempdir().unwrap();
        let options = InitOptions {
            target_dir: dir.path().to_path_buf(),
            force: false,
        };

        let written = generate_localpipe_structure(&options).unwrap();

        assert_eq!(written.len(), 2);
        let lp_dir = dir.path().join(".localpipe");
        assert!(lp_dir.join("config.toml").exists());
        assert!(lp_dir.join("pipeline.yaml").exists());

        let config = load_config(dir.path()).expect("generated config should load");
        assert_eq!(config.settings.timeout_seconds, 300);
        assert!(config.pipeline.build.is_some());
    }

    #[test]
    fn test_generate_fails_if_exists() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join(".localpipe")).unwrap();

        let result = generate_localpipe_structure(&InitOptions {
            target_dir: dir.path().to_path_buf(),
            force: false,
        });

        assert!(matches!(result, Err(InitError::DirectoryExists(_))));
    }

    #[test]
    fn test_generate_with_force_overwrites() {
        let dir = tempdir().unwrap();
        let lp_dir = dir.path().join(".localpipe");
        fs::create_dir_all(&lp_dir).unwrap();
        fs::write(lp_dir.join("config.toml"), "old content").unwrap();
        fs::write(lp_dir.join("deployment-state.json"), "{}").unwrap();

        generate_localpipe_structure(&InitOptions {
            target_dir: dir.path().to_path_buf(),
            force: true,
        })
        .unwrap();

        let config = fs::read_to_string(lp_dir.join("config.toml")).unwrap();
        assert!(config.contains("timeout_seconds"));
        // Files that are not templates are left alone.
        assert!(lp_dir.join("deployment-state.json").exists());
    }
}
