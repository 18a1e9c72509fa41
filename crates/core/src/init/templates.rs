//! Embedded template files for `.localpipe/` initialization.
//!
//! The repository root `templates/` directory is embedded at compile time
//! with `rust-embed`, so `localpipe init` needs no files on disk:
//! - `CARGO_MANIFEST_DIR` = `crates/core`
//! - `../../templates` = repository root `templates/`
//!
//! With the `debug-embed` feature, debug builds embed the files too.

use rust_embed::RustEmbed;

#[derive(RustEmbed)]
#[folder = "$CARGO_MANIFEST_DIR/../../templates"]
pub struct TemplateAssets;

/// Template file content by path relative to `templates/`.
///
/// # Example
/// ```
/// use lp_core::init::templates::get_template;
///
/// let config = get_template("config.toml").expect("config.toml should exist");
/// assert!(config.contains("timeout_seconds"));
/// ```
pub fn get_template(path: &str) -> Option<String> {
    TemplateAssets::get(path).map(|file| String::from_utf8_lossy(file.data.as_ref()).to_string())
}

/// All embedded template paths, sorted.
pub fn list_templates() -> Vec<String> {
    let mut paths: Vec<String> = TemplateAssets::iter().map(|path| path.to_string()).collect();
    paths.sort();
    paths
}
