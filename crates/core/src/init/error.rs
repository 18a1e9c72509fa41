//! Errors from `localpipe init`.

use std::path::PathBuf;
use thiserror::Error;

pub type InitResult<T> = Result<T, InitError>;

#[derive(Debug, Error)]
pub enum InitError {
    /// `.localpipe/` already exists and `--force` was not given.
    #[error(".localpipe directory already exists at {0:?}. Use --force to overwrite.")]
    DirectoryExists(PathBuf),

    /// The embedded template set does not contain this file.
    #[error("No embedded template named {0}")]
    TemplateNotFound(String),

    #[error("Cannot create {path:?}: {source}")]
    DirectoryCreate {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cannot write template to {path:?}: {source}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },
}
