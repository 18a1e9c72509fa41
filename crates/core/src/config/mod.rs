//! Configuration loading and management.
//!
//! This module provides functionality to load the `.localpipe/` project
//! configuration and the environment files selected at `env-check`.

pub mod env;
pub mod error;
pub mod loader;
pub mod models;

pub use env::{load_env_file, select_env_file};
pub use error::{ConfigError, ConfigResult};
pub use loader::load_config;
pub use models::AppConfig;
