//! Project initialization.
//!
//! Generates a `.localpipe/` directory from embedded templates:
//! - `config.toml`: orchestrator settings
//! - `pipeline.yaml`: step commands
//!
//! # Example
//!
//! ```no_run
//! use lp_core::init::{generate_localpipe_structure, InitOptions};
//! use std::path::PathBuf;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let options = InitOptions {
//!     target_dir: PathBuf::from("."),
//!     force: false,
//! };
//!
//! generate_localpipe_structure(&options)?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod generator;
pub mod templates;

pub use error::{InitError, InitResult};
pub use generator::{generate_localpipe_structure, InitOptions};
pub use templates::{get_template, list_templates};
