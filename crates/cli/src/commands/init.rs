use clap::Args;
use color_eyre::Result;
use colored::Colorize;
use lp_core::init::{generate_localpipe_structure, InitOptions};
use std::path::Path;

#[derive(Args, Debug, Clone)]
pub struct InitArgs {
    /// Overwrite existing template files
    #[arg(long)]
    pub force: bool,
}

pub fn execute(args: InitArgs, project: &Path) -> Result<i32> {
    let written = generate_localpipe_structure(&InitOptions {
        target_dir: project.to_path_buf(),
        force: args.force,
    })?;

    for path in &written {
        println!("{} {}", "created".green(), path.display());
    }

    Ok(0)
}
