use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{deploy, init, run, state};

#[derive(Parser)]
#[command(name = "localpipe")]
#[command(version)]
#[command(about = "Local CI/CD pipeline orchestrator")]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    /// Project root containing `.localpipe/`
    #[arg(long, global = true, default_value = ".")]
    project: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    run: run::RunArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline (default)
    Run(run::RunArgs),
    /// Run the configured git operations and record the deployment
    Deploy(deploy::DeployArgs),
    /// Show the recorded deployment state
    State(state::StateArgs),
    /// Create `.localpipe/` from the built-in templates
    Init(init::InitArgs),
}

fn init_tracing() {
    // stdout carries NDJSON log entries only.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    init_tracing();

    let cli = Cli::parse();
    let project = cli.project;

    let code = match cli.command {
        None => run::execute(cli.run, &project).await?,
        Some(Commands::Run(args)) => run::execute(args, &project).await?,
        Some(Commands::Deploy(args)) => deploy::execute(args, &project).await?,
        Some(Commands::State(args)) => state::execute(args, &project)?,
        Some(Commands::Init(args)) => init::execute(args, &project)?,
    };

    std::process::exit(code);
}
