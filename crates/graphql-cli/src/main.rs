mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "graphql")]
#[command(about = "Generate TypeScript types for GraphQL literals", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to GraphQL config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Project name (for multi-project configs)
    #[arg(short, long)]
    project: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a declaration module for every operation and fragment
    Typegen {
        /// Print what would be written without touching the file system
        #[arg(long)]
        dry_run: bool,
    },

    /// Validate GraphQL literals against the schema
    Validate {
        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Human,
    /// JSON output for tooling, one error per line
    Json,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Typegen { dry_run } => {
            commands::typegen::run(cli.config, cli.project, dry_run).await?;
        }
        Commands::Validate { format } => {
            commands::validate::run(cli.config, cli.project, format).await?;
        }
    }

    Ok(())
}
