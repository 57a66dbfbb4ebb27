use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod client;
mod commands;

use client::ApiClient;
use commands::{analyze, analyze::Analysis, metrics, Backend};
use workflow_analysis::{AnalysisConfig, AnalysisService};

#[derive(Parser)]
#[command(
    name = "wfa",
    version,
    about = "Workflow analysis CLI",
    long_about = "Suggest improvements, apply fixes, and estimate time and cost for workflow definitions\n\n\
                  Examples:\n  \
                  wfa suggest workflow.json\n  \
                  wfa fix workflow.json --logs errors.txt\n  \
                  wfa --local estimate workflow.json\n\n\
                  For more help: wfa help",
    after_help = "Use 'wfa <command> --help' for more information about a command."
)]
struct Cli {
    /// API endpoint URL
    #[arg(
        long,
        global = true,
        env = "WFA_API_URL",
        default_value = "http://localhost:8090"
    )]
    api_url: String,

    /// Bearer token sent to the API
    #[arg(long, global = true, env = "WFA_TOKEN", default_value = "mock-cli")]
    token: String,

    /// Run the analysis engine in-process instead of calling the API
    #[arg(long, global = true)]
    local: bool,

    /// Print engine logs to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "pretty")]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, clap::ValueEnum)]
enum OutputFormat {
    Pretty,
    Json,
    Compact,
}

#[derive(Subcommand)]
enum Commands {
    /// Suggest improvements for a workflow
    ///
    /// Examples:
    ///   wfa suggest workflow.json
    ///   wfa suggest workflow.json --output json
    Suggest {
        /// Path to workflow JSON file
        file: PathBuf,
    },

    /// Return a corrected copy of a workflow
    ///
    /// Examples:
    ///   wfa fix workflow.json
    ///   wfa fix workflow.json --logs errors.json
    Fix {
        /// Path to workflow JSON file
        file: PathBuf,

        /// Error logs (JSON array or plain text, one entry per line)
        #[arg(long)]
        logs: Option<PathBuf>,
    },

    /// Estimate execution time, cost and complexity
    Estimate {
        /// Path to workflow JSON file
        file: PathBuf,
    },

    /// Reorder validation ahead of transforms and report cost notes
    Optimize {
        /// Path to workflow JSON file
        file: PathBuf,
    },

    /// Show the dependency graph summary
    Graph {
        /// Path to workflow JSON file
        file: PathBuf,
    },

    /// Show analysis metrics
    Metrics,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "workflow_analysis=debug".into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }

    // Select backend
    let backend = if cli.local {
        let service = AnalysisService::from_config(AnalysisConfig::from_env())
            .context("Failed to initialize analysis engine")?;
        Backend::Local(service)
    } else {
        Backend::Remote(ApiClient::new(&cli.api_url, &cli.token)?)
    };

    // Execute command
    match cli.command {
        Commands::Suggest { file } => {
            analyze::handle(&backend, file, Analysis::Suggest, &cli.output).await?
        }
        Commands::Fix { file, logs } => {
            analyze::handle(&backend, file, Analysis::Fix { logs }, &cli.output).await?
        }
        Commands::Estimate { file } => {
            analyze::handle(&backend, file, Analysis::Estimate, &cli.output).await?
        }
        Commands::Optimize { file } => {
            analyze::handle(&backend, file, Analysis::Optimize, &cli.output).await?
        }
        Commands::Graph { file } => {
            analyze::handle(&backend, file, Analysis::Graph, &cli.output).await?
        }
        Commands::Metrics => metrics::handle(&backend, &cli.output).await?,
    }

    Ok(())
}
