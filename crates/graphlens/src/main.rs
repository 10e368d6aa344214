//! Graphlens CLI - analytical views over a code-graph snapshot.
//!
//! Reads a JSON snapshot from disk and prints coupling metrics, execution
//! flows, impact analysis or a fully laid-out view.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use colored::Colorize;
use graphlens::ViewMode;
use tracing_subscriber::EnvFilter;

mod cli;

/// Graphlens: analytical views over code dependency graphs.
#[derive(Parser)]
#[command(name = "graphlens")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// YAML configuration file (defaults are used when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show coupling metrics, most coupled symbols first
    Metrics {
        /// Snapshot JSON file
        snapshot: PathBuf,

        /// Number of symbols to show
        #[arg(short, long, default_value = "20")]
        top: usize,
    },

    /// List detected execution flows
    Flows {
        /// Snapshot JSON file
        snapshot: PathBuf,
    },

    /// Show the blast radius of changing a symbol
    Impact {
        /// Snapshot JSON file
        snapshot: PathBuf,

        /// Symbol id (`filePath:name:startLine`)
        node_id: String,
    },

    /// Run the full pipeline and print the positioned graph as JSON
    Render {
        /// Snapshot JSON file
        snapshot: PathBuf,

        /// View mode (architecture, flow, risk, impact, trace, search)
        #[arg(short, long, default_value = "architecture")]
        mode: ViewMode,

        /// Focused node id
        #[arg(short, long)]
        focus: Option<String>,

        /// Search query (applies when longer than two characters)
        #[arg(short, long)]
        search: Option<String>,

        /// Collapse a container (repeatable)
        #[arg(long = "collapse", value_name = "ID")]
        collapsed: Vec<String>,

        /// Containment depth: 0 domains, 1 files, 2 symbols
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(0..=2))]
        depth: Option<u8>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli::load_config(cli.config.as_deref()).await {
        Ok(config) => match cli.command {
            Commands::Metrics { snapshot, top } => cli::metrics::run(&config, &snapshot, top).await,
            Commands::Flows { snapshot } => cli::flows::run(&config, &snapshot).await,
            Commands::Impact { snapshot, node_id } => {
                cli::impact::run(&config, &snapshot, &node_id).await
            }
            Commands::Render {
                snapshot,
                mode,
                focus,
                search,
                collapsed,
                depth,
            } => {
                let params = graphlens::ViewParams {
                    mode,
                    focused_node_id: focus,
                    search_query: search,
                    collapsed_nodes: collapsed.into_iter().collect(),
                    max_depth: depth,
                };
                cli::render::run(&config, &snapshot, &params).await
            }
        },
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {e}", "error".red().bold());
            // Show cause chain for nested errors
            let mut source = std::error::Error::source(&e);
            while let Some(cause) = source {
                eprintln!("  {}: {cause}", "caused by".dimmed());
                source = std::error::Error::source(cause);
            }
            ExitCode::FAILURE
        }
    }
}
