use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;
use xfchess_analysis::analysis::{
    validate_fen, AnalysisOptions, AnalysisOrchestrator, AnalysisOutcome,
};
use xfchess_analysis::core::AnalyzerConfig;
use xfchess_analysis::engine::{EngineTransport, HttpEngineTransport};

#[derive(Parser, Debug)]
#[command(
    name = "xfchess-analysis",
    version,
    about = "Query a remote chess analysis engine"
)]
struct Cli {
    /// JSON config file (defaults to the platform config directory)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,
    /// Analysis server base URL, overrides config and environment
    #[arg(long, value_name = "URL", global = true)]
    server: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check a FEN string without contacting the engine
    Validate { fen: String },
    /// Probe the engine's health endpoint
    Health,
    /// Show local and remote engine descriptors
    Info,
    /// Analyse a position with explicit options
    Analyze {
        fen: String,
        #[arg(long, default_value_t = 8)]
        depth: u32,
        /// Bypass the result cache
        #[arg(long)]
        no_cache: bool,
        /// Request deadline in milliseconds (defaults to the configured timeout)
        #[arg(long, value_name = "MS")]
        timeout_ms: Option<u64>,
    },
    /// Depth 6, cached
    Quick { fen: String },
    /// Depth 12, uncached
    Deep { fen: String },
    /// Depth 10, uncached
    Tactical { fen: String },
    /// Analyse at depths 4, 6, ... up to --max-depth
    Multi {
        fen: String,
        #[arg(long, default_value_t = 10)]
        max_depth: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let command = match cli.command {
        Command::Validate { fen } => return validate(&fen),
        command => command,
    };

    let mut config =
        AnalyzerConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(server) = cli.server {
        config.engine.server_url = server;
        config.validate().context("Invalid --server URL")?;
    }

    run(command, &config).await
}

async fn run(command: Command, config: &AnalyzerConfig) -> Result<()> {
    let transport = Arc::new(
        HttpEngineTransport::new(&config.engine).context("Failed to create engine transport")?,
    );
    let analyzer = AnalysisOrchestrator::with_config(transport.clone(), &config.cache);

    match command {
        Command::Validate { fen } => validate(&fen)?,
        Command::Health => {
            let healthy = transport.health_check().await;
            println!("{}", if healthy { "healthy" } else { "unhealthy" });
            if !healthy {
                std::process::exit(1);
            }
        }
        Command::Info => {
            analyzer.initialize().await?;
            print_json(&analyzer.engine_status())?;
            print_json(&analyzer.remote_engine_info().await?)?;
        }
        Command::Analyze {
            fen,
            depth,
            no_cache,
            timeout_ms,
        } => {
            let timeout = timeout_ms
                .map(Duration::from_millis)
                .unwrap_or_else(|| config.engine.request_timeout());
            let options = AnalysisOptions::new(depth, !no_cache, timeout);
            print_outcome(analyzer.get_top_moves(&fen, options).await?)?;
        }
        Command::Quick { fen } => print_outcome(analyzer.quick_evaluation(&fen).await?)?,
        Command::Deep { fen } => print_outcome(analyzer.deep_analysis(&fen).await?)?,
        Command::Tactical { fen } => print_outcome(analyzer.tactical_analysis(&fen).await?)?,
        Command::Multi { fen, max_depth } => {
            let ladder = analyzer.multi_depth_analysis(&fen, max_depth).await;
            info!("[CLI] Collected {} depth results", ladder.len());
            print_json(&ladder)?;
        }
    }

    analyzer.shutdown();
    Ok(())
}

fn validate(fen: &str) -> Result<()> {
    match validate_fen(fen) {
        Ok(()) => {
            println!("valid");
            Ok(())
        }
        Err(reason) => {
            println!("invalid: {reason}");
            std::process::exit(1);
        }
    }
}

fn print_outcome(outcome: AnalysisOutcome) -> Result<()> {
    match outcome {
        AnalysisOutcome::Completed(result) => print_json(&result),
        AnalysisOutcome::Cancelled => {
            println!("analysis was superseded");
            Ok(())
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
