//! Quarry CLI entry point.
//!
//! `quarry search` runs a single research step and prints one result URL
//! per line.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{debug, info};

use quarry::config::{load_config, Config};
use quarry::providers::openai::OpenAiProvider;
use quarry::research::QuerySynthesizer;
use quarry::search::bing::BingSearch;
use quarry::telemetry::{JsonlSink, TelemetrySink, TracingSink};

/// Quarry — turn a research plan into candidate web sources.
#[derive(Parser)]
#[command(name = "quarry", version, about)]
struct Cli {
    /// Path to a TOML config file. Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Write JSON logs to this directory in addition to stderr.
    #[arg(long, global = true)]
    logs_dir: Option<PathBuf>,

    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

/// Available CLI subcommands.
#[derive(Subcommand)]
enum Command {
    /// Synthesize one search query and print the result URLs.
    Search {
        /// Research topic.
        #[arg(long)]
        topic: String,
        /// Current research plan.
        #[arg(long, default_value = "")]
        plan: String,
        /// Facts gathered so far.
        #[arg(long, default_value = "")]
        facts: String,
        /// Prior observation; repeat for several.
        #[arg(long = "observation")]
        observations: Vec<String>,
        /// Append the telemetry record to this JSON lines file.
        #[arg(long)]
        telemetry: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            return Err(e).context("failed to load .env");
        }
    }

    let _logging_guard = match &cli.logs_dir {
        Some(dir) => Some(quarry::logging::init_production(dir)?),
        None => {
            quarry::logging::init_cli()?;
            None
        }
    };

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => Config::default(),
    };
    debug!(?config, "configuration loaded");

    match cli.command {
        Command::Search {
            topic,
            plan,
            facts,
            observations,
            telemetry,
        } => {
            handle_search(
                config,
                &topic,
                &plan,
                &facts,
                &observations,
                telemetry.as_deref(),
            )
            .await
        }
    }
}

/// Wire providers from config and run one research step.
async fn handle_search(
    config: Config,
    topic: &str,
    plan: &str,
    facts: &str,
    observations: &[String],
    telemetry_override: Option<&Path>,
) -> anyhow::Result<()> {
    let model = OpenAiProvider::from_config(&config.models.openai)
        .context("failed to configure OpenAI provider")?;
    let search =
        BingSearch::from_config(&config.search.bing).context("failed to configure Bing search")?;

    let telemetry: Arc<dyn TelemetrySink> =
        match telemetry_override.or(config.telemetry.path.as_deref()) {
            Some(path) => Arc::new(JsonlSink::open(path)?),
            None => Arc::new(TracingSink),
        };

    let synthesizer = QuerySynthesizer::new(
        config.research,
        Arc::new(model),
        Arc::new(search),
        telemetry,
    );

    info!(topic, observations = observations.len(), "running search step");
    let urls = synthesizer
        .synthesize_and_search(topic, plan, facts, observations)
        .await?;

    for url in urls {
        println!("{url}");
    }
    Ok(())
}
