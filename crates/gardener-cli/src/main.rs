//! Gardener CLI - autonomous project-growing commit bot
//!
//! Usage:
//!   gardener run                 Start the loop against the current repo
//!   gardener config              Show the persisted configuration
//!   gardener config --api-key K  Merge a change into it and save

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gardener_core::{GardenerConfig, LogEvent, LogRole};
use gardener_orchestrator::start;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "gardener")]
#[command(author, version, about = "Autonomous project-growing commit bot")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, default_value = "gardener_config.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the orchestration loop until interrupted
    Run {
        /// Working repository root
        #[arg(long, default_value = ".")]
        repo: PathBuf,
    },

    /// Show the configuration, or merge changes into it and save
    Config {
        #[arg(long)]
        api_key: Option<String>,

        /// Local generation model identifier
        #[arg(long)]
        model: Option<String>,

        /// Seconds between commits
        #[arg(long)]
        interval: Option<u64>,

        /// Daily commit quota
        #[arg(long)]
        max_commits: Option<u32>,

        /// Remote repository URL (empty disables pushing)
        #[arg(long)]
        repo_url: Option<String>,

        #[arg(long)]
        committer_name: Option<String>,

        #[arg(long)]
        committer_email: Option<String>,

        /// CPU load percentage below which the system counts as idle
        #[arg(long)]
        idle_threshold: Option<u8>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    match cli.command {
        Commands::Run { repo } => cmd_run(&cli.config, repo).await,
        Commands::Config {
            api_key,
            model,
            interval,
            max_commits,
            repo_url,
            committer_name,
            committer_email,
            idle_threshold,
        } => cmd_config(
            &cli.config,
            ConfigChanges {
                api_key,
                model,
                interval,
                max_commits,
                repo_url,
                committer_name,
                committer_email,
                idle_threshold,
            },
        ),
    }
}

async fn cmd_run(config_path: &Path, repo: PathBuf) -> Result<()> {
    let config = GardenerConfig::load(config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;

    // Configuration-blocking: without a credential the loop cannot do
    // useful work, so refuse loudly instead of spinning on errors.
    if config.api_key.is_empty() {
        anyhow::bail!(
            "API key is missing. Set it first: gardener config --api-key <KEY>"
        );
    }

    info!("Starting loop against {}", repo.display());
    let (handle, mut events) = start(config, repo);

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(event) => render(&event),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupt received, stopping...");
                handle.request_stop();
                break;
            }
        }
    }

    // Drain remaining events while polling the worker down
    while handle.is_running() {
        while let Ok(event) = events.try_recv() {
            render(&event);
        }
        tokio::time::sleep(Duration::from_millis(500)).await;
    }
    while let Ok(event) = events.try_recv() {
        render(&event);
    }
    handle.join().await;
    Ok(())
}

struct ConfigChanges {
    api_key: Option<String>,
    model: Option<String>,
    interval: Option<u64>,
    max_commits: Option<u32>,
    repo_url: Option<String>,
    committer_name: Option<String>,
    committer_email: Option<String>,
    idle_threshold: Option<u8>,
}

impl ConfigChanges {
    fn apply(self, config: &mut GardenerConfig) -> bool {
        let mut changed = false;
        macro_rules! merge {
            ($field:ident, $target:ident) => {
                if let Some(value) = self.$field {
                    config.$target = value;
                    changed = true;
                }
            };
        }
        merge!(api_key, api_key);
        merge!(model, model);
        merge!(interval, interval_secs);
        merge!(max_commits, max_commits_per_day);
        merge!(repo_url, repo_url);
        merge!(committer_name, committer_name);
        merge!(committer_email, committer_email);
        merge!(idle_threshold, idle_threshold_percent);
        changed
    }
}

fn cmd_config(config_path: &Path, changes: ConfigChanges) -> Result<()> {
    let mut config = GardenerConfig::load(config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;

    if changes.apply(&mut config) {
        config
            .save(config_path)
            .with_context(|| format!("Failed to save {}", config_path.display()))?;
        info!("Configuration saved to {}", config_path.display());
    }

    let mut shown = serde_json::to_value(&config)?;
    if let Some(key) = shown.get_mut("api_key") {
        if !config.api_key.is_empty() {
            *key = serde_json::Value::String("<set>".to_string());
        }
    }
    println!("{}", serde_json::to_string_pretty(&shown)?);
    Ok(())
}

fn render(event: &LogEvent) {
    match event.role {
        LogRole::Warning => warn!("[{}] {}", event.role, event.message),
        LogRole::Error | LogRole::Critical => error!("[{}] {}", event.role, event.message),
        _ => info!("[{}] {}", event.role, event.message),
    }
}
