//! Flowreplay CLI
//!
//! Generate session replay videos and manage the video store.

mod generate;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use flowreplay_app::config::CONFIG_FILE_NAME;
use flowreplay_app::{video_store, AppConfig};
use flowreplay_recorder::{JsonSessionStore, SessionId, SessionRepository, SessionSummary};

#[derive(Parser)]
#[command(name = "flowreplay")]
#[command(about = "Flowreplay - session replay video generation", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to ./flowreplay.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay sessions in a browser and encode their videos
    Generate {
        /// Session ids
        #[arg(required = true)]
        ids: Vec<SessionId>,

        /// Sessions replayed at the same time
        #[arg(short, long, default_value = "1")]
        jobs: usize,

        /// Override the output frame rate
        #[arg(long)]
        fps: Option<u32>,

        /// Give up on a replay after this many seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Show the browser window
        #[arg(long)]
        headful: bool,
    },

    /// Print interaction statistics for a session
    Summary {
        /// Session id
        id: SessionId,
    },

    /// Manage generated videos
    Videos {
        #[command(subcommand)]
        command: VideoCommands,
    },

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum VideoCommands {
    /// Delete every video of one session
    Delete {
        /// Session id
        id: SessionId,
    },
    /// Delete all generated videos
    Clear,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Write a configuration file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Commands::Config {
        command: ConfigCommands::Init { force },
    } = &cli.command
    {
        let path = cli.config.clone().unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
        return config_init(&path, *force);
    }

    let cwd = std::env::current_dir().context("Failed to read working directory")?;
    let mut config = AppConfig::load_or_default(cli.config.as_deref(), &cwd)?;

    match cli.command {
        Commands::Config { .. } => unreachable!(), // Handled above
        Commands::Generate {
            ids,
            jobs,
            fps,
            timeout,
            headful,
        } => {
            if let Some(fps) = fps {
                anyhow::ensure!(fps > 0, "--fps must be at least 1");
                config.replay.fps = fps;
            }
            if timeout.is_some() {
                config.replay.timeout_secs = timeout;
            }
            if headful {
                config.browser.headless = false;
            }
            cmd_generate(&config, &ids, jobs).await
        }
        Commands::Summary { id } => cmd_summary(&config, id),
        Commands::Videos { command } => cmd_videos(&config, command),
    }
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn cmd_generate(config: &AppConfig, ids: &[SessionId], jobs: usize) -> Result<()> {
    let responses = generate::run(config, ids, jobs).await;

    let mut failed = 0;
    for (id, response) in &responses {
        if !response.is_success() {
            failed += 1;
            tracing::error!(session = id, status = response.status_code, "Replay failed");
        }
        println!("{}", serde_json::to_string(&response.to_json())?);
    }

    anyhow::ensure!(
        failed == 0,
        "{failed} of {} session(s) failed",
        responses.len()
    );
    Ok(())
}

fn cmd_summary(config: &AppConfig, id: SessionId) -> Result<()> {
    let store = JsonSessionStore::new(&config.storage.sessions_dir);
    let session = store
        .load_session(id)
        .with_context(|| format!("Failed to load session {id}"))?;
    let summary = SessionSummary::from_session(&session);
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn cmd_videos(config: &AppConfig, command: VideoCommands) -> Result<()> {
    let store = video_store(config);
    let removed = match command {
        VideoCommands::Delete { id } => store.delete(id)?,
        VideoCommands::Clear => store.clear()?,
    };
    println!("{}", serde_json::json!({ "status": "success", "removed": removed }));
    Ok(())
}

fn config_init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }
    AppConfig::default().save(path)?;
    tracing::info!(path = %path.display(), "Wrote default configuration");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn generate_takes_many_ids() {
        let cli = Cli::try_parse_from(["flowreplay", "generate", "3", "4", "--jobs", "2"]).unwrap();
        match cli.command {
            Commands::Generate { ids, jobs, .. } => {
                assert_eq!(ids, vec![3, 4]);
                assert_eq!(jobs, 2);
            }
            _ => panic!("expected generate"),
        }
    }

    #[test]
    fn generate_requires_an_id() {
        assert!(Cli::try_parse_from(["flowreplay", "generate"]).is_err());
    }

    #[test]
    fn config_init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);

        config_init(&path, false).unwrap();
        assert!(AppConfig::load(&path).is_ok());
        assert!(config_init(&path, false).is_err());
        assert!(config_init(&path, true).is_ok());
    }
}
