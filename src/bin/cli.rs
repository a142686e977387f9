//! feed-relay CLI
//!
//! One watch cycle per invocation; schedule it externally (cron, CI).

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::{DateTime, Local};
use clap::{Parser, Subcommand};
use feed_relay::{
    error::{AppError, Result},
    models::{Config, Credentials, PostId},
    pipeline::{self, PostRelay, Watcher},
    render,
    services::{MediaCompositor, SlackNotifier},
    storage::{FileWatermarkStore, WatermarkStore},
};

/// Environment variable holding the incoming-webhook URL.
const WEBHOOK_ENV: &str = "SLACK_WEBHOOK_URL";

/// Config file read when `--config` is not given.
const DEFAULT_CONFIG: &str = "config.toml";

/// feed-relay - Kakao channel to Slack relay
#[derive(Parser, Debug)]
#[command(
    name = "feed-relay",
    version,
    about = "Relays new Kakao channel posts to a Slack webhook"
)]
struct Cli {
    /// Path to the configuration file [default: config.toml]
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check the feed once and relay new posts
    Run,

    /// Relay one post unconditionally and set the watermark to it
    Replay {
        /// Post id or post URL
        post: String,
    },

    /// Validate the configuration file
    Validate,

    /// Show the feed URL and the stored watermark
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Read the webhook credential before anything touches disk or network.
fn credentials_from_env() -> Result<Credentials> {
    match std::env::var(WEBHOOK_ENV) {
        Ok(url) if !url.trim().is_empty() => Ok(Credentials::new(url.trim())),
        _ => Err(AppError::MissingCredential(WEBHOOK_ENV.to_string())),
    }
}

/// Load and validate the configuration.
///
/// Only an implicit default path may be absent; anything that exists must parse.
fn load_config(path: &Path, required: bool) -> Result<Config> {
    let config = if required {
        Config::load(path)?
    } else {
        Config::load_if_present(path)?
    };
    config.validate()?;
    Ok(config)
}

/// Main entry point for the CLI application.
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let credentials = match cli.command {
        Command::Run | Command::Replay { .. } => match credentials_from_env() {
            Ok(credentials) => Some(credentials),
            Err(e) => {
                log::error!("{}", e);
                return ExitCode::FAILURE;
            }
        },
        Command::Validate | Command::Info => None,
    };

    let explicit = cli.config.is_some();
    let config_path = cli
        .config
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));
    let required = explicit || matches!(cli.command, Command::Validate);

    let config = match load_config(&config_path, required) {
        Ok(config) => config,
        Err(e) => {
            log::error!("Config {} rejected: {}", config_path.display(), e);
            return ExitCode::FAILURE;
        }
    };

    match (cli.command, credentials) {
        (Command::Run, Some(credentials)) => {
            if let Err(e) = run(&config, &credentials).await {
                log::error!("Run aborted: {}", e);
            }
        }

        (Command::Replay { post }, Some(credentials)) => {
            let id = match pipeline::parse_target(&post) {
                Ok(id) => id,
                Err(e) => {
                    log::error!("{}", e);
                    return ExitCode::FAILURE;
                }
            };
            if let Err(e) = replay(&config, &credentials, id).await {
                log::error!("Replay aborted: {}", e);
            }
        }

        (Command::Validate, _) => {
            log::info!("✓ Config OK ({})", config_path.display());
        }

        (Command::Info, _) => {
            if let Err(e) = info(&config).await {
                log::error!("{}", e);
                return ExitCode::FAILURE;
            }
        }

        _ => {}
    }

    ExitCode::SUCCESS
}

async fn run(config: &Config, credentials: &Credentials) -> Result<()> {
    log::info!("feed-relay starting...");

    let store = FileWatermarkStore::from_config(&config.storage);
    let media = MediaCompositor::from_config(&config.media)?;
    let notifier = SlackNotifier::new(&config.notify, credentials)?;
    let relay = PostRelay::new(config, &media, &notifier);

    let renderer = render::launch(&config.crawler).await?;
    let outcome = Watcher::new(config, &store, &relay)
        .run(renderer.as_ref())
        .await?;

    log::info!(
        "Done: {} listed, {} delivered, {} failed, watermark {}",
        outcome.fetched,
        outcome.delivered_count(),
        outcome.failed_count(),
        outcome
            .committed
            .or(outcome.previous)
            .map(|id| id.to_string())
            .unwrap_or_else(|| "unset".to_string())
    );
    Ok(())
}

async fn replay(config: &Config, credentials: &Credentials, id: PostId) -> Result<()> {
    let store = FileWatermarkStore::from_config(&config.storage);
    let media = MediaCompositor::from_config(&config.media)?;
    let notifier = SlackNotifier::new(&config.notify, credentials)?;
    let relay = PostRelay::new(config, &media, &notifier);

    let renderer = render::launch(&config.crawler).await?;
    let report =
        pipeline::run_replay(id, &config.feed, &relay, &store, renderer.as_ref()).await?;

    if report.delivered() {
        log::info!("Replayed post {} ({})", report.id, report.title);
    } else {
        log::warn!("Post {} was not delivered; watermark set anyway", report.id);
    }
    Ok(())
}

async fn info(config: &Config) -> Result<()> {
    let store = FileWatermarkStore::from_config(&config.storage);

    log::info!("Feed: {}", config.feed.feed_url());
    log::info!("Renderer: {:?}", config.crawler.renderer);
    log::info!("Advance policy: {:?}", config.policy.advance);
    log::info!("Watermark file: {}", store.path().display());

    match store.load().await? {
        Some(id) => {
            log::info!("Last relayed post: {} ({})", id, config.feed.post_url(id));
            if let Ok(modified) = std::fs::metadata(store.path()).and_then(|m| m.modified()) {
                let modified: DateTime<Local> = modified.into();
                log::info!("Last updated: {}", modified.format("%Y-%m-%d %H:%M:%S"));
            }
        }
        None => log::info!("No watermark yet; the next run is a first run."),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_config_rejects_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[feed\nchannel_id = \"_typo\"").unwrap();

        assert!(load_config(&path, true).is_err());
        assert!(load_config(&path, false).is_err());
    }

    #[test]
    fn load_config_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        assert!(matches!(load_config(&path, true), Err(AppError::Io(_))));
        let config = load_config(&path, false).unwrap();
        assert_eq!(config.feed.channel_id, "_FNHuG");
    }

    #[test]
    fn load_config_validates_parsed_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[media]\nmax_columns = 0\n").unwrap();

        assert!(matches!(
            load_config(&path, true),
            Err(AppError::Validation(_))
        ));
    }
}
