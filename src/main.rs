//! # Sandbar Bot Entry Point
//!
//! This binary runs one pass of the pipeline and exits, so it is meant to be
//! started by cron or a systemd timer. It supports production mode (post to
//! Telegram) and development mode (`--stdout`, print the message instead).
//!
//! The process exits normally whether or not the data fetch or the delivery
//! succeeded; problems are reported through the log only.

// Test modules
#[cfg(test)]
mod tests;

use chrono::Utc;
use std::env;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sandbar_lib::config::{Config, DEFAULT_CONFIG_PATH};
use sandbar_lib::notifier::{StdoutNotifier, TelegramNotifier};
use sandbar_lib::pipeline;

/// Command line switches.
#[derive(Debug, PartialEq)]
pub(crate) struct Options {
    /// Print the message instead of sending it
    pub development_mode: bool,
    pub config_path: PathBuf,
}

/// Parse arguments (without the program name).
pub(crate) fn parse_args<I>(args: I) -> Options
where
    I: IntoIterator<Item = String>,
{
    let mut options = Options {
        development_mode: false,
        config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
    };

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--stdout" => options.development_mode = true,
            "--config" => {
                if let Some(path) = args.next() {
                    options.config_path = PathBuf::from(path);
                }
            }
            other => {
                if let Some(path) = other.strip_prefix("--config=") {
                    options.config_path = PathBuf::from(path);
                }
            }
        }
    }
    options
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sandbar_bot=info,sandbar_lib=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Main application entry point.
fn main() -> anyhow::Result<()> {
    init_tracing();

    let options = parse_args(env::args().skip(1));

    // Explicit configuration: file first, then environment secrets
    let mut config = Config::load_from_path(&options.config_path);
    if let Err(e) = config.apply_env(|name| env::var(name).ok()) {
        warn!("Ignoring environment override: {}", e);
    }
    // Broken sections fall back to defaults; missing secrets make the
    // affected request fail and the run degrades
    for problem in config.repair() {
        warn!("Configuration problem: {}", problem);
    }

    // One run, one thread
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let client = pipeline::http_client()?;

    let outcome = rt.block_on(async {
        if options.development_mode {
            pipeline::run(&client, &config, &StdoutNotifier, Utc::now()).await
        } else {
            let telegram = TelegramNotifier::new(
                client.clone(),
                &config.telegram.token,
                &config.telegram.chat_id,
            );
            pipeline::run(&client, &config, &telegram, Utc::now()).await
        }
    });

    if outcome.delivered {
        info!("Run complete");
    } else {
        warn!("Run complete, but the message was not delivered");
    }
    Ok(())
}
