//! skycrawl CLI
//!
//! Single entry point without flags. Settings come from `skycrawl.toml`,
//! credentials from `BSKY_IDENTIFIER` and `BSKY_PASSWORD`.

use std::env;
use std::process::ExitCode;

use clap::Parser;
use skycrawl::{
    api::BskyClient,
    error::{AppError, Result},
    models::Config,
    pipeline::{self, CrawlReport},
    storage::LocalStorage,
};

const CONFIG_PATH: &str = "skycrawl.toml";

/// skycrawl - Bluesky account sampler and engagement profiler
///
/// Reads settings from skycrawl.toml in the working directory and session
/// credentials from BSKY_IDENTIFIER / BSKY_PASSWORD.
#[derive(Parser, Debug)]
#[command(name = "skycrawl", version, about)]
struct Cli {}

/// Initialize logging. `RUST_LOG` overrides the default level.
fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();
}

fn credential(name: &str) -> Result<String> {
    env::var(name).map_err(|_| AppError::config(format!("{name} is not set")))
}

async fn run(config: &Config) -> Result<CrawlReport> {
    let identifier = credential("BSKY_IDENTIFIER")?;
    let password = credential("BSKY_PASSWORD")?;

    let client = BskyClient::login(&config.api, &identifier, &password).await?;
    let storage = LocalStorage::from_config(&config.output);

    log::info!("Output directory: {}", storage.json_dir().display());
    log::info!("CSV directory: {}", storage.csv_dir().display());

    pipeline::run_crawler(config, &client, &storage).await
}

/// Main entry point for the CLI application.
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    Cli::parse();
    init_logging();

    log::info!("skycrawl starting...");

    let config = Config::load_or_default(CONFIG_PATH);
    if let Err(e) = config.validate() {
        log::error!("Invalid configuration in {}: {}", CONFIG_PATH, e);
        return ExitCode::FAILURE;
    }

    tokio::select! {
        result = run(&config) => match result {
            Ok(report) => {
                if report.summary.is_none() {
                    log::warn!("No identities found. Exiting.");
                }
                log::info!("All data collection and processing completed");
                ExitCode::SUCCESS
            }
            Err(e) => {
                log::error!("Critical error during collection: {}", e);
                ExitCode::FAILURE
            }
        },
        _ = tokio::signal::ctrl_c() => {
            log::warn!("Collection interrupted by user");
            log::warn!("Partial data may have been saved in checkpoint files");
            ExitCode::SUCCESS
        }
    }
}
