mod cli;

use artwork_healer::{
    backup::BackupStore,
    config::{self, Config},
    healer::{HealSettings, Healer},
    metadata::TmdbProvider,
    plex::PlexClient,
    report::RunLog,
};

use anyhow::{Context, Result};
use artwork_healer_common::Error;
use clap::Parser;
use cli::Cli;
use std::sync::Arc;

/// Exit status for an unusable configuration.
const CONFIG_EXIT_CODE: i32 = 2;

async fn run(config: &Config) -> Result<()> {
    let server = Arc::new(PlexClient::new(&config.server));
    let provider = Arc::new(
        TmdbProvider::new(
            config.provider.api_key.clone(),
            config.provider.language.clone(),
        )
        .context("Failed to set up TMDB client")?,
    );
    let backups = BackupStore::new(config.healer.backup_dir.clone());

    let mut log = if config.healer.enable_log {
        RunLog::open(&config.healer.log_file).unwrap_or_else(|e| {
            tracing::warn!("Run log disabled: {:#}", e);
            RunLog::disabled()
        })
    } else {
        RunLog::disabled()
    };

    tracing::info!("Healing artwork from {}", config.server.url);
    tracing::info!("Backup store at {:?}", backups.base_dir());
    if config.healer.dry_run {
        tracing::info!("Dry run: nothing will be written or uploaded");
    }

    let healer = Healer::new(
        server,
        provider,
        backups,
        HealSettings::from(&config.healer),
    );
    let report = healer.run(&mut log).await;

    println!("{}", report.summary());
    Ok(())
}

fn main() -> Result<()> {
    let _cli = Cli::parse();

    // Respect RUST_LOG env var if set
    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "artwork_healer=info,artwork_healer_common=info".to_string());

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    // Configuration errors abort before any item is touched
    let config = match config::load_config_or_default() {
        Ok(config) => config,
        Err(e) => match e.downcast_ref::<Error>().filter(|err| err.is_fatal()) {
            Some(err) => {
                eprintln!("Error: {}", err);
                std::process::exit(CONFIG_EXIT_CODE);
            }
            None => return Err(e),
        },
    };

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    rt.block_on(run(&config))
}
