mod types;

pub use types::*;

use anyhow::{Context, Result};
use artwork_healer_common::Error;
use std::path::{Path, PathBuf};

/// Environment variable that points at an explicit config file
pub const CONFIG_ENV: &str = "ARTWORK_HEALER_CONFIG";

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    expand_paths(&mut config.healer);
    validate_config(&config)?;

    Ok(config)
}

/// Load config from `$ARTWORK_HEALER_CONFIG`, then the default locations.
///
/// Without any file the default config is validated, which fails on the
/// missing credentials.
pub fn load_config_or_default() -> Result<Config> {
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        if !path.is_empty() {
            return load_config(Path::new(&path));
        }
    }

    // Try default locations
    let default_paths = [
        "./artwork-healer.toml",
        "./config.toml",
        "~/.config/artwork-healer/config.toml",
        "/etc/artwork-healer/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::debug!("Using config file {:?}", path);
            return load_config(path);
        }
    }

    tracing::warn!("No config file found, falling back to defaults");
    let config = Config::default();
    validate_config(&config)?;
    Ok(config)
}

fn expand_paths(healer: &mut HealerConfig) {
    healer.backup_dir = expand(&healer.backup_dir);
    healer.log_file = expand(&healer.log_file);
}

fn expand(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(raw.as_ref()).as_ref())
}

/// Validate configuration.
///
/// Every failure is a [`Error::Config`]: the run aborts before any item is
/// processed.
pub fn validate_config(config: &Config) -> Result<(), Error> {
    if config.server.url.trim().is_empty() {
        return Err(Error::config("server.url is required"));
    }

    if !config.server.url.starts_with("http://") && !config.server.url.starts_with("https://") {
        return Err(Error::config(format!(
            "server.url must start with http:// or https://, got '{}'",
            config.server.url
        )));
    }

    if config.server.token.trim().is_empty() {
        return Err(Error::config("server.token is required"));
    }

    if config.provider.api_key.trim().is_empty() {
        return Err(Error::config("provider.api_key is required"));
    }

    if config.server.libraries.is_empty() {
        return Err(Error::config("server.libraries must name at least one library"));
    }

    if config.healer.dry_run && config.healer.enable_upload {
        tracing::info!("dry_run is set: enable_upload has no effect for this run");
    }

    Ok(())
}
