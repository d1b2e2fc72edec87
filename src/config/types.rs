use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub healer: HealerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the Plex server, e.g. `http://192.168.1.10:32400`
    #[serde(default)]
    pub url: String,

    /// Plex API token (sent as `X-Plex-Token`)
    #[serde(default)]
    pub token: String,

    /// Library section titles to process
    #[serde(default = "default_libraries")]
    pub libraries: Vec<String>,

    /// Also process collections of every configured movie library
    #[serde(default = "default_true")]
    pub include_collections: bool,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_libraries() -> Vec<String> {
    vec!["Movies".to_string(), "TV Shows".to_string()]
}

fn default_true() -> bool {
    true
}

fn default_timeout() -> u64 {
    10
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            token: String::new(),
            libraries: default_libraries(),
            include_collections: default_true(),
            timeout_secs: default_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    /// TMDB v3 API key
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_language")]
    pub language: String,
}

fn default_language() -> String {
    "en-US".to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            language: default_language(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HealerConfig {
    /// Upload repaired artwork to the server (default: false)
    #[serde(default)]
    pub enable_upload: bool,

    /// Evaluate and log every action without writing anything
    #[serde(default)]
    pub dry_run: bool,

    #[serde(default = "default_backup_dir")]
    pub backup_dir: PathBuf,

    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,

    #[serde(default = "default_true")]
    pub enable_log: bool,

    /// Pause between items in milliseconds
    #[serde(default = "default_item_delay")]
    pub item_delay_ms: u64,

    /// Mirror healthy server artwork into the backup store when no backup exists
    #[serde(default)]
    pub backup_healthy: bool,
}

fn default_backup_dir() -> PathBuf {
    PathBuf::from("Posters")
}

fn default_log_file() -> PathBuf {
    PathBuf::from("artwork_healer.log")
}

fn default_item_delay() -> u64 {
    1000
}

impl Default for HealerConfig {
    fn default() -> Self {
        Self {
            enable_upload: false,
            dry_run: false,
            backup_dir: default_backup_dir(),
            log_file: default_log_file(),
            enable_log: default_true(),
            item_delay_ms: default_item_delay(),
            backup_healthy: false,
        }
    }
}
