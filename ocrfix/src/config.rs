//! User configuration loaded from `$XDG_CONFIG_HOME/ocrfix/config.toml`.
//!
//! Every key is optional. A missing file yields the defaults; a file that fails to
//! parse is logged and also yields the defaults, so a typo never prevents startup.
//! Command-line flags are applied on top by `main`.

use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// `"dark"` or `"catppuccin-mocha"`.
    pub theme: String,
    /// Local SQLite store used when no server is configured.
    pub db_path: PathBuf,
    /// Base URL of the review web service. Takes precedence over `db_path`.
    pub server_url: Option<String>,
    /// Segments claimed per fetch from the local store.
    pub page_size: usize,
    /// Seconds a claimed segment stays reserved in the local store.
    pub claim_lease_secs: u64,
    /// Seconds before a failed fetch is retried automatically. `0` disables it.
    pub auto_retry_secs: u64,
    /// HTTP request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: "catppuccin-mocha".to_owned(),
            db_path: PathBuf::from(".ocrfix/segments.db"),
            server_url: None,
            page_size: 20,
            claim_lease_secs: 30 * 60,
            auto_retry_secs: 5,
            request_timeout_secs: 15,
        }
    }
}

impl Config {
    /// Parses a TOML document; absent keys keep their defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }
}

/// Returns the path to the ocrfix config file.
///
/// Prefers `$XDG_CONFIG_HOME/ocrfix/config.toml`; falls back to
/// `~/.config/ocrfix/config.toml` when the env var is absent.
pub fn config_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join(".config"))
        })
        .unwrap_or_else(|| PathBuf::from(".config"));
    base.join("ocrfix").join("config.toml")
}

/// Loads the config file, falling back to defaults on any error.
pub fn load_config() -> Config {
    let path = config_path();
    let raw = match std::fs::read_to_string(&path) {
        Ok(s) => s,
        Err(_) => {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Config::default();
        }
    };
    match Config::from_toml_str(&raw) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "config parse error, using defaults");
            Config::default()
        }
    }
}
