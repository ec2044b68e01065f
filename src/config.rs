//! Runtime configuration: optional TOML file plus DECKHAND_* env overrides.

use serde::Deserialize;
use std::env;
use std::fs;
use std::path::PathBuf;

pub const DEFAULT_AGENT_URL: &str = "http://127.0.0.1:9966";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the local metrics/alerting agent.
    pub agent_url: String,
    /// Command audit log; defaults to `<state dir>/install.log` when unset.
    pub log_file: Option<PathBuf>,
    /// Shell used to run provisioning commands.
    pub shell: String,
    /// Directory holding per-site Caddy configs.
    pub caddy_sites_dir: PathBuf,
    pub agent_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            agent_url: DEFAULT_AGENT_URL.to_string(),
            log_file: None,
            shell: "sh".to_string(),
            caddy_sites_dir: PathBuf::from("/etc/caddy/sites"),
            agent_timeout_secs: 3,
        }
    }
}

impl Config {
    /// Load the config file if present, then apply env overrides.
    /// A missing or unreadable file is not an error.
    pub fn load() -> Self {
        let mut config = config_path()
            .and_then(|path| fs::read_to_string(path).ok())
            .and_then(|content| match toml::from_str::<Config>(&content) {
                Ok(config) => Some(config),
                Err(err) => {
                    log::warn!("⚠️ Ignoring malformed config file: {}", err);
                    None
                }
            })
            .unwrap_or_default();

        if let Ok(value) = env::var("DECKHAND_AGENT_URL") {
            if !value.is_empty() {
                config.agent_url = value;
            }
        }
        if let Ok(value) = env::var("DECKHAND_LOG_FILE") {
            if !value.is_empty() {
                config.log_file = Some(PathBuf::from(value));
            }
        }
        if let Ok(value) = env::var("DECKHAND_SHELL") {
            if !value.is_empty() {
                config.shell = value;
            }
        }
        if let Ok(value) = env::var("DECKHAND_SITES_DIR") {
            if !value.is_empty() {
                config.caddy_sites_dir = PathBuf::from(value);
            }
        }

        config
    }

    pub fn log_file(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| state_dir().join("install.log"))
    }
}

fn config_path() -> Option<PathBuf> {
    if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
        if !xdg.is_empty() {
            return Some(PathBuf::from(xdg).join("deckhand/config.toml"));
        }
    }
    if let Ok(home) = env::var("HOME") {
        if !home.is_empty() {
            return Some(PathBuf::from(home).join(".config/deckhand/config.toml"));
        }
    }
    None
}

pub fn state_dir() -> PathBuf {
    if let Ok(xdg) = env::var("XDG_STATE_HOME") {
        if !xdg.is_empty() {
            return PathBuf::from(xdg).join("deckhand");
        }
    }
    if let Ok(home) = env::var("HOME") {
        if !home.is_empty() {
            return PathBuf::from(home).join(".local/state/deckhand");
        }
    }
    PathBuf::from("/tmp/deckhand")
}
