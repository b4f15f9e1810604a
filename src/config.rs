//! config.rs — engine configuration.
//!
//! Load order: built-in defaults, then an optional TOML file
//! (`$ENGINE_CONFIG_PATH`, falling back to `config/engine.toml`), then
//! per-field env overrides. Malformed numeric env values keep the current
//! value with a warning instead of aborting startup.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::warn;

const ENV_CONFIG_PATH: &str = "ENGINE_CONFIG_PATH";
const DEFAULT_CONFIG_PATH: &str = "config/engine.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub insights_endpoint: String,
    pub token_endpoint: String,
    /// Optional delivery webhook; unset means log-only dispatch.
    pub webhook_url: Option<String>,
    pub poll_interval_secs: u64,
    pub count_interval_secs: u64,
    pub boot_delay_secs: u64,
    pub http_timeout_secs: u64,
    pub state_dir: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            insights_endpoint: "http://127.0.0.1:8000/api/insights".to_string(),
            token_endpoint: "http://127.0.0.1:8000/api/devices".to_string(),
            webhook_url: None,
            poll_interval_secs: 300,
            count_interval_secs: 60,
            boot_delay_secs: 10,
            http_timeout_secs: 5,
            state_dir: "state".to_string(),
        }
    }
}

impl EngineConfig {
    /// Defaults → optional TOML file → env overrides.
    pub fn load() -> Self {
        let mut cfg = match config_file() {
            Some(path) => Self::from_file(&path).unwrap_or_else(|e| {
                warn!("config file {}: {e:#}, using defaults", path.display());
                Self::default()
            }),
            None => Self::default(),
        };
        cfg.apply_env();
        cfg
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        toml::from_str(&raw).context("parse engine config TOML")
    }

    fn apply_env(&mut self) {
        if let Ok(v) = std::env::var("INSIGHTS_ENDPOINT") {
            self.insights_endpoint = v;
        }
        if let Ok(v) = std::env::var("TOKEN_ENDPOINT") {
            self.token_endpoint = v;
        }
        if let Ok(v) = std::env::var("NOTIFY_WEBHOOK_URL") {
            self.webhook_url = Some(v);
        }
        if let Ok(v) = std::env::var("STATE_DIR") {
            self.state_dir = v;
        }
        self.poll_interval_secs = env_u64("POLL_INTERVAL_SECS", self.poll_interval_secs);
        self.count_interval_secs = env_u64("COUNT_INTERVAL_SECS", self.count_interval_secs);
        self.boot_delay_secs = env_u64("BOOT_DELAY_SECS", self.boot_delay_secs);
        self.http_timeout_secs = env_u64("HTTP_TIMEOUT_SECS", self.http_timeout_secs);
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn count_interval(&self) -> Duration {
        Duration::from_secs(self.count_interval_secs)
    }

    pub fn boot_delay(&self) -> Duration {
        Duration::from_secs(self.boot_delay_secs)
    }
}

fn config_file() -> Option<PathBuf> {
    if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        return Some(PathBuf::from(p));
    }
    let default = PathBuf::from(DEFAULT_CONFIG_PATH);
    default.exists().then_some(default)
}

fn env_u64(key: &str, current: u64) -> u64 {
    match std::env::var(key) {
        Ok(raw) => match raw.parse() {
            Ok(v) => v,
            Err(_) => {
                warn!("{key}={raw} is not a number, keeping {current}");
                current
            }
        },
        Err(_) => current,
    }
}
