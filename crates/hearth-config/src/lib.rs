//! Shared configuration for hearth tools.
//!
//! TOML gateway profiles layered under `HEARTH_`-prefixed environment
//! overrides. The CLI adds flag-aware resolution on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("gateway profile '{name}' not found")]
    UnknownGateway { name: String },

    #[error("no gateway selected; pass --gateway or set default_gateway")]
    NoGateway,

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Gateway profile used when none is named on the command line.
    pub default_gateway: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named gateway profiles.
    #[serde(default)]
    pub gateways: HashMap<String, GatewayProfile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_gateway: Some("home".into()),
            defaults: Defaults::default(),
            gateways: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Defaults {
    /// Output format: "table", "json", "json-compact" or "plain".
    #[serde(default = "default_output")]
    pub output: String,

    /// Log format: "text" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// How long a one-shot command waits for stores to converge.
    #[serde(default = "default_settle_timeout_ms")]
    pub settle_timeout_ms: u64,

    /// Interval between simulated attribute changes in `watch --simulate`.
    #[serde(default = "default_simulate_interval_ms")]
    pub simulate_interval_ms: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            log_format: default_log_format(),
            settle_timeout_ms: default_settle_timeout_ms(),
            simulate_interval_ms: default_simulate_interval_ms(),
        }
    }
}

impl Defaults {
    pub fn settle_timeout(&self) -> Duration {
        Duration::from_millis(self.settle_timeout_ms)
    }

    pub fn simulate_interval(&self) -> Duration {
        Duration::from_millis(self.simulate_interval_ms)
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_log_format() -> String {
    "text".into()
}
fn default_settle_timeout_ms() -> u64 {
    2_000
}
fn default_simulate_interval_ms() -> u64 {
    1_000
}

/// A named gateway profile.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GatewayProfile {
    /// Display name shown in status output.
    pub name: String,

    /// Gateway host or address (e.g., "192.168.1.20").
    pub host: String,

    /// Path to a fixture file used to seed the in-memory domain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixtures: Option<PathBuf>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("org", "hearth", "hearth").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("hearth");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load Config from `path` + environment. A missing file is not an error.
///
/// Nested keys use a double underscore: `HEARTH_DEFAULTS__OUTPUT=json`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("HEARTH_").split("__"));

    let config: Config = figment.extract()?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    match config.defaults.output.as_str() {
        "table" | "json" | "json-compact" | "plain" => {}
        other => {
            return Err(ConfigError::Validation {
                field: "defaults.output".into(),
                reason: format!("expected table, json, json-compact or plain, got '{other}'"),
            });
        }
    }
    match config.defaults.log_format.as_str() {
        "text" | "json" => {}
        other => {
            return Err(ConfigError::Validation {
                field: "defaults.log_format".into(),
                reason: format!("expected 'text' or 'json', got '{other}'"),
            });
        }
    }
    for (field, millis) in [
        ("defaults.settle_timeout_ms", config.defaults.settle_timeout_ms),
        ("defaults.simulate_interval_ms", config.defaults.simulate_interval_ms),
    ] {
        if millis == 0 {
            return Err(ConfigError::Validation {
                field: field.into(),
                reason: "must be greater than zero".into(),
            });
        }
    }
    for (key, profile) in &config.gateways {
        if profile.host.trim().is_empty() {
            return Err(ConfigError::Validation {
                field: format!("gateways.{key}.host"),
                reason: "must not be empty".into(),
            });
        }
    }
    Ok(())
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Gateway resolution ──────────────────────────────────────────────

/// Pick the gateway profile named `requested`, falling back to
/// `default_gateway`. Returns the profile key alongside the profile.
pub fn resolve_gateway<'a>(
    config: &'a Config,
    requested: Option<&'a str>,
) -> Result<(&'a str, &'a GatewayProfile), ConfigError> {
    let name = requested
        .or(config.default_gateway.as_deref())
        .ok_or(ConfigError::NoGateway)?;
    config
        .gateways
        .get_key_value(name)
        .map(|(key, profile)| (key.as_str(), profile))
        .ok_or_else(|| ConfigError::UnknownGateway { name: name.into() })
}
