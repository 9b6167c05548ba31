use crate::util::env_parse;
use anyhow::{Context, Result};
use insight_kernel::{StoreOptions, Synchronous};
use jsonschema::{validator_for, Validator};
use once_cell::sync::Lazy;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_CONFIG: &str = "INSIGHT_CONFIG";
pub const ENV_STATE_DIR: &str = "INSIGHT_STATE_DIR";
pub const ENV_BUSY_MS: &str = "INSIGHT_SQLITE_BUSY_MS";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    Full,
    Normal,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize, JsonSchema)]
pub struct StoreConfig {
    /// Directory holding the insight database
    #[serde(default)]
    pub state_dir: Option<String>,
    /// Milliseconds a write waits on a competing transaction (default 5000)
    #[serde(default)]
    pub busy_timeout_ms: Option<u64>,
    /// SQLite durability level: "full" (default) or "normal"
    #[serde(default)]
    pub synchronous: Option<SyncMode>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize, JsonSchema)]
pub struct LoggingConfig {
    /// Directory for rolling log files; console-only when unset
    #[serde(default)]
    pub dir: Option<String>,
    /// "daily" (default), "hourly" or "minutely"
    #[serde(default)]
    pub rotation: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize, JsonSchema)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

static CONFIG_SCHEMA: Lazy<Validator> = Lazy::new(|| {
    let schema_value = config_schema_json();
    validator_for(&schema_value).expect("valid schema")
});

/// Returns the JSON schema describing the configuration structure.
///
/// # Panics
///
/// Panics if schema generation fails; this indicates a programming error.
pub fn config_schema_json() -> serde_json::Value {
    let schema = schemars::schema_for!(Config);
    serde_json::to_value(&schema).expect("schema json")
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let raw: toml::Value = toml::from_str(&content)?;
    let json_value = serde_json::to_value(&raw)?;
    let validation_errors: Vec<_> = CONFIG_SCHEMA
        .iter_errors(&json_value)
        .map(|e| e.to_string())
        .collect();
    if !validation_errors.is_empty() {
        return Err(anyhow::anyhow!(validation_errors.join(", ")));
    }
    let cfg: Config = toml::from_str(&content)?;
    Ok(cfg)
}

/// Load `explicit`, else the file named by `INSIGHT_CONFIG`, else defaults.
pub fn discover_config(explicit: Option<&Path>) -> Result<Config> {
    if let Some(path) = explicit {
        return load_config(path);
    }
    match std::env::var_os(ENV_CONFIG) {
        Some(path) => load_config(Path::new(&path)),
        None => Ok(Config::default()),
    }
}

impl Config {
    /// Effective state directory: env, then config, then the platform data dir.
    pub fn state_dir(&self) -> PathBuf {
        if let Some(dir) = std::env::var_os(ENV_STATE_DIR) {
            return PathBuf::from(dir);
        }
        if let Some(dir) = self.store.state_dir.as_deref() {
            return PathBuf::from(dir);
        }
        directories::ProjectDirs::from("", "", "insight")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from(".insight"))
    }

    pub fn store_options(&self) -> StoreOptions {
        let defaults = StoreOptions::default();
        let busy_ms = env_parse::<u64>(ENV_BUSY_MS).or(self.store.busy_timeout_ms);
        StoreOptions {
            busy_timeout: busy_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.busy_timeout),
            synchronous: match self.store.synchronous {
                Some(SyncMode::Normal) => Synchronous::Normal,
                Some(SyncMode::Full) => Synchronous::Full,
                None => defaults.synchronous,
            },
        }
    }
}
