//! Application configuration.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Directory name used under the platform config/data/cache roots.
pub const APP_DIR: &str = "squadtui";

const DEFAULT_CONFIG: &str = r#"# squadtui configuration

# Base URL of the analysis service (serves /api/players and /analyze).
api_base_url = "http://127.0.0.1:5001"

# Nominal squad budget. Informational only.
budget = 100.0

# Timeout for reference data and analysis requests.
request_timeout_secs = 30

# Override where squad state and the catalog snapshot are kept.
# state_root = "/path/to/state"
# cache_root = "/path/to/cache"
"#;

/// Runtime configuration, layered from defaults, the config file and `SQUADTUI_*` variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL of the remote service.
    pub api_base_url: String,
    /// Directory holding the persisted squad store.
    pub state_root: PathBuf,
    /// Directory holding the catalog snapshot.
    pub cache_root: PathBuf,
    /// Nominal budget in currency units.
    pub budget: f64,
    /// HTTP request timeout.
    pub request_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:5001".to_string(),
            state_root: dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_DIR)
                .join("state"),
            cache_root: dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_DIR),
            budget: 100.0,
            request_timeout_secs: 30,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default file location and the environment.
    pub fn load() -> Result<Self> {
        Self::load_from(config_path())
    }

    /// Load configuration using the given file (which may be absent).
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let defaults = AppConfig::default();
        let settings = Config::builder()
            .set_default("api_base_url", defaults.api_base_url)?
            .set_default(
                "state_root",
                defaults.state_root.to_string_lossy().into_owned(),
            )?
            .set_default(
                "cache_root",
                defaults.cache_root.to_string_lossy().into_owned(),
            )?
            .set_default("budget", defaults.budget)?
            .set_default("request_timeout_secs", defaults.request_timeout_secs as i64)?
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix("SQUADTUI").try_parsing(true))
            .build()
            .with_context(|| format!("failed to read configuration {}", path.display()))?;

        settings
            .try_deserialize()
            .context("invalid configuration values")
    }
}

/// Path of the user configuration file.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("config.toml")
}

/// Write the default configuration file if none exists yet.
pub fn ensure_default_config() -> Result<()> {
    write_default_config(config_path())
}

fn write_default_config(path: PathBuf) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(&path, DEFAULT_CONFIG)
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), "Wrote default configuration");
    Ok(())
}
