//! Application configuration for the toolbox loader.
//!
//! User config lives at `~/.toolbox/toolbox.toml`; a `toolbox.toml` in the
//! working directory is layered on top of it. CLI flags override config
//! file values, which override defaults.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, ToolboxError};
use crate::merge::deep_merge;
use crate::types::DEFAULT_ROOT_PATH;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "toolbox.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".toolbox";

/// Project-level config file, looked up in the working directory.
pub const PROJECT_CONFIG_FILE: &str = "toolbox.toml";

// ---------------------------------------------------------------------------
// Config structs (matching toolbox.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Retry and timeout policy.
    #[serde(default)]
    pub loader: LoaderSection,

    /// Where documents are served from.
    #[serde(default)]
    pub source: SourceConfig,

    /// Presentation defaults applied to materialized units.
    #[serde(default)]
    pub display: DisplayConfig,
}

/// `[loader]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderSection {
    /// Per-attempt timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Attempts per document, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Backoff base; attempt `n` waits `n * backoff_base_ms` before retrying.
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
}

impl Default for LoaderSection {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base_ms(),
        }
    }
}

fn default_timeout_ms() -> u64 {
    10_000
}
fn default_max_attempts() -> u32 {
    3
}
fn default_backoff_base_ms() -> u64 {
    1_000
}

/// Which transport to use for fetching documents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportChoice {
    /// Probe the base once at startup.
    #[default]
    Auto,
    /// Force the HTTP transport.
    Http,
    /// Force the filesystem transport.
    File,
}

impl FromStr for TransportChoice {
    type Err = ToolboxError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "http" => Ok(Self::Http),
            "file" => Ok(Self::File),
            other => Err(ToolboxError::config(format!(
                "unknown transport `{other}` (expected auto, http or file)"
            ))),
        }
    }
}

/// `[source]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Serving root: an `http(s)://` URL, a `file://` URL, or a directory.
    #[serde(default = "default_base")]
    pub base: String,

    /// Transport selection.
    #[serde(default)]
    pub transport: TransportChoice,

    /// Root manifest path relative to `base`.
    #[serde(default = "default_root_path")]
    pub root_path: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base: default_base(),
            transport: TransportChoice::default(),
            root_path: default_root_path(),
        }
    }
}

fn default_base() -> String {
    ".".into()
}
fn default_root_path() -> String {
    DEFAULT_ROOT_PATH.into()
}

/// `[display]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Initial expansion flag for every unit.
    #[serde(default = "default_true")]
    pub default_expanded: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            default_expanded: true,
        }
    }
}

fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Loader config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime retry policy for the resilient loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Budget for a single attempt. Not cumulative across attempts.
    pub timeout: Duration,
    /// Total attempts, at least 1.
    pub max_attempts: u32,
    /// Linear backoff base.
    pub backoff_base: Duration,
}

impl LoaderConfig {
    /// The built-in policy: 10s per attempt, 3 attempts, 1s backoff base.
    pub const DEFAULT: Self = Self {
        timeout: Duration::from_millis(10_000),
        max_attempts: 3,
        backoff_base: Duration::from_millis(1_000),
    };

    /// Wait before retrying after failed attempt number `attempt` (1-based).
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        self.backoff_base.saturating_mul(attempt)
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<&AppConfig> for LoaderConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            timeout: Duration::from_millis(config.loader.timeout_ms),
            max_attempts: config.loader.max_attempts.max(1),
            backoff_base: Duration::from_millis(config.loader.backoff_base_ms),
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.toolbox/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ToolboxError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.toolbox/toolbox.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load defaults, then each existing file in `layers`, deep-merged in order.
///
/// Later layers win on conflicting keys; tables merge recursively, so a
/// layer only needs to name the keys it changes.
pub fn load_layered(layers: &[PathBuf]) -> Result<AppConfig> {
    let mut merged = serde_json::to_value(AppConfig::default())
        .map_err(|e| ToolboxError::config(e.to_string()))?;

    for path in layers {
        if !path.exists() {
            tracing::debug!(?path, "config layer not found, skipping");
            continue;
        }
        let content = std::fs::read_to_string(path).map_err(|e| ToolboxError::io(path, e))?;
        let layer: Value = toml::from_str(&content).map_err(|e| {
            ToolboxError::config(format!("failed to parse {}: {e}", path.display()))
        })?;
        tracing::debug!(?path, "applying config layer");
        deep_merge(&mut merged, &layer);
    }

    serde_json::from_value(merged)
        .map_err(|e| ToolboxError::config(format!("invalid merged config: {e}")))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| ToolboxError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| ToolboxError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ToolboxError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
