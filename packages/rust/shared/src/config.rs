//! Application configuration for orphanscan.
//!
//! User config lives at `~/.orphanscan/orphanscan.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{OrphanScanError, Result};
use crate::types::{DEFAULT_REDIRECT_KEY, ProtocolMode, ScanConfiguration};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "orphanscan.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".orphanscan";

/// Cached scan results expire after 12 hours.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 12 * 60 * 60;

/// Wall-clock budget for the link scan phase.
pub const DEFAULT_MAX_DURATION_SECS: u64 = 300;

// ---------------------------------------------------------------------------
// Config structs (matching orphanscan.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Scan limits and caching.
    #[serde(default)]
    pub scan: ScanSection,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Path of the site database.
    #[serde(default = "default_database")]
    pub database: String,

    /// Leave posts out of the inventory.
    #[serde(default)]
    pub exclude_posts: bool,

    /// Metadata key holding redirect targets.
    #[serde(default = "default_redirect_key")]
    pub redirect_key: String,

    /// Scheme unification: "none", "to_https" or "to_http".
    #[serde(default)]
    pub protocol_mode: ProtocolMode,

    /// Rows per page in the text report.
    #[serde(default = "default_per_page")]
    pub per_page: usize,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
            exclude_posts: false,
            redirect_key: default_redirect_key(),
            protocol_mode: ProtocolMode::None,
            per_page: default_per_page(),
        }
    }
}

fn default_database() -> String {
    "~/.orphanscan/site.db".into()
}
fn default_redirect_key() -> String {
    DEFAULT_REDIRECT_KEY.into()
}
fn default_per_page() -> usize {
    20
}

/// `[scan]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSection {
    /// Maximum seconds the link scan may run before the scan fails.
    #[serde(default = "default_max_duration")]
    pub max_duration_secs: u64,

    /// Lifetime of cached results.
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,

    /// Whether scans consult and populate the result cache.
    #[serde(default = "default_true")]
    pub use_cache: bool,
}

impl Default for ScanSection {
    fn default() -> Self {
        Self {
            max_duration_secs: default_max_duration(),
            cache_ttl_secs: default_cache_ttl(),
            use_cache: true,
        }
    }
}

fn default_max_duration() -> u64 {
    DEFAULT_MAX_DURATION_SECS
}
fn default_cache_ttl() -> u64 {
    DEFAULT_CACHE_TTL_SECS
}
fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Runtime config (merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime scan limits, merged from the config file and CLI flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanLimits {
    /// Link scan wall-clock guard.
    pub max_duration: Duration,
    /// Cache entry lifetime.
    pub cache_ttl: Duration,
}

impl Default for ScanLimits {
    fn default() -> Self {
        Self {
            max_duration: Duration::from_secs(DEFAULT_MAX_DURATION_SECS),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
        }
    }
}

impl From<&AppConfig> for ScanLimits {
    fn from(config: &AppConfig) -> Self {
        Self {
            max_duration: Duration::from_secs(config.scan.max_duration_secs),
            cache_ttl: Duration::from_secs(config.scan.cache_ttl_secs),
        }
    }
}

impl From<&AppConfig> for ScanConfiguration {
    fn from(config: &AppConfig) -> Self {
        Self {
            include_listable: !config.defaults.exclude_posts,
            redirect_key: config.defaults.redirect_key.clone(),
            protocol_mode: config.defaults.protocol_mode,
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.orphanscan/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| OrphanScanError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.orphanscan/orphanscan.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| OrphanScanError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        OrphanScanError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| OrphanScanError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| OrphanScanError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| OrphanScanError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Expand a leading `~/` in a configured path.
pub fn expand_home(path: &str) -> Result<PathBuf> {
    match path.strip_prefix("~/") {
        Some(rest) => {
            let home = dirs::home_dir()
                .ok_or_else(|| OrphanScanError::config("could not determine home directory"))?;
            Ok(home.join(rest))
        }
        None => Ok(PathBuf::from(path)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("redirect_key"));
        assert!(toml_str.contains("max_duration_secs"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.defaults.redirect_key, "redirect_url");
        assert_eq!(parsed.defaults.protocol_mode, ProtocolMode::None);
        assert_eq!(parsed.scan.cache_ttl_secs, 43_200);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[defaults]
exclude_posts = true
protocol_mode = "to_https"

[scan]
max_duration_secs = 60
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert!(config.defaults.exclude_posts);
        assert_eq!(config.defaults.per_page, 20);
        assert!(config.scan.use_cache);

        let scan = ScanConfiguration::from(&config);
        assert!(!scan.include_listable);
        assert_eq!(scan.protocol_mode, ProtocolMode::ForceSecure);
        assert_eq!(scan.redirect_key, "redirect_url");

        let limits = ScanLimits::from(&config);
        assert_eq!(limits.max_duration, Duration::from_secs(60));
        assert_eq!(limits.cache_ttl, Duration::from_secs(DEFAULT_CACHE_TTL_SECS));
    }

    #[test]
    fn unknown_protocol_mode_is_rejected() {
        let toml_str = "[defaults]\nprotocol_mode = \"gopher\"\n";
        let result: std::result::Result<AppConfig, _> = toml::from_str(toml_str);
        assert!(result.is_err());
    }

    #[test]
    fn expand_home_leaves_plain_paths() {
        assert_eq!(expand_home("/tmp/site.db").unwrap(), PathBuf::from("/tmp/site.db"));
    }
}
