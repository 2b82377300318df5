//! Configuration types for tenement sync components.
//!
//! Defaults are built in; [`SyncConfig::from_env`] and [`HttpConfig::from_env`]
//! apply environment overrides, and an optional `jurisdictions.toml` tunes
//! each jurisdiction and the WA endpoint.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::AppError;
use crate::models::Jurisdiction;

/// Default WA ArcGIS layer serving the DMIRS-003 mining tenements dataset.
pub const DEFAULT_WA_ENDPOINT: &str = "https://services.slip.wa.gov.au/public/rest/services/SLIP_Public_Services/Industry_and_Mining/MapServer/3";

/// Maximum records per request accepted by the WA feature service.
pub const WA_MAX_PAGE_SIZE: usize = 1000;

/// HTTP client configuration for external API calls.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: format!("tenement-sync/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpConfig {
    /// Builds the config from defaults overridden by `HTTP_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(secs) = env_parse::<u64>("HTTP_TIMEOUT_SECS") {
            config.timeout = Duration::from_secs(secs);
        }
        config
    }
}

/// Bounded exponential backoff applied to count queries, page fetches and
/// batch writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay to wait after failed attempt number `attempt` (1-based).
    ///
    /// - Attempt 1: base
    /// - Attempt 2: base × 2
    /// - Attempt 3: base × 4, and so on up to `max_delay`
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let factor = 2u32.saturating_pow(attempt - 1);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

/// Sync pipeline configuration.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Pause between consecutive page fetches.
    pub page_delay: Duration,
    /// Pause between consecutive batch writes.
    pub batch_delay: Duration,
    /// Pause between jurisdictions during a full sync.
    pub jurisdiction_delay: Duration,
    /// Batch size for jurisdictions without a size in `jurisdictions.toml`.
    /// `None` keeps the built-in per-jurisdiction sizes.
    pub default_batch_size: Option<usize>,
    pub retry: RetryPolicy,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            page_delay: Duration::from_millis(500),
            batch_delay: Duration::from_millis(100),
            jurisdiction_delay: Duration::from_secs(1),
            default_batch_size: None,
            retry: RetryPolicy::default(),
        }
    }
}

impl SyncConfig {
    /// Builds the config from defaults overridden by environment variables.
    ///
    /// Recognised: `SYNC_PAGE_DELAY_MS`, `SYNC_BATCH_DELAY_MS`,
    /// `SYNC_JURISDICTION_DELAY_MS`, `SYNC_BATCH_SIZE`, `SYNC_MAX_RETRIES`.
    /// Unparseable values are ignored with a warning.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(ms) = env_parse::<u64>("SYNC_PAGE_DELAY_MS") {
            config.page_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = env_parse::<u64>("SYNC_BATCH_DELAY_MS") {
            config.batch_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = env_parse::<u64>("SYNC_JURISDICTION_DELAY_MS") {
            config.jurisdiction_delay = Duration::from_millis(ms);
        }
        if let Some(size) = env_parse::<usize>("SYNC_BATCH_SIZE") {
            config.default_batch_size = Some(size.max(1));
        }
        if let Some(attempts) = env_parse::<u32>("SYNC_MAX_RETRIES") {
            config.retry.max_attempts = attempts.max(1);
        }
        config
    }

    /// Removes all artificial pauses. Used by tests and one-off CLI runs.
    pub fn without_delays(mut self) -> Self {
        self.page_delay = Duration::ZERO;
        self.batch_delay = Duration::ZERO;
        self.jurisdiction_delay = Duration::ZERO;
        self.retry.base_delay = Duration::ZERO;
        self
    }

    /// Sets a custom retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Sets the fallback batch size (at least 1).
    pub fn with_default_batch_size(mut self, size: usize) -> Self {
        self.default_batch_size = Some(size.max(1));
        self
    }

    /// Sets the pause between jurisdictions in a full sync.
    pub fn with_jurisdiction_delay(mut self, delay: Duration) -> Self {
        self.jurisdiction_delay = delay;
        self
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "Ignoring unparseable environment override");
            None
        }
    }
}

// =============================================================================
// Jurisdiction Configuration (jurisdictions.toml)
// =============================================================================

fn default_enabled() -> bool {
    true
}

fn default_wa_endpoint() -> String {
    DEFAULT_WA_ENDPOINT.to_string()
}

fn default_wa_page_size() -> usize {
    WA_MAX_PAGE_SIZE
}

/// Settings for the WA live feature service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaSourceConfig {
    /// ArcGIS layer URL; `/query` is appended per request.
    #[serde(default = "default_wa_endpoint")]
    pub endpoint: String,

    /// Records per page, clamped to [`WA_MAX_PAGE_SIZE`].
    #[serde(default = "default_wa_page_size")]
    pub page_size: usize,
}

impl Default for WaSourceConfig {
    fn default() -> Self {
        Self {
            endpoint: default_wa_endpoint(),
            page_size: default_wa_page_size(),
        }
    }
}

/// Per-jurisdiction overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JurisdictionEntry {
    pub code: Jurisdiction,

    /// Whether full syncs include this jurisdiction. Defaults to `true`.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    pub batch_size: Option<usize>,

    /// Number of records generated by a placeholder source.
    pub target_count: Option<u64>,
}

/// Root structure of `jurisdictions.toml`.
///
/// # Example
///
/// ```toml
/// [wa]
/// endpoint = "https://services.slip.wa.gov.au/public/rest/services/SLIP_Public_Services/Industry_and_Mining/MapServer/3"
/// page_size = 1000
///
/// [[jurisdictions]]
/// code = "TAS"
/// batch_size = 250
/// target_count = 1247
///
/// [[jurisdictions]]
/// code = "NT"
/// enabled = false
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JurisdictionsConfig {
    #[serde(default)]
    pub wa: WaSourceConfig,

    #[serde(default)]
    pub jurisdictions: Vec<JurisdictionEntry>,
}

impl JurisdictionsConfig {
    /// Returns the override entry for a jurisdiction, if any.
    pub fn entry(&self, jurisdiction: Jurisdiction) -> Option<&JurisdictionEntry> {
        self.jurisdictions.iter().find(|e| e.code == jurisdiction)
    }

    /// Jurisdictions without an entry are enabled.
    pub fn is_enabled(&self, jurisdiction: Jurisdiction) -> bool {
        self.entry(jurisdiction).is_none_or(|e| e.enabled)
    }

    /// Enabled jurisdictions in canonical order.
    pub fn enabled_jurisdictions(&self) -> Vec<Jurisdiction> {
        Jurisdiction::ALL
            .into_iter()
            .filter(|j| self.is_enabled(*j))
            .collect()
    }

    /// Batch size for a jurisdiction.
    ///
    /// A size in the jurisdiction's entry wins, then `fallback` (usually
    /// [`SyncConfig::default_batch_size`]), then the built-in default.
    pub fn batch_size(&self, jurisdiction: Jurisdiction, fallback: Option<usize>) -> usize {
        self.entry(jurisdiction)
            .and_then(|e| e.batch_size)
            .or(fallback)
            .unwrap_or_else(|| default_batch_size(jurisdiction))
            .max(1)
    }

    /// Configured placeholder target count, if overridden.
    pub fn target_count(&self, jurisdiction: Jurisdiction) -> Option<u64> {
        self.entry(jurisdiction).and_then(|e| e.target_count)
    }

    /// WA page size clamped to the service maximum.
    pub fn wa_page_size(&self) -> usize {
        self.wa.page_size.clamp(1, WA_MAX_PAGE_SIZE)
    }
}

/// Built-in batch size per jurisdiction.
pub fn default_batch_size(jurisdiction: Jurisdiction) -> usize {
    match jurisdiction {
        Jurisdiction::Wa | Jurisdiction::Qld => 500,
        Jurisdiction::Nt => 100,
        Jurisdiction::Nsw | Jurisdiction::Vic | Jurisdiction::Tas => 250,
    }
}

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "jurisdictions.toml";

/// Returns the default configuration directory path: `~/.config/tenement-sync/`.
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("tenement-sync"))
}

/// Returns the default configuration file path.
pub fn default_config_path() -> Option<PathBuf> {
    default_config_dir().map(|p| p.join(CONFIG_FILE_NAME))
}

/// Load jurisdiction configuration from a TOML file.
///
/// # Arguments
/// * `path` - Optional custom path. If `None`, uses the default XDG path.
///
/// # Returns
/// * `Ok(config)` - loaded from the file, or built-in defaults when no
///   default file exists
/// * `Err(e)` - a custom path is missing, or the file is invalid
pub fn load_jurisdictions_config(path: Option<PathBuf>) -> Result<JurisdictionsConfig, AppError> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(AppError::ConfigError(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => match default_config_path() {
            Some(p) if p.exists() => p,
            _ => {
                tracing::debug!("No jurisdictions config found, using built-in defaults");
                return Ok(JurisdictionsConfig::default());
            }
        },
    };

    read_config_file(&config_path)
}

fn read_config_file(path: &Path) -> Result<JurisdictionsConfig, AppError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        AppError::ConfigError(format!(
            "Failed to read config file '{}': {}",
            path.display(),
            e
        ))
    })?;

    let config: JurisdictionsConfig = toml::from_str(&content).map_err(|e| {
        AppError::ConfigError(format!("Invalid TOML in '{}': {}", path.display(), e))
    })?;

    tracing::info!(path = %path.display(), "Loaded jurisdictions config");
    Ok(config)
}
