// =============================================================================
// Runtime Configuration — instruments, timing and server settings
// =============================================================================
//
// Loaded from a JSON file at start-up; a missing or unreadable file falls back
// to defaults. Every field carries `#[serde(default)]` so partial files load.
// Persistence uses an atomic tmp + rename pattern.
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_assets() -> Vec<AssetConfig> {
    [
        ("EUR/USD", "EURUSD=X"),
        ("GBP/USD", "GBPUSD=X"),
        ("USD/JPY", "USDJPY=X"),
        ("GBP/JPY", "GBPJPY=X"),
        ("AUD/USD", "AUDUSD=X"),
    ]
    .into_iter()
    .map(|(name, symbol)| AssetConfig::new(name, symbol))
    .collect()
}

fn default_asset() -> String {
    "EUR/USD".to_string()
}

fn default_bar_interval() -> String {
    "1m".to_string()
}

fn default_lookback_range() -> String {
    "1d".to_string()
}

fn default_min_bars() -> usize {
    30
}

fn default_pending_delay_secs() -> u64 {
    20
}

fn default_history_capacity() -> usize {
    20
}

fn default_chart_points() -> usize {
    50
}

fn default_bind_addr() -> String {
    "0.0.0.0:5000".to_string()
}

fn default_price_base_url() -> String {
    "https://query1.finance.yahoo.com".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

// =============================================================================
// AssetConfig
// =============================================================================

/// A tracked instrument: dashboard display name and upstream ticker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetConfig {
    /// Display name used by the API, e.g. "EUR/USD".
    pub name: String,
    /// Upstream price-source symbol, e.g. "EURUSD=X".
    pub symbol: String,
}

impl AssetConfig {
    pub fn new(name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
        }
    }
}

// =============================================================================
// RuntimeConfig
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    // --- Instruments ---------------------------------------------------------

    /// Tracked instruments, in dashboard order.
    #[serde(default = "default_assets")]
    pub assets: Vec<AssetConfig>,

    /// Asset served when a query names none and nothing was selected yet.
    #[serde(default = "default_asset")]
    pub default_asset: String,

    // --- Price data ----------------------------------------------------------

    /// Bar width requested from the price source.
    #[serde(default = "default_bar_interval")]
    pub bar_interval: String,

    /// Look-back window requested from the price source.
    #[serde(default = "default_lookback_range")]
    pub lookback_range: String,

    /// Minimum number of bars before a signal is computed.
    #[serde(default = "default_min_bars")]
    pub min_bars: usize,

    /// Price source base URL.
    #[serde(default = "default_price_base_url")]
    pub price_base_url: String,

    /// Upstream request timeout.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    // --- Signal workflow -----------------------------------------------------

    /// Seconds a new signal stays pending before it is executed.
    #[serde(default = "default_pending_delay_secs")]
    pub pending_delay_secs: u64,

    /// History entries retained per asset.
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    /// Trailing points included in the chart series.
    #[serde(default = "default_chart_points")]
    pub chart_points: usize,

    // --- Server --------------------------------------------------------------

    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            assets: default_assets(),
            default_asset: default_asset(),
            bar_interval: default_bar_interval(),
            lookback_range: default_lookback_range(),
            min_bars: default_min_bars(),
            price_base_url: default_price_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            pending_delay_secs: default_pending_delay_secs(),
            history_capacity: default_history_capacity(),
            chart_points: default_chart_points(),
            bind_addr: default_bind_addr(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read runtime config from {}", path.display()))?;

        let mut config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse runtime config from {}", path.display()))?;
        config.normalise();

        info!(
            path = %path.display(),
            assets = config.assets.len(),
            default_asset = %config.default_asset,
            "runtime config loaded"
        );

        Ok(config)
    }

    /// Persist the current configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise runtime config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "runtime config saved (atomic)");
        Ok(())
    }

    /// Repair settings the rest of the engine relies on: a non-empty asset
    /// list, and a default asset that is part of it.
    pub fn normalise(&mut self) {
        if self.assets.is_empty() {
            warn!("config lists no assets, using the built-in set");
            self.assets = default_assets();
        }
        if self.symbol_for(&self.default_asset).is_none() {
            let fallback = self.assets[0].name.clone();
            warn!(
                default_asset = %self.default_asset,
                fallback = %fallback,
                "default asset is not configured, falling back"
            );
            self.default_asset = fallback;
        }
    }

    /// Upstream symbol for a display name.
    pub fn symbol_for(&self, name: &str) -> Option<&str> {
        self.assets
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.symbol.as_str())
    }

    /// Display names in configured order.
    pub fn asset_names(&self) -> Vec<String> {
        self.assets.iter().map(|a| a.name.clone()).collect()
    }
}
