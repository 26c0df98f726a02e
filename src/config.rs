use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;

// CONFIGURATION STRUCTS
// Every tunable the screener reads lives here and is passed down
// explicitly; nothing consults process-wide state at computation time.

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ApiConfig {
    /// Binance spot REST v3 root. Overridable so tests can point the
    /// client at a local mock server.
    pub base_url: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct KlineConfig {
    pub interval: String, // e.g., "1d"
    pub limit: u32,       // e.g., 1000 candles
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct TradingConfig {
    pub quote_asset: String, // e.g., "USDT"
    /// Optional substring match applied to the symbol universe, the
    /// screener-side version of a search box.
    pub symbol_filter: Option<String>,
    /// Cap on symbols screened per run; 0 means no cap.
    pub max_symbols: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ScreenerConfig {
    /// Calendar split between the "pre" and "post" segments of every
    /// series. Configuration, never derived from the data.
    pub breakpoint: DateTime<Utc>,
    pub ma_lookback: usize,
    pub breach_lookback: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct DisplayConfig {
    pub page_size: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub klines: KlineConfig,
    pub trading: TradingConfig,
    pub screener: ScreenerConfig,
    pub display: DisplayConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.binance.com/api/v3".to_string(),
        }
    }
}

impl Default for KlineConfig {
    fn default() -> Self {
        Self {
            interval: "1d".to_string(),
            limit: 1000,
        }
    }
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            quote_asset: "USDT".to_string(),
            symbol_filter: None,
            max_symbols: 200,
        }
    }
}

impl Default for ScreenerConfig {
    fn default() -> Self {
        Self {
            breakpoint: Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
            ma_lookback: 10,
            breach_lookback: 7,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self { page_size: 30 }
    }
}

/// Path of the optional config file: `config.json` next to the binary.
fn config_path() -> Result<PathBuf> {
    let exe_path = std::env::current_exe()?;
    let dir = exe_path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("Could not find binary directory"))?;
    Ok(dir.join("config.json"))
}

/// Load the configuration, falling back to defaults when no file exists.
/// A file that exists but fails to parse is an error, not a silent
/// fallback.
pub async fn load_or_default() -> Result<AppConfig> {
    let path = config_path()?;
    if !path.exists() {
        return Ok(AppConfig::default());
    }

    // Read raw bytes; serde_json scans them during parsing anyway, so a
    // separate UTF-8 validation pass buys nothing.
    let content = fs::read(&path)
        .await
        .with_context(|| format!("reading {:?}", path))?;
    let config = serde_json::from_slice(&content)
        .with_context(|| format!("parsing {:?}", path))?;
    Ok(config)
}
