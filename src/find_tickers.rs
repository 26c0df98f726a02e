use anyhow::Result;
use reqwest::Client;
use serde::Deserialize;

// Only the slices of /exchangeInfo the screener needs: tradable symbols
// and the advertised request-weight budget.

#[derive(Deserialize, Debug)]
pub struct ExchangeInfo {
    #[serde(rename = "rateLimits", default)]
    pub rate_limits: Vec<RateLimit>,
    #[serde(default)]
    pub symbols: Vec<SymbolInfo>,
}

#[derive(Deserialize, Debug)]
pub struct RateLimit {
    #[serde(rename = "rateLimitType")]
    pub limit_type: String,
    pub interval: String,
    pub limit: u32,
}

#[derive(Deserialize, Debug)]
pub struct SymbolInfo {
    pub symbol: String,
    pub status: String,
    #[serde(rename = "quoteAsset")]
    pub quote_asset: String,
}

/// Tradable symbol universe plus the per-minute weight budget the batch
/// fetcher paces itself against.
#[derive(Debug, Clone)]
pub struct Universe {
    pub symbols: Vec<String>,
    pub weight_limit_per_minute: u32,
}

/// Fetch the exchange metadata and keep actively trading pairs quoted in
/// the configured asset, in the exchange's listing order. Delisted and
/// suspended pairs never make it into the universe.
pub async fn fetch_universe(client: &Client, base_url: &str, quote_asset: &str) -> Result<Universe> {
    let response = client
        .get(format!("{}/exchangeInfo", base_url))
        .send()
        .await?
        .error_for_status()?;

    let info: ExchangeInfo = response.json().await?;
    Ok(build_universe(info, quote_asset))
}

fn build_universe(info: ExchangeInfo, quote_asset: &str) -> Universe {
    let symbols = info
        .symbols
        .into_iter()
        .filter(|s| s.status == "TRADING" && s.quote_asset == quote_asset)
        .map(|s| s.symbol)
        .collect();

    let weight_limit_per_minute = info
        .rate_limits
        .iter()
        .find(|r| r.limit_type == "REQUEST_WEIGHT" && r.interval == "MINUTE")
        .map(|r| r.limit)
        .unwrap_or(2400);

    Universe {
        symbols,
        weight_limit_per_minute,
    }
}
