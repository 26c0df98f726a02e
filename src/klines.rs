use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use crate::candles::{Candle, CandleSeries};
use crate::config::AppConfig;

// Kline rows arrive as positional arrays:
// [openTime, open, high, low, close, volume, closeTime, ...]
const OPEN_TIME: usize = 0;
const OPEN: usize = 1;
const HIGH: usize = 2;
const LOW: usize = 3;
const CLOSE: usize = 4;
const VOLUME: usize = 5;
const CLOSE_TIME: usize = 6;

fn calculate_request_weight(limit: u32) -> u32 {
    match limit {
        0..=99 => 1,
        100..=499 => 2,
        500..=1000 => 5,
        _ => 10,
    }
}

/// Binance serializes prices as JSON strings; older payloads occasionally
/// carry bare numbers or empty strings. Accept all three.
fn lenient_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() { None } else { s.parse().ok() }
        }
        _ => None,
    }
}

fn ms_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(value.as_i64()?)
}

/// One positional row into a typed candle. Rows missing a required field
/// are skipped by the caller rather than failing the whole series.
fn parse_kline_row(row: &[Value]) -> Option<Candle> {
    Some(Candle {
        open_time: ms_timestamp(row.get(OPEN_TIME)?)?,
        open: lenient_f64(row.get(OPEN)?)?,
        high: lenient_f64(row.get(HIGH)?)?,
        low: lenient_f64(row.get(LOW)?)?,
        close: lenient_f64(row.get(CLOSE)?)?,
        volume: lenient_f64(row.get(VOLUME)?)?,
        close_time: ms_timestamp(row.get(CLOSE_TIME)?)?,
    })
}

/// On a 418/429 the error body may carry "banned until <ms-epoch>"
/// (Binance error -1003). Sleep the ban out plus a small margin so the
/// next batch starts clean.
async fn wait_out_ban(text: &str) {
    if !text.contains("-1003") {
        return;
    }
    let re = Regex::new(r"until\s+(\d+)").unwrap();
    if let Some(caps) = re.captures(text) {
        if let Some(ts_match) = caps.get(1) {
            if let Ok(ban_until) = ts_match.as_str().parse::<u64>() {
                let now = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .unwrap()
                    .as_millis() as u64;
                if ban_until > now {
                    let wait_ms = ban_until - now;
                    let wait_sec = (wait_ms as f64 / 1000.0) + 5.0;
                    tokio::time::sleep(Duration::from_secs_f64(wait_sec)).await;
                }
            }
        }
    }
}

/// Fetch one symbol's candle history. `start`/`end` bound the window as
/// half-open `[start, end)` millisecond timestamps; both are optional.
/// Any failure here is scoped to this symbol only.
pub async fn fetch_series(
    client: &Client,
    config: &AppConfig,
    symbol: &str,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Result<CandleSeries> {
    let mut query: Vec<(&str, String)> = vec![
        ("symbol", symbol.to_string()),
        ("interval", config.klines.interval.clone()),
        ("limit", config.klines.limit.to_string()),
    ];
    if let Some(start) = start {
        query.push(("startTime", start.timestamp_millis().to_string()));
    }
    if let Some(end) = end {
        query.push(("endTime", end.timestamp_millis().to_string()));
    }

    let response = client
        .get(format!("{}/klines", config.api.base_url))
        .query(&query)
        .send()
        .await?;

    let status = response.status();
    if status.as_u16() == 418 || status.as_u16() == 429 {
        if let Ok(text) = response.text().await {
            wait_out_ban(&text).await;
        }
        return Err(anyhow!("rate limited fetching klines for {}", symbol));
    }
    if !status.is_success() {
        return Err(anyhow!("klines request for {} failed: {}", symbol, status));
    }

    let rows: Vec<Vec<Value>> = response.json().await?;
    let candles: Vec<Candle> = rows.iter().filter_map(|row| parse_kline_row(row)).collect();

    Ok(CandleSeries::new(
        symbol,
        config.klines.interval.clone(),
        candles,
    ))
}

#[derive(Deserialize)]
struct TickerPrice {
    price: String,
}

/// The symbol's latest traded price. Always a fresh query; the candle
/// history is never a substitute for this.
pub async fn fetch_latest_price(client: &Client, config: &AppConfig, symbol: &str) -> Result<f64> {
    let response = client
        .get(format!("{}/ticker/price", config.api.base_url))
        .query(&[("symbol", symbol)])
        .send()
        .await?
        .error_for_status()?;

    let ticker: TickerPrice = response.json().await?;
    ticker
        .price
        .trim()
        .parse()
        .map_err(|e| anyhow!("unparseable price for {}: {}", symbol, e))
}

/// Fetch candle histories for a whole universe, batched to stay inside
/// the advertised request-weight budget (at 90% capacity) and paced to
/// one batch per minute. Each symbol carries its own `Result`; one bad
/// symbol never takes the batch down with it.
pub async fn fetch_universe_series(
    client: &Client,
    config: &AppConfig,
    symbols: &[String],
    weight_limit_per_minute: u32,
) -> Vec<(String, Result<CandleSeries>)> {
    let weight_per_req = calculate_request_weight(config.klines.limit);
    let safe_capacity = (weight_limit_per_minute as f64 * 0.90) as u32;
    let batch_size = std::cmp::max(1, safe_capacity / weight_per_req) as usize;

    let mut all_results = Vec::with_capacity(symbols.len());

    for (i, batch) in symbols.chunks(batch_size).enumerate() {
        let start_time = Instant::now();

        let tasks: Vec<_> = batch
            .iter()
            .map(|symbol| fetch_series(client, config, symbol, None, None))
            .collect();
        let results = join_all(tasks).await;
        all_results.extend(batch.iter().cloned().zip(results));

        // Weight resets per minute; wait the rest of it out before the
        // next batch, with a couple of seconds of slack.
        if i * batch_size + batch.len() < symbols.len() {
            let elapsed = start_time.elapsed();
            if elapsed.as_secs() < 60 {
                let wait = Duration::from_secs(62) - elapsed;
                tokio::time::sleep(wait).await;
            }
        }
    }

    all_results
}

/// Latest prices for many symbols at once. A failed query becomes `None`
/// for that symbol, which downstream treats as an absent current price.
pub async fn fetch_latest_prices(
    client: &Client,
    config: &AppConfig,
    symbols: &[String],
) -> Vec<(String, Option<f64>)> {
    let tasks: Vec<_> = symbols
        .iter()
        .map(|symbol| fetch_latest_price(client, config, symbol))
        .collect();
    let results = join_all(tasks).await;

    symbols
        .iter()
        .cloned()
        .zip(results.into_iter().map(Result::ok))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lenient_floats_accept_strings_numbers_and_reject_blanks() {
        assert_eq!(lenient_f64(&json!("42.5")), Some(42.5));
        assert_eq!(lenient_f64(&json!(7)), Some(7.0));
        assert_eq!(lenient_f64(&json!("  ")), None);
        assert_eq!(lenient_f64(&json!(null)), None);
        assert_eq!(lenient_f64(&json!("abc")), None);
    }

    #[test]
    fn kline_rows_parse_positionally() {
        let row = json!([
            1672531200000i64,
            "16500.1",
            "16750.2",
            "16400.3",
            "16600.4",
            "1234.5",
            1672617599999i64,
            "0",
            100,
            "0",
            "0",
            "0"
        ]);
        let candle = parse_kline_row(row.as_array().unwrap()).unwrap();
        assert_eq!(candle.open, 16500.1);
        assert_eq!(candle.high, 16750.2);
        assert_eq!(candle.low, 16400.3);
        assert_eq!(candle.close, 16600.4);
        assert_eq!(candle.open_time.timestamp_millis(), 1672531200000);
    }

    #[test]
    fn truncated_rows_are_rejected() {
        let row = json!([1672531200000i64, "1.0", "2.0"]);
        assert_eq!(parse_kline_row(row.as_array().unwrap()), None);
    }

    #[test]
    fn request_weight_tiers_match_the_exchange_table() {
        assert_eq!(calculate_request_weight(50), 1);
        assert_eq!(calculate_request_weight(499), 2);
        assert_eq!(calculate_request_weight(1000), 5);
        assert_eq!(calculate_request_weight(1500), 10);
    }
}
