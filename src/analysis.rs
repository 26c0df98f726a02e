//! Per-symbol orchestration: fetched candles + latest prices in,
//! display-ready metrics and screening verdicts out.

use chrono::{DateTime, Utc};

use crate::candles::CandleSeries;
use crate::config::AppConfig;
use crate::format::{format_metrics, retain_complete, DisplayMetrics};
use crate::swing_points::build_chain;
use crate::trend_filter::{screen, ScreeningResult, TrendFilterParams};

/// Everything one screening run produces for the consumer.
#[derive(Debug, Clone)]
pub struct ScreenReport {
    /// Close time of the newest candle seen across the universe.
    pub data_as_of: Option<DateTime<Utc>>,
    /// Complete metric records, best current run first.
    pub metrics: Vec<DisplayMetrics>,
    /// Trend-support verdict for every symbol that had a series.
    pub screened: Vec<ScreeningResult>,
}

/// Build the report from fetched data. Pure: every series is paired with
/// the latest price its caller fetched (or `None` if that query failed),
/// and symbols whose fetch failed entirely never reach this point.
pub fn build_report(data: &[(CandleSeries, Option<f64>)], config: &AppConfig) -> ScreenReport {
    let breakpoint = config.screener.breakpoint;
    let params = TrendFilterParams {
        ma_lookback: config.screener.ma_lookback,
        breach_lookback: config.screener.breach_lookback,
    };

    let mut metrics = Vec::with_capacity(data.len());
    let mut screened = Vec::with_capacity(data.len());
    let mut data_as_of: Option<DateTime<Utc>> = None;

    for (series, latest_price) in data {
        let chain = build_chain(series, breakpoint, *latest_price);
        let listed_at = series.first().map(|c| c.open_time);
        metrics.push(format_metrics(series.symbol(), listed_at, &chain));
        screened.push(screen(series, breakpoint, &params));

        if let Some(last) = series.last() {
            if data_as_of.is_none_or(|t| last.close_time > t) {
                data_as_of = Some(last.close_time);
            }
        }
    }

    // Only fully populated rows are worth ranking; see format::retain_complete.
    let mut metrics = retain_complete(metrics);
    metrics.sort_unstable_by(|a, b| {
        b.pct_current_run
            .partial_cmp(&a.pct_current_run)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    ScreenReport {
        data_as_of,
        metrics,
        screened,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candles::Candle;
    use chrono::TimeZone;

    fn day(month: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(if month >= 12 { 2022 } else { 2023 }, month, d, 0, 0, 0).unwrap()
    }

    fn candle(at: DateTime<Utc>, high: f64, low: f64) -> Candle {
        Candle {
            open_time: at,
            open: low,
            high,
            low,
            close: low,
            volume: 0.0,
            close_time: at + chrono::Duration::days(1),
        }
    }

    fn full_history(symbol: &str) -> CandleSeries {
        let candles = vec![
            candle(day(12, 1), 150.0, 100.0),
            candle(day(12, 10), 140.0, 110.0),
            candle(day(1, 5), 130.0, 120.0),
            candle(day(1, 10), 200.0, 160.0),
            candle(day(1, 15), 190.0, 160.0),
        ];
        CandleSeries::new(symbol, "1d", candles)
    }

    #[test]
    fn symbols_without_pre_history_drop_out_of_the_metrics() {
        let config = AppConfig::default();
        let fresh_listing = CandleSeries::new(
            "NEWUSDT",
            "1d",
            vec![candle(day(1, 5), 10.0, 8.0), candle(day(1, 6), 11.0, 9.0)],
        );
        let data = vec![
            (full_history("BTCUSDT"), Some(180.0)),
            (fresh_listing, Some(10.0)),
        ];

        let report = build_report(&data, &config);

        assert_eq!(report.metrics.len(), 1);
        assert_eq!(report.metrics[0].symbol, "BTCUSDT");
        // The screen still has a verdict for both symbols.
        assert_eq!(report.screened.len(), 2);
    }

    #[test]
    fn metrics_rank_by_current_run() {
        let config = AppConfig::default();
        // Same shape, different latest prices: the bigger bounce off the
        // second low ranks first.
        let data = vec![
            (full_history("AAAUSDT"), Some(170.0)),
            (full_history("BBBUSDT"), Some(250.0)),
        ];

        let report = build_report(&data, &config);

        let symbols: Vec<_> = report.metrics.iter().map(|m| m.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["BBBUSDT", "AAAUSDT"]);
    }

    #[test]
    fn data_as_of_is_the_newest_close_time() {
        let config = AppConfig::default();
        let data = vec![(full_history("BTCUSDT"), Some(180.0))];
        let report = build_report(&data, &config);
        assert_eq!(report.data_as_of, Some(day(1, 15) + chrono::Duration::days(1)));
    }
}
