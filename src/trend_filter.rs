use chrono::{DateTime, Utc};

use crate::candles::CandleSeries;
use crate::extremum::{window_extremum, ExtremumMode, PriceField};
use crate::indicators::rolling_close_ma;

/// Lookback windows for the trend-support screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrendFilterParams {
    /// Moving-average window over the close.
    pub ma_lookback: usize,
    /// How many of the newest candles are checked against their MA.
    pub breach_lookback: usize,
}

impl Default for TrendFilterParams {
    fn default() -> Self {
        Self {
            ma_lookback: 10,
            breach_lookback: 7,
        }
    }
}

/// Screening verdict for one symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreeningResult {
    pub symbol: String,
    pub qualifies: bool,
}

/// Two-stage trend-support screen.
///
/// Stage one rejects a symbol whose price has recently undercut its own
/// moving average: any of the last `breach_lookback` candles with a
/// defined MA whose `low` sits strictly below it fails. Stage two demands
/// a rising floor: the lowest low on or after the breakpoint must sit
/// strictly above the lowest low before it. An empty side of the split
/// counts as an infinite floor, the same way the original screen treated
/// a missing segment.
///
/// A series shorter than `ma_lookback` cannot produce a single valid MA
/// value, and is rejected outright.
pub fn qualifies(
    series: &CandleSeries,
    breakpoint: DateTime<Utc>,
    params: &TrendFilterParams,
) -> bool {
    let candles = series.candles();
    if candles.len() < params.ma_lookback {
        return false;
    }

    let ma = rolling_close_ma(series, params.ma_lookback);
    let tail_start = candles.len().saturating_sub(params.breach_lookback);
    for (candle, ma_value) in candles[tail_start..].iter().zip(&ma[tail_start..]) {
        if let Some(ma_value) = ma_value {
            if candle.low < *ma_value {
                return false;
            }
        }
    }

    let floor = |start, end| {
        window_extremum(series, PriceField::Low, start, end, ExtremumMode::Min)
            .map(|p| p.price)
            .unwrap_or(f64::INFINITY)
    };
    let min_before = floor(None, Some(breakpoint));
    let min_after = floor(Some(breakpoint), None);

    min_after > min_before
}

pub fn screen(
    series: &CandleSeries,
    breakpoint: DateTime<Utc>,
    params: &TrendFilterParams,
) -> ScreeningResult {
    ScreeningResult {
        symbol: series.symbol().to_string(),
        qualifies: qualifies(series, breakpoint, params),
    }
}
