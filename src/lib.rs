//! Swing-point screener for Binance spot pairs: chained pivot extraction
//! around a configurable breakpoint date, plus a trend-support screen.

pub mod analysis;
pub mod candles;
pub mod comfy_table;
pub mod config;
pub mod extremum;
pub mod find_tickers;
pub mod format;
pub mod indicators;
pub mod klines;
pub mod swing_points;
pub mod trend_filter;
