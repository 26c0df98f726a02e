use chrono::{DateTime, Utc};

/// One daily OHLC observation for a trading pair.
///
/// `open`, `volume` and `close_time` come along for free from the API and
/// are kept on the struct, but the swing-point math only ever reads
/// `open_time`, `high`, `low` and `close`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candle {
    pub open_time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub close_time: DateTime<Utc>,
}

/// A price extremum together with the time at which it occurred.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pivot {
    pub price: f64,
    pub at: DateTime<Utc>,
}

/// Ordered candle history for exactly one symbol and interval.
///
/// Candles must be strictly ascending by `open_time`, one per period, no
/// duplicates. Binance returns klines in exactly this order; the invariant
/// is checked in debug builds. The series is never mutated after
/// construction, and an empty series is a valid (if uninteresting) value.
#[derive(Debug, Clone, PartialEq)]
pub struct CandleSeries {
    symbol: String,
    interval: String,
    candles: Vec<Candle>,
}

impl CandleSeries {
    pub fn new(symbol: impl Into<String>, interval: impl Into<String>, candles: Vec<Candle>) -> Self {
        debug_assert!(
            candles.windows(2).all(|w| w[0].open_time < w[1].open_time),
            "candles must be strictly ascending by open_time"
        );
        Self {
            symbol: symbol.into(),
            interval: interval.into(),
            candles,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn interval(&self) -> &str {
        &self.interval
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn first(&self) -> Option<&Candle> {
        self.candles.first()
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }

    /// Candles with `open_time` in the half-open window `[start, end)`.
    /// Either bound may be omitted to leave that side unbounded.
    pub fn range(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> impl Iterator<Item = &Candle> {
        self.candles.iter().filter(move |c| {
            start.is_none_or(|s| c.open_time >= s) && end.is_none_or(|e| c.open_time < e)
        })
    }
}
