use chrono::{DateTime, Utc};

use crate::swing_points::PivotChain;

/// Round to two decimal places.
///
/// This is the one rounding rule of the whole crate: percentages use it
/// directly and price formatting uses it after magnitude scaling, so test
/// expectations elsewhere match against it.
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Price with a magnitude suffix: millions get "M", thousands "k",
/// everything else is printed plain. The rounded value goes through
/// `Display`, which drops trailing zeros (4500 → "4.5k", 42 → "42").
pub fn format_price(x: f64) -> String {
    if x >= 1_000_000.0 {
        format!("{}M", round2(x / 1_000_000.0))
    } else if x >= 1_000.0 {
        format!("{}k", round2(x / 1_000.0))
    } else {
        format!("{}", round2(x))
    }
}

/// Display-ready metrics for one symbol. Field presence mirrors the pivot
/// chain exactly; formatting never invents or removes a value.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayMetrics {
    pub symbol: String,
    /// First traded day of the fetched history. Presentation only.
    pub listing_date: Option<String>,
    pub pre_low: Option<String>,
    pub pre_high: Option<String>,
    pub post_low: Option<String>,
    pub post_high: Option<String>,
    pub post_low2: Option<String>,
    pub current: Option<String>,
    pub pct_pre_run: Option<f64>,
    pub pct_post_run: Option<f64>,
    pub pct_post_drop: Option<f64>,
    pub pct_second_drop: Option<f64>,
    pub pct_current_run: Option<f64>,
}

pub fn format_metrics(
    symbol: &str,
    listed_at: Option<DateTime<Utc>>,
    chain: &PivotChain,
) -> DisplayMetrics {
    let price = |p: Option<crate::candles::Pivot>| p.map(|p| format_price(p.price));

    DisplayMetrics {
        symbol: symbol.to_string(),
        listing_date: listed_at.map(|t| t.format("%Y-%m-%d").to_string()),
        pre_low: price(chain.pre_low),
        pre_high: price(chain.pre_high),
        post_low: price(chain.post_low),
        post_high: price(chain.post_high),
        post_low2: price(chain.post_low2),
        current: chain.current.map(format_price),
        pct_pre_run: chain.pct_pre_run,
        pct_post_run: chain.pct_post_run,
        pct_post_drop: chain.pct_post_drop,
        pct_second_drop: chain.pct_second_drop,
        pct_current_run: chain.pct_current_run,
    }
}

impl DisplayMetrics {
    /// True when every field is present.
    pub fn is_complete(&self) -> bool {
        self.listing_date.is_some()
            && self.pre_low.is_some()
            && self.pre_high.is_some()
            && self.post_low.is_some()
            && self.post_high.is_some()
            && self.post_low2.is_some()
            && self.current.is_some()
            && self.pct_pre_run.is_some()
            && self.pct_post_run.is_some()
            && self.pct_post_drop.is_some()
            && self.pct_second_drop.is_some()
            && self.pct_current_run.is_some()
    }
}

/// Completeness policy: only fully populated records reach the output.
///
/// This intentionally shrinks the result set: a symbol with no pre-breakpoint
/// history or a failed price query disappears entirely rather than rendering
/// a ragged row. Callers that want partial rows must skip this filter, not
/// weaken it.
pub fn retain_complete(records: Vec<DisplayMetrics>) -> Vec<DisplayMetrics> {
    records.into_iter().filter(DisplayMetrics::is_complete).collect()
}
