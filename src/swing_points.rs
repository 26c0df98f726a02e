use chrono::{DateTime, Utc};

use crate::candles::{CandleSeries, Pivot};
use crate::extremum::{window_extremum, ExtremumMode, PriceField};
use crate::format::round2;

/// The alternating low/high/low structure of one symbol's history around a
/// breakpoint date, plus the percentage moves between adjacent legs.
///
/// `current` is the exchange's latest traded price, supplied by the caller
/// from a separate ticker query rather than derived from the candle
/// history. Any pivot can be absent; percentages are absent whenever either
/// operand is.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PivotChain {
    pub pre_low: Option<Pivot>,
    pub pre_high: Option<Pivot>,
    pub post_low: Option<Pivot>,
    pub post_high: Option<Pivot>,
    pub post_low2: Option<Pivot>,
    pub current: Option<f64>,

    pub pct_pre_run: Option<f64>,
    pub pct_post_drop: Option<f64>,
    pub pct_post_run: Option<f64>,
    pub pct_second_drop: Option<f64>,
    pub pct_current_run: Option<f64>,
}

/// Computation steps in dependency order. Each post-breakpoint step anchors
/// its search window at the timestamp of the previous step's pivot
/// (inclusive), so the chain walks strictly forward in time; an absent
/// pivot leaves every step depending on it absent as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChainStep {
    PreLow,
    PreHigh,
    PostLow,
    PostHigh,
    PostLow2,
    Current,
    Done,
}

/// Build the pivot chain for one symbol.
///
/// Runs the five window queries in their fixed order against the already
/// fetched series, then derives the percentage legs. Re-running on the same
/// series and breakpoint always yields the same chain.
pub fn build_chain(
    series: &CandleSeries,
    breakpoint: DateTime<Utc>,
    latest_price: Option<f64>,
) -> PivotChain {
    let mut chain = PivotChain::default();
    let mut step = ChainStep::PreLow;

    while step != ChainStep::Done {
        step = match step {
            ChainStep::PreLow => {
                chain.pre_low = window_extremum(
                    series,
                    PriceField::Low,
                    None,
                    Some(breakpoint),
                    ExtremumMode::Min,
                );
                ChainStep::PreHigh
            }
            ChainStep::PreHigh => {
                chain.pre_high = window_extremum(
                    series,
                    PriceField::High,
                    None,
                    Some(breakpoint),
                    ExtremumMode::Max,
                );
                ChainStep::PostLow
            }
            ChainStep::PostLow => {
                chain.post_low = window_extremum(
                    series,
                    PriceField::Low,
                    Some(breakpoint),
                    None,
                    ExtremumMode::Min,
                );
                ChainStep::PostHigh
            }
            ChainStep::PostHigh => {
                chain.post_high = chain.post_low.and_then(|anchor| {
                    window_extremum(
                        series,
                        PriceField::High,
                        Some(anchor.at),
                        None,
                        ExtremumMode::Max,
                    )
                });
                ChainStep::PostLow2
            }
            ChainStep::PostLow2 => {
                chain.post_low2 = chain.post_high.and_then(|anchor| {
                    window_extremum(
                        series,
                        PriceField::Low,
                        Some(anchor.at),
                        None,
                        ExtremumMode::Min,
                    )
                });
                ChainStep::Current
            }
            ChainStep::Current => {
                chain.current = latest_price;
                ChainStep::Done
            }
            ChainStep::Done => ChainStep::Done,
        };
    }

    let price = |p: Option<Pivot>| p.map(|p| p.price);
    chain.pct_pre_run = pct(price(chain.pre_high), price(chain.pre_low));
    chain.pct_post_drop = pct(price(chain.post_low), price(chain.pre_high));
    chain.pct_post_run = pct(price(chain.post_high), price(chain.post_low));
    chain.pct_second_drop = pct(price(chain.post_low2), price(chain.post_high));
    chain.pct_current_run = pct(chain.current, price(chain.post_low2));

    chain
}

/// Percentage move from `b` to `a`, rounded to two decimals. Absent when
/// either operand is absent or the base is zero.
pub fn pct(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) if b != 0.0 => Some(round2(((a / b) - 1.0) * 100.0)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candles::Candle;
    use chrono::TimeZone;

    fn day(d: u32) -> DateTime<Utc> {
        // Spread across two months so "day" 1..=40 stays valid.
        let base = Utc.with_ymd_and_hms(2022, 12, 1, 0, 0, 0).unwrap();
        base + chrono::Duration::days(d as i64)
    }

    fn candle(d: u32, high: f64, low: f64) -> Candle {
        Candle {
            open_time: day(d),
            open: low,
            high,
            low,
            close: low,
            volume: 0.0,
            close_time: day(d),
        }
    }

    /// Pre segment: low 100 on day 2, high 150 on day 5.
    /// Post segment: low 120 on day 32, high 200 on day 35, low2 160 on day 38.
    fn worked_series() -> (CandleSeries, DateTime<Utc>) {
        let breakpoint = day(31);
        let candles = vec![
            candle(1, 120.0, 110.0),
            candle(2, 115.0, 100.0),
            candle(5, 150.0, 130.0),
            candle(10, 140.0, 125.0),
            candle(32, 130.0, 120.0),
            candle(35, 200.0, 170.0),
            candle(38, 175.0, 160.0),
            candle(40, 185.0, 165.0),
        ];
        (CandleSeries::new("TESTUSDT", "1d", candles), breakpoint)
    }

    #[test]
    fn worked_example_matches_expected_percentages() {
        let (series, breakpoint) = worked_series();
        let chain = build_chain(&series, breakpoint, Some(180.0));

        assert_eq!(chain.pre_low.unwrap().price, 100.0);
        assert_eq!(chain.pre_high.unwrap().price, 150.0);
        assert_eq!(chain.post_low.unwrap().price, 120.0);
        assert_eq!(chain.post_high.unwrap().price, 200.0);
        assert_eq!(chain.post_low2.unwrap().price, 160.0);

        assert_eq!(chain.pct_pre_run, Some(50.0));
        assert_eq!(chain.pct_post_drop, Some(-20.0));
        assert_eq!(chain.pct_post_run, Some(66.67));
        assert_eq!(chain.pct_second_drop, Some(-20.0));
        assert_eq!(chain.pct_current_run, Some(12.5));
    }

    #[test]
    fn chain_timestamps_never_move_backwards() {
        let (series, breakpoint) = worked_series();
        let chain = build_chain(&series, breakpoint, Some(180.0));

        let pre_low = chain.pre_low.unwrap().at;
        let pre_high = chain.pre_high.unwrap().at;
        let post_low = chain.post_low.unwrap().at;
        let post_high = chain.post_high.unwrap().at;
        let post_low2 = chain.post_low2.unwrap().at;

        assert!(pre_low <= pre_high);
        assert!(pre_high <= post_low);
        assert!(post_low <= post_high);
        assert!(post_high <= post_low2);
    }

    #[test]
    fn empty_post_segment_short_circuits_the_rest() {
        let breakpoint = day(31);
        let candles = vec![candle(1, 120.0, 110.0), candle(2, 115.0, 100.0)];
        let series = CandleSeries::new("TESTUSDT", "1d", candles);

        let chain = build_chain(&series, breakpoint, Some(180.0));

        assert!(chain.pre_low.is_some());
        assert!(chain.pre_high.is_some());
        assert_eq!(chain.post_low, None);
        assert_eq!(chain.post_high, None);
        assert_eq!(chain.post_low2, None);
        // The current price is a separate query and survives on its own,
        // but every percentage touching the post chain is gone.
        assert_eq!(chain.current, Some(180.0));
        assert!(chain.pct_pre_run.is_some());
        assert_eq!(chain.pct_post_drop, None);
        assert_eq!(chain.pct_post_run, None);
        assert_eq!(chain.pct_second_drop, None);
        assert_eq!(chain.pct_current_run, None);
    }

    #[test]
    fn post_high_anchors_at_the_post_low_timestamp() {
        let breakpoint = day(31);
        // The highest high of the post segment (day 32) happens before the
        // post low (day 34), so it must not win: the run is measured only
        // from the low onwards.
        let candles = vec![
            candle(32, 500.0, 200.0),
            candle(34, 210.0, 100.0),
            candle(36, 300.0, 150.0),
        ];
        let series = CandleSeries::new("TESTUSDT", "1d", candles);

        let chain = build_chain(&series, breakpoint, None);
        assert_eq!(chain.post_low.unwrap().at, day(34));
        assert_eq!(chain.post_high.unwrap().price, 300.0);
        assert_eq!(chain.post_high.unwrap().at, day(36));
    }

    #[test]
    fn rebuilding_yields_an_identical_chain() {
        let (series, breakpoint) = worked_series();
        let first = build_chain(&series, breakpoint, Some(180.0));
        let second = build_chain(&series, breakpoint, Some(180.0));
        assert_eq!(first, second);
    }

    #[test]
    fn pct_guards_absent_operands_and_zero_base() {
        assert_eq!(pct(None, Some(10.0)), None);
        assert_eq!(pct(Some(10.0), None), None);
        assert_eq!(pct(Some(10.0), Some(0.0)), None);
        assert_eq!(pct(Some(115.0), Some(100.0)), Some(15.0));
        assert_eq!(pct(Some(200.0), Some(120.0)), Some(66.67));
    }
}
