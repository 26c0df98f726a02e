use chrono::{DateTime, Utc};

use crate::candles::{Candle, CandleSeries, Pivot};

/// Which side of the candle a window query reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceField {
    High,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtremumMode {
    Min,
    Max,
}

impl PriceField {
    fn of(self, candle: &Candle) -> f64 {
        match self {
            PriceField::High => candle.high,
            PriceField::Low => candle.low,
        }
    }
}

/// Minimum or maximum of one price field over `open_time ∈ [start, end)`.
///
/// Returns `None` when no candle falls inside the window. Ties go to the
/// earliest candle: the scan runs in ascending time order and a later
/// candle only replaces the incumbent on a strictly better price. Callers
/// anchor follow-up queries on the winning timestamp, so the tie rule is
/// load-bearing, not cosmetic.
pub fn window_extremum(
    series: &CandleSeries,
    field: PriceField,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    mode: ExtremumMode,
) -> Option<Pivot> {
    let mut best: Option<Pivot> = None;

    for candle in series.range(start, end) {
        let price = field.of(candle);
        let better = match best {
            None => true,
            Some(incumbent) => match mode {
                ExtremumMode::Min => price < incumbent.price,
                ExtremumMode::Max => price > incumbent.price,
            },
        };
        if better {
            best = Some(Pivot {
                price,
                at: candle.open_time,
            });
        }
    }

    best
}
