use ta::Next;
use ta::indicators::SimpleMovingAverage;

use crate::candles::CandleSeries;

/// Trailing simple moving average of the close, one entry per candle.
///
/// The first `period - 1` entries are `None`: a point only gets a value
/// once a full window of closes exists behind it. A zero period never has
/// a full window, so it yields all `None`.
pub fn rolling_close_ma(series: &CandleSeries, period: usize) -> Vec<Option<f64>> {
    let mut sma = match SimpleMovingAverage::new(period) {
        Ok(sma) => sma,
        Err(_) => return vec![None; series.len()],
    };

    series
        .candles()
        .iter()
        .enumerate()
        .map(|(i, candle)| {
            let value = sma.next(candle.close);
            if i + 1 >= period { Some(value) } else { None }
        })
        .collect()
}
