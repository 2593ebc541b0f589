//! Rolling and exponential transforms over a close-price column.
//!
//! Every function is pure and returns a column of the same length as its input.
//! Positions without enough history are `None` (the warm-up gap), never an error.

use crate::config::IndicatorConfig;
use crate::config::constants::indicators::RSI_CEILING;
use crate::models::{Column, IndicatorFrame, PriceSeries};
use statrs::statistics::Statistics;

use super::returns::{cumulative_returns, daily_returns};

/// Arithmetic mean of the trailing `window` values. Undefined for `i < window - 1`.
pub fn sma(values: &[f64], window: usize) -> Column {
    let mut out = vec![None; values.len()];
    if window == 0 || window > values.len() {
        return out;
    }
    for (start, slice) in values.windows(window).enumerate() {
        out[start + window - 1] = Some(slice.iter().sum::<f64>() / window as f64);
    }
    out
}

/// `ema[i] = v[i] * k + ema[i - 1] * (1 - k)` with `k = 2 / (span + 1)`, seeded by `ema[0] = v[0]`.
pub fn ema(values: &[f64], span: usize) -> Vec<f64> {
    let k = 2.0 / (span as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut prev: Option<f64> = None;
    for &v in values {
        let next = match prev {
            Some(p) => v * k + p * (1.0 - k),
            None => v,
        };
        out.push(next);
        prev = Some(next);
    }
    out
}

#[derive(Debug, Clone, PartialEq)]
pub struct Macd {
    pub line: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

pub fn macd(values: &[f64], fast: usize, slow: usize, signal_span: usize) -> Macd {
    let fast_ema = ema(values, fast);
    let slow_ema = ema(values, slow);
    let line: Vec<f64> = fast_ema.iter().zip(&slow_ema).map(|(f, s)| f - s).collect();
    let signal = ema(&line, signal_span);
    let histogram = line.iter().zip(&signal).map(|(l, s)| l - s).collect();
    Macd {
        line,
        signal,
        histogram,
    }
}

/// Relative strength over the last `period` price changes, in `[0, 100]`.
///
/// Uses simple averages of gains and losses. Zero average loss reports 100.
/// Undefined for `i < period`.
///
/// The first close has no change before it and is not counted as a zero
/// change, so a 14 period RSI starts at index 14, not 13.
pub fn rsi(values: &[f64], period: usize) -> Column {
    let mut out = vec![None; values.len()];
    if period == 0 || period >= values.len() {
        return out;
    }

    let deltas: Vec<f64> = values.windows(2).map(|w| w[1] - w[0]).collect();

    // deltas[j] is the change into values[j + 1]
    for (start, slice) in deltas.windows(period).enumerate() {
        let gain: f64 = slice.iter().filter(|d| **d > 0.0).sum::<f64>() / period as f64;
        let loss: f64 = -slice.iter().filter(|d| **d < 0.0).sum::<f64>() / period as f64;

        let value = if loss <= 0.0 {
            RSI_CEILING
        } else {
            let rs = gain / loss;
            RSI_CEILING - RSI_CEILING / (1.0 + rs)
        };
        out[start + period] = Some(value.clamp(0.0, RSI_CEILING));
    }
    out
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bands {
    pub middle: Column,
    pub upper: Column,
    pub lower: Column,
    /// `(upper - lower) / middle`
    pub width: Column,
}

/// Volatility bands around the `period` SMA, `k` sample standard deviations wide.
pub fn bands(values: &[f64], period: usize, k: f64) -> Bands {
    let middle = sma(values, period);
    let n = values.len();
    let mut upper = vec![None; n];
    let mut lower = vec![None; n];
    let mut width = vec![None; n];
    // sample deviation needs two points
    if period < 2 {
        return Bands {
            middle,
            upper,
            lower,
            width,
        };
    }

    for i in 0..n {
        let Some(mid) = middle[i] else { continue };
        let sd = values[i + 1 - period..=i].iter().std_dev();
        if !sd.is_finite() {
            continue;
        }
        let up = mid + k * sd;
        let lo = mid - k * sd;
        upper[i] = Some(up);
        lower[i] = Some(lo);
        if mid != 0.0 {
            width[i] = Some((up - lo) / mid);
        }
    }

    Bands {
        middle,
        upper,
        lower,
        width,
    }
}

/// `v[i] / v[i - lag]`. Undefined for `i < lag` or a zero base.
pub fn momentum(values: &[f64], lag: usize) -> Column {
    (0..values.len())
        .map(|i| {
            if i < lag {
                return None;
            }
            let base = values[i - lag];
            (base != 0.0).then(|| values[i] / base)
        })
        .collect()
}

/// Every indicator column for one symbol.
pub fn compute_indicators(series: &PriceSeries, cfg: &IndicatorConfig) -> IndicatorFrame {
    let closes = series.closes();
    let as_column = |v: Vec<f64>| -> Column { v.into_iter().map(Some).collect() };

    let macd = macd(closes, cfg.ema_fast, cfg.ema_slow, cfg.macd_signal);
    let bands = bands(closes, cfg.band_period, cfg.band_width_k);

    IndicatorFrame {
        symbol_interval: series.symbol_interval.clone(),
        timestamps: series.timestamps.clone(),
        closes: closes.to_vec(),

        sma_short: sma(closes, cfg.sma_short),
        sma_medium: sma(closes, cfg.sma_medium),
        sma_long: sma(closes, cfg.sma_long),

        ema_fast: as_column(ema(closes, cfg.ema_fast)),
        ema_slow: as_column(ema(closes, cfg.ema_slow)),

        macd: as_column(macd.line),
        macd_signal: as_column(macd.signal),
        macd_histogram: as_column(macd.histogram),

        rsi: rsi(closes, cfg.rsi_period),

        band_middle: bands.middle,
        band_upper: bands.upper,
        band_lower: bands.lower,
        band_width: bands.width,

        momentum: momentum(closes, cfg.momentum_lag),

        daily_return: daily_returns(closes),
        cumulative_return: cumulative_returns(closes),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SymbolInterval;

    fn noisy(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0 + (i % 7) as f64 * 0.3)
            .collect()
    }

    #[test]
    fn test_sma_warm_up_and_mean() {
        let values = noisy(60);
        for w in [1, 5, 20] {
            let col = sma(&values, w);
            for (i, v) in col.iter().enumerate() {
                if i + 1 < w {
                    assert!(v.is_none());
                } else {
                    let expected = values[i + 1 - w..=i].iter().sum::<f64>() / w as f64;
                    assert!((v.unwrap() - expected).abs() < 1e-9);
                }
            }
        }
        assert!(sma(&values, 200).iter().all(Option::is_none));
    }

    #[test]
    fn test_ema_of_constant_is_constant() {
        let out = ema(&[42.0; 50], 12);
        assert!(out.iter().all(|v| (v - 42.0).abs() < 1e-12));
    }

    #[test]
    fn test_ema_recurrence() {
        let out = ema(&[1.0, 2.0, 3.0], 3);
        // k = 0.5
        assert_eq!(out, vec![1.0, 1.5, 2.25]);
    }

    #[test]
    fn test_macd_histogram_is_line_minus_signal() {
        let values = noisy(80);
        let m = macd(&values, 12, 26, 9);
        for i in 0..values.len() {
            assert!((m.histogram[i] - (m.line[i] - m.signal[i])).abs() < 1e-12);
        }
        assert_eq!(m.line[0], 0.0);
    }

    #[test]
    fn test_rsi_bounds_and_warm_up() {
        let values = noisy(120);
        let col = rsi(&values, 14);
        assert!(col[..14].iter().all(Option::is_none));
        assert_eq!(col[13], None);
        assert!(col[14].is_some());
        for v in col[14..].iter() {
            let v = v.unwrap();
            assert!((0.0..=100.0).contains(&v));
        }
    }

    #[test]
    fn test_rsi_without_losses_is_ceiling() {
        let rising: Vec<f64> = (0..30).map(|i| i as f64).collect();
        let col = rsi(&rising, 14);
        assert_eq!(col[14], Some(100.0));
        let flat = rsi(&[5.0; 30], 14);
        assert_eq!(flat[29], Some(100.0));
        let falling: Vec<f64> = (0..30).map(|i| -(i as f64)).collect();
        assert_eq!(rsi(&falling, 14)[20], Some(0.0));
    }

    #[test]
    fn test_bands_use_sample_deviation() {
        let values = [1.0, 2.0, 3.0, 4.0];
        let b = bands(&values, 4, 2.0);
        let sd = (5.0f64 / 3.0).sqrt();
        assert_eq!(b.middle[3], Some(2.5));
        assert!((b.upper[3].unwrap() - (2.5 + 2.0 * sd)).abs() < 1e-12);
        assert!((b.lower[3].unwrap() - (2.5 - 2.0 * sd)).abs() < 1e-12);
        assert!((b.width[3].unwrap() - 4.0 * sd / 2.5).abs() < 1e-12);
        assert!(b.upper[2].is_none());
    }

    #[test]
    fn test_single_point_bands_stay_undefined() {
        let b = bands(&[1.0, 2.0, 3.0], 1, 2.0);
        assert_eq!(b.middle, vec![Some(1.0), Some(2.0), Some(3.0)]);
        assert!(b.upper.iter().all(Option::is_none));
        assert!(b.width.iter().all(Option::is_none));
    }

    #[test]
    fn test_momentum_ratio() {
        let values: Vec<f64> = (1..=20).map(|i| i as f64).collect();
        let col = momentum(&values, 10);
        assert!(col[9].is_none());
        assert_eq!(col[10], Some(11.0 / 1.0));
        assert_eq!(col[19], Some(20.0 / 10.0));
    }

    #[test]
    fn test_compute_indicators_on_sub_range() {
        let series =
            PriceSeries::from_closes(SymbolInterval::daily("X"), 0, &noisy(250)).unwrap();
        let cfg = IndicatorConfig::default();
        let frame = compute_indicators(&series, &cfg);
        assert_eq!(frame.len(), 250);
        assert_eq!(IndicatorFrame::warm_up_len(&frame.sma_long), 199);
        assert_eq!(IndicatorFrame::warm_up_len(&frame.ema_fast), 0);
        assert_eq!(IndicatorFrame::warm_up_len(&frame.momentum), 10);

        // Pure: recomputing on a slice matches the slice of a fresh computation
        let sub = series.slice(50..120);
        let sub_frame = compute_indicators(&sub, &cfg);
        assert_eq!(sub_frame.sma_short, sma(&series.closes()[50..120], 20));
        assert_eq!(IndicatorFrame::warm_up_len(&sub_frame.sma_long), 70);
    }

    #[test]
    fn test_empty_series_yields_empty_frame() {
        let series = PriceSeries::from_candles(SymbolInterval::daily("X"), vec![]).unwrap();
        let frame = compute_indicators(&series, &IndicatorConfig::default());
        assert!(frame.is_empty());
        assert!(frame.rsi.is_empty());
    }
}
