use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::analysis::returns::{cumulative_returns, daily_returns, defined};
use crate::config::constants::{TRADING_DAYS_PER_YEAR, performance::ONE_MONTH_DAYS};
use crate::models::PriceSeries;
use crate::utils::{TimeUtils, start_of_year_ms};

/// Headline return and risk figures for one symbol. Returns are fractions.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PerformanceSummary {
    pub symbol: String,
    pub last_close: f64,
    pub ytd_return: Option<f64>,
    pub one_month_return: Option<f64>,
    /// Sample standard deviation of daily returns
    pub daily_volatility: Option<f64>,
    pub annualised_volatility: Option<f64>,
}

/// Return from the first observation at or after `from_ms` to the last close.
fn return_since(series: &PriceSeries, from_ms: i64) -> Option<f64> {
    let idx = series.timestamps.partition_point(|&ts| ts < from_ms);
    let base = *series.close_prices.get(idx)?;
    let last = series.last_close()?;
    (base != 0.0).then(|| last / base - 1.0)
}

pub fn summarise(series: &PriceSeries) -> Option<PerformanceSummary> {
    let last_ts = series.last_timestamp()?;
    let last_close = series.last_close()?;

    let ytd_return = start_of_year_ms(last_ts).and_then(|soy| return_since(series, soy));
    let one_month_return = return_since(series, last_ts - ONE_MONTH_DAYS * TimeUtils::MS_IN_D);

    let returns = defined(&daily_returns(series.closes()));
    let daily_volatility = if returns.len() >= 2 {
        Some(returns.iter().std_dev())
    } else {
        None
    };

    Some(PerformanceSummary {
        symbol: series.symbol().to_string(),
        last_close,
        ytd_return,
        one_month_return,
        daily_volatility,
        annualised_volatility: daily_volatility.map(|v| v * TRADING_DAYS_PER_YEAR.sqrt()),
    })
}

/// Pearson correlation. None for mismatched lengths, fewer than two points or zero variance.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let sx = x.iter().std_dev();
    let sy = y.iter().std_dev();
    if !(sx > 0.0 && sy > 0.0) {
        return None;
    }
    let cov = x.iter().covariance(y.iter());
    Some((cov / (sx * sy)).clamp(-1.0, 1.0))
}

/// Symmetric correlation matrix of cumulative-return paths, aligned on shared timestamps.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub symbols: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.symbols.iter().position(|s| s == a)?;
        let j = self.symbols.iter().position(|s| s == b)?;
        self.values[i][j]
    }
}

pub fn correlation_matrix(series: &[&PriceSeries]) -> CorrelationMatrix {
    let paths: Vec<BTreeMap<i64, f64>> = series
        .iter()
        .map(|s| {
            s.timestamps
                .iter()
                .zip(cumulative_returns(s.closes()))
                .filter_map(|(ts, r)| r.map(|r| (*ts, r)))
                .collect()
        })
        .collect();

    let n = series.len();
    let mut values = vec![vec![None; n]; n];
    for i in 0..n {
        for j in i..n {
            let (xs, ys): (Vec<f64>, Vec<f64>) = paths[i]
                .iter()
                .filter_map(|(ts, x)| paths[j].get(ts).map(|y| (*x, *y)))
                .unzip();
            let r = pearson(&xs, &ys);
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    CorrelationMatrix {
        symbols: series.iter().map(|s| s.symbol().to_string()).collect(),
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SymbolInterval;
    use chrono::{TimeZone, Utc};

    fn series(name: &str, start_ms: i64, closes: &[f64]) -> PriceSeries {
        PriceSeries::from_closes(SymbolInterval::daily(name), start_ms, closes).unwrap()
    }

    #[test]
    fn test_ytd_starts_at_first_observation_of_year() {
        let start = Utc.with_ymd_and_hms(2023, 12, 30, 0, 0, 0).unwrap().timestamp_millis();
        // Dec 30, Dec 31, Jan 1, Jan 2
        let s = series("X", start, &[90.0, 95.0, 100.0, 110.0]);
        let summary = summarise(&s).unwrap();
        assert!((summary.ytd_return.unwrap() - 0.10).abs() < 1e-12);
        // window covers the whole series
        assert!((summary.one_month_return.unwrap() - (110.0 / 90.0 - 1.0)).abs() < 1e-12);
        assert_eq!(summary.last_close, 110.0);
    }

    #[test]
    fn test_annualised_volatility_scales_daily() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + (i as f64).sin()).collect();
        let summary = summarise(&series("X", 0, &closes)).unwrap();
        let daily = summary.daily_volatility.unwrap();
        assert!(daily > 0.0);
        assert!((summary.annualised_volatility.unwrap() - daily * 252f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_summary_of_empty_series_is_none() {
        assert!(summarise(&series("X", 0, &[])).is_none());
    }

    #[test]
    fn test_pearson_extremes() {
        let x = [1.0, 2.0, 3.0, 4.0];
        assert!((pearson(&x, &[2.0, 4.0, 6.0, 8.0]).unwrap() - 1.0).abs() < 1e-12);
        assert!((pearson(&x, &[8.0, 6.0, 4.0, 2.0]).unwrap() + 1.0).abs() < 1e-12);
        assert_eq!(pearson(&x, &[1.0; 4]), None);
        assert_eq!(pearson(&x, &[1.0]), None);
    }

    #[test]
    fn test_correlation_matrix_aligns_on_common_timestamps() {
        let a = series("A", 0, &[10.0, 11.0, 12.0, 13.0, 14.0]);
        // starts one day later, moves the same way
        let b = series("B", TimeUtils::MS_IN_D, &[20.0, 22.0, 24.0, 26.0]);
        let m = correlation_matrix(&[&a, &b]);
        assert_eq!(m.symbols, vec!["A", "B"]);
        assert!((m.get("A", "B").unwrap() - 1.0).abs() < 1e-9);
        assert_eq!(m.get("A", "B"), m.get("B", "A"));
        assert!((m.get("A", "A").unwrap() - 1.0).abs() < 1e-12);
    }
}
