use crate::models::{ForecastMetrics, HistoricalPoint};

/// Root mean squared error. Zero for empty input.
pub fn rmse(predicted: &[f64], actual: &[f64]) -> f64 {
    let n = predicted.len().min(actual.len());
    if n == 0 {
        return 0.0;
    }
    let sse: f64 = predicted
        .iter()
        .zip(actual)
        .map(|(p, a)| (p - a).powi(2))
        .sum();
    (sse / n as f64).sqrt()
}

pub fn mae(predicted: &[f64], actual: &[f64]) -> f64 {
    let n = predicted.len().min(actual.len());
    if n == 0 {
        return 0.0;
    }
    predicted
        .iter()
        .zip(actual)
        .map(|(p, a)| (p - a).abs())
        .sum::<f64>()
        / n as f64
}

/// Mean absolute percentage error as a fraction. None if any actual is zero.
pub fn mape(predicted: &[f64], actual: &[f64]) -> Option<f64> {
    let n = predicted.len().min(actual.len());
    if n == 0 || actual.iter().take(n).any(|a| *a == 0.0) {
        return None;
    }
    Some(
        predicted
            .iter()
            .zip(actual)
            .map(|(p, a)| ((p - a) / a).abs())
            .sum::<f64>()
            / n as f64,
    )
}

pub fn forecast_metrics(points: &[HistoricalPoint]) -> ForecastMetrics {
    let predicted: Vec<f64> = points.iter().map(|p| p.predicted).collect();
    let actual: Vec<f64> = points.iter().map(|p| p.actual).collect();
    ForecastMetrics {
        rmse: rmse(&predicted, &actual),
        mae: mae(&predicted, &actual),
        mape: mape(&predicted, &actual),
    }
}
