//! Console tables for a finished batch.

use tabled::builder::Builder;
use tabled::{Table, Tabled};

use crate::analysis::{CorrelationMatrix, PerformanceSummary};
use crate::engine::{AnalysisReport, SymbolBundle, SymbolFailure};
use crate::models::IndicatorFrame;
use crate::utils::epoch_ms_to_date_string;

const MISSING: &str = "-";

fn fmt_price(v: Option<f64>) -> String {
    v.map_or_else(|| MISSING.to_string(), |v| format!("{:.2}", v))
}

fn fmt_pct(v: Option<f64>) -> String {
    v.map_or_else(|| MISSING.to_string(), |v| format!("{:+.2}%", v * 100.0))
}

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "Symbol")]
    symbol: String,
    #[tabled(rename = "Candles")]
    candles: usize,
    #[tabled(rename = "Last Close")]
    last_close: String,
    #[tabled(rename = "RSI")]
    rsi: String,
    #[tabled(rename = "RMSE")]
    rmse: String,
    #[tabled(rename = "MAE")]
    mae: String,
    #[tabled(rename = "Final Forecast")]
    final_forecast: String,
    #[tabled(rename = "Horizon End")]
    horizon_end: String,
    #[tabled(rename = "Change %")]
    change: String,
    #[tabled(rename = "Signal")]
    signal: String,
}

impl From<&SymbolBundle> for SummaryRow {
    fn from(bundle: &SymbolBundle) -> Self {
        let last_close = bundle.last_close();
        let forecast = bundle.forecast.as_ref();
        let final_forecast = forecast.and_then(|f| f.final_prediction());
        let change = match (last_close, final_forecast) {
            (Some(last), Some(fin)) if last != 0.0 => Some(fin / last - 1.0),
            _ => None,
        };

        Self {
            symbol: bundle.symbol.clone(),
            candles: bundle.candle_count,
            last_close: fmt_price(last_close),
            rsi: fmt_price(IndicatorFrame::last_defined(&bundle.indicators.rsi)),
            rmse: fmt_price(forecast.map(|f| f.metrics.rmse)),
            mae: fmt_price(forecast.map(|f| f.metrics.mae)),
            final_forecast: fmt_price(final_forecast),
            horizon_end: forecast
                .and_then(|f| f.future.last())
                .map_or_else(|| MISSING.to_string(), |p| epoch_ms_to_date_string(p.timestamp_ms)),
            change: fmt_pct(change),
            signal: bundle
                .recommendation
                .map_or_else(|| MISSING.to_string(), |r| r.to_string()),
        }
    }
}

#[derive(Tabled)]
struct PerformanceRow {
    #[tabled(rename = "Symbol")]
    symbol: String,
    #[tabled(rename = "Last Close")]
    last_close: String,
    #[tabled(rename = "YTD")]
    ytd: String,
    #[tabled(rename = "1M")]
    one_month: String,
    #[tabled(rename = "Daily Vol")]
    daily_vol: String,
    #[tabled(rename = "Annual Vol")]
    annual_vol: String,
}

impl From<&PerformanceSummary> for PerformanceRow {
    fn from(p: &PerformanceSummary) -> Self {
        Self {
            symbol: p.symbol.clone(),
            last_close: format!("{:.2}", p.last_close),
            ytd: fmt_pct(p.ytd_return),
            one_month: fmt_pct(p.one_month_return),
            daily_vol: fmt_pct(p.daily_volatility),
            annual_vol: fmt_pct(p.annualised_volatility),
        }
    }
}

#[derive(Tabled)]
struct FailureRow {
    #[tabled(rename = "Symbol")]
    symbol: String,
    #[tabled(rename = "Stage")]
    stage: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Reason")]
    reason: String,
}

impl From<&SymbolFailure> for FailureRow {
    fn from(f: &SymbolFailure) -> Self {
        Self {
            symbol: f.symbol.clone(),
            stage: f.stage.to_string(),
            kind: f.error.kind().to_string(),
            reason: f.error.to_string(),
        }
    }
}

fn correlation_table(matrix: &CorrelationMatrix) -> String {
    let mut builder = Builder::default();

    let mut header = vec![String::new()];
    header.extend(matrix.symbols.iter().cloned());
    builder.push_record(header);

    for (symbol, row) in matrix.symbols.iter().zip(&matrix.values) {
        let mut record = vec![symbol.clone()];
        record.extend(
            row.iter()
                .map(|v| v.map_or_else(|| MISSING.to_string(), |v| format!("{:.3}", v))),
        );
        builder.push_record(record);
    }

    builder.build().to_string()
}

pub fn render(report: &AnalysisReport) -> String {
    let mut out = String::new();

    if report.bundles.is_empty() {
        out.push_str("No symbols were processed.\n");
    } else {
        let rows: Vec<SummaryRow> = report.bundles.values().map(SummaryRow::from).collect();
        out.push_str("Forecast summary\n");
        out.push_str(&Table::new(rows).to_string());
        out.push('\n');

        let mut perf: Vec<PerformanceRow> = report
            .bundles
            .values()
            .filter_map(|b| b.performance.as_ref())
            .map(PerformanceRow::from)
            .collect();
        if let Some(bench) = &report.benchmark {
            perf.push(PerformanceRow::from(bench));
        }
        if !perf.is_empty() {
            out.push_str("\nPerformance\n");
            out.push_str(&Table::new(perf).to_string());
            out.push('\n');
        }
    }

    if let Some(matrix) = &report.correlations {
        out.push_str("\nCorrelation of cumulative returns\n");
        out.push_str(&correlation_table(matrix));
        out.push('\n');
    }

    if !report.failures.is_empty() {
        let rows: Vec<FailureRow> = report.failures.iter().map(FailureRow::from).collect();
        out.push_str("\nFailures\n");
        out.push_str(&Table::new(rows).to_string());
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ANALYSIS;
    use crate::domain::{AnalysisError, SymbolInterval};
    use crate::engine::{FailureStage, ForecastEngine, SymbolInput};
    use crate::models::PriceSeries;

    fn report() -> AnalysisReport {
        let mut config = ANALYSIS;
        config.forecast = config.forecast.with_time_steps(10).with_horizon(5);
        let closes: Vec<f64> = (0..80).map(|i| 50.0 + (i as f64 * 0.25).sin() * 2.0).collect();
        let inputs: Vec<SymbolInput> = vec![
            (
                "AAA".to_string(),
                PriceSeries::from_closes(SymbolInterval::daily("AAA"), 0, &closes),
            ),
            (
                "GONE".to_string(),
                Err(AnalysisError::NoData {
                    symbol: "GONE".to_string(),
                }),
            ),
        ];
        let bench = PriceSeries::from_closes(SymbolInterval::daily("^GSPC"), 0, &closes).unwrap();
        ForecastEngine::new(config).run_batch(inputs, Some(&bench))
    }

    #[test]
    fn test_render_lists_results_and_failures() {
        let report = report();
        assert_eq!(report.failures[0].stage, FailureStage::Fetch);

        let text = render(&report);
        assert!(text.contains("Forecast summary"));
        assert!(text.contains("Final Forecast"));
        // 80 daily bars from the epoch, 5 steps ahead
        assert!(text.contains("1970-03-26"));
        assert!(text.contains("AAA"));
        assert!(text.contains("^GSPC"));
        assert!(text.contains("Correlation"));
        assert!(text.contains("GONE"));
        assert!(text.contains("no_data"));
    }

    #[test]
    fn test_render_empty_report() {
        let text = render(&AnalysisReport::default());
        assert!(text.contains("No symbols were processed"));
        assert!(!text.contains("Failures"));
    }

    #[test]
    fn test_percent_formatting() {
        assert_eq!(fmt_pct(Some(0.1234)), "+12.34%");
        assert_eq!(fmt_pct(Some(-0.05)), "-5.00%");
        assert_eq!(fmt_pct(None), "-");
    }
}
