use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, NaiveDate};
use csv::ReaderBuilder;

use crate::domain::Candle;
use crate::utils::TimeUtils;

/// Accepts `YYYY-MM-DD`, RFC 3339 or a raw millisecond epoch.
pub fn parse_timestamp(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(ms) = raw.parse::<i64>() {
        return Some(ms);
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, TimeUtils::STANDARD_TIME_FORMAT) {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc().timestamp_millis());
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.timestamp_millis())
}

/// Reads `date,open,high,low,close[,volume]` rows (header required).
///
/// Output is sorted by timestamp with duplicates collapsed to the last row seen.
pub fn read_price_csv<R: Read>(reader: R) -> Result<Vec<Candle>> {
    let mut reader = ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut candles = Vec::new();

    for (line, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("Malformed CSV row {}", line + 2))?;
        if record.len() < 5 {
            bail!("Row {} has {} columns, expected at least 5", line + 2, record.len());
        }

        let timestamp_ms = parse_timestamp(&record[0])
            .with_context(|| format!("Failed to parse timestamp {:?}", &record[0]))?;
        let field = |i: usize, name: &str| -> Result<f64> {
            record[i]
                .parse::<f64>()
                .with_context(|| format!("Failed to parse {} on row {}", name, line + 2))
        };
        let volume = if record.len() > 5 && !record[5].is_empty() {
            field(5, "volume")?
        } else {
            0.0
        };

        candles.push(Candle::new(
            timestamp_ms,
            field(1, "open")?,
            field(2, "high")?,
            field(3, "low")?,
            field(4, "close")?,
            volume,
        ));
    }

    // Stable sort keeps file order among equal timestamps, so the last duplicate wins
    candles.sort_by_key(|c| c.timestamp_ms);
    let mut deduped: Vec<Candle> = Vec::with_capacity(candles.len());
    for c in candles {
        match deduped.last_mut() {
            Some(prev) if prev.timestamp_ms == c.timestamp_ms => *prev = c,
            _ => deduped.push(c),
        }
    }
    Ok(deduped)
}

pub fn load_price_csv(path: &Path) -> Result<Vec<Candle>> {
    let file = File::open(path).with_context(|| format!("Failed to open file: {:?}", path))?;
    read_price_csv(file).with_context(|| format!("Failed to read prices from: {:?}", path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp_formats() {
        assert_eq!(parse_timestamp("1970-01-02"), Some(TimeUtils::MS_IN_D));
        assert_eq!(parse_timestamp("86400000"), Some(TimeUtils::MS_IN_D));
        assert_eq!(parse_timestamp("1970-01-02T00:00:00Z"), Some(TimeUtils::MS_IN_D));
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn test_read_sorts_and_dedups() {
        let data = "date,open,high,low,close,volume\n\
                    2024-01-03,3,3,3,3,30\n\
                    2024-01-01,1,1,1,1,10\n\
                    2024-01-03,4,4,4,4,40\n\
                    2024-01-02,2,2,2,2,\n";
        let candles = read_price_csv(data.as_bytes()).unwrap();
        assert_eq!(candles.len(), 3);
        assert_eq!(candles[0].close_price, 1.0);
        assert_eq!(candles[1].volume, 0.0);
        assert_eq!(candles[2].close_price, 4.0);
        assert!(candles.windows(2).all(|w| w[0].timestamp_ms < w[1].timestamp_ms));
    }

    #[test]
    fn test_bad_number_is_reported() {
        let data = "date,open,high,low,close\n2024-01-01,1,1,1,oops\n";
        let err = read_price_csv(data.as_bytes()).unwrap_err();
        assert!(format!("{:#}", err).contains("close"));
    }
}
