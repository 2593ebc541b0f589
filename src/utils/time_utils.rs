use chrono::{DateTime, Datelike, TimeZone, Utc};

pub struct TimeUtils;

impl TimeUtils {
    pub const MS_IN_S: i64 = 1000;
    pub const MS_IN_MIN: i64 = Self::MS_IN_S * 60;
    pub const MS_IN_5_MIN: i64 = Self::MS_IN_MIN * 5;
    pub const MS_IN_15_MIN: i64 = Self::MS_IN_MIN * 15;
    pub const MS_IN_30_MIN: i64 = Self::MS_IN_MIN * 30;
    pub const MS_IN_H: i64 = Self::MS_IN_MIN * 60;
    pub const MS_IN_4_H: i64 = Self::MS_IN_H * 4;
    pub const MS_IN_D: i64 = Self::MS_IN_H * 24;
    pub const MS_IN_W: i64 = Self::MS_IN_D * 7;
    pub const MS_IN_1_M: i64 = Self::MS_IN_D * 30;
    pub const STANDARD_TIME_FORMAT: &str = "%Y-%m-%d";

    /// Shorthand label for an interval (e.g. `30m`, `1d`).
    pub fn interval_to_string(interval_ms: i64) -> &'static str {
        match interval_ms {
            Self::MS_IN_S => "1s",
            Self::MS_IN_MIN => "1m",
            Self::MS_IN_5_MIN => "5m",
            Self::MS_IN_15_MIN => "15m",
            Self::MS_IN_30_MIN => "30m",
            Self::MS_IN_H => "1h",
            Self::MS_IN_4_H => "4h",
            Self::MS_IN_D => "1d",
            Self::MS_IN_W => "1w",
            Self::MS_IN_1_M => "1M",
            _ => "unknown",
        }
    }

    /// Inverse of [`Self::interval_to_string`]. Used when parsing CLI input.
    pub fn interval_from_str(label: &str) -> Option<i64> {
        match label {
            "1s" => Some(Self::MS_IN_S),
            "1m" => Some(Self::MS_IN_MIN),
            "5m" => Some(Self::MS_IN_5_MIN),
            "15m" => Some(Self::MS_IN_15_MIN),
            "30m" => Some(Self::MS_IN_30_MIN),
            "1h" => Some(Self::MS_IN_H),
            "4h" => Some(Self::MS_IN_4_H),
            "1d" => Some(Self::MS_IN_D),
            "1w" => Some(Self::MS_IN_W),
            "1M" => Some(Self::MS_IN_1_M),
            _ => None,
        }
    }
}

pub fn epoch_ms_to_datetime(epoch_ms: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(epoch_ms).single()
}

// Display only
pub fn epoch_ms_to_date_string(epoch_ms: i64) -> String {
    match epoch_ms_to_datetime(epoch_ms) {
        Some(dt) => dt.format(TimeUtils::STANDARD_TIME_FORMAT).to_string(),
        None => format!("<invalid {}ms>", epoch_ms),
    }
}

/// Millisecond timestamp of 1 January 00:00 UTC in the year containing `epoch_ms`.
pub fn start_of_year_ms(epoch_ms: i64) -> Option<i64> {
    let dt = epoch_ms_to_datetime(epoch_ms)?;
    Utc.with_ymd_and_hms(dt.year(), 1, 1, 0, 0, 0)
        .single()
        .map(|start| start.timestamp_millis())
}

pub fn now_timestamp_ms() -> i64 {
    Utc::now().timestamp_millis()
}
