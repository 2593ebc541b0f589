mod maths_utils;
mod perf;
mod time_utils;

pub use time_utils::{
    TimeUtils, epoch_ms_to_date_string, epoch_ms_to_datetime, now_timestamp_ms,
    start_of_year_ms,
};

pub use maths_utils::{min_max, remap};
