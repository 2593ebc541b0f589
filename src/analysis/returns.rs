use itertools::Itertools;

use crate::models::Column;

/// Simple period-over-period return. The first entry is undefined.
pub fn daily_returns(closes: &[f64]) -> Column {
    if closes.is_empty() {
        return Vec::new();
    }
    std::iter::once(None)
        .chain(
            closes
                .iter()
                .tuple_windows()
                .map(|(prev, cur)| (*prev != 0.0).then(|| cur / prev - 1.0)),
        )
        .collect()
}

/// Compounded return since the first observation. Starts at 0.
pub fn cumulative_returns(closes: &[f64]) -> Column {
    let Some(&first) = closes.first() else {
        return Vec::new();
    };
    closes
        .iter()
        .map(|c| (first != 0.0).then(|| c / first - 1.0))
        .collect()
}

/// Defined values only.
pub fn defined(column: &[Option<f64>]) -> Vec<f64> {
    column.iter().filter_map(|v| *v).collect()
}
