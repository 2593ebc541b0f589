use argminmax::ArgMinMax;

/// (min, max) of a non-empty slice. Returns None for an empty slice.
#[inline]
pub fn min_max(vec: &[f64]) -> Option<(f64, f64)> {
    if vec.is_empty() {
        return None;
    }
    let (min_index, max_index) = vec.argminmax();
    Some((vec[min_index], vec[max_index]))
}

/// Linearly maps a value from one range to another while preserving its relative proportion.
#[inline]
pub fn remap(val: f64, in_min: f64, in_max: f64, out_min: f64, out_max: f64) -> f64 {
    let t = (val - in_min) / (in_max - in_min);
    out_min + t * (out_max - out_min)
}
