/// Computes the arithmetic mean of a slice of values. Returns `None` for empty input.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Converts a class rank into a "top X%" percentile. Returns `None` when the
/// cohort is empty.
pub fn percentile(rank: u32, cohort_size: u32) -> Option<f64> {
    if cohort_size == 0 {
        return None;
    }
    Some(f64::from(rank) / f64::from(cohort_size) * 100.0)
}
