/// Percentile of an ascending slice using linear interpolation between the
/// two closest ranks. Returns 0 for an empty slice.
///
/// `p` is in percent: `p <= 0` yields the minimum, `p >= 100` the maximum.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    let (Some(&first), Some(&last)) = (sorted.first(), sorted.last()) else {
        return 0.0;
    };
    if p <= 0.0 {
        return first;
    }
    if p >= 100.0 {
        return last;
    }

    let k = (sorted.len() - 1) as f64 * (p / 100.0);
    let floor = k.floor();
    let ceil = k.ceil();
    if floor == ceil {
        return sorted[k as usize];
    }
    sorted[floor as usize] * (ceil - k) + sorted[ceil as usize] * (k - floor)
}

/// Arithmetic mean; 0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation; 0 when there are fewer than two samples.
pub fn population_stdev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Copy of `values` sorted ascending.
pub fn sorted(values: impl IntoIterator<Item = f64>) -> Vec<f64> {
    let mut out: Vec<f64> = values.into_iter().collect();
    out.sort_by(|a, b| a.total_cmp(b));
    out
}
