//! Summary statistics over a set of amounts. Every statistic has an explicit value for the
//! empty and single-element cases so no NaN reaches a feature record.

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AmountStats {
    pub count: u64,
    pub sum: f64,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    /// Population standard deviation
    pub std: f64,
}

impl AmountStats {
    pub fn from_amounts(amounts: &[f64]) -> Self {
        if amounts.is_empty() {
            return Self::default();
        }
        let n = amounts.len() as f64;
        let sum: f64 = amounts.iter().sum();
        let mean = sum / n;
        let min = amounts.iter().copied().fold(f64::INFINITY, f64::min);
        let max = amounts.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let std = if amounts.len() <= 1 {
            0.0
        } else {
            (amounts.iter().map(|a| (a - mean).powi(2)).sum::<f64>() / n).sqrt()
        };
        Self {
            count: amounts.len() as u64,
            sum,
            mean,
            min,
            max,
            std,
        }
    }
}

/// Quantile with linear interpolation between closest ranks. `sorted` must be ascending;
/// returns 0 for an empty slice.
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let pos = q.clamp(0.0, 1.0) * (n - 1) as f64;
            let lo = pos.floor() as usize;
            let hi = pos.ceil() as usize;
            let frac = pos - lo as f64;
            sorted[lo] + (sorted[hi] - sorted[lo]) * frac
        }
    }
}

/// Sample standard deviation (n - 1 denominator); 0 for fewer than two values.
pub fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt()
}

pub fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(f64::total_cmp);
    out
}
