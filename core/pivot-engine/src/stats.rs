//! FILENAME: core/pivot-engine/src/stats.rs
//! Statistics library backing the pivot aggregates and the descriptives.
//!
//! Every function is pure and works on a slice of present values; the
//! caller removes missing cells first. Statistics that are undefined for
//! the given sample size return `None` instead of NaN, which the pivot
//! engine renders as the missing marker.

/// Multiplier of the normal-approximation 95% confidence interval.
pub const Z_95: f64 = 1.96;

pub fn count(values: &[f64]) -> usize {
    values.len()
}

pub fn sum(values: &[f64]) -> f64 {
    values.iter().sum()
}

/// Arithmetic mean. `None` for an empty sample.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(sum(values) / values.len() as f64)
}

/// Sum of squared deviations from the mean divided by `n - 1`.
/// `None` for fewer than two values.
pub fn sample_variance(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|x| (x - m) * (x - m)).sum();
    Some(ss / (n - 1) as f64)
}

pub fn sample_stdev(values: &[f64]) -> Option<f64> {
    sample_variance(values).map(f64::sqrt)
}

/// Standard error of the mean: `stdev / sqrt(n)`.
pub fn sem(values: &[f64]) -> Option<f64> {
    sample_stdev(values).map(|sd| sd / (values.len() as f64).sqrt())
}

/// Root-mean-square of the raw values.
pub fn rms(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let squares: f64 = values.iter().map(|x| x * x).sum();
    Some((squares / values.len() as f64).sqrt())
}

pub fn min(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::min)
}

pub fn max(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max)
}

pub fn range(values: &[f64]) -> Option<f64> {
    Some(max(values)? - min(values)?)
}

/// Order-statistic median; the mean of the two middle values for even `n`.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Fisher-Pearson coefficient of skewness `g1 = m3 / m2^1.5`, computed
/// from the population central moments. `None` for an empty or constant
/// sample.
pub fn skewness(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let n = values.len() as f64;
    let (m2, m3) = values.iter().fold((0.0, 0.0), |(m2, m3), x| {
        let d = x - m;
        (m2 + d * d, m3 + d * d * d)
    });
    let (m2, m3) = (m2 / n, m3 / n);
    if m2 == 0.0 {
        return None;
    }
    Some(m3 / m2.powf(1.5))
}

/// Normal-approximation 95% confidence interval `mean ± 1.96 * sem`.
pub fn ci95(mean: f64, sem: f64) -> (f64, f64) {
    (mean - Z_95 * sem, mean + Z_95 * sem)
}
