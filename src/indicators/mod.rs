pub mod ema;
pub mod rsi;
pub mod macd;
pub mod bollinger;
pub mod rolling;

pub use rsi::*;
pub use macd::*;
pub use bollinger::*;
pub use rolling::*;

use tracing::debug;

/// Standard deviations below this are treated as exactly zero so that
/// ratios against them resolve to "no value" instead of exploding.
pub const ZERO_STD_EPSILON: f64 = 1e-12;

/// A streaming indicator fed one observation at a time.
pub trait Indicator {
    type Input: Copy;
    type Output;

    fn name(&self) -> &'static str;
    fn update(&mut self, input: Self::Input) -> Self::Output;
    fn is_ready(&self) -> bool;
}

/// Feeds a whole series through `indicator`, one output per input.
pub fn series<I: Indicator>(indicator: &mut I, inputs: &[I::Input]) -> Vec<I::Output> {
    let outputs: Vec<I::Output> = inputs.iter().map(|x| indicator.update(*x)).collect();
    if !indicator.is_ready() {
        debug!("{} not ready after {} observations", indicator.name(), inputs.len());
    }
    outputs
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator).
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = mean(values)?;
    let variance = values
        .iter()
        .map(|v| {
            let diff = v - mean;
            diff * diff
        })
        .sum::<f64>()
        / (values.len() - 1) as f64;

    Some(variance.max(0.0).sqrt())
}

/// Percentile with linear interpolation between closest ranks; `q` in [0, 100].
pub fn percentile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let rank = (q.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;

    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
}

pub fn is_zero_std(std: f64) -> bool {
    std.abs() < ZERO_STD_EPSILON
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_and_sample_std() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(mean(&values), Some(5.0));
        // population std is 2.0, sample std is sqrt(32/7)
        let std = sample_std(&values).unwrap();
        assert!((std - (32.0f64 / 7.0).sqrt()).abs() < 1e-12);

        assert_eq!(mean(&[]), None);
        assert_eq!(sample_std(&[1.0]), None);
    }

    #[test]
    fn test_percentile_interpolates() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(percentile(&values, 0.0), Some(1.0));
        assert_eq!(percentile(&values, 100.0), Some(5.0));
        assert_eq!(percentile(&values, 50.0), Some(3.0));
        // rank 0.05 * 4 = 0.2 -> 1.0 + 0.2
        assert!((percentile(&values, 5.0).unwrap() - 1.2).abs() < 1e-12);
        assert_eq!(percentile(&[], 5.0), None);
    }

    #[test]
    fn test_percentile_ignores_input_order() {
        let values = [5.0, 1.0, 4.0, 2.0, 3.0];
        assert_eq!(percentile(&values, 50.0), Some(3.0));
    }
}
