use tracing::debug;

use crate::config::StatisticalSettings;
use crate::indicators::{Indicator, RollingZScore};

/// Return, volatility and drawdown series, one entry per row.
#[derive(Debug, Clone, PartialEq)]
pub struct StatisticalFeatures {
    pub returns: Vec<Option<f64>>,
    pub volatility: Vec<Option<f64>>,
    pub drawdown: Vec<f64>,
    pub zscore_returns: Vec<Option<f64>>,
}

impl StatisticalFeatures {
    pub fn len(&self) -> usize {
        self.drawdown.len()
    }

    /// Defined returns, in row order.
    pub fn valid_returns(&self) -> Vec<f64> {
        self.returns.iter().flatten().copied().collect()
    }

    /// Rows where both return and volatility are defined, as
    /// `(row, [return, volatility])`.
    pub fn return_volatility_pairs(&self) -> Vec<(usize, [f64; 2])> {
        self.returns
            .iter()
            .zip(&self.volatility)
            .enumerate()
            .filter_map(|(i, (r, v))| Some((i, [(*r)?, (*v)?])))
            .collect()
    }

    pub fn max_drawdown(&self) -> f64 {
        self.drawdown.iter().copied().fold(0.0, f64::min)
    }
}

pub fn compute(closes: &[f64], settings: &StatisticalSettings) -> StatisticalFeatures {
    let returns = pct_change(closes);
    let drawdown = drawdown(closes);

    let mut rolling = RollingZScore::new(settings.volatility_window);
    let mut volatility = Vec::with_capacity(closes.len());
    let mut zscore_returns = Vec::with_capacity(closes.len());
    for r in &returns {
        zscore_returns.push(rolling.update(*r));
        volatility.push(rolling.std());
    }

    debug!(
        rows = closes.len(),
        volatility_defined = volatility.iter().flatten().count(),
        "Statistical features computed"
    );

    StatisticalFeatures {
        returns,
        volatility,
        drawdown,
        zscore_returns,
    }
}

/// Fractional change against the previous row; the first row has none.
pub fn pct_change(closes: &[f64]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(closes.len());
    if let Some(first) = closes.first() {
        out.push(None);
        let mut prev = *first;
        for &close in &closes[1..] {
            out.push(if prev != 0.0 { Some(close / prev - 1.0) } else { None });
            prev = close;
        }
    }
    out
}

/// Fraction below the running peak close; never positive.
pub fn drawdown(closes: &[f64]) -> Vec<f64> {
    let mut peak = f64::NEG_INFINITY;
    closes
        .iter()
        .map(|&close| {
            peak = peak.max(close);
            if peak > 0.0 {
                ((close - peak) / peak).min(0.0)
            } else {
                0.0
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: [f64; 10] = [100.0, 102.0, 101.0, 103.0, 105.0, 104.0, 106.0, 108.0, 110.0, 109.0];

    #[test]
    fn test_short_sample_has_no_volatility() {
        let features = compute(&SAMPLE, &StatisticalSettings::default());
        assert_eq!(features.returns[0], None);
        assert!((features.returns[1].unwrap() - 0.02).abs() < 1e-12);
        assert!(features.volatility.iter().all(|v| v.is_none()));
        assert!(features.zscore_returns.iter().all(|v| v.is_none()));
        assert!(features.return_volatility_pairs().is_empty());
    }

    #[test]
    fn test_first_volatility_at_row_twenty() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + ((i * 7) % 5) as f64).collect();
        let features = compute(&closes, &StatisticalSettings::default());
        assert!(features.volatility[..20].iter().all(|v| v.is_none()));
        assert!(features.volatility[20].is_some());
        assert_eq!(features.return_volatility_pairs()[0].0, 20);
    }

    #[test]
    fn test_drawdown_never_positive() {
        let features = compute(&SAMPLE, &StatisticalSettings::default());
        assert!(features.drawdown.iter().all(|d| *d <= 0.0));
        // 101 vs peak 102
        assert!((features.drawdown[2] - (101.0 / 102.0 - 1.0)).abs() < 1e-12);
        assert!((features.max_drawdown() - (101.0 / 102.0 - 1.0)).abs() < 1e-12);
    }

    #[test]
    fn test_max_drawdown_zero_for_non_decreasing() {
        let closes = [10.0, 10.0, 11.0, 12.0, 12.0];
        let features = compute(&closes, &StatisticalSettings::default());
        assert_eq!(features.max_drawdown(), 0.0);
    }

    #[test]
    fn test_constant_series_zscore_is_none() {
        let features = compute(&[50.0; 40], &StatisticalSettings::default());
        assert!(features.volatility[20..].iter().all(|v| *v == Some(0.0)));
        assert!(features.zscore_returns.iter().all(|v| v.is_none()));
    }
}
