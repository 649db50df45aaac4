use tracing::debug;

use crate::config::TechnicalSettings;
use crate::indicators::{series, BollingerBands, Macd, Rsi};

/// Momentum and band indicators derived from the close, one entry per row.
#[derive(Debug, Clone, PartialEq)]
pub struct TechnicalFeatures {
    pub rsi: Vec<Option<f64>>,
    pub macd: Vec<f64>,
    pub macd_signal: Vec<f64>,
    pub macd_histogram: Vec<f64>,
    pub bb_upper: Vec<Option<f64>>,
    pub bb_middle: Vec<Option<f64>>,
    pub bb_lower: Vec<Option<f64>>,
}

pub fn compute(closes: &[f64], settings: &TechnicalSettings) -> TechnicalFeatures {
    let rsi = series(&mut Rsi::new(settings.rsi_period), closes);
    let macd = series(
        &mut Macd::new(settings.macd_fast, settings.macd_slow, settings.macd_signal),
        closes,
    );
    let bands = series(
        &mut BollingerBands::new(settings.bollinger_window, settings.bollinger_std),
        closes,
    );

    let features = TechnicalFeatures {
        rsi,
        macd: macd.iter().map(|m| m.macd_line).collect(),
        macd_signal: macd.iter().map(|m| m.signal_line).collect(),
        macd_histogram: macd.iter().map(|m| m.histogram).collect(),
        bb_upper: bands.iter().map(|b| b.map(|b| b.upper)).collect(),
        bb_middle: bands.iter().map(|b| b.map(|b| b.middle)).collect(),
        bb_lower: bands.iter().map(|b| b.map(|b| b.lower)).collect(),
    };

    debug!(
        rows = closes.len(),
        rsi_defined = features.rsi.iter().flatten().count(),
        bands_defined = features.bb_upper.iter().flatten().count(),
        "Technical indicators computed"
    );

    features
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: [f64; 10] = [100.0, 102.0, 101.0, 103.0, 105.0, 104.0, 106.0, 108.0, 110.0, 109.0];

    #[test]
    fn test_short_sample_shapes() {
        let features = compute(&SAMPLE, &TechnicalSettings::default());
        assert_eq!(features.macd.len(), SAMPLE.len());
        assert_eq!(features.macd[0], 0.0);
        assert!(features.macd.iter().all(|v| v.is_finite()));
        assert!(features.macd_signal.iter().all(|v| v.is_finite()));
        // window 20 > 10 rows, period 14 > 9 deltas
        assert!(features.bb_upper.iter().all(|v| v.is_none()));
        assert!(features.rsi.iter().all(|v| v.is_none()));
    }

    #[test]
    fn test_rsi_bounds_on_noisy_series() {
        let closes: Vec<f64> = (0..200)
            .map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0 + i as f64 * 0.05)
            .collect();
        let settings = TechnicalSettings::default();
        let features = compute(&closes, &settings);

        for (i, value) in features.rsi.iter().enumerate() {
            match value {
                Some(v) => {
                    assert!(i >= settings.rsi_period);
                    assert!((0.0..=100.0).contains(v));
                }
                None => assert!(i < settings.rsi_period),
            }
        }
    }

    #[test]
    fn test_bands_bracket_middle() {
        let closes: Vec<f64> = (0..40).map(|i| 50.0 + (i % 5) as f64).collect();
        let features = compute(&closes, &TechnicalSettings::default());
        assert!(features.bb_upper[18].is_none());
        for i in 19..40 {
            let (upper, middle, lower) = (
                features.bb_upper[i].unwrap(),
                features.bb_middle[i].unwrap(),
                features.bb_lower[i].unwrap(),
            );
            assert!(upper >= middle && middle >= lower);
        }
    }
}
