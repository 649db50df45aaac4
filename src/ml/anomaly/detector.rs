use ndarray::Array2;
use tracing::{debug, warn};

use super::{AnomalyFlags, IsolationForest};
use crate::config::AnomalySettings;
use crate::features::StatisticalFeatures;
use crate::indicators::rolling_zscore_series;

/// Flags sessions whose return is a rolling z-score outlier, or whose
/// (return, volatility) point an isolation forest isolates quickly.
pub struct AnomalyDetector {
    settings: AnomalySettings,
}

impl AnomalyDetector {
    pub fn new(settings: AnomalySettings) -> Self {
        Self { settings }
    }

    pub fn detect(&self, features: &StatisticalFeatures) -> AnomalyFlags {
        let price_anomaly = self.price_anomalies(features);
        let (ml_anomaly, ml_score) = self.ml_anomalies(features);

        let flags = AnomalyFlags::combine(price_anomaly, ml_anomaly, ml_score);
        debug!(
            price = flags.price_anomaly.iter().filter(|f| **f).count(),
            ml = flags.ml_anomaly.iter().filter(|f| **f).count(),
            total = flags.flagged_rows().len(),
            "Anomalies flagged"
        );
        flags
    }

    fn price_anomalies(&self, features: &StatisticalFeatures) -> Vec<bool> {
        rolling_zscore_series(&features.returns, self.settings.zscore_window)
            .into_iter()
            .map(|z| z.is_some_and(|z| z.abs() > self.settings.zscore_threshold))
            .collect()
    }

    fn ml_anomalies(&self, features: &StatisticalFeatures) -> (Vec<bool>, Vec<Option<f64>>) {
        let rows = features.len();
        let mut flags = vec![false; rows];
        let mut scores = vec![None; rows];

        let pairs = features.return_volatility_pairs();
        if pairs.is_empty() {
            warn!("No rows with both returns and volatility; ML anomalies not evaluated");
            return (flags, scores);
        }

        let data = Array2::from_shape_fn((pairs.len(), 2), |(i, j)| pairs[i].1[j]);
        let model = IsolationForest::new(self.settings.n_estimators, self.settings.contamination)
            .with_max_samples(self.settings.max_samples)
            .with_seed(self.settings.seed);

        let Some(forest) = model.fit(&data) else {
            return (flags, scores);
        };

        for ((row, _), score) in pairs.iter().zip(forest.score_samples(&data)) {
            flags[*row] = forest.is_outlier(score);
            scores[*row] = Some(score);
        }

        debug!(
            fitted = pairs.len(),
            threshold = forest.threshold(),
            "Isolation forest scored"
        );

        (flags, scores)
    }
}
