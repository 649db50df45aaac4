pub mod isolation_forest;
pub mod detector;

pub use isolation_forest::IsolationForest;
pub use detector::AnomalyDetector;

/// Per-row anomaly verdicts. `anomaly_flag` is the OR of the two detectors.
#[derive(Debug, Clone, PartialEq)]
pub struct AnomalyFlags {
    pub price_anomaly: Vec<bool>,
    pub ml_anomaly: Vec<bool>,
    pub anomaly_flag: Vec<bool>,
    /// Isolation forest score for rows it saw.
    pub ml_score: Vec<Option<f64>>,
}

impl AnomalyFlags {
    pub fn combine(price_anomaly: Vec<bool>, ml_anomaly: Vec<bool>, ml_score: Vec<Option<f64>>) -> Self {
        let anomaly_flag = price_anomaly
            .iter()
            .zip(&ml_anomaly)
            .map(|(p, m)| *p || *m)
            .collect();
        Self {
            price_anomaly,
            ml_anomaly,
            anomaly_flag,
            ml_score,
        }
    }

    pub fn flagged_rows(&self) -> Vec<usize> {
        self.anomaly_flag
            .iter()
            .enumerate()
            .filter_map(|(i, f)| f.then_some(i))
            .collect()
    }
}
