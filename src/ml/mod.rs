pub mod regime;
pub mod anomaly;

pub use regime::{MarketRegime, RegimeAssignment, RegimeDetector};
pub use anomaly::{AnomalyDetector, AnomalyFlags};
