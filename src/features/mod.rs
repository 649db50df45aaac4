pub mod technical;
pub mod statistical;

pub use technical::TechnicalFeatures;
pub use statistical::StatisticalFeatures;
