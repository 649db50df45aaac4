pub mod kmeans;
pub mod detector;

pub use kmeans::KMeans;
pub use detector::{ClusterProfile, RegimeAssignment, RegimeDetector};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Semantic market regimes, in ascending order of mean return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MarketRegime {
    Bear,
    Sideways,
    Bull,
}

impl MarketRegime {
    /// Labels handed out to clusters ranked by ascending mean return.
    pub const ORDERED: [MarketRegime; 3] = [MarketRegime::Bear, MarketRegime::Sideways, MarketRegime::Bull];

    pub fn from_rank(rank: usize) -> Option<Self> {
        Self::ORDERED.get(rank).copied()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MarketRegime::Bear => "Bear",
            MarketRegime::Sideways => "Sideways",
            MarketRegime::Bull => "Bull",
        }
    }
}

impl fmt::Display for MarketRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_mapping() {
        assert_eq!(MarketRegime::from_rank(0), Some(MarketRegime::Bear));
        assert_eq!(MarketRegime::from_rank(1), Some(MarketRegime::Sideways));
        assert_eq!(MarketRegime::from_rank(2), Some(MarketRegime::Bull));
        assert_eq!(MarketRegime::from_rank(3), None);
        assert_eq!(MarketRegime::Bull.to_string(), "Bull");
    }
}
