use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::{debug, warn};

use super::{KMeans, MarketRegime};
use crate::config::RegimeSettings;
use crate::features::StatisticalFeatures;

/// Mean behaviour of one raw cluster, in ranked order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterProfile {
    pub cluster: usize,
    pub label: Option<MarketRegime>,
    pub mean_return: f64,
    pub mean_volatility: f64,
    pub size: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegimeAssignment {
    /// Raw cluster id; only meaningful within this run.
    pub regime: Vec<Option<usize>>,
    pub market_regime: Vec<Option<MarketRegime>>,
    pub profiles: Vec<ClusterProfile>,
}

impl RegimeAssignment {
    pub fn unassigned(rows: usize) -> Self {
        Self {
            regime: vec![None; rows],
            market_regime: vec![None; rows],
            profiles: Vec::new(),
        }
    }

    /// Row counts per label, Bear first.
    pub fn counts(&self) -> Vec<(MarketRegime, usize)> {
        MarketRegime::ORDERED
            .iter()
            .map(|label| {
                let count = self.market_regime.iter().filter(|r| **r == Some(*label)).count();
                (*label, count)
            })
            .filter(|(_, count)| *count > 0)
            .collect()
    }

    pub fn latest_labelled(&self) -> Option<MarketRegime> {
        self.market_regime.last().copied().flatten()
    }
}

/// Clusters (return, volatility) pairs and names the clusters by their mean
/// return rank.
pub struct RegimeDetector {
    settings: RegimeSettings,
}

impl RegimeDetector {
    pub fn new(settings: RegimeSettings) -> Self {
        if settings.n_regimes != MarketRegime::ORDERED.len() {
            warn!(
                "n_regimes = {} but only {} labels exist; clusters ranked past the last label stay unlabelled",
                settings.n_regimes,
                MarketRegime::ORDERED.len()
            );
        }
        Self { settings }
    }

    pub fn detect(&self, features: &StatisticalFeatures) -> RegimeAssignment {
        let rows = features.len();
        let pairs = features.return_volatility_pairs();

        if pairs.is_empty() {
            warn!("No rows with both returns and volatility; regimes left unassigned");
            return RegimeAssignment::unassigned(rows);
        }

        let k = self.settings.n_regimes.min(pairs.len());
        if k < self.settings.n_regimes {
            warn!(
                "Only {} clusterable rows for {} regimes; clustering with k = {}",
                pairs.len(),
                self.settings.n_regimes,
                k
            );
        }

        let data = Array2::from_shape_fn((pairs.len(), 2), |(i, j)| pairs[i].1[j]);
        let kmeans = KMeans::new(k)
            .with_seed(self.settings.seed)
            .with_n_init(self.settings.n_init)
            .with_max_iter(self.settings.max_iter)
            .with_tol(self.settings.tolerance);

        let Some(fit) = kmeans.fit(&data) else {
            return RegimeAssignment::unassigned(rows);
        };

        let profiles = rank_clusters(&pairs, &fit.labels, k);

        let mut assignment = RegimeAssignment::unassigned(rows);
        for ((row, _), &cluster) in pairs.iter().zip(&fit.labels) {
            assignment.regime[*row] = Some(cluster);
            assignment.market_regime[*row] = profiles
                .iter()
                .find(|p| p.cluster == cluster)
                .and_then(|p| p.label);
        }

        debug!(
            clustered = pairs.len(),
            k,
            inertia = fit.inertia,
            iterations = fit.n_iter,
            "Regimes assigned"
        );

        assignment.profiles = profiles;
        assignment
    }
}

/// Profiles of non-empty clusters sorted by mean return, then mean
/// volatility, zipped with the ordered labels.
fn rank_clusters(pairs: &[(usize, [f64; 2])], labels: &[usize], k: usize) -> Vec<ClusterProfile> {
    let mut sums = vec![(0.0, 0.0, 0usize); k];
    for ((_, [ret, vol]), &cluster) in pairs.iter().zip(labels) {
        let entry = &mut sums[cluster];
        entry.0 += ret;
        entry.1 += vol;
        entry.2 += 1;
    }

    let mut profiles: Vec<ClusterProfile> = sums
        .into_iter()
        .enumerate()
        .filter(|(_, (_, _, size))| *size > 0)
        .map(|(cluster, (ret, vol, size))| ClusterProfile {
            cluster,
            label: None,
            mean_return: ret / size as f64,
            mean_volatility: vol / size as f64,
            size,
        })
        .collect();

    profiles.sort_by(|a, b| {
        match a.mean_return.total_cmp(&b.mean_return) {
            Ordering::Equal => a.mean_volatility.total_cmp(&b.mean_volatility),
            other => other,
        }
    });

    for (rank, profile) in profiles.iter_mut().enumerate() {
        profile.label = MarketRegime::from_rank(rank);
    }

    profiles
}
