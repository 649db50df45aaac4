//! Isolation forest outlier model.
//!
//! Points that random axis-aligned splits separate quickly sit on short
//! paths; the score `2^(-E[h(x)] / c(psi))` approaches 1 for them.

use ndarray::{Array2, ArrayView1};
use rand::seq::index;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::indicators::percentile;

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

#[derive(Debug, Clone)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
    Leaf {
        size: usize,
    },
}

#[derive(Debug, Clone)]
struct IsolationTree {
    root: Node,
}

impl IsolationTree {
    fn grow(data: &Array2<f64>, rows: Vec<usize>, height_limit: usize, rng: &mut ChaCha8Rng) -> Self {
        Self {
            root: grow_node(data, rows, 0, height_limit, rng),
        }
    }

    fn path_length(&self, point: ArrayView1<f64>) -> f64 {
        let mut node = &self.root;
        let mut depth = 0usize;
        loop {
            match node {
                Node::Leaf { size } => return depth as f64 + average_path_length(*size),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if point[*feature] < *threshold { left } else { right };
                    depth += 1;
                }
            }
        }
    }
}

fn grow_node(
    data: &Array2<f64>,
    rows: Vec<usize>,
    depth: usize,
    height_limit: usize,
    rng: &mut ChaCha8Rng,
) -> Node {
    let size = rows.len();
    if depth >= height_limit || size <= 1 {
        return Node::Leaf { size };
    }

    let feature = rng.gen_range(0..data.ncols());
    let (lo, hi) = rows.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &r| {
        let v = data[[r, feature]];
        (lo.min(v), hi.max(v))
    });
    if hi - lo <= f64::EPSILON * hi.abs().max(1.0) {
        return Node::Leaf { size };
    }

    let threshold = rng.gen_range(lo..hi);
    let (left, right): (Vec<usize>, Vec<usize>) =
        rows.into_iter().partition(|&r| data[[r, feature]] < threshold);

    if left.is_empty() || right.is_empty() {
        return Node::Leaf { size };
    }

    Node::Split {
        feature,
        threshold,
        left: Box::new(grow_node(data, left, depth + 1, height_limit, rng)),
        right: Box::new(grow_node(data, right, depth + 1, height_limit, rng)),
    }
}

/// Expected path length of an unsuccessful BST search over `n` points.
pub fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

#[derive(Debug, Clone)]
pub struct IsolationForest {
    pub n_estimators: usize,
    pub max_samples: usize,
    pub contamination: f64,
    pub seed: u64,
}

/// A fitted forest plus the score cut-off derived from its training data.
#[derive(Debug, Clone)]
pub struct FittedForest {
    trees: Vec<IsolationTree>,
    sample_size: usize,
    threshold: f64,
}

impl IsolationForest {
    pub fn new(n_estimators: usize, contamination: f64) -> Self {
        Self {
            n_estimators,
            max_samples: 256,
            contamination,
            seed: 42,
        }
    }

    pub fn with_max_samples(mut self, max_samples: usize) -> Self {
        self.max_samples = max_samples;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// `None` for an empty matrix or an empty forest.
    pub fn fit(&self, data: &Array2<f64>) -> Option<FittedForest> {
        let n = data.nrows();
        if n == 0 || self.n_estimators == 0 {
            return None;
        }

        let sample_size = self.max_samples.clamp(1, n);
        let height_limit = (sample_size as f64).log2().ceil().max(0.0) as usize;
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);

        let trees = (0..self.n_estimators)
            .map(|_| {
                let rows = index::sample(&mut rng, n, sample_size).into_vec();
                IsolationTree::grow(data, rows, height_limit, &mut rng)
            })
            .collect();

        let mut fitted = FittedForest {
            trees,
            sample_size,
            threshold: f64::INFINITY,
        };

        let training_scores = fitted.score_samples(data);
        fitted.threshold = percentile(&training_scores, (1.0 - self.contamination) * 100.0)
            .unwrap_or(f64::INFINITY);

        Some(fitted)
    }
}

impl FittedForest {
    /// Anomaly score in (0, 1]; higher is more isolated.
    pub fn score(&self, point: ArrayView1<f64>) -> f64 {
        let mean_path = self.trees.iter().map(|t| t.path_length(point)).sum::<f64>()
            / self.trees.len() as f64;
        let normaliser = average_path_length(self.sample_size);
        if normaliser > 0.0 {
            2f64.powf(-mean_path / normaliser)
        } else {
            0.5
        }
    }

    pub fn score_samples(&self, data: &Array2<f64>) -> Vec<f64> {
        data.rows().into_iter().map(|row| self.score(row)).collect()
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Strictly above the training cut-off.
    pub fn is_outlier(&self, score: f64) -> bool {
        score > self.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cloud_with_outliers() -> Array2<f64> {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut data = Array2::zeros((102, 2));
        for i in 0..100 {
            data[[i, 0]] = rng.gen_range(-1.0..1.0);
            data[[i, 1]] = rng.gen_range(-1.0..1.0);
        }
        data[[100, 0]] = 12.0;
        data[[100, 1]] = 12.0;
        data[[101, 0]] = -12.0;
        data[[101, 1]] = -9.0;
        data
    }

    #[test]
    fn test_far_points_score_highest() {
        let data = cloud_with_outliers();
        let forest = IsolationForest::new(100, 0.02).fit(&data).unwrap();
        let scores = forest.score_samples(&data);

        let max_inlier = scores[..100].iter().copied().fold(f64::MIN, f64::max);
        assert!(scores[100] > max_inlier);
        assert!(scores[101] > max_inlier);
        assert!(forest.is_outlier(scores[100]));
        assert!(forest.is_outlier(scores[101]));
    }

    #[test]
    fn test_flag_rate_bounded_by_contamination() {
        let data = cloud_with_outliers();
        let forest = IsolationForest::new(100, 0.03).fit(&data).unwrap();
        let flagged = forest
            .score_samples(&data)
            .into_iter()
            .filter(|s| forest.is_outlier(*s))
            .count();
        assert!(flagged >= 1);
        assert!(flagged <= 4);
    }

    #[test]
    fn test_same_seed_same_scores() {
        let data = cloud_with_outliers();
        let model = IsolationForest::new(50, 0.03).with_seed(11);
        let a = model.fit(&data).unwrap().score_samples(&data);
        let b = model.fit(&data).unwrap().score_samples(&data);
        assert_eq!(a, b);
    }

    #[test]
    fn test_degenerate_inputs() {
        assert!(IsolationForest::new(10, 0.1).fit(&Array2::zeros((0, 2))).is_none());

        let single = Array2::from_elem((1, 2), 3.0);
        let forest = IsolationForest::new(10, 0.1).fit(&single).unwrap();
        let scores = forest.score_samples(&single);
        assert_eq!(scores, vec![0.5]);
        assert!(!forest.is_outlier(scores[0]));
    }

    #[test]
    fn test_average_path_length() {
        assert_eq!(average_path_length(1), 0.0);
        assert_eq!(average_path_length(2), 1.0);
        assert!(average_path_length(256) > average_path_length(16));
    }
}
