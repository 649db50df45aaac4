use ndarray::{Array2, ArrayView1, Axis};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::trace;

/// Lloyd's k-means with k-means++ seeding and several restarts.
#[derive(Debug, Clone)]
pub struct KMeans {
    pub n_clusters: usize,
    pub n_init: usize,
    pub max_iter: usize,
    /// Relative to the mean per-feature variance of the data.
    pub tol: f64,
    pub seed: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KMeansFit {
    pub labels: Vec<usize>,
    pub inertia: f64,
    pub n_iter: usize,
}

impl KMeans {
    pub fn new(n_clusters: usize) -> Self {
        Self {
            n_clusters,
            n_init: 10,
            max_iter: 300,
            tol: 1e-4,
            seed: 42,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_n_init(mut self, n_init: usize) -> Self {
        self.n_init = n_init.max(1);
        self
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter.max(1);
        self
    }

    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Returns `None` when there is nothing to cluster. `n_clusters` must not
    /// exceed the number of rows.
    pub fn fit(&self, data: &Array2<f64>) -> Option<KMeansFit> {
        let n_obs = data.nrows();
        if n_obs == 0 || self.n_clusters == 0 || self.n_clusters > n_obs {
            return None;
        }

        let tol = self.tol * mean_feature_variance(data);
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);

        let mut best: Option<KMeansFit> = None;
        for run in 0..self.n_init {
            let centroids = self.init_plus_plus(data, &mut rng);
            let fit = self.lloyd(data, centroids, tol);
            trace!(run, inertia = fit.inertia, n_iter = fit.n_iter, "k-means run finished");

            let better = best.as_ref().map_or(true, |b| fit.inertia < b.inertia);
            if better {
                best = Some(fit);
            }
        }

        best
    }

    fn init_plus_plus(&self, data: &Array2<f64>, rng: &mut ChaCha8Rng) -> Array2<f64> {
        let n_obs = data.nrows();
        let mut centroids = Array2::zeros((self.n_clusters, data.ncols()));

        let first = rng.gen_range(0..n_obs);
        centroids.row_mut(0).assign(&data.row(first));

        let mut min_dist: Vec<f64> = data
            .outer_iter()
            .map(|row| squared_distance(row, centroids.row(0)))
            .collect();

        for c in 1..self.n_clusters {
            let total: f64 = min_dist.iter().sum();
            let chosen = if total > 0.0 {
                let mut target = rng.gen::<f64>() * total;
                let mut idx = n_obs - 1;
                for (i, d) in min_dist.iter().enumerate() {
                    if target < *d {
                        idx = i;
                        break;
                    }
                    target -= d;
                }
                idx
            } else {
                // every point coincides with a centroid already
                rng.gen_range(0..n_obs)
            };

            centroids.row_mut(c).assign(&data.row(chosen));
            for (i, row) in data.outer_iter().enumerate() {
                min_dist[i] = min_dist[i].min(squared_distance(row, centroids.row(c)));
            }
        }

        centroids
    }

    fn lloyd(&self, data: &Array2<f64>, mut centroids: Array2<f64>, tol: f64) -> KMeansFit {
        let mut labels = assign(data, &centroids);
        let mut n_iter = 0;

        for iteration in 0..self.max_iter {
            n_iter = iteration + 1;

            let mut sums = Array2::<f64>::zeros(centroids.dim());
            let mut counts = vec![0usize; self.n_clusters];
            for (row, &label) in data.outer_iter().zip(&labels) {
                let mut target = sums.row_mut(label);
                target += &row;
                counts[label] += 1;
            }

            let mut shift = 0.0;
            for (c, count) in counts.iter().enumerate() {
                // An empty cluster keeps its previous centroid.
                if *count == 0 {
                    continue;
                }
                let updated = sums.row(c).mapv(|v| v / *count as f64);
                shift += squared_distance(updated.view(), centroids.row(c));
                centroids.row_mut(c).assign(&updated);
            }

            labels = assign(data, &centroids);
            if shift <= tol {
                break;
            }
        }

        let inertia = data
            .outer_iter()
            .zip(&labels)
            .map(|(row, &label)| squared_distance(row, centroids.row(label)))
            .sum();

        KMeansFit {
            labels,
            inertia,
            n_iter,
        }
    }
}

fn assign(data: &Array2<f64>, centroids: &Array2<f64>) -> Vec<usize> {
    data.outer_iter()
        .map(|row| {
            let mut best = 0;
            let mut best_dist = f64::INFINITY;
            for (c, centroid) in centroids.outer_iter().enumerate() {
                let dist = squared_distance(row, centroid);
                if dist < best_dist {
                    best_dist = dist;
                    best = c;
                }
            }
            best
        })
        .collect()
}

fn squared_distance(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}

fn mean_feature_variance(data: &Array2<f64>) -> f64 {
    if data.nrows() == 0 {
        return 0.0;
    }
    data.var_axis(Axis(0), 0.0).mean().unwrap_or(0.0)
}
