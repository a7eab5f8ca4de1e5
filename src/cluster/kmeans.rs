//! K-means clustering.
//!
//! Partitions data into k clusters by minimizing **within-cluster sum of squares**
//! (WCSS, a.k.a. inertia). The foundational clustering algorithm, dating to
//! 1957 (Lloyd).
//!
//! # The Objective
//!
//! ```text
//! WCSS = Σₖ Σᵢ∈Cₖ ||xᵢ - μₖ||²
//! ```
//!
//! # Lloyd's Algorithm
//!
//! 1. Initialize k centroids by sampling k distinct entities uniformly
//! 2. **Assign**: Each point → nearest centroid (ties → lowest centroid index)
//! 3. **Update**: Each centroid → mean of assigned points
//! 4. Repeat until no assignment changes, or `max_iter` is reached
//!
//! WCSS decreases monotonically: each step either decreases it or leaves it
//! unchanged.
//!
//! # Restarts
//!
//! Lloyd finds a local minimum only, so the whole procedure is repeated
//! `restarts` times from different samples and the lowest-inertia run wins.
//! Restart `r` seeds its RNG from `(seed, r)`, so runs are reproducible
//! whether or not they execute in parallel.
//!
//! # Empty Clusters
//!
//! A centroid that ends an assignment step with no members keeps its
//! previous position, and the run records a
//! [`Warning::DegenerateCluster`].

use super::traits::Clustering;
use super::util::derive_seed;
use crate::error::{Error, Result, Warning};
use crate::matrix::FeatureMatrix;
use crate::partition::FlatClustering;
use ndarray::{Array2, ArrayView1, ArrayView2};
use rand::prelude::*;
use tracing::{debug, trace, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// K-means clustering algorithm.
#[derive(Debug, Clone)]
pub struct Kmeans {
    /// Number of clusters.
    k: usize,
    /// Independent runs; the best one is kept.
    restarts: usize,
    /// Maximum Lloyd iterations per run.
    max_iter: usize,
    /// Base random seed.
    seed: Option<u64>,
}

/// Result of a k-means fit (the best restart).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KmeansFit {
    /// Cluster of every entity.
    pub labels: FlatClustering,
    /// K×D centroids. Row `c` is the mean of cluster `c`; centroids of
    /// degenerate clusters follow the populated ones.
    pub centroids: Array2<f64>,
    /// Sum of squared distances to assigned centroids.
    pub inertia: f64,
    /// Lloyd iterations performed by the winning run.
    pub iterations: usize,
    /// Whether the winning run stopped because assignments were stable.
    pub converged: bool,
    /// Index of the winning restart.
    pub restart: usize,
    /// Base seed; replays the fit with [`Kmeans::with_seed`].
    pub seed: u64,
    /// Inertia after each update step of the winning run (non-increasing).
    pub inertia_history: Vec<f64>,
    /// Final inertia of every restart, by restart index.
    pub restart_inertias: Vec<f64>,
    /// Non-fatal conditions raised by the winning run.
    pub warnings: Vec<Warning>,
}

struct Run {
    labels: Vec<usize>,
    centroids: Array2<f64>,
    inertia: f64,
    iterations: usize,
    converged: bool,
    history: Vec<f64>,
    warnings: Vec<Warning>,
}

impl Kmeans {
    /// Create a new K-means clusterer.
    pub fn new(k: usize) -> Self {
        Self {
            k,
            restarts: 10,
            max_iter: 100,
            seed: None,
        }
    }

    /// Set number of restarts.
    pub fn with_restarts(mut self, restarts: usize) -> Self {
        self.restarts = restarts;
        self
    }

    /// Set maximum iterations.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Run all restarts and return the lowest-inertia fit.
    pub fn fit(&self, data: &FeatureMatrix) -> Result<KmeansFit> {
        let n = data.n_entities();
        if self.k == 0 || self.k > n {
            return Err(Error::InvalidClusterCount {
                requested: self.k,
                n_items: n,
            });
        }
        if self.restarts == 0 {
            return Err(Error::InvalidParameter {
                name: "restarts",
                message: "must be at least 1",
            });
        }
        if self.max_iter == 0 {
            return Err(Error::InvalidParameter {
                name: "max_iter",
                message: "must be at least 1",
            });
        }

        let seed = self.seed.unwrap_or_else(|| rand::rng().random());
        let view = data.view();

        #[cfg(feature = "parallel")]
        let runs: Vec<Run> = (0..self.restarts)
            .into_par_iter()
            .map(|r| self.run_once(&view, r, derive_seed(seed, r as u64)))
            .collect();

        #[cfg(not(feature = "parallel"))]
        let runs: Vec<Run> = (0..self.restarts)
            .map(|r| self.run_once(&view, r, derive_seed(seed, r as u64)))
            .collect();

        let restart_inertias: Vec<f64> = runs.iter().map(|r| r.inertia).collect();
        let mut best = 0;
        for (r, inertia) in restart_inertias.iter().enumerate() {
            if *inertia < restart_inertias[best] {
                best = r;
            }
        }
        let run = runs.into_iter().nth(best).ok_or(Error::EmptyInput)?;

        debug!(
            k = self.k,
            restart = best,
            inertia = run.inertia,
            iterations = run.iterations,
            "k-means fit"
        );

        let labels = FlatClustering::from_labels(&run.labels)?;
        let centroids = reorder_centroids(&run.centroids, &run.labels, labels.labels());

        Ok(KmeansFit {
            labels,
            centroids,
            inertia: run.inertia,
            iterations: run.iterations,
            converged: run.converged,
            restart: best,
            seed,
            inertia_history: run.history,
            restart_inertias,
            warnings: run.warnings,
        })
    }

    fn run_once(&self, data: &ArrayView2<'_, f64>, restart: usize, seed: u64) -> Run {
        let (n, d) = data.dim();
        let mut rng = StdRng::seed_from_u64(seed);

        let mut centroids = Array2::zeros((self.k, d));
        for (c, idx) in rand::seq::index::sample(&mut rng, n, self.k).iter().enumerate() {
            centroids.row_mut(c).assign(&data.row(idx));
        }

        let mut labels = vec![usize::MAX; n];
        let mut history = Vec::new();
        let mut warnings = Vec::new();
        let mut converged = false;
        let mut iterations = 0;

        for iter in 0..self.max_iter {
            iterations = iter + 1;
            if assign(data, &centroids, &mut labels) == 0 {
                converged = true;
                break;
            }

            // Update step
            let mut sums = Array2::<f64>::zeros((self.k, d));
            let mut counts = vec![0usize; self.k];
            for (i, &c) in labels.iter().enumerate() {
                let mut row = sums.row_mut(c);
                row += &data.row(i);
                counts[c] += 1;
            }
            for (c, &count) in counts.iter().enumerate() {
                if count > 0 {
                    let mean = sums.row(c).mapv(|v| v / count as f64);
                    centroids.row_mut(c).assign(&mean);
                } else {
                    warn!(restart, iteration = iter, cluster = c, "empty k-means cluster kept its centroid");
                    warnings.push(Warning::DegenerateCluster {
                        restart,
                        iteration: iter,
                        cluster: c,
                    });
                }
            }

            let inertia = inertia(data, &centroids, &labels);
            trace!(restart, iteration = iter, inertia, "lloyd step");
            history.push(inertia);
        }

        if !converged {
            warn!(restart, iterations, "k-means hit max_iter before assignments stabilized");
            warnings.push(Warning::NotConverged {
                restart,
                iterations,
            });
        }

        Run {
            inertia: inertia(data, &centroids, &labels),
            labels,
            centroids,
            iterations,
            converged,
            history,
            warnings,
        }
    }
}

/// Assign every point to its nearest centroid; returns how many labels changed.
fn assign(data: &ArrayView2<'_, f64>, centroids: &Array2<f64>, labels: &mut [usize]) -> usize {
    let mut changed = 0;
    for (i, label) in labels.iter_mut().enumerate() {
        let point = data.row(i);
        let mut best_cluster = 0;
        let mut best_dist = f64::INFINITY;

        for (c, centroid) in centroids.outer_iter().enumerate() {
            let dist = squared_distance(&point, &centroid);
            if dist < best_dist {
                best_dist = dist;
                best_cluster = c;
            }
        }
        if *label != best_cluster {
            *label = best_cluster;
            changed += 1;
        }
    }
    changed
}

/// Compute squared Euclidean distance.
fn squared_distance(a: &ArrayView1<'_, f64>, b: &ArrayView1<'_, f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}

fn inertia(data: &ArrayView2<'_, f64>, centroids: &Array2<f64>, labels: &[usize]) -> f64 {
    labels
        .iter()
        .enumerate()
        .map(|(i, &c)| squared_distance(&data.row(i), &centroids.row(c)))
        .sum()
}

/// Reorder centroid rows to follow the dense label numbering.
fn reorder_centroids(centroids: &Array2<f64>, raw: &[usize], dense: &[usize]) -> Array2<f64> {
    let k = centroids.nrows();
    let mut order: Vec<Option<usize>> = vec![None; k];
    for (&r, &d) in raw.iter().zip(dense) {
        order[d] = Some(r);
    }
    let used: Vec<usize> = order.iter().flatten().copied().collect();
    let unused = (0..k).filter(|c| !used.contains(c));

    let mut out = Array2::zeros(centroids.raw_dim());
    for (row, src) in used.iter().copied().chain(unused).enumerate() {
        out.row_mut(row).assign(&centroids.row(src));
    }
    out
}

impl Clustering for Kmeans {
    fn fit_predict(&self, data: &FeatureMatrix) -> Result<FlatClustering> {
        Ok(self.fit(data)?.labels)
    }

    fn n_clusters(&self) -> usize {
        self.k
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_blobs() -> FeatureMatrix {
        FeatureMatrix::from_rows(&[
            vec![0.0, 0.0],
            vec![0.1, 0.1],
            vec![10.0, 10.0],
            vec![10.1, 10.1],
        ])
        .unwrap()
    }

    #[test]
    fn test_kmeans_basic() {
        let fit = Kmeans::new(2).with_seed(42).fit(&two_blobs()).unwrap();
        let labels = fit.labels.labels();

        // Points 0,1 should be in same cluster, points 2,3 in another
        assert_eq!(labels, &[0, 0, 1, 1]);
        assert!(fit.converged);
        assert!(fit.warnings.is_empty());
        assert!((fit.centroids[[0, 0]] - 0.05).abs() < 1e-12);
        assert!((fit.centroids[[1, 1]] - 10.05).abs() < 1e-12);
    }

    #[test]
    fn test_kmeans_all_points_assigned() {
        // Property: every point must be assigned to exactly one cluster
        let rows: Vec<Vec<f64>> = (0..50)
            .map(|i| vec![i as f64 * 0.1, (i % 5) as f64])
            .collect();
        let data = FeatureMatrix::from_rows(&rows).unwrap();

        let fit = Kmeans::new(5).with_seed(123).fit(&data).unwrap();
        assert_eq!(fit.labels.len(), 50);
        for &label in fit.labels.labels() {
            assert!(label < 5, "label {} out of range", label);
        }
    }

    #[test]
    fn test_kmeans_k_equals_n() {
        let data =
            FeatureMatrix::from_rows(&[vec![0.0, 0.0], vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();
        let fit = Kmeans::new(3).with_seed(42).fit(&data).unwrap();

        assert_eq!(fit.labels.n_clusters(), 3);
        assert_eq!(fit.inertia, 0.0);
    }

    #[test]
    fn test_kmeans_deterministic_with_seed() {
        let a = Kmeans::new(2).with_seed(42).fit(&two_blobs()).unwrap();
        let b = Kmeans::new(2).with_seed(42).fit(&two_blobs()).unwrap();
        assert_eq!(a, b, "same seed should give same result");
    }

    #[test]
    fn test_kmeans_unseeded_is_replayable() {
        let a = Kmeans::new(2).fit(&two_blobs()).unwrap();
        let b = Kmeans::new(2).with_seed(a.seed).fit(&two_blobs()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_best_restart_has_lowest_inertia() {
        let rows: Vec<Vec<f64>> = (0..30)
            .map(|i| vec![((i * 7) % 11) as f64, ((i * 5) % 13) as f64])
            .collect();
        let data = FeatureMatrix::from_rows(&rows).unwrap();
        let fit = Kmeans::new(4).with_restarts(8).with_seed(9).fit(&data).unwrap();

        assert_eq!(fit.restart_inertias.len(), 8);
        for &r in &fit.restart_inertias {
            assert!(fit.inertia <= r);
        }
        assert_eq!(fit.inertia, fit.restart_inertias[fit.restart]);
    }

    #[test]
    fn test_inertia_history_non_increasing() {
        let rows: Vec<Vec<f64>> = (0..40)
            .map(|i| vec![(i as f64).sin() * 5.0, (i as f64 * 0.7).cos() * 3.0])
            .collect();
        let data = FeatureMatrix::from_rows(&rows).unwrap();
        let fit = Kmeans::new(3).with_restarts(1).with_seed(5).fit(&data).unwrap();

        for w in fit.inertia_history.windows(2) {
            assert!(w[1] <= w[0] + 1e-9, "{:?}", fit.inertia_history);
        }
        if let Some(&last) = fit.inertia_history.last() {
            assert!((fit.inertia - last).abs() < 1e-9);
        }
    }

    #[test]
    fn test_duplicate_points_degenerate_cluster_kept() {
        // Two identical rows sampled as separate centroids: the higher-index
        // one loses the tie and ends up empty.
        let data = FeatureMatrix::from_rows(&[vec![0.0], vec![0.0], vec![5.0]]).unwrap();
        let fit = Kmeans::new(3).with_restarts(1).with_seed(1).fit(&data).unwrap();

        assert_eq!(fit.labels.n_clusters(), 2);
        assert_eq!(fit.centroids.nrows(), 3);
        assert!(fit
            .warnings
            .iter()
            .any(|w| matches!(w, Warning::DegenerateCluster { .. })));
        assert_eq!(fit.inertia, 0.0);
    }

    #[test]
    fn test_max_iter_flags_non_convergence() {
        let fit = Kmeans::new(2)
            .with_restarts(1)
            .with_max_iter(1)
            .with_seed(3)
            .fit(&two_blobs())
            .unwrap();
        assert!(!fit.converged);
        assert_eq!(fit.iterations, 1);
        assert!(fit
            .warnings
            .contains(&Warning::NotConverged { restart: 0, iterations: 1 }));
    }

    #[test]
    fn test_kmeans_scaling_invariant() {
        // Metamorphic: uniform scaling shouldn't change cluster assignments
        let scaled: Vec<Vec<f64>> = two_blobs()
            .view()
            .outer_iter()
            .map(|r| r.iter().map(|x| x * 100.0).collect())
            .collect();
        let scaled = FeatureMatrix::from_rows(&scaled).unwrap();

        let a = Kmeans::new(2).with_seed(42).fit(&two_blobs()).unwrap();
        let b = Kmeans::new(2).with_seed(42).fit(&scaled).unwrap();
        assert_eq!(a.labels, b.labels);
    }

    #[test]
    fn test_invalid_parameters() {
        let data = two_blobs();
        assert!(matches!(
            Kmeans::new(5).fit(&data),
            Err(Error::InvalidClusterCount { requested: 5, n_items: 4 })
        ));
        assert!(matches!(
            Kmeans::new(0).fit(&data),
            Err(Error::InvalidClusterCount { requested: 0, .. })
        ));
        assert!(matches!(
            Kmeans::new(2).with_restarts(0).fit(&data),
            Err(Error::InvalidParameter { name: "restarts", .. })
        ));
        assert!(matches!(
            Kmeans::new(2).with_max_iter(0).fit(&data),
            Err(Error::InvalidParameter { name: "max_iter", .. })
        ));
    }
}
