//! Choosing the number of clusters.
//!
//! Given a feature matrix and a range of candidate k, each method scores
//! every k and recommends one:
//!
//! | Method | Score | Recommendation |
//! |--------|-------|----------------|
//! | [`Elbow`](ValidityMethod::Elbow) | WSS(k) | max second difference of ln WSS |
//! | [`Silhouette`](ValidityMethod::Silhouette) | mean s(i) | max score |
//! | [`Gap`](ValidityMethod::Gap) | E*[ln W] − ln W | smallest k with gap(k) ≥ gap(k+1) − s(k+1) |
//! | [`Hartigan`](ValidityMethod::Hartigan) | (W(k)/W(k+1) − 1)(n − k − 1) | smallest k below threshold |
//!
//! The elbow pick is a heuristic; the raw curve is in the report for manual
//! inspection.
//!
//! Partitions come from k-means or from cutting one dendrogram, see
//! [`Partitioner`]. No method mutates its input.
//!
//! # References
//!
//! - Rousseeuw (1987). "Silhouettes: a graphical aid to the interpretation
//!   and validation of cluster analysis"
//! - Tibshirani, Walther & Hastie (2001). "Estimating the number of clusters
//!   in a data set via the gap statistic"
//! - Hartigan (1975). "Clustering Algorithms"

mod gap;
mod silhouette;
mod sse;

pub use silhouette::{silhouette_samples, silhouette_score};
pub use sse::within_cluster_sse;

use crate::cluster::{HierarchicalClustering, Kmeans, Linkage};
use crate::distance::{DissimilarityMatrix, Metric};
use crate::error::{Error, Result};
use crate::matrix::FeatureMatrix;
use crate::partition::FlatClustering;
use std::ops::RangeInclusive;
use tracing::debug;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Cluster-count selection method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ValidityMethod {
    /// Within-cluster sum of squares and its elbow.
    Elbow,
    /// Mean silhouette width.
    Silhouette,
    /// Gap statistic against a uniform reference.
    Gap,
    /// Hartigan's index.
    Hartigan,
}

impl ValidityMethod {
    /// All methods, in report order.
    pub const ALL: [ValidityMethod; 4] = [
        ValidityMethod::Elbow,
        ValidityMethod::Silhouette,
        ValidityMethod::Gap,
        ValidityMethod::Hartigan,
    ];

    /// Lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            ValidityMethod::Elbow => "elbow",
            ValidityMethod::Silhouette => "silhouette",
            ValidityMethod::Gap => "gap",
            ValidityMethod::Hartigan => "hartigan",
        }
    }
}

/// How candidate partitions are produced for each k.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Partitioner {
    /// Independent k-means fit per k.
    Kmeans,
    /// One dendrogram, cut at every k.
    Hierarchical(Linkage),
}

/// Settings shared by all validity methods.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ValidityConfig {
    /// Source of partitions.
    pub partitioner: Partitioner,
    /// Metric for silhouette (and non-Euclidean hierarchical partitions).
    pub metric: Metric,
    /// K-means restarts per k.
    pub restarts: usize,
    /// K-means iteration cap.
    pub max_iter: usize,
    /// Base seed for k-means and the gap references.
    pub seed: u64,
    /// Number of gap-statistic reference datasets (B).
    pub references: usize,
    /// Hartigan index threshold.
    pub hartigan_threshold: f64,
}

impl Default for ValidityConfig {
    fn default() -> Self {
        Self {
            partitioner: Partitioner::Kmeans,
            metric: Metric::Euclidean,
            restarts: 10,
            max_iter: 100,
            seed: 42,
            references: 100,
            hartigan_threshold: 10.0,
        }
    }
}

impl ValidityConfig {
    /// Set partitioner.
    pub fn with_partitioner(mut self, partitioner: Partitioner) -> Self {
        self.partitioner = partitioner;
        self
    }

    /// Set metric.
    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    /// Set k-means restarts.
    pub fn with_restarts(mut self, restarts: usize) -> Self {
        self.restarts = restarts;
        self
    }

    /// Set k-means iteration cap.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set base seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set number of gap references.
    pub fn with_references(mut self, references: usize) -> Self {
        self.references = references;
        self
    }

    /// Set Hartigan threshold.
    pub fn with_hartigan_threshold(mut self, threshold: f64) -> Self {
        self.hartigan_threshold = threshold;
        self
    }
}

/// Score of one candidate k.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ValidityScore {
    /// Number of clusters.
    pub k: usize,
    /// Score; `None` where the method is undefined at this k.
    pub value: Option<f64>,
    /// Standard error (gap statistic only).
    pub std_error: Option<f64>,
}

/// Scores over a k range plus the method's pick.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ValidityReport {
    /// Method that produced the scores.
    pub method: ValidityMethod,
    /// One entry per k, ascending.
    pub scores: Vec<ValidityScore>,
    /// Recommended k, if the selection rule decided.
    pub recommended: Option<usize>,
}

impl ValidityReport {
    /// Defined `(k, score)` pairs, for plotting.
    pub fn curve(&self) -> Vec<(usize, f64)> {
        self.scores
            .iter()
            .filter_map(|s| s.value.map(|v| (s.k, v)))
            .collect()
    }

    /// Score at `k`.
    pub fn score(&self, k: usize) -> Option<f64> {
        self.scores.iter().find(|s| s.k == k).and_then(|s| s.value)
    }
}

/// Cluster-count validity evaluation.
#[derive(Debug, Clone, Default)]
pub struct ClusterValidity {
    config: ValidityConfig,
}

impl ClusterValidity {
    /// Create an evaluator.
    pub fn new(config: ValidityConfig) -> Self {
        Self { config }
    }

    /// Configuration in use.
    pub fn config(&self) -> &ValidityConfig {
        &self.config
    }

    /// Score every k in `k_range` with `method`.
    pub fn evaluate(
        &self,
        data: &FeatureMatrix,
        method: ValidityMethod,
        k_range: RangeInclusive<usize>,
    ) -> Result<ValidityReport> {
        let ks = self.check_range(data, k_range)?;
        let n = data.n_entities();

        let (scores, recommended) = match method {
            ValidityMethod::Elbow => {
                let wss = self.wss_curve(data, &ks, self.config.seed)?;
                let recommended = sse::elbow(&ks, &wss);
                (plain_scores(&ks, wss.into_iter().map(Some)), recommended)
            }
            ValidityMethod::Silhouette => {
                let dissimilarity = DissimilarityMatrix::compute(data, self.config.metric)?;
                let parts = self.partitions(data, &ks, self.config.seed, Some(&dissimilarity))?;
                let values = parts
                    .iter()
                    .map(|p| {
                        if p.n_clusters() < 2 {
                            Ok(None)
                        } else {
                            silhouette_score(&dissimilarity, p).map(Some)
                        }
                    })
                    .collect::<Result<Vec<_>>>()?;
                let recommended = argmax(&ks, &values);
                (plain_scores(&ks, values.into_iter()), recommended)
            }
            ValidityMethod::Gap => {
                let gaps = gap::gap_scores(self, data, &ks)?;
                let recommended = gap::one_standard_error(&ks, &gaps);
                let scores = ks
                    .iter()
                    .zip(&gaps)
                    .map(|(&k, &(g, s))| ValidityScore {
                        k,
                        value: Some(g),
                        std_error: Some(s),
                    })
                    .collect();
                (scores, recommended)
            }
            ValidityMethod::Hartigan => {
                let mut extended = ks.clone();
                let last = ks[ks.len() - 1];
                if last < n {
                    extended.push(last + 1);
                }
                let wss = self.wss_curve(data, &extended, self.config.seed)?;
                let values: Vec<Option<f64>> = ks
                    .iter()
                    .enumerate()
                    .map(|(i, &k)| wss.get(i + 1).map(|&next| sse::hartigan(wss[i], next, n, k)))
                    .collect();
                let threshold = self.config.hartigan_threshold;
                let recommended = ks
                    .iter()
                    .zip(&values)
                    .find(|(_, v)| v.is_some_and(|h| h < threshold))
                    .map(|(&k, _)| k);
                (plain_scores(&ks, values.into_iter()), recommended)
            }
        };

        debug!(method = method.name(), ?recommended, "validity evaluated");
        Ok(ValidityReport {
            method,
            scores,
            recommended,
        })
    }

    fn check_range(&self, data: &FeatureMatrix, k_range: RangeInclusive<usize>) -> Result<Vec<usize>> {
        let (start, end) = (*k_range.start(), *k_range.end());
        if start == 0 {
            return Err(Error::InvalidParameter {
                name: "k_range",
                message: "must start at 1 or above",
            });
        }
        if start > end {
            return Err(Error::InvalidParameter {
                name: "k_range",
                message: "must not be empty",
            });
        }
        if end > data.n_entities() {
            return Err(Error::InvalidClusterCount {
                requested: end,
                n_items: data.n_entities(),
            });
        }
        Ok(k_range.collect())
    }

    pub(crate) fn wss_curve(&self, data: &FeatureMatrix, ks: &[usize], seed: u64) -> Result<Vec<f64>> {
        self.partitions(data, ks, seed, None)?
            .iter()
            .map(|p| within_cluster_sse(data, p))
            .collect()
    }

    /// One partition per k, in `ks` order.
    pub(crate) fn partitions(
        &self,
        data: &FeatureMatrix,
        ks: &[usize],
        seed: u64,
        dissimilarity: Option<&DissimilarityMatrix>,
    ) -> Result<Vec<FlatClustering>> {
        match self.config.partitioner {
            Partitioner::Kmeans => par_map(ks, |k| {
                Ok(Kmeans::new(k)
                    .with_restarts(self.config.restarts)
                    .with_max_iter(self.config.max_iter)
                    .with_seed(seed)
                    .fit(data)?
                    .labels)
            }),
            Partitioner::Hierarchical(linkage) => {
                let metric = if linkage.requires_euclidean() {
                    Metric::Euclidean
                } else {
                    self.config.metric
                };
                let owned;
                let d = match dissimilarity {
                    Some(d) if d.metric() == Some(metric) => d,
                    _ => {
                        owned = DissimilarityMatrix::compute(data, metric)?;
                        &owned
                    }
                };
                let dendro = HierarchicalClustering::new(1).with_linkage(linkage).build(d)?;
                ks.iter().map(|&k| dendro.cut_to_k(k)).collect()
            }
        }
    }
}

fn plain_scores(ks: &[usize], values: impl Iterator<Item = Option<f64>>) -> Vec<ValidityScore> {
    ks.iter()
        .zip(values)
        .map(|(&k, value)| ValidityScore {
            k,
            value,
            std_error: None,
        })
        .collect()
}

/// k with the largest defined value; ties go to the smaller k.
fn argmax(ks: &[usize], values: &[Option<f64>]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (&k, v) in ks.iter().zip(values) {
        if let Some(v) = *v {
            match best {
                Some((_, b)) if v <= b => {}
                _ => best = Some((k, v)),
            }
        }
    }
    best.map(|(k, _)| k)
}

/// Map `f` over `items`, in parallel with the `parallel` feature; order is kept.
pub(crate) fn par_map<T, F>(items: &[usize], f: F) -> Result<Vec<T>>
where
    T: Send,
    F: Fn(usize) -> Result<T> + Sync + Send,
{
    #[cfg(feature = "parallel")]
    {
        items.par_iter().map(|&i| f(i)).collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        items.iter().map(|&i| f(i)).collect()
    }
}
