//! One-call analysis: dissimilarities, dendrogram, k selection, both
//! partitions, and their agreement.
//!
//! ```rust
//! use clade::{AnalysisConfig, ClusterAnalysis, FeatureMatrix, Linkage, ValidityMethod};
//!
//! let data = FeatureMatrix::from_rows(&[
//!     vec![0.0, 0.0],
//!     vec![0.0, 1.0],
//!     vec![10.0, 0.0],
//!     vec![10.0, 1.0],
//! ])
//! .unwrap();
//!
//! let config = AnalysisConfig::default()
//!     .with_linkage(Linkage::Complete)
//!     .with_methods(vec![ValidityMethod::Silhouette])
//!     .with_k_range(2, 3);
//! let outcome = ClusterAnalysis::new(config).run(&data).unwrap();
//! assert_eq!(outcome.k, 2);
//! assert_eq!(outcome.hierarchical.labels(), &[0, 0, 1, 1]);
//! ```
//!
//! Pooling results over several imputed datasets is left to the caller: run
//! the analysis once per matrix.

use crate::agreement::ari;
use crate::cluster::{HierarchicalClustering, Kmeans, KmeansFit, Linkage};
use crate::distance::{DissimilarityMatrix, Metric};
use crate::error::{Error, Result};
use crate::hierarchy::Dendrogram;
use crate::matrix::FeatureMatrix;
use crate::partition::FlatClustering;
use crate::validity::{ClusterValidity, ValidityConfig, ValidityMethod, ValidityReport};
use tracing::debug;

/// Settings for [`ClusterAnalysis`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AnalysisConfig {
    /// Metric for the dissimilarity matrix.
    pub metric: Metric,
    /// Linkage for the dendrogram.
    pub linkage: Linkage,
    /// Fixed number of clusters; `None` lets `selection` decide.
    pub n_clusters: Option<usize>,
    /// Smallest candidate k.
    pub k_min: usize,
    /// Largest candidate k (clamped to the number of entities).
    pub k_max: usize,
    /// Validity methods to report.
    pub methods: Vec<ValidityMethod>,
    /// Method whose recommendation picks k when `n_clusters` is unset.
    pub selection: ValidityMethod,
    /// K-means restarts for the final partition.
    pub restarts: usize,
    /// K-means iteration cap for the final partition.
    pub max_iter: usize,
    /// K-means seed for the final partition.
    pub seed: u64,
    /// Validity settings.
    pub validity: ValidityConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            metric: Metric::Euclidean,
            linkage: Linkage::Ward,
            n_clusters: None,
            k_min: 1,
            k_max: 10,
            methods: ValidityMethod::ALL.to_vec(),
            selection: ValidityMethod::Silhouette,
            restarts: 10,
            max_iter: 100,
            seed: 42,
            validity: ValidityConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// Set metric.
    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    /// Set linkage.
    pub fn with_linkage(mut self, linkage: Linkage) -> Self {
        self.linkage = linkage;
        self
    }

    /// Fix the number of clusters.
    pub fn with_n_clusters(mut self, k: usize) -> Self {
        self.n_clusters = Some(k);
        self
    }

    /// Set candidate k range (inclusive).
    pub fn with_k_range(mut self, k_min: usize, k_max: usize) -> Self {
        self.k_min = k_min;
        self.k_max = k_max;
        self
    }

    /// Set reported validity methods.
    pub fn with_methods(mut self, methods: Vec<ValidityMethod>) -> Self {
        self.methods = methods;
        self
    }

    /// Set the method that chooses k.
    pub fn with_selection(mut self, selection: ValidityMethod) -> Self {
        self.selection = selection;
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

    /// Set k-means seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set validity settings.
    pub fn with_validity(mut self, validity: ValidityConfig) -> Self {
        self.validity = validity;
        self
    }
}

/// Everything an analysis produced.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    /// Pairwise dissimilarities.
    pub dissimilarity: DissimilarityMatrix,
    /// Full merge tree.
    pub dendrogram: Dendrogram,
    /// Chosen number of clusters.
    pub k: usize,
    /// Dendrogram cut into `k` clusters.
    pub hierarchical: FlatClustering,
    /// K-means with `k` clusters.
    pub kmeans: KmeansFit,
    /// Validity reports, in `methods` order.
    pub validity: Vec<ValidityReport>,
    /// Adjusted Rand Index between the two partitions.
    pub agreement: f64,
}

/// Thin orchestration over the engine.
#[derive(Debug, Clone, Default)]
pub struct ClusterAnalysis {
    config: AnalysisConfig,
}

impl ClusterAnalysis {
    /// Create an analysis.
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    /// Run every step on `data`.
    pub fn run(&self, data: &FeatureMatrix) -> Result<AnalysisOutcome> {
        let config = &self.config;
        let k_range = config.k_min..=config.k_max.min(data.n_entities());

        let dissimilarity = DissimilarityMatrix::compute(data, config.metric)?;
        let dendrogram = HierarchicalClustering::new(1)
            .with_linkage(config.linkage)
            .build(&dissimilarity)?;

        let validity = ClusterValidity::new(config.validity.clone());
        let reports = config
            .methods
            .iter()
            .map(|&m| validity.evaluate(data, m, k_range.clone()))
            .collect::<Result<Vec<_>>>()?;

        let k = match config.n_clusters {
            Some(k) => k,
            None => {
                let recommended = match reports.iter().find(|r| r.method == config.selection) {
                    Some(report) => report.recommended,
                    None => {
                        validity
                            .evaluate(data, config.selection, k_range.clone())?
                            .recommended
                    }
                };
                recommended.ok_or(Error::NoRecommendation(config.selection.name()))?
            }
        };

        let hierarchical = dendrogram.cut_to_k(k)?;
        let kmeans = Kmeans::new(k)
            .with_restarts(config.restarts)
            .with_max_iter(config.max_iter)
            .with_seed(config.seed)
            .fit(data)?;
        let agreement = ari(&hierarchical, &kmeans.labels)?;

        debug!(k, agreement, linkage = config.linkage.name(), "analysis complete");
        Ok(AnalysisOutcome {
            dissimilarity,
            dendrogram,
            k,
            hierarchical,
            kmeans,
            validity: reports,
            agreement,
        })
    }
}
