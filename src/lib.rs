//! # clade
//!
//! Clustering for rating vectors: each entity (an emotion word, say) is a
//! row of numeric scores, and the crate groups entities whose rows are alike.
//!
//! - [`distance`]: pairwise dissimilarities (Euclidean, Manhattan).
//! - [`cluster`]: agglomerative clustering with five linkages, and k-means
//!   with seeded restarts.
//! - [`hierarchy`]: the merge tree and its cuts.
//! - [`validity`]: choosing k (elbow, silhouette, gap statistic, Hartigan).
//! - [`agreement`]: Adjusted Rand Index between two partitions.
//! - [`analysis`]: all of the above in one call.
//!
//! Everything is deterministic given a seed. Progress is reported through
//! [`tracing`] events; install a subscriber to see them.

#![forbid(unsafe_code)]

pub mod agreement;
pub mod analysis;
pub mod cluster;
pub mod distance;
/// Error types used across `clade`.
pub mod error;
pub mod hierarchy;
pub mod matrix;
pub mod partition;
pub mod validity;

pub use agreement::ari;
pub use analysis::{AnalysisConfig, AnalysisOutcome, ClusterAnalysis};
pub use cluster::{Clustering, HierarchicalClustering, Kmeans, KmeansFit, Linkage};
pub use distance::{DissimilarityMatrix, Metric};
pub use error::{Error, Result, Warning};
pub use hierarchy::{ClusterNode, Dendrogram, Merge};
pub use matrix::FeatureMatrix;
pub use partition::FlatClustering;
pub use validity::{ClusterValidity, Partitioner, ValidityConfig, ValidityMethod, ValidityReport};
