//! Clustering traits.

use crate::error::Result;
use crate::matrix::FeatureMatrix;
use crate::partition::FlatClustering;

/// Trait for hard clustering algorithms (one cluster per entity).
pub trait Clustering {
    /// Fit the model to data and return cluster assignments.
    fn fit_predict(&self, data: &FeatureMatrix) -> Result<FlatClustering>;

    /// Get the number of clusters.
    fn n_clusters(&self) -> usize;
}
