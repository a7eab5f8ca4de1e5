//! Hierarchical (agglomerative) clustering.
//!
//! Bottom-up clustering that builds a **dendrogram** by iteratively
//! merging the closest clusters. Unlike K-means, you don't need to specify
//! k in advance. Cut the tree at any height or cluster count.
//!
//! # Algorithm
//!
//! Start from N singletons. N−1 times: find the closest pair of active
//! clusters, merge them at their linkage distance, and update the distances
//! from the merged cluster to every other one with the Lance–Williams
//! recurrence (see [`Linkage`]).
//!
//! Each active cluster occupies the matrix slot of its smallest member, so
//! scanning slots in ascending order breaks ties by (lowest entity in A, then
//! in B) and the result is reproducible.
//!
//! # When to Use
//!
//! - **Exploratory analysis**: View cluster structure at multiple granularities
//! - **Unknown k**: Cut dendrogram at different heights to explore
//! - **Small-medium data**: O(n²) space, O(n³) time

use super::linkage::{Linkage, LinkageContext};
use super::traits::Clustering;
use crate::distance::{DissimilarityMatrix, Metric};
use crate::error::{Error, Result};
use crate::hierarchy::Dendrogram;
use crate::matrix::FeatureMatrix;
use crate::partition::FlatClustering;
use ndarray::Array2;
use tracing::{debug, trace};

/// Hierarchical (agglomerative) clustering.
#[derive(Debug, Clone)]
pub struct HierarchicalClustering {
    /// Number of clusters produced by [`Clustering::fit_predict`].
    n_clusters: usize,
    /// Linkage method.
    linkage: Linkage,
}

impl HierarchicalClustering {
    /// Create a new hierarchical clusterer.
    pub fn new(n_clusters: usize) -> Self {
        Self {
            n_clusters,
            linkage: Linkage::Average,
        }
    }

    /// Set linkage method.
    pub fn with_linkage(mut self, linkage: Linkage) -> Self {
        self.linkage = linkage;
        self
    }

    /// Configured linkage.
    pub fn linkage(&self) -> Linkage {
        self.linkage
    }

    /// Build the full dendrogram from precomputed dissimilarities.
    ///
    /// Distances are updated with the Lance–Williams recurrence, so the raw
    /// features are never touched.
    pub fn build(&self, dissimilarity: &DissimilarityMatrix) -> Result<Dendrogram> {
        let n = self.check(dissimilarity)?;
        let linkage = self.linkage;

        let mut work: Array2<f64> = dissimilarity.as_array().mapv(|v| linkage.to_working(v));
        let mut active: Vec<usize> = (0..n).collect();
        let mut node_of: Vec<usize> = (0..n).collect();
        let mut size = vec![1usize; n];
        let mut dendro = Dendrogram::new(n);

        while active.len() > 1 {
            let (pa, pb, best) = closest_pair(active.len(), |a, b| work[[active[a], active[b]]]);
            let (i, j) = (active[pa], active[pb]);

            let height = linkage.to_height(best);
            let id = dendro.add_merge(node_of[i], node_of[j], height);
            trace!(step = dendro.n_merges(), i, j, height, "merge");

            for &k in &active {
                if k == i || k == j {
                    continue;
                }
                let v = linkage.update_after_merge(
                    work[[k, i]],
                    work[[k, j]],
                    best,
                    size[i],
                    size[j],
                    size[k],
                );
                work[[i, k]] = v;
                work[[k, i]] = v;
            }

            size[i] += size[j];
            node_of[i] = id;
            active.remove(pb);
        }

        debug!(
            n,
            linkage = linkage.name(),
            inversions = dendro.inversions().len(),
            "dendrogram built"
        );
        Ok(dendro)
    }

    /// Build the dendrogram recomputing every cluster distance from members.
    ///
    /// Slow (O(n⁴) worst case). Produces the same merges as [`Self::build`]
    /// and serves as its cross-check.
    pub fn build_recomputed(
        &self,
        data: &FeatureMatrix,
        dissimilarity: &DissimilarityMatrix,
    ) -> Result<Dendrogram> {
        let n = self.check(dissimilarity)?;
        if data.n_entities() != n {
            return Err(Error::DimensionMismatch {
                expected: n,
                found: data.n_entities(),
            });
        }
        let ctx = LinkageContext {
            dissimilarity,
            features: Some(data),
        };

        let mut clusters: Vec<(usize, Vec<usize>)> = (0..n).map(|i| (i, vec![i])).collect();
        let mut dendro = Dendrogram::new(n);

        while clusters.len() > 1 {
            let m = clusters.len();
            let mut dist = Array2::<f64>::zeros((m, m));
            for a in 0..m {
                for b in (a + 1)..m {
                    dist[[a, b]] = self.linkage.distance(&clusters[a].1, &clusters[b].1, &ctx)?;
                }
            }
            let (pa, pb, height) = closest_pair(m, |a, b| dist[[a, b]]);

            let (node_b, members_b) = clusters.remove(pb);
            let (node_a, members_a) = &mut clusters[pa];
            *node_a = dendro.add_merge(*node_a, node_b, height);
            members_a.extend(members_b);
        }

        Ok(dendro)
    }

    /// Euclidean dissimilarities followed by [`Self::build`].
    pub fn fit_dendrogram(&self, data: &FeatureMatrix) -> Result<Dendrogram> {
        let dissimilarity = DissimilarityMatrix::compute(data, Metric::Euclidean)?;
        self.build(&dissimilarity)
    }

    fn check(&self, dissimilarity: &DissimilarityMatrix) -> Result<usize> {
        let n = dissimilarity.n();
        if n < 2 {
            return Err(Error::TooFewEntities { min: 2, found: n });
        }
        if self.linkage.requires_euclidean() && dissimilarity.metric() == Some(Metric::Manhattan) {
            return Err(Error::InvalidParameter {
                name: "linkage",
                message: "centroid and ward linkage need euclidean dissimilarities",
            });
        }
        Ok(n)
    }
}

/// Relative difference below which two cluster distances count as tied.
const TIE_TOL: f64 = 1e-12;

/// Positions `(a, b)` with `a < b` of the smallest `dist(a, b)` among `m ≥ 2` clusters.
///
/// A candidate replaces the current best only if it is smaller by more than
/// [`TIE_TOL`], so ties (including ones blurred by rounding) keep the first
/// pair in scan order.
fn closest_pair(m: usize, dist: impl Fn(usize, usize) -> f64) -> (usize, usize, f64) {
    let mut best = (0, 1, dist(0, 1));
    for a in 0..m {
        for b in (a + 1)..m {
            let v = dist(a, b);
            if v < best.2 - TIE_TOL * best.2.abs().max(1.0) {
                best = (a, b, v);
            }
        }
    }
    best
}

impl Clustering for HierarchicalClustering {
    fn fit_predict(&self, data: &FeatureMatrix) -> Result<FlatClustering> {
        let dendro = self.fit_dendrogram(data)?;
        dendro.cut_to_k(self.n_clusters)
    }

    fn n_clusters(&self) -> usize {
        self.n_clusters
    }
}
