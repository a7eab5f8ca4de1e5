//! Flat cluster assignments.

use crate::error::{Error, Result};
use std::collections::HashMap;

/// One cluster id per entity.
///
/// Ids are dense (`0..n_clusters`) and numbered in order of first appearance,
/// so entity 0 is always in cluster 0. They carry no other meaning.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FlatClustering {
    labels: Vec<usize>,
    n_clusters: usize,
}

impl FlatClustering {
    /// Renumber arbitrary labels densely by first appearance.
    pub fn from_labels(raw: &[usize]) -> Result<Self> {
        if raw.is_empty() {
            return Err(Error::EmptyInput);
        }
        let mut map: HashMap<usize, usize> = HashMap::new();
        let labels = raw
            .iter()
            .map(|l| {
                let next = map.len();
                *map.entry(*l).or_insert(next)
            })
            .collect();
        Ok(Self {
            labels,
            n_clusters: map.len(),
        })
    }

    /// Cluster id of every entity.
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Cluster id of entity `i`.
    pub fn label(&self, i: usize) -> usize {
        self.labels[i]
    }

    /// Number of distinct clusters.
    pub fn n_clusters(&self) -> usize {
        self.n_clusters
    }

    /// Number of entities.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Always false: a clustering covers at least one entity.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Member count of every cluster.
    pub fn sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.n_clusters];
        for &l in &self.labels {
            sizes[l] += 1;
        }
        sizes
    }

    /// Entity indices grouped by cluster, ascending within each group.
    pub fn members(&self) -> Vec<Vec<usize>> {
        let mut groups = vec![Vec::new(); self.n_clusters];
        for (i, &l) in self.labels.iter().enumerate() {
            groups[l].push(i);
        }
        groups
    }

    /// Consume into the raw label vector.
    pub fn into_labels(self) -> Vec<usize> {
        self.labels
    }
}
