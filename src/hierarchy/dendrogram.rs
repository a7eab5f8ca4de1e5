//! Dendrogram produced by agglomerative clustering.
//!
//! Nodes live in an arena indexed by id. Leaves are ids `0..n`; the merge at
//! step `t` creates node `n + t`. Child links are ids, so the tree has no
//! ownership cycles and lookups are O(1).

use crate::error::{Error, Result};
use crate::partition::FlatClustering;

/// A node in the merge tree.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClusterNode {
    /// Arena id.
    pub id: usize,
    /// Left child (the side holding the smaller entity index).
    pub left: Option<usize>,
    /// Right child.
    pub right: Option<usize>,
    /// Merge height (0 for leaves).
    pub height: f64,
    /// Number of leaves below this node.
    pub size: usize,
    /// Smallest entity index below this node.
    pub min_member: usize,
}

impl ClusterNode {
    /// True for original entities.
    pub fn is_leaf(&self) -> bool {
        self.left.is_none()
    }
}

/// A single merge event.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Merge {
    /// Node id of the cluster with the smaller entity index.
    pub cluster_a: usize,
    /// Node id of the other cluster.
    pub cluster_b: usize,
    /// Linkage distance at which the merge happened.
    pub height: f64,
    /// Size of the resulting cluster.
    pub size: usize,
}

/// Completed merge tree plus its ordered merge events.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Dendrogram {
    nodes: Vec<ClusterNode>,
    merges: Vec<Merge>,
    n_items: usize,
}

impl Dendrogram {
    /// Start a tree with `n_items` leaves and no merges.
    pub(crate) fn new(n_items: usize) -> Self {
        let mut nodes = Vec::with_capacity(2 * n_items.max(1) - 1);
        nodes.extend((0..n_items).map(|id| ClusterNode {
            id,
            left: None,
            right: None,
            height: 0.0,
            size: 1,
            min_member: id,
        }));
        Self {
            nodes,
            merges: Vec::with_capacity(n_items.saturating_sub(1)),
            n_items,
        }
    }

    /// Record a merge of nodes `a` and `b`; returns the new node id.
    pub(crate) fn add_merge(&mut self, a: usize, b: usize, height: f64) -> usize {
        let (na, nb) = (self.nodes[a], self.nodes[b]);
        let (left, right) = if na.min_member <= nb.min_member {
            (na, nb)
        } else {
            (nb, na)
        };
        let height = height.max(0.0);
        let id = self.nodes.len();
        let size = left.size + right.size;

        self.nodes.push(ClusterNode {
            id,
            left: Some(left.id),
            right: Some(right.id),
            height,
            size,
            min_member: left.min_member,
        });
        self.merges.push(Merge {
            cluster_a: left.id,
            cluster_b: right.id,
            height,
            size,
        });
        id
    }

    /// Flat clustering with exactly `k` clusters.
    ///
    /// Applies the first `n − k` merges.
    pub fn cut_to_k(&self, k: usize) -> Result<FlatClustering> {
        if k == 0 || k > self.n_items {
            return Err(Error::InvalidClusterCount {
                requested: k,
                n_items: self.n_items,
            });
        }
        self.labels_after(self.n_items - k)
    }

    /// Flat clustering from the merges strictly below height `h`.
    ///
    /// Merges are applied in order and the cut stops at the first merge at or
    /// above `h`. For monotonic dendrograms that is every merge below `h`.
    pub fn cut_at_height(&self, h: f64) -> Result<FlatClustering> {
        if h.is_nan() || h < 0.0 {
            return Err(Error::InvalidHeight(h));
        }
        let applied = self.merges.iter().take_while(|m| m.height < h).count();
        self.labels_after(applied)
    }

    fn labels_after(&self, applied: usize) -> Result<FlatClustering> {
        // parent[node] = node created by the merge that absorbed it.
        let mut parent: Vec<usize> = (0..self.n_items + applied).collect();
        for (t, merge) in self.merges.iter().take(applied).enumerate() {
            let id = self.n_items + t;
            parent[merge.cluster_a] = id;
            parent[merge.cluster_b] = id;
        }

        let roots: Vec<usize> = (0..self.n_items)
            .map(|leaf| {
                let mut cur = leaf;
                while parent[cur] != cur {
                    cur = parent[cur];
                }
                cur
            })
            .collect();
        FlatClustering::from_labels(&roots)
    }

    /// Entity indices below node `id`, ascending.
    pub fn members(&self, id: usize) -> Vec<usize> {
        let mut out = self.leaf_order_from(id);
        out.sort_unstable();
        out
    }

    /// Leaves in left-to-right drawing order.
    pub fn leaf_order(&self) -> Vec<usize> {
        match self.root() {
            Some(root) => self.leaf_order_from(root.id),
            None => Vec::new(),
        }
    }

    fn leaf_order_from(&self, id: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(cur) = stack.pop() {
            let node = &self.nodes[cur];
            match (node.left, node.right) {
                (Some(l), Some(r)) => {
                    stack.push(r);
                    stack.push(l);
                }
                _ => out.push(cur),
            }
        }
        out
    }

    /// Merge steps whose height is below one of their children's.
    ///
    /// Only centroid linkage can produce these.
    pub fn inversions(&self) -> Vec<usize> {
        self.merges
            .iter()
            .enumerate()
            .filter(|(_, m)| {
                let child = self.nodes[m.cluster_a]
                    .height
                    .max(self.nodes[m.cluster_b].height);
                m.height < child
            })
            .map(|(t, _)| t)
            .collect()
    }

    /// Root node, once the tree is complete.
    pub fn root(&self) -> Option<&ClusterNode> {
        if self.merges.len() + 1 == self.n_items {
            self.nodes.last()
        } else {
            None
        }
    }

    /// Node by arena id.
    pub fn node(&self, id: usize) -> Option<&ClusterNode> {
        self.nodes.get(id)
    }

    /// Number of original items.
    pub fn n_items(&self) -> usize {
        self.n_items
    }

    /// Number of merges recorded.
    pub fn n_merges(&self) -> usize {
        self.merges.len()
    }

    /// Merge events in order.
    pub fn merges(&self) -> &[Merge] {
        &self.merges
    }

    /// Merge heights in order.
    pub fn heights(&self) -> Vec<f64> {
        self.merges.iter().map(|m| m.height).collect()
    }
}
