//! Merge trees.
//!
//! A [`Dendrogram`] records the complete merge history of agglomerative
//! clustering:
//!
//! ```text
//!         6 (height=1.0)
//!        / \
//!       4   5 (height=0.7)
//!      / \ / \
//!     0  1 2  3 (leaves)
//! ```
//!
//! Key property: "cut" at any height or cluster count to get a flat
//! assignment. Heights, merge events and the leaf order are what a plotting
//! collaborator needs to draw it.

mod dendrogram;

pub use dendrogram::{ClusterNode, Dendrogram, Merge};
