//! Clustering algorithms for grouping similar entities.
//!
//! Both algorithms produce **hard** assignments: every entity belongs to
//! exactly one cluster, reported as a [`FlatClustering`](crate::FlatClustering).
//!
//! ## Algorithms
//!
//! ### K-means
//!
//! The classic algorithm: assign each point to the nearest centroid, then
//! update centroids to the mean of their points. Repeat.
//!
//! **Objective**: Minimize within-cluster sum of squares:
//!
//! ```text
//! J = Σ_k Σ_{x ∈ C_k} ||x - μ_k||²
//! ```
//!
//! **Assumptions**:
//! - Clusters are roughly spherical
//! - Clusters have similar sizes
//! - You know k in advance (or pick it with [`crate::validity`])
//!
//! ### Hierarchical (Agglomerative) Clustering
//!
//! Bottom-up: start with each point as its own cluster, repeatedly merge
//! the two closest clusters until one remains. The merge history forms a
//! **dendrogram**: a binary tree you can cut at any height to get k clusters.
//!
//! **Linkage methods** determine "distance between clusters":
//!
//! | Linkage | Distance | Effect |
//! |---------|----------|--------|
//! | Single | min(pairwise) | Chaining; elongated clusters |
//! | Complete | max(pairwise) | Compact, spherical clusters |
//! | Average | mean(pairwise) | Balanced compromise |
//! | Centroid | distance of means | Can invert merge heights |
//! | Ward | Variance increase | Minimizes within-cluster variance |
//!
//! ## Usage
//!
//! ```rust
//! use clade::cluster::{Clustering, HierarchicalClustering, Kmeans, Linkage};
//! use clade::FeatureMatrix;
//!
//! let data = FeatureMatrix::from_rows(&[
//!     vec![0.0, 0.0],
//!     vec![0.1, 0.1],
//!     vec![10.0, 10.0],
//!     vec![10.1, 10.1],
//! ])
//! .unwrap();
//!
//! let labels = Kmeans::new(2).with_seed(7).fit_predict(&data).unwrap();
//! assert_eq!(labels.label(0), labels.label(1));
//! assert_ne!(labels.label(0), labels.label(2));
//!
//! let labels = HierarchicalClustering::new(2)
//!     .with_linkage(Linkage::Complete)
//!     .fit_predict(&data)
//!     .unwrap();
//! assert_eq!(labels.labels(), &[0, 0, 1, 1]);
//! ```

mod hierarchical;
mod kmeans;
mod linkage;
mod traits;
pub(crate) mod util;

pub use hierarchical::HierarchicalClustering;
pub use kmeans::{Kmeans, KmeansFit};
pub use linkage::{LanceWilliams, Linkage, LinkageContext};
pub use traits::Clustering;
