//! Linkage strategies: how the distance between two clusters is defined.
//!
//! | Linkage | Distance | Effect |
//! |---------|----------|--------|
//! | Single | min(pairwise) | Chaining; elongated clusters |
//! | Complete | max(pairwise) | Compact, spherical clusters |
//! | Average | mean(pairwise) | Balanced compromise |
//! | Centroid | ‖μₐ − μᵦ‖ | Can produce inversions |
//! | Ward | Δ SSE | Minimizes within-cluster variance |
//!
//! # Lance–Williams recurrence
//!
//! After merging clusters i and j, the distance from any other cluster k to
//! the union is a linear function of distances that are already known:
//!
//! ```text
//! d(k, i∪j) = αᵢ·d(k,i) + αⱼ·d(k,j) + β·d(i,j) + γ·|d(k,i) − d(k,j)|
//! ```
//!
//! Centroid linkage runs the recurrence on squared Euclidean distances. Ward
//! runs it on the SSE increase itself, which for two singletons is `½·d²`:
//!
//! ```text
//! Δ(A,B) = (nₐ × nᵦ)/(nₐ + nᵦ) × ||μₐ - μᵦ||²
//! ```
//!
//! [`Linkage::distance`] computes the same quantities directly from cluster
//! members, which is what the recurrence is checked against.

use crate::distance::{squared_euclidean, DissimilarityMatrix};
use crate::error::{Error, Result};
use crate::matrix::FeatureMatrix;

/// Linkage method for hierarchical clustering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Linkage {
    /// Single linkage: minimum distance between clusters.
    Single,
    /// Complete linkage: maximum distance between clusters.
    Complete,
    /// Average linkage: mean distance between clusters (UPGMA).
    #[default]
    Average,
    /// Centroid linkage: Euclidean distance between cluster means.
    Centroid,
    /// Ward's method: increase in within-cluster sum of squares.
    Ward,
}

/// Coefficients of one Lance–Williams update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LanceWilliams {
    /// Weight of `d(k, i)`.
    pub alpha_i: f64,
    /// Weight of `d(k, j)`.
    pub alpha_j: f64,
    /// Weight of `d(i, j)`.
    pub beta: f64,
    /// Weight of `|d(k, i) − d(k, j)|`.
    pub gamma: f64,
}

/// What [`Linkage::distance`] may read.
#[derive(Debug, Clone, Copy)]
pub struct LinkageContext<'a> {
    /// Pairwise entity dissimilarities.
    pub dissimilarity: &'a DissimilarityMatrix,
    /// Raw features; required by centroid and Ward linkage.
    pub features: Option<&'a FeatureMatrix>,
}

impl Linkage {
    /// Lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            Linkage::Single => "single",
            Linkage::Complete => "complete",
            Linkage::Average => "average",
            Linkage::Centroid => "centroid",
            Linkage::Ward => "ward",
        }
    }

    /// False when the linkage can produce height inversions.
    pub fn is_monotonic(&self) -> bool {
        !matches!(self, Linkage::Centroid)
    }

    /// True when the linkage is only meaningful on Euclidean distances.
    pub fn requires_euclidean(&self) -> bool {
        matches!(self, Linkage::Centroid | Linkage::Ward)
    }

    /// Cluster distance recomputed from members.
    ///
    /// Centroid and Ward read the feature matrix; the others read only the
    /// dissimilarities. The value is in height units.
    pub fn distance(&self, a: &[usize], b: &[usize], ctx: &LinkageContext<'_>) -> Result<f64> {
        if a.is_empty() || b.is_empty() {
            return Err(Error::EmptyInput);
        }
        let d = ctx.dissimilarity;
        let cross = || a.iter().flat_map(move |&i| b.iter().map(move |&j| d.get(i, j)));

        let value = match self {
            Linkage::Single => cross().fold(f64::INFINITY, f64::min),
            Linkage::Complete => cross().fold(0.0, f64::max),
            Linkage::Average => cross().sum::<f64>() / (a.len() * b.len()) as f64,
            Linkage::Centroid | Linkage::Ward => {
                let features = ctx.features.ok_or(Error::MissingFeatures(self.name()))?;
                let sq = squared_euclidean(&features.mean_of(a), &features.mean_of(b));
                if *self == Linkage::Centroid {
                    sq.sqrt()
                } else {
                    let (na, nb) = (a.len() as f64, b.len() as f64);
                    na * nb / (na + nb) * sq
                }
            }
        };
        Ok(value)
    }

    /// Lance–Williams coefficients for merging `i` and `j`, seen from `k`.
    pub fn coefficients(&self, n_i: usize, n_j: usize, n_k: usize) -> LanceWilliams {
        let (ni, nj, nk) = (n_i as f64, n_j as f64, n_k as f64);
        match self {
            Linkage::Single => LanceWilliams {
                alpha_i: 0.5,
                alpha_j: 0.5,
                beta: 0.0,
                gamma: -0.5,
            },
            Linkage::Complete => LanceWilliams {
                alpha_i: 0.5,
                alpha_j: 0.5,
                beta: 0.0,
                gamma: 0.5,
            },
            Linkage::Average => LanceWilliams {
                alpha_i: ni / (ni + nj),
                alpha_j: nj / (ni + nj),
                beta: 0.0,
                gamma: 0.0,
            },
            Linkage::Centroid => {
                let n = ni + nj;
                LanceWilliams {
                    alpha_i: ni / n,
                    alpha_j: nj / n,
                    beta: -(ni * nj) / (n * n),
                    gamma: 0.0,
                }
            }
            Linkage::Ward => {
                let t = ni + nj + nk;
                LanceWilliams {
                    alpha_i: (nk + ni) / t,
                    alpha_j: (nk + nj) / t,
                    beta: -nk / t,
                    gamma: 0.0,
                }
            }
        }
    }

    /// Working-space distance from `k` to the union of `i` and `j`.
    ///
    /// Single and complete are evaluated as exact `min`/`max`, which is what
    /// their coefficients reduce to.
    #[inline]
    pub fn update_after_merge(
        &self,
        d_ki: f64,
        d_kj: f64,
        d_ij: f64,
        n_i: usize,
        n_j: usize,
        n_k: usize,
    ) -> f64 {
        match self {
            Linkage::Single => d_ki.min(d_kj),
            Linkage::Complete => d_ki.max(d_kj),
            _ => {
                let c = self.coefficients(n_i, n_j, n_k);
                c.alpha_i * d_ki + c.alpha_j * d_kj + c.beta * d_ij + c.gamma * (d_ki - d_kj).abs()
            }
        }
    }

    /// Map an entity dissimilarity into the space the recurrence runs in.
    #[inline]
    pub(crate) fn to_working(&self, d: f64) -> f64 {
        match self {
            Linkage::Centroid => d * d,
            Linkage::Ward => 0.5 * d * d,
            _ => d,
        }
    }

    /// Map a working-space value back to a merge height.
    #[inline]
    pub(crate) fn to_height(&self, w: f64) -> f64 {
        match self {
            Linkage::Centroid => w.max(0.0).sqrt(),
            _ => w.max(0.0),
        }
    }
}
