//! Silhouette widths.
//!
//! ```text
//! a(i) = mean d(i, j) over the other members of i's cluster
//! b(i) = min over other clusters C of mean d(i, j), j ∈ C
//! s(i) = (b(i) − a(i)) / max(a(i), b(i))
//! ```
//!
//! `s(i)` is 0 for members of singleton clusters. Values lie in [−1, 1]:
//! near 1 the point sits well inside its cluster, near −1 it would fit a
//! neighbouring cluster better.

use crate::distance::DissimilarityMatrix;
use crate::error::{Error, Result};
use crate::partition::FlatClustering;

/// Silhouette width of every entity.
///
/// Needs at least two clusters.
pub fn silhouette_samples(
    dissimilarity: &DissimilarityMatrix,
    labels: &FlatClustering,
) -> Result<Vec<f64>> {
    let n = dissimilarity.n();
    if labels.len() != n {
        return Err(Error::DimensionMismatch {
            expected: n,
            found: labels.len(),
        });
    }
    let k = labels.n_clusters();
    if k < 2 {
        return Err(Error::InvalidClusterCount {
            requested: k,
            n_items: n,
        });
    }

    let sizes = labels.sizes();
    let mut out = Vec::with_capacity(n);
    let mut sums = vec![0.0; k];

    for i in 0..n {
        sums.iter_mut().for_each(|s| *s = 0.0);
        for j in 0..n {
            if j != i {
                sums[labels.label(j)] += dissimilarity.get(i, j);
            }
        }

        let own = labels.label(i);
        if sizes[own] == 1 {
            out.push(0.0);
            continue;
        }

        let a = sums[own] / (sizes[own] - 1) as f64;
        let b = (0..k)
            .filter(|&c| c != own)
            .map(|c| sums[c] / sizes[c] as f64)
            .fold(f64::INFINITY, f64::min);

        let denom = a.max(b);
        let s = if denom > 0.0 { (b - a) / denom } else { 0.0 };
        out.push(s.clamp(-1.0, 1.0));
    }

    Ok(out)
}

/// Mean silhouette width.
pub fn silhouette_score(dissimilarity: &DissimilarityMatrix, labels: &FlatClustering) -> Result<f64> {
    let samples = silhouette_samples(dissimilarity, labels)?;
    Ok(samples.iter().sum::<f64>() / samples.len() as f64)
}
