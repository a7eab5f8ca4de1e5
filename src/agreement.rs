//! Agreement between two partitions of the same entities.
//!
//! Used to compare the hierarchical and k-means views of one dataset. The
//! Adjusted Rand Index is chance-corrected: 0 for independent partitions,
//! 1 for identical ones (up to relabelling), negative when worse than chance.
//!
//! ```rust
//! use clade::{agreement::ari, FlatClustering};
//!
//! let a = FlatClustering::from_labels(&[0, 0, 1, 1]).unwrap();
//! let b = FlatClustering::from_labels(&[5, 5, 2, 2]).unwrap();
//! assert!((ari(&a, &b).unwrap() - 1.0).abs() < 1e-12);
//! ```
//!
//! # References
//!
//! - Hubert & Arabie (1985). "Comparing partitions"

use crate::error::{Error, Result};
use crate::partition::FlatClustering;

/// Adjusted Rand Index between `a` and `b`.
pub fn ari(a: &FlatClustering, b: &FlatClustering) -> Result<f64> {
    if a.len() != b.len() {
        return Err(Error::DimensionMismatch {
            expected: a.len(),
            found: b.len(),
        });
    }

    // Contingency table; ids are dense so a flat vector suffices.
    let (ka, kb) = (a.n_clusters(), b.n_clusters());
    let mut table = vec![0usize; ka * kb];
    for (&x, &y) in a.labels().iter().zip(b.labels()) {
        table[x * kb + y] += 1;
    }

    let sum_ij: f64 = table.iter().map(|&c| comb2(c)).sum();
    let sum_a: f64 = a.sizes().into_iter().map(comb2).sum();
    let sum_b: f64 = b.sizes().into_iter().map(comb2).sum();
    let total = comb2(a.len());

    if total == 0.0 {
        return Ok(1.0);
    }
    let expected = sum_a * sum_b / total;
    let max_index = (sum_a + sum_b) / 2.0;
    let denom = max_index - expected;
    if denom.abs() < 1e-12 {
        // Both partitions are trivial (all-in-one or all-singletons).
        return Ok(if sum_ij == max_index { 1.0 } else { 0.0 });
    }
    Ok((sum_ij - expected) / denom)
}

fn comb2(n: usize) -> f64 {
    if n < 2 {
        0.0
    } else {
        (n * (n - 1) / 2) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fc(labels: &[usize]) -> FlatClustering {
        FlatClustering::from_labels(labels).unwrap()
    }

    #[test]
    fn test_ari_perfect_and_permuted() {
        assert!((ari(&fc(&[0, 0, 1, 1, 2, 2]), &fc(&[2, 2, 0, 0, 1, 1])).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_ari_disagreement() {
        // Crossed split scores below chance.
        assert!(ari(&fc(&[0, 0, 1, 1]), &fc(&[0, 1, 0, 1])).unwrap() < 0.0);
    }

    #[test]
    fn test_ari_trivial_partitions() {
        assert_eq!(ari(&fc(&[0, 0, 0]), &fc(&[0, 0, 0])).unwrap(), 1.0);
        assert_eq!(ari(&fc(&[0, 1, 2]), &fc(&[0, 1, 2])).unwrap(), 1.0);
    }

    #[test]
    fn test_ari_length_mismatch() {
        assert!(matches!(
            ari(&fc(&[0, 1]), &fc(&[0, 1, 1])),
            Err(Error::DimensionMismatch { expected: 2, found: 3 })
        ));
    }
}
