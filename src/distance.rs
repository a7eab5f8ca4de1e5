//! Pairwise dissimilarities between entities.
//!
//! The dissimilarity matrix is the dominant O(N²D) cost of the engine. It is
//! computed once and shared by hierarchical clustering and silhouette
//! evaluation.
//!
//! | Metric | Formula |
//! |--------|---------|
//! | Euclidean | `sqrt(Σ_d (x_d − y_d)²)` |
//! | Manhattan | `Σ_d |x_d − y_d|` |
//!
//! Both satisfy the triangle inequality. Ward and centroid linkage assume
//! Euclidean geometry.

use crate::error::{Error, Result};
use crate::matrix::FeatureMatrix;
use ndarray::Array2;

/// Relative tolerance used when checking caller-supplied matrices for symmetry.
const SYMMETRY_TOL: f64 = 1e-9;

/// Distance metric between two feature vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Metric {
    /// Straight-line distance.
    #[default]
    Euclidean,
    /// Sum of absolute coordinate differences.
    Manhattan,
}

impl Metric {
    /// Distance between `a` and `b`.
    #[inline]
    pub fn distance(&self, a: &[f64], b: &[f64]) -> f64 {
        debug_assert_eq!(a.len(), b.len());
        match self {
            Metric::Euclidean => squared_euclidean(a, b).sqrt(),
            Metric::Manhattan => a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum(),
        }
    }
}

#[inline]
pub(crate) fn squared_euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

/// Symmetric N×N matrix of pairwise dissimilarities.
///
/// Deserialization re-runs the [`from_square`](Self::from_square) checks.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawDissimilarity"))]
pub struct DissimilarityMatrix {
    values: Array2<f64>,
    metric: Option<Metric>,
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawDissimilarity {
    values: Array2<f64>,
    metric: Option<Metric>,
}

#[cfg(feature = "serde")]
impl TryFrom<RawDissimilarity> for DissimilarityMatrix {
    type Error = Error;

    fn try_from(raw: RawDissimilarity) -> Result<Self> {
        let mut out = Self::from_square(raw.values)?;
        out.metric = raw.metric;
        Ok(out)
    }
}

impl DissimilarityMatrix {
    /// Compute all pairwise distances under `metric`.
    ///
    /// Features are finite, but their differences or squares can still exceed
    /// `f64::MAX` (around 1e154 per coordinate for Euclidean). That case is
    /// reported as [`Error::DistanceOverflow`]; rescale the features first.
    pub fn compute(data: &FeatureMatrix, metric: Metric) -> Result<Self> {
        let mut out = Self::compute_with(data, |a, b| metric.distance(a, b)).map_err(|e| match e {
            // Finite inputs only reach infinity through overflow.
            Error::InvalidDistance { row, col, value } if value.is_infinite() => {
                Error::DistanceOverflow { row, col }
            }
            other => other,
        })?;
        out.metric = Some(metric);
        Ok(out)
    }

    /// Compute all pairwise distances with a custom function.
    ///
    /// Only the upper triangle is evaluated, so the result is symmetric by
    /// construction. Every value must be finite and non-negative.
    pub fn compute_with<F>(data: &FeatureMatrix, dist: F) -> Result<Self>
    where
        F: Fn(&[f64], &[f64]) -> f64,
    {
        let n = data.n_entities();
        if n < 2 {
            return Err(Error::TooFewEntities { min: 2, found: n });
        }

        let rows: Vec<Vec<f64>> = (0..n).map(|i| data.row(i).to_vec()).collect();
        let mut values = Array2::zeros((n, n));
        for i in 0..n {
            for j in (i + 1)..n {
                let d = dist(&rows[i], &rows[j]);
                if !d.is_finite() || d < 0.0 {
                    return Err(Error::InvalidDistance {
                        row: i,
                        col: j,
                        value: d,
                    });
                }
                values[[i, j]] = d;
                values[[j, i]] = d;
            }
        }

        Ok(Self {
            values,
            metric: None,
        })
    }

    /// Wrap a caller-supplied square matrix after validating it.
    pub fn from_square(values: Array2<f64>) -> Result<Self> {
        let (rows, cols) = values.dim();
        if rows != cols {
            return Err(Error::NotSquare { rows, cols });
        }
        if rows < 2 {
            return Err(Error::TooFewEntities {
                min: 2,
                found: rows,
            });
        }

        for i in 0..rows {
            let diag = values[[i, i]];
            if diag != 0.0 {
                return Err(Error::InvalidDistance {
                    row: i,
                    col: i,
                    value: diag,
                });
            }
            for j in (i + 1)..rows {
                let (a, b) = (values[[i, j]], values[[j, i]]);
                for (row, col, value) in [(i, j, a), (j, i, b)] {
                    if !value.is_finite() || value < 0.0 {
                        return Err(Error::InvalidDistance { row, col, value });
                    }
                }
                if (a - b).abs() > SYMMETRY_TOL * a.abs().max(b.abs()).max(1.0) {
                    return Err(Error::NotSymmetric { row: i, col: j });
                }
            }
        }

        Ok(Self {
            values,
            metric: None,
        })
    }

    /// Number of entities.
    pub fn n(&self) -> usize {
        self.values.nrows()
    }

    /// Dissimilarity between entities `i` and `j`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of range.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[[i, j]]
    }

    /// Metric used to compute the matrix, if known.
    pub fn metric(&self) -> Option<Metric> {
        self.metric
    }

    /// Borrow the full square matrix.
    pub fn as_array(&self) -> &Array2<f64> {
        &self.values
    }

    /// Upper triangle, row-major: `N·(N−1)/2` values.
    pub fn condensed(&self) -> Vec<f64> {
        let n = self.n();
        let mut out = Vec::with_capacity(n * (n - 1) / 2);
        for i in 0..n {
            for j in (i + 1)..n {
                out.push(self.values[[i, j]]);
            }
        }
        out
    }
}
