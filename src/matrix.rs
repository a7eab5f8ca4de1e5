//! Validated feature matrices.
//!
//! A [`FeatureMatrix`] holds N entities (rows) by D features (columns). For
//! emotion words, each row is one word and each column one participant's
//! rating. The matrix is checked once on construction and is read-only
//! afterwards; every engine operation borrows it.
//!
//! ```rust
//! use clade::FeatureMatrix;
//!
//! let m = FeatureMatrix::from_rows(&[vec![0.0, 1.0], vec![2.0, 3.0]])
//!     .unwrap()
//!     .with_labels(vec!["calm".into(), "tense".into()])
//!     .unwrap();
//! assert_eq!(m.n_entities(), 2);
//! assert_eq!(m.label(1), Some("tense"));
//! ```

use crate::error::{Error, Result};
use ndarray::{Array2, ArrayView1, ArrayView2, Axis};
use std::collections::HashSet;

/// N entities by D numeric features.
///
/// Deserialization goes through the same checks as
/// [`from_array`](Self::from_array) and [`with_labels`](Self::with_labels).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawFeatureMatrix"))]
pub struct FeatureMatrix {
    data: Array2<f64>,
    labels: Option<Vec<String>>,
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawFeatureMatrix {
    data: Array2<f64>,
    labels: Option<Vec<String>>,
}

#[cfg(feature = "serde")]
impl TryFrom<RawFeatureMatrix> for FeatureMatrix {
    type Error = Error;

    fn try_from(raw: RawFeatureMatrix) -> Result<Self> {
        let matrix = Self::from_array(raw.data)?;
        match raw.labels {
            Some(labels) => matrix.with_labels(labels),
            None => Ok(matrix),
        }
    }
}

impl FeatureMatrix {
    /// Build from row vectors.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let n = rows.len();
        let d = rows.first().map(Vec::len).unwrap_or(0);
        if n == 0 || d == 0 {
            return Err(Error::EmptyInput);
        }

        let mut flat = Vec::with_capacity(n * d);
        for row in rows {
            if row.len() != d {
                return Err(Error::DimensionMismatch {
                    expected: d,
                    found: row.len(),
                });
            }
            flat.extend_from_slice(row);
        }

        let data = Array2::from_shape_vec((n, d), flat).map_err(|_| Error::DimensionMismatch {
            expected: n * d,
            found: rows.iter().map(Vec::len).sum(),
        })?;
        Self::from_array(data)
    }

    /// Build from an owned array.
    pub fn from_array(data: Array2<f64>) -> Result<Self> {
        if data.nrows() == 0 || data.ncols() == 0 {
            return Err(Error::EmptyInput);
        }
        if let Some(((row, col), _)) = data.indexed_iter().find(|(_, v)| !v.is_finite()) {
            return Err(Error::NonFinite { row, col });
        }
        Ok(Self { data, labels: None })
    }

    /// Attach one unique label per entity.
    pub fn with_labels(mut self, labels: Vec<String>) -> Result<Self> {
        if labels.len() != self.n_entities() {
            return Err(Error::LabelCount {
                expected: self.n_entities(),
                found: labels.len(),
            });
        }
        let mut seen = HashSet::with_capacity(labels.len());
        for label in &labels {
            if !seen.insert(label.as_str()) {
                return Err(Error::DuplicateLabel(label.clone()));
            }
        }
        self.labels = Some(labels);
        Ok(self)
    }

    /// Number of entities (rows).
    pub fn n_entities(&self) -> usize {
        self.data.nrows()
    }

    /// Number of features (columns).
    pub fn n_features(&self) -> usize {
        self.data.ncols()
    }

    /// Feature vector of entity `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= n_entities()`.
    pub fn row(&self, i: usize) -> ArrayView1<'_, f64> {
        self.data.row(i)
    }

    /// Borrow the whole matrix.
    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.data.view()
    }

    /// Entity labels, if attached.
    pub fn labels(&self) -> Option<&[String]> {
        self.labels.as_deref()
    }

    /// Label of entity `i`, if labels are attached.
    pub fn label(&self, i: usize) -> Option<&str> {
        self.labels.as_ref()?.get(i).map(String::as_str)
    }

    /// `(min, max)` of every feature column.
    pub fn column_ranges(&self) -> Vec<(f64, f64)> {
        self.data
            .axis_iter(Axis(1))
            .map(|col| {
                col.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                    (lo.min(v), hi.max(v))
                })
            })
            .collect()
    }

    /// Mean feature vector of the given entities.
    pub(crate) fn mean_of(&self, members: &[usize]) -> Vec<f64> {
        let mut mean = vec![0.0; self.n_features()];
        for &i in members {
            for (m, &v) in mean.iter_mut().zip(self.data.row(i).iter()) {
                *m += v;
            }
        }
        let count = members.len().max(1) as f64;
        mean.iter_mut().for_each(|m| *m /= count);
        mean
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rows_shape() {
        let m = FeatureMatrix::from_rows(&[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]).unwrap();
        assert_eq!(m.n_entities(), 2);
        assert_eq!(m.n_features(), 3);
        assert_eq!(m.row(1)[2], 6.0);
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let err = FeatureMatrix::from_rows(&[vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert_eq!(
            err,
            Error::DimensionMismatch {
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn test_non_finite_rejected() {
        let err = FeatureMatrix::from_rows(&[vec![1.0, 2.0], vec![f64::NAN, 0.0]]).unwrap_err();
        assert_eq!(err, Error::NonFinite { row: 1, col: 0 });

        let err = FeatureMatrix::from_rows(&[vec![f64::INFINITY]]).unwrap_err();
        assert_eq!(err, Error::NonFinite { row: 0, col: 0 });
    }

    #[test]
    fn test_empty_rejected() {
        assert_eq!(FeatureMatrix::from_rows(&[]).unwrap_err(), Error::EmptyInput);
        assert_eq!(
            FeatureMatrix::from_rows(&[vec![], vec![]]).unwrap_err(),
            Error::EmptyInput
        );
    }

    #[test]
    fn test_duplicate_labels_rejected() {
        let m = FeatureMatrix::from_rows(&[vec![0.0], vec![1.0]]).unwrap();
        let err = m
            .with_labels(vec!["joy".into(), "joy".into()])
            .unwrap_err();
        assert_eq!(err, Error::DuplicateLabel("joy".into()));
    }

    #[test]
    fn test_label_count_checked() {
        let m = FeatureMatrix::from_rows(&[vec![0.0], vec![1.0]]).unwrap();
        assert!(matches!(
            m.with_labels(vec!["joy".into()]),
            Err(Error::LabelCount { expected: 2, found: 1 })
        ));
    }

    #[test]
    fn test_column_ranges_and_mean() {
        let m = FeatureMatrix::from_rows(&[vec![0.0, 5.0], vec![2.0, -1.0], vec![4.0, 2.0]])
            .unwrap();
        assert_eq!(m.column_ranges(), vec![(0.0, 4.0), (-1.0, 5.0)]);
        assert_eq!(m.mean_of(&[0, 2]), vec![2.0, 3.5]);
    }
}

#[cfg(all(test, feature = "serde"))]
mod serde_tests {
    use super::*;

    #[test]
    fn test_deserialize_rejects_duplicate_labels() {
        let m = FeatureMatrix::from_rows(&[vec![0.0], vec![1.0]])
            .unwrap()
            .with_labels(vec!["calm".into(), "tense".into()])
            .unwrap();
        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(serde_json::from_str::<FeatureMatrix>(&json).unwrap(), m);

        let duplicated = json.replace("\"tense\"", "\"calm\"");
        let err = serde_json::from_str::<FeatureMatrix>(&duplicated).unwrap_err();
        assert!(err.to_string().contains("duplicate entity label 'calm'"));
    }
}
