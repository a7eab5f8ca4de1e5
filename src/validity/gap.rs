//! Gap statistic (Tibshirani, Walther & Hastie, 2001).
//!
//! 1. Cluster the observed data for every k and take `ln W_k`.
//! 2. Draw B reference datasets, each feature uniform over its observed
//!    range, cluster them the same way and take `ln W*_kb`.
//! 3. `gap(k) = (1/B) Σ_b ln W*_kb − ln W_k`, with
//!    `s_k = sd_k · sqrt(1 + 1/B)`.
//! 4. Pick the smallest k with `gap(k) ≥ gap(k+1) − s_{k+1}`.
//!
//! Reference `b` is drawn and clustered from seeds derived from `(seed, b)`,
//! so the statistic is reproducible and independent of scheduling.

use super::sse::ln_wss;
use super::{par_map, ClusterValidity};
use crate::cluster::util::derive_seed;
use crate::error::{Error, Result};
use crate::matrix::FeatureMatrix;
use ndarray::Array2;
use rand::distr::Uniform;
use rand::prelude::*;

/// `(gap, standard error)` for every k in `ks`.
pub(super) fn gap_scores(
    validity: &ClusterValidity,
    data: &FeatureMatrix,
    ks: &[usize],
) -> Result<Vec<(f64, f64)>> {
    let config = validity.config();
    let b = config.references;
    if b == 0 {
        return Err(Error::InvalidParameter {
            name: "references",
            message: "must be at least 1",
        });
    }

    let columns = reference_columns(&data.column_ranges())?;

    let observed: Vec<f64> = validity
        .wss_curve(data, ks, config.seed)?
        .into_iter()
        .map(ln_wss)
        .collect();

    let streams: Vec<usize> = (0..b).collect();
    let reference_logs: Vec<Vec<f64>> = par_map(&streams, |r| {
        let stream = derive_seed(config.seed, r as u64);
        let reference = reference_dataset(&columns, data.n_entities(), stream)?;
        let wss = validity.wss_curve(&reference, ks, derive_seed(stream, 0))?;
        Ok(wss.into_iter().map(ln_wss).collect())
    })?;

    let b_f = b as f64;
    let out = (0..ks.len())
        .map(|i| {
            let mean = reference_logs.iter().map(|logs| logs[i]).sum::<f64>() / b_f;
            let var = reference_logs
                .iter()
                .map(|logs| (logs[i] - mean).powi(2))
                .sum::<f64>()
                / b_f;
            let s = var.sqrt() * (1.0 + 1.0 / b_f).sqrt();
            (mean - observed[i], s)
        })
        .collect();
    Ok(out)
}

/// Smallest k with `gap(k) ≥ gap(k+1) − s_{k+1}`.
pub(super) fn one_standard_error(ks: &[usize], gaps: &[(f64, f64)]) -> Option<usize> {
    gaps.windows(2)
        .position(|w| w[0].0 >= w[1].0 - w[1].1)
        .map(|i| ks[i])
}

/// Sampler for one reference column.
#[derive(Debug, Clone)]
enum Column {
    /// The observed column is constant.
    Constant(f64),
    Uniform(Uniform<f64>),
}

/// One sampler per feature, uniform over its observed `(min, max)`.
fn reference_columns(ranges: &[(f64, f64)]) -> Result<Vec<Column>> {
    ranges
        .iter()
        .enumerate()
        .map(|(col, &(lo, hi))| {
            if hi > lo {
                Uniform::new(lo, hi)
                    .map(Column::Uniform)
                    .map_err(|_| Error::RangeOverflow { col })
            } else {
                Ok(Column::Constant(lo))
            }
        })
        .collect()
}

/// `n` rows drawn from `columns`.
fn reference_dataset(columns: &[Column], n: usize, seed: u64) -> Result<FeatureMatrix> {
    let mut rng = StdRng::seed_from_u64(seed);
    let data = Array2::from_shape_fn((n, columns.len()), |(_, j)| match &columns[j] {
        Column::Constant(v) => *v,
        Column::Uniform(u) => rng.sample(u),
    });
    FeatureMatrix::from_array(data)
}
