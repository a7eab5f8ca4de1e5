//! Within-cluster sum of squares and the indices built on it.

use crate::error::{Error, Result};
use crate::matrix::FeatureMatrix;
use crate::partition::FlatClustering;

/// Smallest WSS fed to a logarithm; a perfect fit would otherwise give −∞.
pub(crate) const WSS_FLOOR: f64 = f64::MIN_POSITIVE;

/// Total squared deviation of every entity from its cluster mean.
///
/// Two passes: cluster means first, then squared deviations from them, which
/// avoids the cancellation of the `Σx² − n·μ²` form.
pub fn within_cluster_sse(data: &FeatureMatrix, labels: &FlatClustering) -> Result<f64> {
    let n = data.n_entities();
    if labels.len() != n {
        return Err(Error::DimensionMismatch {
            expected: n,
            found: labels.len(),
        });
    }

    let members = labels.members();
    let total = members
        .iter()
        .map(|group| {
            let mean = data.mean_of(group);
            group
                .iter()
                .map(|&i| {
                    data.row(i)
                        .iter()
                        .zip(&mean)
                        .map(|(x, m)| (x - m) * (x - m))
                        .sum::<f64>()
                })
                .sum::<f64>()
        })
        .sum();
    Ok(total)
}

/// Natural log of a WSS value, floored at [`WSS_FLOOR`].
#[inline]
pub(crate) fn ln_wss(w: f64) -> f64 {
    w.max(WSS_FLOOR).ln()
}

/// Interior k with the largest second difference of `ln W(k)`.
///
/// Working on the log curve measures relative drops, so one huge early
/// decrease does not mask a later sharp bend. Needs three consecutive k.
pub(crate) fn elbow(ks: &[usize], wss: &[f64]) -> Option<usize> {
    if ks.len() < 3 {
        return None;
    }
    let logs: Vec<f64> = wss.iter().map(|&w| ln_wss(w)).collect();
    let mut best: Option<(usize, f64)> = None;
    for i in 1..ks.len() - 1 {
        let bend = logs[i - 1] - 2.0 * logs[i] + logs[i + 1];
        match best {
            Some((_, b)) if bend <= b => {}
            _ => best = Some((ks[i], bend)),
        }
    }
    best.map(|(k, _)| k)
}

/// Hartigan's index `(W(k)/W(k+1) − 1)·(n − k − 1)`.
pub(crate) fn hartigan(w_k: f64, w_next: f64, n: usize, k: usize) -> f64 {
    let factor = n.saturating_sub(k + 1) as f64;
    if w_next > 0.0 {
        (w_k / w_next - 1.0) * factor
    } else if w_k > 0.0 && factor > 0.0 {
        f64::INFINITY
    } else {
        0.0
    }
}
