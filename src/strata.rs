//! which stratum each fitted point belongs to
//!
//! fitters that tag their points w/ a stratum index are trusted (after a
//! contiguity check). untagged output falls back to reading block starts off
//! the places where time goes backwards, and refuses to guess when the block
//! count doesn't match the number of strata.

use std::ops::Range;

use crate::{
    error::{Result, SurvError},
    fitter::FittedPoint,
};

/// stratum index per fitted point, `0..n_strata`
pub fn assign_labels(points: &[FittedPoint], n_strata: usize) -> Result<Vec<usize>> {
    let n_tagged = points.iter().filter(|p| p.stratum.is_some()).count();

    if n_tagged == 0 {
        let times: Vec<f64> = points.iter().map(|p| p.time).collect();
        return labels_from_resets(&times, n_strata);
    }

    if n_tagged != points.len() {
        return Err(SurvError::invalid_survival_data(format!(
            "fitter tagged {n_tagged} of {} points w/ a stratum",
            points.len()
        )));
    }

    let labels: Vec<usize> = points.iter().filter_map(|p| p.stratum).collect();

    if let Some(&max) = labels.iter().max() {
        if max >= n_strata {
            return Err(SurvError::StratumMismatch { detected: max + 1, expected: n_strata });
        }
    }

    if labels.windows(2).any(|w| w[1] < w[0]) {
        return Err(SurvError::invalid_survival_data(
            "fitted strata are not in contiguous ascending blocks",
        ));
    }

    let detected = blocks(&labels).len();
    if detected != n_strata {
        return Err(SurvError::StratumMismatch { detected, expected: n_strata });
    }

    Ok(labels)
}

/// indices where time drops below the previous time - each starts a new block
pub fn detect_boundaries(times: &[f64]) -> Vec<usize> {
    (1..times.len()).filter(|&i| times[i] < times[i - 1]).collect()
}

/// positional reconstruction: block k gets label k
pub fn labels_from_resets(times: &[f64], n_strata: usize) -> Result<Vec<usize>> {
    let boundaries = detect_boundaries(times);
    let detected = if times.is_empty() { 0 } else { boundaries.len() + 1 };

    if detected != n_strata {
        return Err(SurvError::StratumMismatch { detected, expected: n_strata });
    }

    let n = times.len();
    let mut labels = Vec::with_capacity(n);
    let mut start = 0;
    for (k, &end) in boundaries.iter().chain(std::iter::once(&n)).enumerate() {
        labels.extend(std::iter::repeat_n(k, end - start));
        start = end;
    }
    Ok(labels)
}

/// contiguous (label, row range) runs in a label vector
pub fn blocks(labels: &[usize]) -> Vec<(usize, Range<usize>)> {
    let mut out = Vec::new();
    let mut start = 0;
    for i in 1..=labels.len() {
        if i == labels.len() || labels[i] != labels[start] {
            out.push((labels[start], start..i));
            start = i;
        }
    }
    out
}
