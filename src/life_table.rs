//! actuarial life-table columns derived from a fitted survival curve
//!
//! only rows w/ at least one event take part. within a stratum the rows are
//! folded left to right carrying (previous survival, previous time, running
//! life), starting from (1, 0, 0). strata never share lag state.
//!
//! zero-width intervals and zero times are not errors: the affected columns
//! come out as ±inf / NaN and are left that way.

use ndarray::{Array1, ArrayView1};
use crate::strata;

/// derived columns for one event row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LifeTableRow {
    pub hazard: f64,
    pub density: f64,
    pub mid_int: f64,
    pub life: f64,
    pub proplife: f64,
}

impl LifeTableRow {
    /// sentinel for rows that carry no life-table values
    pub const NOT_APPLICABLE: Self = Self {
        hazard: f64::NAN,
        density: f64::NAN,
        mid_int: f64::NAN,
        life: f64::NAN,
        proplife: f64::NAN,
    };
}

#[derive(Debug, Clone, Copy)]
struct Lag {
    survival: f64,
    time: f64,
    life: f64,
}

const START: Lag = Lag { survival: 1.0, time: 0.0, life: 0.0 };

/// derive the life-table rows for one stratum's event rows, in time order
pub fn derive(times: &[f64], survival: &[f64]) -> Vec<LifeTableRow> {
    times
        .iter()
        .zip(survival)
        .scan(START, |lag, (&time, &surv)| {
            let delta = time - lag.time;
            let life = lag.life + delta * (3.0 * surv - lag.survival) / 2.0;
            let row = LifeTableRow {
                hazard: (lag.survival / surv).ln() / delta,
                density: (lag.survival - surv) / delta,
                mid_int: (time + lag.time) / 2.0,
                life,
                proplife: life / time,
            };
            *lag = Lag { survival: surv, time, life };
            Some(row)
        })
        .collect()
}

/// life-table columns aligned w/ the full fitted table.
///
/// rows w/o events hold `LifeTableRow::NOT_APPLICABLE`.
#[derive(Debug, Clone, PartialEq)]
pub struct LifeColumns {
    pub hazard: Array1<f64>,
    pub density: Array1<f64>,
    pub mid_int: Array1<f64>,
    pub life: Array1<f64>,
    pub proplife: Array1<f64>,
}

impl LifeColumns {
    /// run `derive` over each stratum block of the fitted table
    pub fn build(
        time: ArrayView1<f64>,
        survival: ArrayView1<f64>,
        n_events: ArrayView1<f64>,
        labels: &[usize],
    ) -> Self {
        let n = time.len();
        let mut rows = vec![LifeTableRow::NOT_APPLICABLE; n];

        for (label, range) in strata::blocks(labels) {
            let event_rows: Vec<usize> = range.filter(|&i| n_events[i] > 0.0).collect();
            let times: Vec<f64> = event_rows.iter().map(|&i| time[i]).collect();
            let surv: Vec<f64> = event_rows.iter().map(|&i| survival[i]).collect();

            let derived = derive(&times, &surv);
            let degenerate = derived
                .iter()
                .filter(|r| !(r.hazard.is_finite() && r.density.is_finite() && r.proplife.is_finite()))
                .count();
            if degenerate > 0 {
                log::warn!(
                    "stratum {label}: {degenerate} of {} event rows have non-finite hazard/density/proplife",
                    derived.len()
                );
            }

            for (i, row) in event_rows.into_iter().zip(derived) {
                rows[i] = row;
            }
        }

        Self {
            hazard: rows.iter().map(|r| r.hazard).collect(),
            density: rows.iter().map(|r| r.density).collect(),
            mid_int: rows.iter().map(|r| r.mid_int).collect(),
            life: rows.iter().map(|r| r.life).collect(),
            proplife: rows.iter().map(|r| r.proplife).collect(),
        }
    }
}
