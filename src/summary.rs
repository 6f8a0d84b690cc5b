use crate::{
    strata,
    table::{SurvivalRow, SurvivalTable},
};

/// per-stratum headline numbers
#[derive(Debug, Clone, PartialEq)]
pub struct StratumSummary {
    pub group: Option<String>,
    pub n_start: f64,        // initial risk set
    pub events: f64,         // total events
    pub median: Option<f64>, // median survival time, None if S never reaches 0.5
    pub median_lower: Option<f64>,
    pub median_upper: Option<f64>,
}

/// median survival etc for every stratum of a fitted table
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub conf_level: f64,
    pub strata: Vec<StratumSummary>,
}

impl Summary {
    pub fn compute(table: &SurvivalTable, conf_level: f64) -> Self {
        let strata = strata::blocks(table.labels())
            .into_iter()
            .map(|(label, _)| {
                let rows: Vec<_> = table.stratum_rows(label).collect();
                let times: Vec<f64> = rows.iter().map(|r| r.time).collect();
                let curve = |f: fn(&SurvivalRow<'_>) -> f64| -> Vec<f64> { rows.iter().map(f).collect() };

                StratumSummary {
                    group: table.levels().get(label).cloned(),
                    n_start: rows.first().map_or(0.0, |r| r.n_risk),
                    events: rows.iter().map(|r| r.n_events).sum(),
                    median: crossing_time(&times, &curve(|r| r.survival)),
                    median_lower: crossing_time(&times, &curve(|r| r.lower)),
                    median_upper: crossing_time(&times, &curve(|r| r.upper)),
                }
            })
            .collect();

        Self { conf_level, strata }
    }

    /// print out the per-stratum table
    pub fn print(&self) {
        let pct = (self.conf_level * 100.0).round();
        println!("{:<16} {:>10} {:>10} {:>10} {:>10} {:>10}",
                 "group", "n", "events", "median", format!("{pct}%LCL"), format!("{pct}%UCL"));
        println!("{:-<71}", "");

        let fmt = |v: Option<f64>| v.map_or_else(|| "NA".to_string(), |v| format!("{v:.4}"));
        for s in &self.strata {
            println!("{:<16} {:>10.2} {:>10.2} {:>10} {:>10} {:>10}",
                     s.group.as_deref().unwrap_or("all"),
                     s.n_start,
                     s.events,
                     fmt(s.median),
                     fmt(s.median_lower),
                     fmt(s.median_upper));
        }
    }
}

/// first time the curve drops to 0.5 or below. when it sits exactly on 0.5,
/// take the midpoint between that time and the time it next drops.
fn crossing_time(times: &[f64], curve: &[f64]) -> Option<f64> {
    const TOL: f64 = 1e-12;
    let i = curve.iter().position(|&s| s <= 0.5 + TOL)?;

    if (curve[i] - 0.5).abs() > TOL {
        return Some(times[i]);
    }
    match (i + 1..curve.len()).find(|&j| curve[j] < curve[i] - TOL) {
        Some(j) => Some((times[i] + times[j]) / 2.0),
        None => Some(times[i]),
    }
}

/// step-function lookup of survival at `time` within stratum `label`.
/// 1 before the first fitted time.
pub fn survival_at(table: &SurvivalTable, label: usize, time: f64) -> f64 {
    table
        .stratum_rows(label)
        .take_while(|r| r.time <= time)
        .last()
        .map_or(1.0, |r| r.survival)
}
