use ndarray::{Array1, ArrayView1};
use serde::{Serialize, Serializer};
use crate::{
    fitter::FittedPoint,
    hazard::cumulative_hazard,
    life_table::{LifeColumns, LifeTableRow},
    strata,
};

/// type discriminator carried by every result table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    Survival,
}

/// fitted survival table w/ cumulative hazard, stratum labels and life-table columns.
///
/// one row per fitted time point, strata back to back. the life-table
/// columns (`hazard` .. `proplife`) are NaN on rows w/o events.
///
/// serialized columns write NaN as `null` and ±inf as `"Inf"` / `"-Inf"`,
/// so an infinite `cum_haz` at S = 0 can't be mistaken for a missing value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurvivalTable {
    #[serde(rename = "type")]
    kind: TableKind,
    #[serde(serialize_with = "column")]
    time: Array1<f64>,
    #[serde(serialize_with = "column")]
    n: Array1<f64>,
    #[serde(serialize_with = "column")]
    cens: Array1<f64>,
    #[serde(serialize_with = "column")]
    dead: Array1<f64>,
    #[serde(serialize_with = "column")]
    surv: Array1<f64>,
    #[serde(serialize_with = "column")]
    se: Array1<f64>,
    #[serde(serialize_with = "column")]
    lower: Array1<f64>,
    #[serde(serialize_with = "column")]
    upper: Array1<f64>,
    #[serde(serialize_with = "column")]
    cum_haz: Array1<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    groups: Option<Vec<String>>,
    #[serde(serialize_with = "column")]
    hazard: Array1<f64>,
    #[serde(serialize_with = "column")]
    density: Array1<f64>,
    #[serde(serialize_with = "column")]
    mid_int: Array1<f64>,
    #[serde(serialize_with = "column")]
    life: Array1<f64>,
    #[serde(serialize_with = "column")]
    proplife: Array1<f64>,
    #[serde(skip)]
    labels: Vec<usize>,
    #[serde(skip)]
    levels: Vec<String>,
}

// plain json arrays for plotting consumers. NaN ("not applicable") is null,
// ±inf is the string "Inf" / "-Inf" so it stays apart from NaN.
fn column<S: Serializer>(values: &Array1<f64>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(values.iter().map(|&v| Cell(v)))
}

struct Cell(f64);

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let v = self.0;
        if v.is_nan() {
            serializer.serialize_none()
        } else if v.is_infinite() {
            serializer.serialize_str(if v > 0.0 { "Inf" } else { "-Inf" })
        } else {
            serializer.serialize_f64(v)
        }
    }
}

/// one row of a `SurvivalTable`
#[derive(Debug, Clone, PartialEq)]
pub struct SurvivalRow<'a> {
    pub time: f64,
    pub n_risk: f64,
    pub n_censored: f64,
    pub n_events: f64,
    pub survival: f64,
    pub std_err: f64,
    pub lower: f64,
    pub upper: f64,
    pub cum_hazard: f64,
    pub group: Option<&'a str>,
    /// `None` on rows w/o events
    pub life: Option<LifeTableRow>,
}

impl SurvivalTable {
    /// output column names when unstratified, in order
    pub const COLUMNS: [&'static str; 14] = [
        "time", "n", "cens", "dead", "surv", "se", "lower", "upper", "cum_haz",
        "hazard", "density", "mid_int", "life", "proplife",
    ];

    /// assemble the table from fitted points and their stratum labels.
    ///
    /// `levels` names the strata (index = label); pass `None` for an
    /// unstratified fit, in which case no `groups` column is produced.
    pub fn assemble(points: &[FittedPoint], labels: Vec<usize>, levels: Option<&[String]>) -> Self {
        let pick = |f: fn(&FittedPoint) -> f64| -> Array1<f64> { points.iter().map(f).collect() };

        let time = pick(|p| p.time);
        let surv = pick(|p| p.survival);
        let dead = pick(|p| p.n_events);
        let cum_haz = cumulative_hazard(surv.view());
        let life = LifeColumns::build(time.view(), surv.view(), dead.view(), &labels);

        let groups = levels.map(|levels| labels.iter().map(|&k| levels[k].clone()).collect());

        Self {
            kind: TableKind::Survival,
            n: pick(|p| p.n_risk),
            cens: pick(|p| p.n_censored),
            se: pick(|p| p.std_err),
            lower: pick(|p| p.lower),
            upper: pick(|p| p.upper),
            time,
            dead,
            surv,
            cum_haz,
            groups,
            hazard: life.hazard,
            density: life.density,
            mid_int: life.mid_int,
            life: life.life,
            proplife: life.proplife,
            labels,
            levels: levels.map(<[String]>::to_vec).unwrap_or_default(),
        }
    }

    pub fn kind(&self) -> TableKind {
        self.kind
    }

    pub fn n_rows(&self) -> usize {
        self.time.len()
    }

    pub fn is_stratified(&self) -> bool {
        self.groups.is_some()
    }

    /// column names in output order, `groups` included when stratified
    pub fn column_names(&self) -> Vec<&'static str> {
        let mut names = Self::COLUMNS.to_vec();
        if self.is_stratified() {
            names.insert(9, "groups");
        }
        names
    }

    /// numeric column by output name
    pub fn column(&self, name: &str) -> Option<ArrayView1<'_, f64>> {
        let col = match name {
            "time" => &self.time,
            "n" => &self.n,
            "cens" => &self.cens,
            "dead" => &self.dead,
            "surv" => &self.surv,
            "se" => &self.se,
            "lower" => &self.lower,
            "upper" => &self.upper,
            "cum_haz" => &self.cum_haz,
            "hazard" => &self.hazard,
            "density" => &self.density,
            "mid_int" => &self.mid_int,
            "life" => &self.life,
            "proplife" => &self.proplife,
            _ => return None,
        };
        Some(col.view())
    }

    pub fn time(&self) -> ArrayView1<'_, f64> {
        self.time.view()
    }

    pub fn survival(&self) -> ArrayView1<'_, f64> {
        self.surv.view()
    }

    pub fn cum_hazard(&self) -> ArrayView1<'_, f64> {
        self.cum_haz.view()
    }

    /// per-row stratum label, `None` when unstratified
    pub fn groups(&self) -> Option<&[String]> {
        self.groups.as_deref()
    }

    /// stratum names, index = label (empty when unstratified)
    pub fn levels(&self) -> &[String] {
        &self.levels
    }

    /// per-row stratum index (all zero when unstratified)
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    pub fn row(&self, i: usize) -> SurvivalRow<'_> {
        let life = (self.dead[i] > 0.0).then(|| LifeTableRow {
            hazard: self.hazard[i],
            density: self.density[i],
            mid_int: self.mid_int[i],
            life: self.life[i],
            proplife: self.proplife[i],
        });

        SurvivalRow {
            time: self.time[i],
            n_risk: self.n[i],
            n_censored: self.cens[i],
            n_events: self.dead[i],
            survival: self.surv[i],
            std_err: self.se[i],
            lower: self.lower[i],
            upper: self.upper[i],
            cum_hazard: self.cum_haz[i],
            group: self.groups.as_ref().map(|g| g[i].as_str()),
            life,
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = SurvivalRow<'_>> {
        (0..self.n_rows()).map(move |i| self.row(i))
    }

    /// only the rows w/ events - the life table proper
    pub fn life_table_rows(&self) -> impl Iterator<Item = SurvivalRow<'_>> {
        self.rows().filter(|r| r.life.is_some())
    }

    /// rows of stratum `label`
    pub fn stratum_rows(&self, label: usize) -> impl Iterator<Item = SurvivalRow<'_>> {
        strata::blocks(&self.labels)
            .into_iter()
            .filter(move |(l, _)| *l == label)
            .flat_map(|(_, range)| range)
            .map(move |i| self.row(i))
    }
}
