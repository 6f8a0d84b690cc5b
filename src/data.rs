use std::collections::HashMap;

use ndarray::{Array1, ArrayView1};
use crate::error::{Result, SurvError};

/// one named input column
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Float(Array1<f64>),
    Bool(Vec<bool>),
    Text(Vec<String>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Float(values) => values.len(),
            Column::Bool(values) => values.len(),
            Column::Text(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn kind(&self) -> &'static str {
        match self {
            Column::Float(_) => "numeric",
            Column::Bool(_) => "boolean",
            Column::Text(_) => "text",
        }
    }
}

impl From<Vec<f64>> for Column {
    fn from(values: Vec<f64>) -> Self {
        Column::Float(Array1::from(values))
    }
}

impl From<Array1<f64>> for Column {
    fn from(values: Array1<f64>) -> Self {
        Column::Float(values)
    }
}

impl From<Vec<bool>> for Column {
    fn from(values: Vec<bool>) -> Self {
        Column::Bool(values)
    }
}

impl From<Vec<String>> for Column {
    fn from(values: Vec<String>) -> Self {
        Column::Text(values)
    }
}

impl From<Vec<&str>> for Column {
    fn from(values: Vec<&str>) -> Self {
        Column::Text(values.into_iter().map(str::to_owned).collect())
    }
}

/// tiny named-column table - whatever the caller loaded their data into
#[derive(Debug, Clone, Default)]
pub struct Frame {
    columns: Vec<(String, Column)>, // insertion order kept
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    /// add a column, replacing any existing column w/ the same name
    pub fn with_column(mut self, name: impl Into<String>, column: impl Into<Column>) -> Self {
        let name = name.into();
        let column = column.into();
        match self.columns.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = column,
            None => self.columns.push((name, column)),
        }
        self
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|(n, _)| n == name).map(|(_, c)| c)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }

    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, |(_, c)| c.len())
    }
}

/// which columns of a `Frame` hold time, event, strata and weight
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub time: String,
    pub event: String,
    pub strata: Option<String>,
    pub weight: Option<String>,
}

impl ColumnSpec {
    pub fn new(time: impl Into<String>, event: impl Into<String>) -> Self {
        Self {
            time: time.into(),
            event: event.into(),
            strata: None,
            weight: None,
        }
    }

    pub fn with_strata(mut self, column: impl Into<String>) -> Self {
        self.strata = Some(column.into());
        self
    }

    pub fn with_weight(mut self, column: impl Into<String>) -> Self {
        self.weight = Some(column.into());
        self
    }

    /// every column name this spec needs, in time/event/strata/weight order
    pub fn required(&self) -> Vec<&str> {
        let mut names = vec![self.time.as_str(), self.event.as_str()];
        names.extend(self.strata.as_deref());
        names.extend(self.weight.as_deref());
        names
    }
}

/// validated right-censored observations, optionally stratified and weighted
#[derive(Debug, Clone)]
pub struct SurvivalData {
    times: Array1<f64>,           // time to event/censoring
    events: Vec<bool>,            // true = event, false = censored
    strata: Option<Vec<usize>>,   // per-row index into `levels`
    levels: Vec<String>,          // distinct strata, first-appearance order
    weights: Option<Array1<f64>>, // raw caller weights
}

impl SurvivalData {
    /// make new survival data from raw vecs
    pub fn new(times: Vec<f64>, events: Vec<bool>) -> Result<Self> {
        if events.len() != times.len() {
            return Err(SurvError::invalid_dimensions(format!(
                "times len ({}) != events len ({})",
                times.len(),
                events.len()
            )));
        }

        if times.is_empty() {
            return Err(SurvError::invalid_survival_data("no observations"));
        }

        // zero is allowed, survfit-style
        if times.iter().any(|&t| t < 0.0 || !t.is_finite()) {
            return Err(SurvError::invalid_survival_data(
                "survival times must be non-negative & finite",
            ));
        }

        Ok(Self {
            times: Array1::from(times),
            events,
            strata: None,
            levels: Vec::new(),
            weights: None,
        })
    }

    /// attach a stratifying variable, one value per observation
    pub fn with_strata<S: ToString>(mut self, strata: Vec<S>) -> Result<Self> {
        if strata.len() != self.n_samples() {
            return Err(SurvError::invalid_dimensions(format!(
                "strata len ({}) != n_samples ({})",
                strata.len(),
                self.n_samples()
            )));
        }

        let mut seen: HashMap<String, usize> = HashMap::new();
        let mut levels = Vec::new();
        let codes = strata
            .iter()
            .map(|value| {
                let value = value.to_string();
                *seen.entry(value.clone()).or_insert_with(|| {
                    levels.push(value);
                    levels.len() - 1
                })
            })
            .collect();

        self.strata = Some(codes);
        self.levels = levels;
        Ok(self)
    }

    /// attach case weights (non-negative)
    pub fn with_weights(mut self, weights: Vec<f64>) -> Result<Self> {
        if weights.len() != self.n_samples() {
            return Err(SurvError::invalid_dimensions(format!(
                "weights len ({}) != n_samples ({})",
                weights.len(),
                self.n_samples()
            )));
        }

        if weights.iter().any(|&w| w < 0.0 || !w.is_finite()) {
            return Err(SurvError::invalid_survival_data(
                "weights must be non-negative & finite",
            ));
        }

        self.weights = Some(Array1::from(weights));
        Ok(self)
    }

    /// pull observations out of a named-column table.
    ///
    /// every column named by `spec` is checked before anything is read, so a
    /// typo in a column name fails fast w/ that name in the error.
    pub fn from_frame(frame: &Frame, spec: &ColumnSpec) -> Result<Self> {
        if let Some(missing) = spec.required().into_iter().find(|name| frame.column(name).is_none()) {
            return Err(SurvError::missing_column(missing));
        }

        let times = float_column(frame, &spec.time)?;
        let events = event_column(frame, &spec.event)?;
        let mut data = Self::new(times, events)?;

        if let Some(name) = &spec.strata {
            data = data.with_strata(label_column(frame, name)?)?;
        }
        if let Some(name) = &spec.weight {
            data = data.with_weights(float_column(frame, name)?)?;
        }

        Ok(data)
    }

    /// how many observations
    pub fn n_samples(&self) -> usize {
        self.times.len()
    }

    /// how many observed events
    pub fn n_events(&self) -> usize {
        self.events.iter().filter(|&&e| e).count()
    }

    /// event/censoring times
    pub fn times(&self) -> ArrayView1<'_, f64> {
        self.times.view()
    }

    /// event indicators (true = event, false = censored)
    pub fn events(&self) -> &[bool] {
        &self.events
    }

    /// raw weights as supplied
    pub fn weights(&self) -> Option<ArrayView1<'_, f64>> {
        self.weights.as_ref().map(Array1::view)
    }

    /// per-row stratum codes, indexing into `levels()`
    pub fn strata(&self) -> Option<&[usize]> {
        self.strata.as_deref()
    }

    /// distinct stratum values in order of first appearance
    pub fn levels(&self) -> &[String] {
        &self.levels
    }

    pub fn is_stratified(&self) -> bool {
        self.strata.is_some()
    }

    /// number of strata to fit (1 when unstratified)
    pub fn n_strata(&self) -> usize {
        if self.is_stratified() { self.levels.len() } else { 1 }
    }

    /// row indices belonging to stratum `k`, in input order
    pub fn stratum_rows(&self, k: usize) -> Vec<usize> {
        match &self.strata {
            Some(codes) => codes
                .iter()
                .enumerate()
                .filter_map(|(i, &c)| (c == k).then_some(i))
                .collect(),
            None => (0..self.n_samples()).collect(),
        }
    }

    /// weights w/ censored rows zeroed: `weight * event`.
    /// `None` when no weights were supplied (every row counts once).
    pub fn prepared_weights(&self) -> Option<Array1<f64>> {
        self.weights.as_ref().map(|weights| {
            weights
                .iter()
                .zip(&self.events)
                .map(|(&w, &e)| if e { w } else { 0.0 })
                .collect()
        })
    }
}

fn float_column(frame: &Frame, name: &str) -> Result<Vec<f64>> {
    match frame.column(name) {
        Some(Column::Float(values)) => Ok(values.to_vec()),
        Some(other) => Err(SurvError::invalid_column(
            name,
            format!("expected numeric column, got {}", other.kind()),
        )),
        None => Err(SurvError::missing_column(name)),
    }
}

fn event_column(frame: &Frame, name: &str) -> Result<Vec<bool>> {
    match frame.column(name) {
        Some(Column::Bool(values)) => Ok(values.clone()),
        Some(Column::Float(values)) => values
            .iter()
            .map(|&v| {
                if v == 1.0 {
                    Ok(true)
                } else if v == 0.0 {
                    Ok(false)
                } else {
                    Err(SurvError::invalid_column(
                        name,
                        format!("event indicator must be 0 or 1, got {v}"),
                    ))
                }
            })
            .collect(),
        Some(other) => Err(SurvError::invalid_column(
            name,
            format!("expected boolean-like column, got {}", other.kind()),
        )),
        None => Err(SurvError::missing_column(name)),
    }
}

fn label_column(frame: &Frame, name: &str) -> Result<Vec<String>> {
    match frame.column(name) {
        Some(Column::Text(values)) => Ok(values.clone()),
        Some(Column::Bool(values)) => Ok(values.iter().map(ToString::to_string).collect()),
        Some(Column::Float(values)) => values
            .iter()
            .map(|&v| {
                if v.is_finite() {
                    Ok(v.to_string())
                } else {
                    Err(SurvError::invalid_column(name, "stratum value must be finite"))
                }
            })
            .collect(),
        None => Err(SurvError::missing_column(name)),
    }
}
