use log::{debug, trace, warn};
use crate::{
    confidence::ConfidenceLevel,
    data::{ColumnSpec, Frame, SurvivalData},
    error::Result,
    fitter::{ConfidenceType, CurveFitter, Estimator, FitOptions, ProductLimitFitter, VarianceEstimator},
    strata,
    summary::Summary,
    table::SurvivalTable,
};

/// survival curve + life table in one go
#[derive(Debug, Clone)]
pub struct LifeTableModel<F = ProductLimitFitter> {
    options: FitOptions, // conf_level as given, normalized at fit time
    fitter: F,
}

impl Default for LifeTableModel {
    fn default() -> Self {
        Self {
            options: FitOptions::default(),
            fitter: ProductLimitFitter::new(),
        }
    }
}

impl LifeTableModel {
    /// new model w/ the product-limit fitter and defaults
    pub fn new() -> Self {
        Self::default()
    }
}

impl<F: CurveFitter> LifeTableModel<F> {
    /// swap in a different curve fitter
    pub fn with_fitter<G: CurveFitter>(self, fitter: G) -> LifeTableModel<G> {
        LifeTableModel { options: self.options, fitter }
    }

    /// confidence level - values above 1 are percentages (95 == 0.95)
    pub fn with_conf_level(mut self, level: f64) -> Self {
        self.options.conf_level = level;
        self
    }

    pub fn with_conf_type(mut self, conf_type: ConfidenceType) -> Self {
        self.options.conf_type = conf_type;
        self
    }

    pub fn with_estimator(mut self, estimator: Estimator) -> Self {
        self.options.estimator = estimator;
        self
    }

    pub fn with_variance(mut self, variance: VarianceEstimator) -> Self {
        self.options.variance = variance;
        self
    }

    /// replace all fitter options at once (e.g. deserialized from config)
    pub fn with_options(mut self, options: FitOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &FitOptions {
        &self.options
    }

    /// the confidence level the fitter will actually see
    pub fn conf_level(&self) -> ConfidenceLevel {
        ConfidenceLevel::normalize(self.options.conf_level)
    }

    /// fit the curve, then derive cumulative hazard, groups and life-table columns
    pub fn fit(&self, data: &SurvivalData) -> Result<SurvivalTable> {
        let options = FitOptions {
            conf_level: self.conf_level().value(),
            ..self.options.clone()
        };
        let weights = data.prepared_weights();

        debug!(
            "fitting {} observations ({} events) in {} strata, conf_level={}",
            data.n_samples(),
            data.n_events(),
            data.n_strata(),
            options.conf_level
        );

        let points = self.fitter.fit(data, weights.as_ref().map(|w| w.view()), &options)?;
        let labels = strata::assign_labels(&points, data.n_strata())?;

        for (label, range) in strata::blocks(&labels) {
            trace!("stratum {label}: {} fitted points", range.len());
        }

        let levels = data.is_stratified().then(|| data.levels());
        let table = SurvivalTable::assemble(&points, labels, levels);

        let zero_survival = table.cum_hazard().iter().filter(|h| h.is_infinite()).count();
        if zero_survival > 0 {
            warn!("{zero_survival} rows have zero survival, cumulative hazard is +inf there");
        }
        debug!(
            "fitted table: {} rows, {} event rows",
            table.n_rows(),
            table.life_table_rows().count()
        );

        Ok(table)
    }

    /// fit straight from a named-column table
    pub fn fit_frame(&self, frame: &Frame, spec: &ColumnSpec) -> Result<SurvivalTable> {
        let data = SurvivalData::from_frame(frame, spec)?;
        self.fit(&data)
    }

    /// median survival per stratum at this model's confidence level
    pub fn summary(&self, table: &SurvivalTable) -> Summary {
        Summary::compute(table, self.conf_level().value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::ArrayView1;
    use approx::assert_relative_eq;
    use crate::{
        error::SurvError,
        fitter::FittedPoint,
    };

    fn create_test_data() -> SurvivalData {
        let times = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        let events = vec![true, false, true, true, false, true, true, false];
        SurvivalData::new(times, events).unwrap()
    }

    /// hands back points w/o stratum tags, like a fitter that only concatenates blocks
    struct UntaggedFitter;

    impl CurveFitter for UntaggedFitter {
        fn fit(
            &self,
            data: &SurvivalData,
            weights: Option<ArrayView1<f64>>,
            options: &FitOptions,
        ) -> Result<Vec<FittedPoint>> {
            let mut points = ProductLimitFitter::new().fit(data, weights, options)?;
            for p in &mut points {
                p.stratum = None;
            }
            Ok(points)
        }
    }

    #[test]
    fn test_model_creation() {
        let model = LifeTableModel::new()
            .with_conf_level(90.0)
            .with_conf_type(ConfidenceType::Plain)
            .with_estimator(Estimator::FlemingHarrington);

        assert_eq!(model.options().conf_level, 90.0);
        assert_relative_eq!(model.conf_level().value(), 0.9, epsilon = 1e-12);
        assert_eq!(model.options().conf_type, ConfidenceType::Plain);
        assert_eq!(model.options().estimator, Estimator::FlemingHarrington);
        assert_eq!(model.options().variance, VarianceEstimator::Greenwood);
    }

    #[test]
    fn test_percentage_conf_level_same_bounds() {
        let data = create_test_data();
        let a = LifeTableModel::new().with_conf_level(95.0).fit(&data).unwrap();
        let b = LifeTableModel::new().with_conf_level(0.95).fit(&data).unwrap();
        assert_eq!(a.column("lower"), b.column("lower"));
        assert_eq!(a.column("upper"), b.column("upper"));
    }

    #[test]
    fn test_invalid_conf_level_error() {
        let err = LifeTableModel::new().with_conf_level(150.0).fit(&create_test_data()).unwrap_err();
        assert!(matches!(err, SurvError::InvalidConfidenceLevel { .. }));
    }

    #[test]
    fn test_untagged_fitter_still_labels_strata() {
        let data = SurvivalData::new(vec![3.0, 1.0, 2.0, 4.0, 1.5], vec![true; 5])
            .unwrap()
            .with_strata(vec!["x", "y", "x", "y", "y"])
            .unwrap();

        let tagged = LifeTableModel::new().fit(&data).unwrap();
        let untagged = LifeTableModel::new().with_fitter(UntaggedFitter).fit(&data).unwrap();

        assert_eq!(tagged.groups(), untagged.groups());
        assert_eq!(tagged.groups().unwrap(), ["x", "x", "y", "y", "y"]);
    }

    #[test]
    fn test_untagged_fitter_mismatch_is_loud() {
        // stratum "y" has a single time above x's last time, no reset to see
        let data = SurvivalData::new(vec![1.0, 2.0, 9.0], vec![true; 3])
            .unwrap()
            .with_strata(vec!["x", "x", "y"])
            .unwrap();

        let err = LifeTableModel::new().with_fitter(UntaggedFitter).fit(&data).unwrap_err();
        assert_eq!(err, SurvError::StratumMismatch { detected: 1, expected: 2 });

        // tagged default fitter gets it right
        let table = LifeTableModel::new().fit(&data).unwrap();
        assert_eq!(table.groups().unwrap(), ["x", "x", "y"]);
    }

    #[test]
    fn test_fit_frame_missing_column() {
        let frame = Frame::new()
            .with_column("time", vec![1.0, 2.0])
            .with_column("status", vec![true, false]);
        let spec = ColumnSpec::new("time", "dead");

        let err = LifeTableModel::new().fit_frame(&frame, &spec).unwrap_err();
        assert_eq!(err, SurvError::missing_column("dead"));
    }

    #[test]
    fn test_summary_uses_normalized_level() {
        let model = LifeTableModel::new().with_conf_level(90.0);
        let table = model.fit(&create_test_data()).unwrap();
        let summary = model.summary(&table);
        assert_relative_eq!(summary.conf_level, 0.9, epsilon = 1e-12);
        assert_eq!(summary.strata.len(), 1);
        assert_eq!(summary.strata[0].group, None);
    }
}
