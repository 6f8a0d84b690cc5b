use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};
use crate::{
    confidence::{ConfidenceLevel, NormalQuantile, StandardNormal, DEFAULT_CONF_LEVEL},
    data::SurvivalData,
    error::{Result, SurvError},
};

/// Survival estimator variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Estimator {
    /// product-limit: S(t) = Π(1 - d/n)
    #[default]
    KaplanMeier,
    /// exp of the Nelson-Aalen cumulative hazard: S(t) = exp(-Σ d/n)
    FlemingHarrington,
}

/// Variance estimator for log-survival
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VarianceEstimator {
    /// Σ d / (n (n - d))
    #[default]
    Greenwood,
    /// Σ d / n²
    Tsiatis,
}

/// Scale on which pointwise confidence intervals are built
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConfidenceType {
    #[default]
    Log,
    LogLog,
    Plain,
    None,
}

/// Options handed to the curve fitter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitOptions {
    pub conf_level: f64,
    pub conf_type: ConfidenceType,
    pub estimator: Estimator,
    pub variance: VarianceEstimator,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            conf_level: DEFAULT_CONF_LEVEL,
            conf_type: ConfidenceType::Log,
            estimator: Estimator::KaplanMeier,
            variance: VarianceEstimator::Greenwood,
        }
    }
}

/// One fitted time point as reported by a curve fitter
#[derive(Debug, Clone, PartialEq)]
pub struct FittedPoint {
    pub time: f64,
    pub n_risk: f64,
    pub n_censored: f64,
    pub n_events: f64,
    pub survival: f64,
    pub std_err: f64,
    pub lower: f64,
    pub upper: f64,
    /// source stratum (index into `SurvivalData::levels`), if the fitter tags it
    pub stratum: Option<usize>,
}

/// Survival curve fitter interface.
///
/// Implementations return one block of points per stratum, strata in
/// `SurvivalData::levels` order, each block sorted by ascending time.
/// `weights` are the already prepared weights (censored rows zeroed).
pub trait CurveFitter {
    fn fit(
        &self,
        data: &SurvivalData,
        weights: Option<ArrayView1<f64>>,
        options: &FitOptions,
    ) -> Result<Vec<FittedPoint>>;
}

/// Product-limit / Fleming-Harrington fitter w/ pointwise confidence bands
#[derive(Debug, Clone)]
pub struct ProductLimitFitter<Q = StandardNormal> {
    quantile: Q,
}

impl ProductLimitFitter<StandardNormal> {
    pub fn new() -> Self {
        Self { quantile: StandardNormal }
    }
}

impl Default for ProductLimitFitter<StandardNormal> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Q: NormalQuantile> ProductLimitFitter<Q> {
    /// use a different normal-quantile provider
    pub fn with_quantile(quantile: Q) -> Self {
        Self { quantile }
    }

    /// Fit one stratum given its rows. Unique times include censoring-only times.
    fn fit_stratum(
        &self,
        data: &SurvivalData,
        rows: &[usize],
        weights: Option<ArrayView1<f64>>,
        options: &FitOptions,
        z: f64,
        stratum: Option<usize>,
    ) -> Vec<FittedPoint> {
        let times = data.times();
        let events = data.events();

        let mut obs: Vec<(f64, bool, f64)> = rows
            .iter()
            .map(|&i| (times[i], events[i], weights.map_or(1.0, |w| w[i])))
            .collect();
        obs.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut at_risk: f64 = obs.iter().map(|o| o.2).sum();
        let mut survival = 1.0;
        let mut cum_hazard = 0.0; // Nelson-Aalen, only used by FH
        let mut var_log = 0.0;
        let mut points = Vec::new();

        let mut i = 0;
        while i < obs.len() {
            let time = obs[i].0;
            let mut n_events = 0.0;
            let mut n_censored = 0.0;

            let mut j = i;
            while j < obs.len() && obs[j].0 == time {
                if obs[j].1 {
                    n_events += obs[j].2;
                } else {
                    n_censored += obs[j].2;
                }
                j += 1;
            }

            let n_risk = at_risk;
            if n_events > 0.0 && n_risk > 0.0 {
                match options.estimator {
                    Estimator::KaplanMeier => survival *= 1.0 - n_events / n_risk,
                    Estimator::FlemingHarrington => {
                        cum_hazard += n_events / n_risk;
                        survival = (-cum_hazard).exp();
                    }
                }
                var_log += match options.variance {
                    VarianceEstimator::Greenwood => n_events / (n_risk * (n_risk - n_events)),
                    VarianceEstimator::Tsiatis => n_events / (n_risk * n_risk),
                };
            }

            let (lower, upper) = interval(survival, var_log, z, options.conf_type);
            points.push(FittedPoint {
                time,
                n_risk,
                n_censored,
                n_events,
                survival,
                std_err: survival * var_log.sqrt(),
                lower,
                upper,
                stratum,
            });

            at_risk -= n_events + n_censored;
            i = j;
        }

        points
    }
}

impl<Q: NormalQuantile> CurveFitter for ProductLimitFitter<Q> {
    fn fit(
        &self,
        data: &SurvivalData,
        weights: Option<ArrayView1<f64>>,
        options: &FitOptions,
    ) -> Result<Vec<FittedPoint>> {
        if let Some(w) = weights {
            if w.len() != data.n_samples() {
                return Err(SurvError::invalid_dimensions(format!(
                    "weights len ({}) != n_samples ({})",
                    w.len(),
                    data.n_samples()
                )));
            }
        }

        let z = ConfidenceLevel::exact(options.conf_level).critical_value(&self.quantile)?;

        let mut points = Vec::with_capacity(data.n_samples());
        for k in 0..data.n_strata() {
            let rows = data.stratum_rows(k);
            let tag = data.is_stratified().then_some(k);
            points.extend(self.fit_stratum(data, &rows, weights, options, z, tag));
        }
        Ok(points)
    }
}

/// pointwise (lower, upper) around `survival` given var(log S)
fn interval(survival: f64, var_log: f64, z: f64, conf_type: ConfidenceType) -> (f64, f64) {
    if conf_type == ConfidenceType::None || survival == 0.0 {
        return (f64::NAN, f64::NAN);
    }
    if var_log == 0.0 {
        return (survival, survival);
    }

    let se_log = var_log.sqrt();
    match conf_type {
        ConfidenceType::Log => {
            let width = z * se_log;
            (survival * (-width).exp(), (survival * width.exp()).min(1.0))
        }
        ConfidenceType::LogLog => {
            if survival == 1.0 {
                return (survival, survival);
            }
            let log_neg_log = (-survival.ln()).ln();
            let scaled = se_log / survival.ln();
            let a = (-(log_neg_log + z * scaled).exp()).exp();
            let b = (-(log_neg_log - z * scaled).exp()).exp();
            (a.min(b), a.max(b))
        }
        ConfidenceType::Plain => {
            let se = survival * se_log;
            ((survival - z * se).max(0.0), (survival + z * se).min(1.0))
        }
        ConfidenceType::None => (f64::NAN, f64::NAN),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn create_test_data() -> SurvivalData {
        let times = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let events = vec![true, false, true, true, false];
        SurvivalData::new(times, events).unwrap()
    }

    fn fit(data: &SurvivalData, options: &FitOptions) -> Vec<FittedPoint> {
        let weights = data.prepared_weights();
        ProductLimitFitter::new()
            .fit(data, weights.as_ref().map(|w| w.view()), options)
            .unwrap()
    }

    #[test]
    fn test_kaplan_meier_values() {
        let points = fit(&create_test_data(), &FitOptions::default());
        assert_eq!(points.len(), 5);

        let survival: Vec<f64> = points.iter().map(|p| p.survival).collect();
        let expected = [0.8, 0.8, 0.8 * 2.0 / 3.0, 0.8 * 2.0 / 3.0 * 0.5, 0.8 * 2.0 / 3.0 * 0.5];
        for (s, e) in survival.iter().zip(expected) {
            assert_relative_eq!(*s, e, epsilon = 1e-12);
        }

        let n_risk: Vec<f64> = points.iter().map(|p| p.n_risk).collect();
        assert_eq!(n_risk, vec![5.0, 4.0, 3.0, 2.0, 1.0]);
        assert_eq!(points[1].n_censored, 1.0);
        assert_eq!(points[1].n_events, 0.0);
        assert!(points.iter().all(|p| p.stratum.is_none()));
    }

    #[test]
    fn test_greenwood_std_err() {
        let points = fit(&create_test_data(), &FitOptions::default());
        // 0.8 * sqrt(1 / (5 * 4))
        assert_relative_eq!(points[0].std_err, 0.8 * 0.05_f64.sqrt(), epsilon = 1e-12);

        let z = 1.959963984540054;
        assert_relative_eq!(points[0].lower, 0.8 * (-z * 0.05_f64.sqrt()).exp(), epsilon = 1e-6);
        assert_relative_eq!(points[0].upper, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_bounds_contain_survival() {
        for conf_type in [ConfidenceType::Log, ConfidenceType::LogLog, ConfidenceType::Plain] {
            let options = FitOptions { conf_type, ..FitOptions::default() };
            for p in fit(&create_test_data(), &options) {
                assert!(p.lower <= p.survival + 1e-12, "{conf_type:?}: {p:?}");
                assert!(p.survival <= p.upper + 1e-12, "{conf_type:?}: {p:?}");
                assert!(p.lower >= 0.0 && p.upper <= 1.0);
            }
        }
    }

    #[test]
    fn test_no_conf_type_gives_nan_bounds() {
        let options = FitOptions { conf_type: ConfidenceType::None, ..FitOptions::default() };
        let points = fit(&create_test_data(), &options);
        assert!(points.iter().all(|p| p.lower.is_nan() && p.upper.is_nan()));
    }

    #[test]
    fn test_fleming_harrington() {
        let data = SurvivalData::new(vec![1.0, 2.0], vec![true, true]).unwrap();
        let options = FitOptions {
            estimator: Estimator::FlemingHarrington,
            variance: VarianceEstimator::Tsiatis,
            ..FitOptions::default()
        };
        let points = fit(&data, &options);
        assert_relative_eq!(points[0].survival, (-0.5_f64).exp(), epsilon = 1e-12);
        assert_relative_eq!(points[1].survival, (-1.5_f64).exp(), epsilon = 1e-12);
        // tsiatis: 1/4 + 1/1
        assert_relative_eq!(points[1].std_err, points[1].survival * 1.25_f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_weighted_censored_rows_contribute_nothing() {
        let data = SurvivalData::new(vec![1.0, 2.0, 3.0], vec![true, false, true])
            .unwrap()
            .with_weights(vec![2.0, 5.0, 1.0])
            .unwrap();
        let points = fit(&data, &FitOptions::default());

        assert_eq!(points.len(), 3);
        assert_eq!(points[0].n_risk, 3.0);
        assert_relative_eq!(points[0].survival, 1.0 / 3.0, epsilon = 1e-12);
        assert_eq!(points[1].n_censored, 0.0);
        assert_eq!(points[2].survival, 0.0);
        assert!(points[2].lower.is_nan());
    }

    #[test]
    fn test_strata_tagged_in_level_order() {
        let data = SurvivalData::new(vec![4.0, 1.0, 2.0, 3.0, 5.0], vec![true; 5])
            .unwrap()
            .with_strata(vec!["b", "a", "b", "a", "a"])
            .unwrap();
        let points = fit(&data, &FitOptions::default());

        let tags: Vec<Option<usize>> = points.iter().map(|p| p.stratum).collect();
        assert_eq!(tags, vec![Some(0), Some(0), Some(1), Some(1), Some(1)]);
        let times: Vec<f64> = points.iter().map(|p| p.time).collect();
        assert_eq!(times, vec![2.0, 4.0, 1.0, 3.0, 5.0]);
    }

    /// hands the probability straight back as the critical value
    struct EchoQuantile;

    impl NormalQuantile for EchoQuantile {
        fn quantile(&self, p: f64) -> f64 {
            p
        }
    }

    #[test]
    fn test_bounds_follow_supplied_quantile() {
        let data = create_test_data();
        let weights = data.prepared_weights();
        let points = ProductLimitFitter::with_quantile(EchoQuantile)
            .fit(&data, weights.as_ref().map(|w| w.view()), &FitOptions::default())
            .unwrap();

        // z = 1 - (1 - 0.95) / 2
        let z = 0.975;
        let s = 0.8 * 2.0 / 3.0;
        let se_log = (1.0 / 20.0 + 1.0 / 6.0_f64).sqrt();
        assert_relative_eq!(points[2].survival, s, epsilon = 1e-12);
        assert_relative_eq!(points[2].lower, s * (-z * se_log).exp(), epsilon = 1e-12);
        assert_relative_eq!(points[2].upper, s * (z * se_log).exp(), epsilon = 1e-12);

        // std err doesn't depend on the provider
        let default = fit(&data, &FitOptions::default());
        assert_eq!(points[2].std_err, default[2].std_err);
        assert!(default[2].lower < points[2].lower);
    }

    #[test]
    fn test_invalid_conf_level_error() {
        let options = FitOptions { conf_level: 1.5, ..FitOptions::default() };
        let result = ProductLimitFitter::new().fit(&create_test_data(), None, &options);
        assert!(matches!(result, Err(SurvError::InvalidConfidenceLevel { .. })));
    }

    #[test]
    fn test_options_from_json() {
        let options: FitOptions =
            serde_json::from_str(r#"{"conf_type": "log-log", "estimator": "fleming-harrington"}"#).unwrap();
        assert_eq!(options.conf_type, ConfidenceType::LogLog);
        assert_eq!(options.estimator, Estimator::FlemingHarrington);
        assert_eq!(options.conf_level, 0.95);
        assert_eq!(options.variance, VarianceEstimator::Greenwood);
    }
}
