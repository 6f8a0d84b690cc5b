//! # km life table
//!
//! kaplan-meier survival curves for right-censored data, plus the stuff you
//! actually tabulate or plot afterwards
//!
//! ## what you get
//!
//! - product-limit (or fleming-harrington) survival w/ pointwise confidence bands
//! - cumulative hazard `-ln S(t)`
//! - optional strata, each fitted and labeled on its own
//! - optional case weights (censored rows never carry weight)
//! - life-table columns at event times: hazard, density, mid-interval time,
//!   cumulative life lived and proportion of life lived
//! - median survival per stratum
//!
//! ## quick start
//!
//! ```rust
//! use km_life_table::{LifeTableModel, SurvivalData};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let times = vec![1.0, 2.0, 4.0, 5.0, 7.0, 8.0];
//! let events = vec![true, true, true, false, true, false]; // false = censored
//! let arm = vec!["ctl", "trt", "ctl", "trt", "ctl", "trt"];
//!
//! let data = SurvivalData::new(times, events)?.with_strata(arm)?;
//!
//! let table = LifeTableModel::new()
//!     .with_conf_level(95.0) // same as 0.95
//!     .fit(&data)?;
//!
//! for row in table.life_table_rows() {
//!     let life = row.life.unwrap();
//!     println!("{:?} t={} S={:.3} hazard={:.3}", row.group, row.time, row.survival, life.hazard);
//! }
//! # Ok(())
//! # }
//! ```

pub mod confidence;
pub mod data;
pub mod error;
pub mod fitter;
pub mod hazard;
pub mod life_table;
pub mod model;
pub mod strata;
pub mod summary;
pub mod table;

pub use data::{Column, ColumnSpec, Frame, SurvivalData};
pub use error::{Result, SurvError};
pub use fitter::{ConfidenceType, CurveFitter, Estimator, FitOptions, FittedPoint, ProductLimitFitter, VarianceEstimator};
pub use life_table::LifeTableRow;
pub use model::LifeTableModel;
pub use summary::Summary;
pub use table::{SurvivalRow, SurvivalTable, TableKind};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_functionality() {
        let times = vec![1.0, 2.0, 4.0];
        let events = vec![true; 3];

        let data = SurvivalData::new(times, events).unwrap();
        let table = LifeTableModel::new().fit(&data).unwrap();

        assert_eq!(table.n_rows(), 3);
        assert_eq!(table.kind(), TableKind::Survival);
        assert_eq!(table.life_table_rows().count(), 3);
    }
}
