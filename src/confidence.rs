use std::f64::consts::SQRT_2;

use statrs::function::erf::erfc_inv;
use crate::error::{Result, SurvError};

/// default two-sided confidence level
pub const DEFAULT_CONF_LEVEL: f64 = 0.95;

/// anything that can hand back standard-normal quantiles
pub trait NormalQuantile {
    /// inverse cdf of N(0, 1) at probability `p` in (0, 1)
    fn quantile(&self, p: f64) -> f64;
}

/// N(0, 1) quantiles via statrs' inverse complementary error function
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardNormal;

impl NormalQuantile for StandardNormal {
    fn quantile(&self, p: f64) -> f64 {
        -SQRT_2 * erfc_inv(2.0 * p)
    }
}

/// confidence level after percentage normalization
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceLevel(f64);

impl ConfidenceLevel {
    /// values above 1 are read as percentages (95 -> 0.95).
    /// nothing is validated here, a nonsense level only fails once a fitter
    /// asks for its critical value.
    pub fn normalize(raw: f64) -> Self {
        if raw > 1.0 { Self(raw / 100.0) } else { Self(raw) }
    }

    /// wrap a level that was already normalized upstream
    pub fn exact(level: f64) -> Self {
        Self(level)
    }

    pub fn value(self) -> f64 {
        self.0
    }

    pub fn is_valid(self) -> bool {
        self.0 > 0.0 && self.0 < 1.0
    }

    /// two-sided critical value z = Φ⁻¹(1 - (1 - level) / 2)
    pub fn critical_value(self, provider: &dyn NormalQuantile) -> Result<f64> {
        if !self.is_valid() {
            return Err(SurvError::InvalidConfidenceLevel { level: self.0 });
        }
        Ok(provider.quantile(1.0 - (1.0 - self.0) / 2.0))
    }
}

impl Default for ConfidenceLevel {
    fn default() -> Self {
        Self(DEFAULT_CONF_LEVEL)
    }
}
