use thiserror::Error;

pub type Result<T> = std::result::Result<T, SurvError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SurvError {
    #[error("column not found in input table: {column}")]
    MissingColumn { column: String },

    #[error("bad column {column}: {message}")]
    InvalidColumn { column: String, message: String },

    #[error("dimensions don't match: {message}")]
    InvalidDimensions { message: String },

    #[error("survival data is broken: {message}")]
    InvalidSurvivalData { message: String },

    #[error("confidence level must be in (0, 1) after normalization, got {level}")]
    InvalidConfidenceLevel { level: f64 },

    #[error("stratum blocks don't line up: detected {detected} blocks in fitted curve but {expected} distinct strata")]
    StratumMismatch { detected: usize, expected: usize },
}

impl SurvError {
    pub fn missing_column(column: impl Into<String>) -> Self {
        Self::MissingColumn { column: column.into() }
    }

    pub fn invalid_column(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidColumn {
            column: column.into(),
            message: message.into(),
        }
    }

    pub fn invalid_dimensions(message: impl Into<String>) -> Self {
        Self::InvalidDimensions { message: message.into() }
    }

    pub fn invalid_survival_data(message: impl Into<String>) -> Self {
        Self::InvalidSurvivalData { message: message.into() }
    }
}
