use construye_catalog::OptionId;
use thiserror::Error;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Malformed or missing brief field, reported verbatim to the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    pub field: String,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EstimationError {
    /// The option has no rooms to cost
    #[error("option {} has no rooms to estimate", .option.as_str())]
    EmptyLayout { option: OptionId },
}

/// Every failure `generate_plan` can report
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("invalid brief: {0}")]
    Validation(#[from] ValidationError),

    #[error("estimation failed: {0}")]
    Estimation(#[from] EstimationError),
}

impl EngineError {
    /// Stable machine-readable code for error envelopes
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::Estimation(_) => "estimation_error",
        }
    }
}
