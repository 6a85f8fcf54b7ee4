use thiserror::Error;

/// Recoverable indicator failures.
///
/// Reading an undefined band value is not represented here: that is a caller
/// bug and panics at the index site (see `OffsetSeries`).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IndicatorError {
    #[error("insufficient data: required {required} bars, got {got}")]
    InsufficientData { required: usize, got: usize },

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, IndicatorError>;
