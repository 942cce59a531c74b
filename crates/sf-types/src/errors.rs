use thiserror::Error;

/// Main error type for the StageForge system
#[derive(Error, Debug)]
pub enum StageError {
    #[error("Layout error: {0}")]
    Layout(#[from] LayoutError),

    #[error("Evaluation error: {0}")]
    Evaluation(#[from] EvaluationError),

    #[error("Optimization error: {0}")]
    Optimization(#[from] OptimizationError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors raised while turning a parameter vector into a level
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LayoutError {
    #[error("Invalid parameter shape: expected {expected} values, got {actual}")]
    InvalidParameterShape { expected: usize, actual: usize },

    #[error("Platform count mismatch: expected {expected} {kind} platforms, got {actual}")]
    CountMismatch {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Static platforms not sorted by x1: platform {index} starts at {x1} after {previous}")]
    Unsorted { index: usize, x1: f64, previous: f64 },
}

/// A candidate vector could not be scored. Recovered by the search driver
/// with a fixed penalty and never surfaced to callers.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaluationError {
    #[error("Decoding failed: {0}")]
    Layout(#[from] LayoutError),

    #[error("Score is not finite: {value}")]
    NonFiniteScore { value: f64 },
}

/// Failures of the constrained minimizer itself
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OptimizationError {
    #[error("Optimization failed: {message}")]
    NotConverged { message: String },

    #[error("Invalid problem: {message}")]
    InvalidProblem { message: String },

    #[error("Bounds for parameter {index} are inverted: [{low}, {high}]")]
    InvertedBounds { index: usize, low: f64, high: f64 },
}

/// Result type alias for StageForge operations
pub type StageResult<T> = Result<T, StageError>;

/// Macro for creating configuration errors
#[macro_export]
macro_rules! config_error {
    ($($arg:tt)*) => {
        $crate::StageError::Config(format!($($arg)*))
    };
}
