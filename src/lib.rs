//! Expected-goals kernel: shot geometry, logistic xG model, fitting and evaluation.

pub mod artifact;
pub mod config;
pub mod evaluation;
pub mod features;
pub mod fit;
pub mod geometry;
pub mod model;
pub mod pipeline;
pub mod player_totals;
pub mod report_export;
pub mod shot;
pub mod surface;
pub mod synthetic;
pub mod wyscout;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum XgError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("dimension mismatch: expected {expected} coefficients, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("fit did not converge after {iterations} iterations (last change {last_change:e})")]
    NonConvergence { iterations: usize, last_change: f64 },

    #[error("undefined division: {0}")]
    DivisionUndefined(String),

    #[error("singular information matrix at iteration {iteration}")]
    SingularSystem { iteration: usize },

    #[error("unknown feature name: {0}")]
    UnknownFeature(String),

    #[error("feature mismatch: model expects [{expected}], got [{actual}]")]
    FeatureMismatch { expected: String, actual: String },
}

pub type Result<T> = std::result::Result<T, XgError>;
