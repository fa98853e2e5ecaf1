//! Error taxonomy for a single analysis run.

use thiserror::Error;

/// Failure of an analysis request.
///
/// `Validation` is a caller fault (bad input, no partial result).
/// `Configuration` is a server-side setup fault such as a location that has
/// no rate-constant entry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    /// A facility field is malformed or out of range.
    #[error("invalid `{field}`: {reason}")]
    Validation {
        /// Name of the offending input field.
        field: &'static str,
        /// Human-readable constraint description.
        reason: String,
    },

    /// Rate constants could not be resolved.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl AnalysisError {
    pub(crate) fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// Short machine-readable kind, used in API error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "ValidationError",
            Self::Configuration(_) => "ConfigurationError",
        }
    }
}

/// The IRR root-finder could not produce a rate.
///
/// Never fails an analysis; the financial result reports `irr` as absent.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ConvergenceError {
    /// NPV has the same sign at both ends of the search bracket.
    #[error("no sign change in NPV between {low} and {high}")]
    NoSignChange {
        /// Lower bracket rate.
        low: f64,
        /// Upper bracket rate.
        high: f64,
    },

    /// The bracket did not shrink below tolerance within the iteration budget.
    #[error("IRR did not converge within {iterations} iterations")]
    IterationBudget {
        /// Iterations spent.
        iterations: usize,
    },
}
