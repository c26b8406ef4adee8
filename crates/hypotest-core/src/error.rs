// =============================================================================
// Error Types
// =============================================================================
//
// Two layers of errors live here:
//
//   - RoutineError: raised by the statistical routines themselves (empty
//     input, mismatched lengths, degenerate data). The dispatcher never
//     inspects or repairs these; it hands them back to the caller as-is.
//
//   - HypotestError: everything the catalog and dispatcher can report,
//     including a transparent wrapper around RoutineError.
//
// =============================================================================

use thiserror::Error;

use crate::catalog::VariableType;

/// Failures raised while computing a test statistic.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RoutineError {
    /// Input had no observations (or too few to compute anything).
    #[error("Empty input: {0}")]
    EmptyInput(String),

    /// Two inputs that must line up did not.
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// Input contained a value the routine cannot use (NaN, negative count, ...).
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// Data is well-formed but the statistic is undefined (zero variance,
    /// a single group, an empty margin, ...).
    #[error("Degenerate data: {0}")]
    Degenerate(String),
}

/// Errors surfaced by the catalog and the dispatcher.
#[derive(Debug, Error)]
pub enum HypotestError {
    /// The requested test code is not in the catalog.
    #[error("Unknown test code '{0}'")]
    NotFound(String),

    /// Number of samples does not match the test's analysis arity.
    #[error("Test '{code}' expects {expected} sample(s), got {actual}")]
    ShapeMismatch {
        code: String,
        expected: usize,
        actual: usize,
    },

    /// A sample's kind (numeric vs categorical) does not fit the declared
    /// variable type.
    #[error("Test '{code}' expects a {expected} {position} variable")]
    VariableTypeMismatch {
        code: String,
        position: &'static str,
        expected: VariableType,
    },

    /// A run option is out of range.
    #[error("Invalid option: {0}")]
    InvalidOption(String),

    /// The catalog source could not be parsed or failed validation.
    #[error("Invalid catalog: {0}")]
    Catalog(String),

    #[error("Failed to read catalog: {0}")]
    Io(#[from] std::io::Error),

    /// Propagated unchanged from the routine.
    #[error(transparent)]
    Computation(#[from] RoutineError),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, HypotestError>;
