// =============================================================================
// Hypotest Core Library
// =============================================================================
//
// Entry point for the pure Rust hypothesis-testing library. It holds a
// catalog of statistical tests, each described by its assumptions and the
// variables it expects, and a dispatcher that runs a test by its short code.
//
// STRUCTURE:
// ----------
//   - catalog:    Test descriptors, the built-in TOML catalog, filtering
//   - dispatch:   Samples, run options, validation and results
//   - routines:   The statistical functions behind each catalog entry
//   - inference:  Shared p-value, interval and reporting helpers
//   - error:      Error types used throughout the library
//
// FOR MAINTAINERS:
// ----------------
// When adding a new test:
//   1. Implement the routine in the matching `routines` submodule, with tests
//   2. Add a `Routine` variant and wire it up in `Routine::invoke`
//   3. Add an entry to `data/catalog.toml`
//   4. Update the Python bindings in the `hypotest` crate if needed
//
// =============================================================================

pub mod catalog;
pub mod dispatch;
pub mod error;
pub mod inference;
pub mod routines;

// Re-export commonly used items at the top level for convenience
pub use catalog::{
    AnalysisArity, Catalog, CatalogFilter, MinSampleSize, Status, TestDescriptor, VariableType,
};
pub use dispatch::{
    run, Dispatcher, ReferenceDistribution, RunOptions, Sample, SampleSizeAdvisory, TestResult,
};
pub use error::{HypotestError, Result, RoutineError};
pub use inference::{significance_stars, Alternative};
pub use routines::correlation::KendallVariant;
pub use routines::{ConfidenceInterval, Dof, Routine, RoutineOutput};
