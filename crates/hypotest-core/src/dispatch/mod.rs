// =============================================================================
// Test Dispatch
// =============================================================================
//
// Resolves a test code to its descriptor and runs the backing routine:
//
//   1. Validate the run options
//   2. Look up the descriptor            → NotFound
//   3. Check the number of samples       → ShapeMismatch
//   4. Check each sample's kind          → VariableTypeMismatch
//   5. Compare sample size to the declared minimum (advisory only)
//   6. Invoke the routine                → Computation (routine error as-is)
//   7. Attach the descriptor to the result
//
// The dispatcher holds no state beyond a borrowed catalog, so a single
// instance can be shared freely across threads.
//
// =============================================================================

mod options;
mod result;

pub use options::{ReferenceDistribution, RunOptions};
pub use result::{SampleSizeAdvisory, TestResult};

use std::borrow::Cow;

use ndarray::Array1;

use crate::catalog::{Catalog, TestDescriptor, VariableType};
use crate::error::{HypotestError, Result};

// =============================================================================
// Samples
// =============================================================================

/// One variable's observations.
#[derive(Debug, Clone, PartialEq)]
pub enum Sample {
    Numeric(Array1<f64>),
    Categorical(Vec<String>),
}

impl Sample {
    pub fn len(&self) -> usize {
        match self {
            Sample::Numeric(values) => values.len(),
            Sample::Categorical(labels) => labels.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Sample::Numeric(_))
    }

    /// Numeric values, borrowed when the array is contiguous.
    pub fn numeric(&self) -> Option<Cow<'_, [f64]>> {
        match self {
            Sample::Numeric(values) => Some(match values.as_slice() {
                Some(slice) => Cow::Borrowed(slice),
                None => Cow::Owned(values.to_vec()),
            }),
            Sample::Categorical(_) => None,
        }
    }

    pub fn categorical(&self) -> Option<&[String]> {
        match self {
            Sample::Categorical(labels) => Some(labels),
            Sample::Numeric(_) => None,
        }
    }

    /// Observations as labels. Numeric values are rendered with `Display`.
    pub fn labels(&self) -> Vec<String> {
        match self {
            Sample::Categorical(labels) => labels.clone(),
            Sample::Numeric(values) => values.iter().map(|v| v.to_string()).collect(),
        }
    }

    fn is_accepted_by(&self, variable_type: VariableType) -> bool {
        match self {
            Sample::Numeric(_) => variable_type.accepts_numeric(),
            Sample::Categorical(_) => variable_type.accepts_categorical(),
        }
    }
}

impl From<Array1<f64>> for Sample {
    fn from(values: Array1<f64>) -> Self {
        Sample::Numeric(values)
    }
}

impl From<Vec<f64>> for Sample {
    fn from(values: Vec<f64>) -> Self {
        Sample::Numeric(Array1::from(values))
    }
}

impl From<&[f64]> for Sample {
    fn from(values: &[f64]) -> Self {
        Sample::Numeric(Array1::from(values.to_vec()))
    }
}

impl From<Vec<String>> for Sample {
    fn from(labels: Vec<String>) -> Self {
        Sample::Categorical(labels)
    }
}

impl From<Vec<&str>> for Sample {
    fn from(labels: Vec<&str>) -> Self {
        Sample::Categorical(labels.into_iter().map(String::from).collect())
    }
}

// =============================================================================
// Dispatcher
// =============================================================================

/// Runs catalog tests by code.
#[derive(Debug, Clone, Copy)]
pub struct Dispatcher<'c> {
    catalog: &'c Catalog,
}

impl Dispatcher<'static> {
    /// Dispatcher over the built-in catalog.
    pub fn builtin() -> Result<Self> {
        Ok(Self::new(Catalog::builtin()?))
    }
}

impl<'c> Dispatcher<'c> {
    pub fn new(catalog: &'c Catalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &'c Catalog {
        self.catalog
    }

    /// Run test `code` on `samples` (x first, then y for bivariate tests).
    pub fn run(&self, code: &str, samples: &[Sample], options: &RunOptions) -> Result<TestResult> {
        options.validate()?;
        let descriptor = self.catalog.lookup(code)?;
        log::debug!(
            "Dispatching '{}' to {} with {} sample(s)",
            code,
            descriptor.backing_function_reference,
            samples.len()
        );

        check_shape(descriptor, samples)?;
        let advisory = sample_size_advisory(descriptor, samples);

        let output = descriptor
            .backing_function_reference
            .invoke(samples, options)?;

        Ok(TestResult {
            descriptor: descriptor.clone(),
            output,
            alpha: options.alpha,
            advisory,
        })
    }
}

/// Run test `code` against the built-in catalog.
///
/// # Example
/// ```
/// use hypotest_core::{run, RunOptions, Sample};
///
/// let x = Sample::from(vec![1.0, 2.0, 3.0, 4.0, 5.0]);
/// let y = Sample::from(vec![2.0, 4.0, 6.0, 8.0, 10.0]);
/// let result = run("pearson", &[x, y], &RunOptions::default()).unwrap();
/// assert!((result.statistic() - 1.0).abs() < 1e-12);
/// ```
pub fn run(code: &str, samples: &[Sample], options: &RunOptions) -> Result<TestResult> {
    Dispatcher::builtin()?.run(code, samples, options)
}

fn check_shape(descriptor: &TestDescriptor, samples: &[Sample]) -> Result<()> {
    let expected = descriptor.analysis_arity.sample_count();
    if samples.len() != expected {
        return Err(HypotestError::ShapeMismatch {
            code: descriptor.code.clone(),
            expected,
            actual: samples.len(),
        });
    }

    for (index, (sample, position)) in samples.iter().zip(["x", "y"]).enumerate() {
        let declared = descriptor.variable_type(index);
        if !sample.is_accepted_by(declared) {
            return Err(HypotestError::VariableTypeMismatch {
                code: descriptor.code.clone(),
                position,
                expected: declared,
            });
        }
    }
    Ok(())
}

fn sample_size_advisory(
    descriptor: &TestDescriptor,
    samples: &[Sample],
) -> Option<SampleSizeAdvisory> {
    let required = descriptor.min_sample_size.get()?;
    let actual = samples.iter().map(Sample::len).min()?;
    if actual >= required {
        return None;
    }
    log::warn!(
        "Test '{}' recommends at least {} observations, got {}",
        descriptor.code,
        required,
        actual
    );
    Some(SampleSizeAdvisory { required, actual })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RoutineError;
    use ndarray::{array, s};

    fn seq(n: usize) -> Sample {
        Sample::from((1..=n).map(|v| v as f64).collect::<Vec<_>>())
    }

    #[test]
    fn test_sample_numeric_view() {
        let contiguous = Sample::Numeric(array![1.0, 2.0, 3.0, 4.0]);
        assert!(matches!(contiguous.numeric(), Some(Cow::Borrowed(_))));

        let strided = array![1.0, 2.0, 3.0, 4.0].slice(s![..;2]).to_owned();
        assert_eq!(Sample::Numeric(strided).numeric().unwrap().as_ref(), &[1.0, 3.0]);

        assert!(Sample::from(vec!["a"]).numeric().is_none());
    }

    #[test]
    fn test_sample_labels_from_numbers() {
        let sample = Sample::from(vec![1.0, 2.5]);
        assert_eq!(sample.labels(), vec!["1".to_string(), "2.5".to_string()]);
    }

    #[test]
    fn test_unknown_code() {
        let err = run("nope", &[seq(5)], &RunOptions::default()).unwrap_err();
        assert!(matches!(err, HypotestError::NotFound(_)));
    }

    #[test]
    fn test_wrong_sample_count() {
        let err = run("pearson", &[seq(30)], &RunOptions::default()).unwrap_err();
        match err {
            HypotestError::ShapeMismatch { expected, actual, .. } => {
                assert_eq!((expected, actual), (2, 1));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_categorical_into_continuous() {
        let labels = Sample::from(vec!["a", "b", "c"]);
        let err = run("shapiro", &[labels], &RunOptions::default()).unwrap_err();
        match err {
            HypotestError::VariableTypeMismatch { position, expected, .. } => {
                assert_eq!(position, "x");
                assert_eq!(expected, VariableType::Continuous);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_numeric_into_nominal() {
        let err = run("x2gof", &[seq(10)], &RunOptions::default()).unwrap_err();
        assert!(matches!(err, HypotestError::VariableTypeMismatch { .. }));
    }

    #[test]
    fn test_invalid_alpha_rejected_first() {
        let options = RunOptions { alpha: 1.5, ..Default::default() };
        let err = run("nope", &[], &options).unwrap_err();
        assert!(matches!(err, HypotestError::InvalidOption(_)));
    }

    #[test]
    fn test_advisory_below_minimum() {
        // pearson declares a minimum of 25
        let result = run("pearson", &[seq(10), seq(10)], &RunOptions::default()).unwrap();
        assert_eq!(result.advisory, Some(SampleSizeAdvisory { required: 25, actual: 10 }));
    }

    #[test]
    fn test_no_advisory_when_not_applicable() {
        let result = run("t1", &[seq(4)], &RunOptions::default()).unwrap();
        assert!(result.advisory.is_none());
    }

    #[test]
    fn test_routine_error_passed_through() {
        let constant = Sample::from(vec![3.0; 5]);
        let err = run("t1", &[constant], &RunOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            HypotestError::Computation(RoutineError::Degenerate(_))
        ));
    }

    #[test]
    fn test_result_carries_provenance() {
        let options = RunOptions { alpha: 0.01, ..Default::default() };
        let result = run("kw", &[seq(6), Sample::from(vec!["a", "a", "a", "b", "b", "b"])], &options)
            .unwrap();
        assert_eq!(result.code(), "kw");
        assert_eq!(result.alpha, 0.01);
        assert_eq!(result.descriptor.backing_function_reference.as_str(), "kruskal");
    }

    #[test]
    fn test_shared_types_are_thread_safe() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Catalog>();
        assert_send_sync::<Dispatcher<'static>>();
        assert_send_sync::<TestResult>();
    }

    #[test]
    fn test_custom_catalog() {
        let text = Catalog::builtin().unwrap().to_toml_string().unwrap();
        let catalog = Catalog::from_toml_str(&text).unwrap();
        let dispatcher = Dispatcher::new(&catalog);
        let result = dispatcher.run("t1", &[seq(5)], &RunOptions::default()).unwrap();
        assert!(result.statistic() > 0.0);
    }
}
