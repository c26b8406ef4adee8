// =============================================================================
// Dispatch Python Bindings
// =============================================================================
//
// `run(code, x, y=None, ...)` resolves a catalog test and executes it.
// Samples may be 1-D float64 numpy arrays, lists of floats, or lists of
// strings (categorical).
// =============================================================================

use std::collections::BTreeMap;

use numpy::PyReadonlyArray1;
use pyo3::exceptions::PyTypeError;
use pyo3::prelude::*;
use pyo3::types::PyDict;

use hypotest_core::{
    Alternative, Dispatcher, Dof, KendallVariant, ReferenceDistribution, RunOptions, Sample,
    TestResult,
};

use crate::catalog_py::PyTestDescriptor;
use crate::to_py_err;

/// Outcome of a dispatched test.
#[pyclass(name = "TestResult")]
#[derive(Clone)]
pub struct PyTestResult {
    inner: TestResult,
}

#[pymethods]
impl PyTestResult {
    #[getter]
    fn code(&self) -> &str {
        self.inner.code()
    }

    #[getter]
    fn statistic(&self) -> f64 {
        self.inner.statistic()
    }

    #[getter]
    fn pvalue(&self) -> f64 {
        self.inner.pvalue()
    }

    #[getter]
    fn alpha(&self) -> f64 {
        self.inner.alpha
    }

    /// Degrees of freedom: a float, a (df1, df2) tuple, or None.
    #[getter]
    fn dof(&self, py: Python<'_>) -> Option<PyObject> {
        self.inner.dof().map(|dof| match dof {
            Dof::One(df) => df.into_py(py),
            Dof::Two(df1, df2) => (df1, df2).into_py(py),
        })
    }

    /// (low, high) interval at level 1 − alpha, when the test provides one.
    #[getter]
    fn confidence_interval(&self) -> Option<(f64, f64)> {
        self.inner.confidence_interval().map(|ci| (ci.low, ci.high))
    }

    /// Extra values reported by the routine (z, effect sizes, critical values).
    #[getter]
    fn auxiliary(&self) -> BTreeMap<&'static str, f64> {
        self.inner.output.auxiliary.clone()
    }

    /// Sample-size warning text, or None.
    #[getter]
    fn advisory(&self) -> Option<String> {
        self.inner.advisory.map(|a| a.to_string())
    }

    #[getter]
    fn descriptor(&self) -> PyTestDescriptor {
        PyTestDescriptor { inner: self.inner.descriptor.clone() }
    }

    fn is_significant(&self) -> bool {
        self.inner.is_significant()
    }

    fn stars(&self) -> &'static str {
        self.inner.stars()
    }

    /// APA-style summary, e.g. "t(18)=-7.39, p<.001".
    fn report(&self) -> String {
        self.inner.report()
    }

    fn interpretation(&self) -> Option<String> {
        self.inner.interpretation()
    }

    fn to_dict<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        let dict = PyDict::new_bound(py);
        dict.set_item("code", self.inner.code())?;
        dict.set_item("statistic", self.inner.statistic())?;
        dict.set_item("pvalue", self.inner.pvalue())?;
        dict.set_item("dof", self.dof(py))?;
        dict.set_item("confidence_interval", self.confidence_interval())?;
        dict.set_item("auxiliary", self.auxiliary())?;
        dict.set_item("significant", self.inner.is_significant())?;
        dict.set_item("report", self.inner.report())?;
        dict.set_item("advisory", self.advisory())?;
        Ok(dict)
    }

    fn __repr__(&self) -> String {
        format!("TestResult({})", self.inner)
    }
}

/// Convert a Python sequence into a core sample.
fn extract_sample(obj: &Bound<'_, PyAny>, position: &str) -> PyResult<Sample> {
    if let Ok(array) = obj.extract::<PyReadonlyArray1<'_, f64>>() {
        return Ok(Sample::Numeric(array.as_array().to_owned()));
    }
    if let Ok(values) = obj.extract::<Vec<f64>>() {
        return Ok(Sample::from(values));
    }
    if let Ok(labels) = obj.extract::<Vec<String>>() {
        return Ok(Sample::from(labels));
    }
    Err(PyTypeError::new_err(format!(
        "{} must be a 1-D float64 array, a list of floats, or a list of str",
        position
    )))
}

/// Run a catalog test.
///
/// # Arguments
/// * `code` - Catalog code, e.g. "t2" or "x2ind"
/// * `x`, `y` - Samples; `y` is required for bivariate tests
/// * `alpha` - Significance level, also sets the confidence level
/// * `alternative` - "two-sided", "less" or "greater"
/// * `equal_var` - Pooled (True) or Welch (False) two-sample t-test
/// * `popmean` - Hypothesized mean for the one-sample t-test
/// * `expected` - Expected frequencies for χ² goodness of fit
/// * `correction` - Yates correction for 2x2 contingency tables
/// * `reference`, `reference_params` - Reference distribution for the one-sample KS test
/// * `kendall_variant` - "b" or "c" normalization of Kendall's tau
///
/// # Returns
/// A TestResult. Raises NotFoundError, ShapeMismatchError,
/// VariableTypeMismatchError, ComputationError, or ValueError for bad options.
#[pyfunction]
#[pyo3(
    name = "run",
    signature = (
        code,
        x,
        y=None,
        alpha=0.05,
        alternative="two-sided",
        equal_var=true,
        popmean=0.0,
        expected=None,
        correction=true,
        reference="norm",
        reference_params=None,
        kendall_variant="c"
    )
)]
#[allow(clippy::too_many_arguments)]
pub fn run_py(
    py: Python<'_>,
    code: &str,
    x: &Bound<'_, PyAny>,
    y: Option<&Bound<'_, PyAny>>,
    alpha: f64,
    alternative: &str,
    equal_var: bool,
    popmean: f64,
    expected: Option<Vec<f64>>,
    correction: bool,
    reference: &str,
    reference_params: Option<Vec<f64>>,
    kendall_variant: &str,
) -> PyResult<PyTestResult> {
    let mut samples = vec![extract_sample(x, "x")?];
    if let Some(y) = y {
        samples.push(extract_sample(y, "y")?);
    }

    let options = RunOptions {
        alpha,
        alternative: alternative.parse::<Alternative>().map_err(to_py_err)?,
        equal_var,
        popmean,
        expected,
        reference: ReferenceDistribution::from_parts(
            reference,
            reference_params.as_deref().unwrap_or(&[]),
        )
        .map_err(to_py_err)?,
        correction,
        kendall_variant: kendall_variant
            .parse::<KendallVariant>()
            .map_err(to_py_err)?,
    };

    let code = code.to_string();
    let result = py.allow_threads(|| {
        Dispatcher::builtin().and_then(|d| d.run(&code, &samples, &options))
    });

    result
        .map(|inner| PyTestResult { inner })
        .map_err(to_py_err)
}
