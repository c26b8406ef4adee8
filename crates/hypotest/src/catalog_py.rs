// =============================================================================
// Catalog Python Bindings
// =============================================================================
//
// Read-only view of the built-in test catalog.
// =============================================================================

use pyo3::prelude::*;
use pyo3::types::PyDict;

use hypotest_core::{AnalysisArity, Catalog, CatalogFilter, TestDescriptor, VariableType};

use crate::to_py_err;

/// Metadata describing one statistical test.
#[pyclass(name = "TestDescriptor")]
#[derive(Clone)]
pub struct PyTestDescriptor {
    pub(crate) inner: TestDescriptor,
}

#[pymethods]
impl PyTestDescriptor {
    #[getter]
    fn code(&self) -> &str {
        &self.inner.code
    }

    #[getter]
    fn name(&self) -> &str {
        &self.inner.name
    }

    #[getter]
    fn statistic_name(&self) -> &str {
        &self.inner.statistic_name
    }

    #[getter]
    fn hypothesis_category(&self) -> &str {
        &self.inner.hypothesis_category
    }

    #[getter]
    fn null_hypothesis(&self) -> &str {
        &self.inner.null_hypothesis
    }

    #[getter]
    fn analysis_arity(&self) -> &'static str {
        self.inner.analysis_arity.as_str()
    }

    #[getter]
    fn assumes_normality(&self) -> bool {
        self.inner.assumes_normality
    }

    #[getter]
    fn assumes_homoscedasticity(&self) -> bool {
        self.inner.assumes_homoscedasticity
    }

    #[getter]
    fn is_parametric(&self) -> bool {
        self.inner.is_parametric
    }

    #[getter]
    fn supports_small_samples(&self) -> bool {
        self.inner.supports_small_samples
    }

    /// Minimum sample size, or None when not applicable.
    #[getter]
    fn min_sample_size(&self) -> Option<usize> {
        self.inner.min_sample_size.get()
    }

    #[getter]
    fn x_variable_type(&self) -> &'static str {
        self.inner.x_variable_type.as_str()
    }

    #[getter]
    fn y_variable_type(&self) -> &'static str {
        self.inner.y_variable_type.as_str()
    }

    #[getter]
    fn backing_function_reference(&self) -> &'static str {
        self.inner.backing_function_reference.as_str()
    }

    #[getter]
    fn status(&self) -> &'static str {
        self.inner.status.as_str()
    }

    #[getter]
    fn description(&self) -> Option<&str> {
        self.inner.description.as_deref()
    }

    #[getter]
    fn assumptions(&self) -> Option<&str> {
        self.inner.assumptions.as_deref()
    }

    #[getter]
    fn use_when(&self) -> Option<&str> {
        self.inner.use_when.as_deref()
    }

    #[getter]
    fn reference_url(&self) -> Option<&str> {
        self.inner.reference_url.as_deref()
    }

    /// All fields as a plain dict.
    fn to_dict<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        let d = &self.inner;
        let dict = PyDict::new_bound(py);
        dict.set_item("code", &d.code)?;
        dict.set_item("name", &d.name)?;
        dict.set_item("statistic_name", &d.statistic_name)?;
        dict.set_item("hypothesis_category", &d.hypothesis_category)?;
        dict.set_item("null_hypothesis", &d.null_hypothesis)?;
        dict.set_item("analysis_arity", d.analysis_arity.as_str())?;
        dict.set_item("assumes_normality", d.assumes_normality)?;
        dict.set_item("assumes_homoscedasticity", d.assumes_homoscedasticity)?;
        dict.set_item("is_parametric", d.is_parametric)?;
        dict.set_item("supports_small_samples", d.supports_small_samples)?;
        dict.set_item("min_sample_size", d.min_sample_size.get())?;
        dict.set_item("x_variable_type", d.x_variable_type.as_str())?;
        dict.set_item("y_variable_type", d.y_variable_type.as_str())?;
        dict.set_item("backing_function_reference", d.backing_function_reference.as_str())?;
        dict.set_item("status", d.status.as_str())?;
        dict.set_item("description", d.description.as_deref())?;
        dict.set_item("assumptions", d.assumptions.as_deref())?;
        dict.set_item("use_when", d.use_when.as_deref())?;
        dict.set_item("reference_url", d.reference_url.as_deref())?;
        Ok(dict)
    }

    fn __repr__(&self) -> String {
        format!("TestDescriptor(code='{}', name='{}')", self.inner.code, self.inner.name)
    }
}

/// Look up a test by its code.
///
/// Raises NotFoundError for an unknown code.
#[pyfunction]
#[pyo3(name = "lookup")]
pub fn lookup_py(code: &str) -> PyResult<PyTestDescriptor> {
    let catalog = Catalog::builtin().map_err(to_py_err)?;
    let descriptor = catalog.lookup(code).map_err(to_py_err)?;
    Ok(PyTestDescriptor { inner: descriptor.clone() })
}

/// List catalog tests, optionally filtered.
///
/// # Arguments
/// * `arity` - "univariate" or "bivariate"
/// * `x_type`, `y_type` - Declared variable type, e.g. "continuous", "nominal"
/// * `sample_size` - Keep tests whose minimum sample size this satisfies
/// * `parametric` - Keep only parametric (True) or non-parametric (False) tests
/// * `category` - Hypothesis category, case-insensitive
#[pyfunction]
#[pyo3(
    name = "list_tests",
    signature = (arity=None, x_type=None, y_type=None, sample_size=None, parametric=None, category=None)
)]
pub fn list_tests_py(
    arity: Option<&str>,
    x_type: Option<&str>,
    y_type: Option<&str>,
    sample_size: Option<usize>,
    parametric: Option<bool>,
    category: Option<String>,
) -> PyResult<Vec<PyTestDescriptor>> {
    let filter = CatalogFilter {
        arity: arity
            .map(str::parse::<AnalysisArity>)
            .transpose()
            .map_err(to_py_err)?,
        x_type: x_type
            .map(str::parse::<VariableType>)
            .transpose()
            .map_err(to_py_err)?,
        y_type: y_type
            .map(str::parse::<VariableType>)
            .transpose()
            .map_err(to_py_err)?,
        sample_size,
        parametric,
        category,
        ..Default::default()
    };

    let catalog = Catalog::builtin().map_err(to_py_err)?;
    Ok(catalog
        .list(&filter)
        .into_iter()
        .map(|d| PyTestDescriptor { inner: d.clone() })
        .collect())
}
