// =============================================================================
// Hypotest Python Bindings
// =============================================================================
//
// Bridge between Rust and Python using PyO3. It wraps `hypotest-core` and
// exposes it as the extension module `_hypotest`.
//
// HOW THIS WORKS:
// ---------------
// 1. Python passes samples as numpy arrays, lists of floats, or lists of str
// 2. They are converted into core `Sample`s and handed to the dispatcher
// 3. Results come back as `TestResult` objects; errors map onto the
//    exception classes declared below
//
// STRUCTURE:
// ----------
// - catalog_py:   `TestDescriptor` class, `lookup`, `list_tests`
// - dispatch_py:  `TestResult` class, `run`
//
// FOR MAINTAINERS:
// ----------------
// When adding new functionality:
// 1. Implement the logic in `hypotest-core` first
// 2. Create a Python wrapper in the matching `*_py` module
// 3. Add it to the module in the `_hypotest` function at the bottom
//
// =============================================================================

use pyo3::create_exception;
use pyo3::exceptions::{PyKeyError, PyOSError, PyValueError};
use pyo3::prelude::*;

use hypotest_core::HypotestError;

mod catalog_py;
mod dispatch_py;

// =============================================================================
// Exceptions
// =============================================================================

create_exception!(_hypotest, NotFoundError, PyKeyError, "Unknown test code.");
create_exception!(
    _hypotest,
    ShapeMismatchError,
    PyValueError,
    "Number of samples does not match the test's arity."
);
create_exception!(
    _hypotest,
    VariableTypeMismatchError,
    PyValueError,
    "A sample's kind does not fit the declared variable type."
);
create_exception!(
    _hypotest,
    ComputationError,
    PyValueError,
    "The statistical routine could not compute a result."
);

/// Map a core error onto the matching Python exception.
pub(crate) fn to_py_err(err: HypotestError) -> PyErr {
    let message = err.to_string();
    match err {
        HypotestError::NotFound(_) => NotFoundError::new_err(message),
        HypotestError::ShapeMismatch { .. } => ShapeMismatchError::new_err(message),
        HypotestError::VariableTypeMismatch { .. } => VariableTypeMismatchError::new_err(message),
        HypotestError::Computation(_) => ComputationError::new_err(message),
        HypotestError::Io(_) => PyOSError::new_err(message),
        HypotestError::InvalidOption(_) | HypotestError::Catalog(_) => {
            PyValueError::new_err(message)
        }
    }
}

// =============================================================================
// Module Definition
// =============================================================================

#[pymodule]
fn _hypotest(m: &Bound<'_, PyModule>) -> PyResult<()> {
    let py = m.py();

    // Exceptions
    m.add("NotFoundError", py.get_type_bound::<NotFoundError>())?;
    m.add("ShapeMismatchError", py.get_type_bound::<ShapeMismatchError>())?;
    m.add(
        "VariableTypeMismatchError",
        py.get_type_bound::<VariableTypeMismatchError>(),
    )?;
    m.add("ComputationError", py.get_type_bound::<ComputationError>())?;

    // Catalog
    m.add_class::<catalog_py::PyTestDescriptor>()?;
    m.add_function(wrap_pyfunction!(catalog_py::lookup_py, m)?)?;
    m.add_function(wrap_pyfunction!(catalog_py::list_tests_py, m)?)?;

    // Dispatch
    m.add_class::<dispatch_py::PyTestResult>()?;
    m.add_function(wrap_pyfunction!(dispatch_py::run_py, m)?)?;

    Ok(())
}
