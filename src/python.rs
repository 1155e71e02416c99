//! Python bindings (`_rust_fast_cluster`).

use numpy::{IntoPyArray, PyArray2};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::error::Error;

impl From<Error> for PyErr {
    fn from(err: Error) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

/// Hierarchical clustering of a condensed distance vector. Returns the
/// (n - 1) x 4 linkage matrix as a float64 array.
#[pyfunction]
#[pyo3(name = "linkage", signature = (y, method = "single"))]
fn linkage_py<'py>(
    py: Python<'py>,
    y: Vec<f64>,
    method: &str,
) -> PyResult<Bound<'py, PyArray2<f64>>> {
    let z = py.allow_threads(|| crate::linkage(&y, method))?;
    Ok(z.into_pyarray_bound(py))
}

#[pymodule]
fn _rust_fast_cluster(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(linkage_py, m)?)?;
    Ok(())
}
