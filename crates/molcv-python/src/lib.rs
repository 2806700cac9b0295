//! Python boundary layer over the circular variance engine.
//!
//! This is the validating outer surface: it checks array dimensionality and
//! column counts, pads 3-column coordinates to the engine's 4-lane layout,
//! and maps engine errors to `ValueError` before any computation starts.

use ::molcv::engine::error::EngineError;
use ::molcv::workflows::cv;
use numpy::{IntoPyArray, PyArray1, PyArray2, PyReadonlyArray1, PyReadonlyArray2};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

fn engine_error_to_py(error: EngineError) -> PyErr {
    PyValueError::new_err(error.to_string())
}

/// Repacks an N×3 or N×4 position array into the engine's N×4 layout,
/// zero-filling the padding lane when it is absent.
fn packed_positions(atom_positions: &PyReadonlyArray2<'_, f32>) -> PyResult<Vec<f32>> {
    let view = atom_positions.as_array();
    let columns = view.ncols();

    if !(3..=4).contains(&columns) {
        return Err(PyValueError::new_err(
            "atom positions must have 3 or 4 columns",
        ));
    }

    let mut packed = Vec::with_capacity(view.nrows() * 4);
    for row in view.rows() {
        packed.push(row[0]);
        packed.push(row[1]);
        packed.push(row[2]);
        packed.push(if columns == 4 { row[3] } else { 0.0 });
    }

    Ok(packed)
}

/// Compute per-residue circular variance for one or more cutoff radii.
///
/// Returns a (cutoffs x residues) float32 matrix, rows in cutoff order.
#[pyfunction]
fn compute_cv<'py>(
    py: Python<'py>,
    residue_atom_counts: PyReadonlyArray1<'py, u32>,
    atom_positions: PyReadonlyArray2<'py, f32>,
    cutoffs: PyReadonlyArray1<'py, f32>,
) -> PyResult<Bound<'py, PyArray2<f32>>> {
    let counts = residue_atom_counts.as_array().to_vec();
    let radii = cutoffs.as_array().to_vec();
    let packed = packed_positions(&atom_positions)?;

    let matrix = cv::compute_cv(&counts, &packed, &radii).map_err(engine_error_to_py)?;

    Ok(matrix.into_pyarray(py))
}

/// Single-cutoff convenience form: returns a length-P float32 vector.
#[pyfunction]
fn compute_cv_single<'py>(
    py: Python<'py>,
    residue_atom_counts: PyReadonlyArray1<'py, u32>,
    atom_positions: PyReadonlyArray2<'py, f32>,
    cutoff: f32,
) -> PyResult<Bound<'py, PyArray1<f32>>> {
    let counts = residue_atom_counts.as_array().to_vec();
    let packed = packed_positions(&atom_positions)?;

    let vector =
        cv::compute_cv_single(&counts, &packed, cutoff).map_err(engine_error_to_py)?;

    Ok(vector.into_pyarray(py))
}

#[pymodule]
fn molcv(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(compute_cv, m)?)?;
    m.add_function(wrap_pyfunction!(compute_cv_single, m)?)?;
    Ok(())
}
