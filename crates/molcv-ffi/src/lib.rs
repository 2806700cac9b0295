//! C ABI surface over the circular variance engine.
//!
//! A single entry point mirroring [`molcv::workflows::cv::compute_cv`], with
//! status-code error reporting and a caller-allocated output buffer. All
//! validation is delegated to the engine; this layer only translates between
//! raw pointers and slices.

use molcv::engine::error::EngineError;
use molcv::workflows::cv;
use std::os::raw::c_int;
use std::slice;

/// The computation succeeded and the output buffer was filled.
pub const MOLCV_OK: c_int = 0;
/// A required pointer argument was null.
pub const MOLCV_ERR_NULL_POINTER: c_int = -1;
/// Dimensionality or count mismatch between inputs.
pub const MOLCV_ERR_SHAPE: c_int = -2;
/// A cutoff radius was non-positive or non-finite.
pub const MOLCV_ERR_INVALID_CUTOFF: c_int = -3;
/// Zero atoms, residues, or cutoffs.
pub const MOLCV_ERR_EMPTY_INPUT: c_int = -4;

/// Computes per-residue circular variance for every cutoff radius.
///
/// `atom_positions` must hold `4 * atom_count` floats (x, y, z, padding per
/// atom, row-major); `out_cv` must have room for
/// `cutoff_count * residue_count` floats and is written row-major, one row
/// per cutoff. On any non-zero return the output buffer is untouched.
///
/// # Safety
///
/// All pointers must be valid for the lengths implied by the count
/// arguments, and `out_cv` must not alias the input buffers.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn molcv_compute_cv(
    residue_atom_counts: *const u32,
    residue_count: usize,
    atom_positions: *const f32,
    atom_count: usize,
    cutoffs: *const f32,
    cutoff_count: usize,
    out_cv: *mut f32,
) -> c_int {
    if residue_atom_counts.is_null()
        || atom_positions.is_null()
        || cutoffs.is_null()
        || out_cv.is_null()
    {
        return MOLCV_ERR_NULL_POINTER;
    }

    let counts = unsafe { slice::from_raw_parts(residue_atom_counts, residue_count) };
    let positions = unsafe { slice::from_raw_parts(atom_positions, atom_count * 4) };
    let radii = unsafe { slice::from_raw_parts(cutoffs, cutoff_count) };

    match cv::compute_cv(counts, positions, radii) {
        Ok(matrix) => {
            let out = unsafe { slice::from_raw_parts_mut(out_cv, cutoff_count * residue_count) };
            for (slot, &value) in out.iter_mut().zip(matrix.iter()) {
                *slot = value;
            }
            MOLCV_OK
        }
        Err(EngineError::Shape(_)) => MOLCV_ERR_SHAPE,
        Err(EngineError::InvalidCutoff { .. }) => MOLCV_ERR_INVALID_CUTOFF,
        Err(EngineError::EmptyInput(_)) => MOLCV_ERR_EMPTY_INPUT,
    }
}
