use super::grid::SpatialGrid;
use crate::core::models::table::AtomTable;
use nalgebra::Vector3;

/// Circular variance of one atom for one cutoff radius.
///
/// For atom `i` with neighbors `{j}` strictly within the cutoff, each
/// neighbor contributes the unit vector from `i` towards `j`; the variance is
/// `1 - |sum| / n`. All neighbor directions coinciding gives 0; isotropically
/// distributed directions cancel and push the value towards 1. The result is
/// clamped to [0, 1] to absorb rounding at the two boundaries.
///
/// Conventions, both local to this function:
/// - An atom with no neighbors has no defined directional variance and
///   reports 0.
/// - A coincident neighbor (zero distance) has no defined direction and is
///   skipped entirely, contributing neither to the sum nor to `n`.
pub(crate) fn circular_variance(
    table: &AtomTable,
    grid: &SpatialGrid<'_>,
    atom: u32,
    radius: f32,
) -> f32 {
    let origin = table.position(atom as usize);

    let mut direction_sum: Vector3<f32> = Vector3::zeros();
    let mut neighbor_count: u32 = 0;

    for neighbor in grid.neighbors(atom, radius) {
        let offset = (table.position(neighbor as usize) - origin).xyz();
        let length_squared = offset.norm_squared();
        if length_squared > 0.0 {
            direction_sum += offset / length_squared.sqrt();
            neighbor_count += 1;
        }
    }

    if neighbor_count == 0 {
        return 0.0;
    }

    (1.0 - direction_sum.norm() / neighbor_count as f32).clamp(0.0, 1.0)
}
