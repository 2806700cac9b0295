use nalgebra::{Vector3, Vector4};

/// Squared Euclidean distance between two 4-lane positions, computed over the
/// three meaningful lanes only. The padding lane never participates.
#[inline]
pub fn distance_squared(a: &Vector4<f32>, b: &Vector4<f32>) -> f32 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    let dz = a.z - b.z;
    dx * dx + dy * dy + dz * dz
}

/// Axis-aligned bounding box over a set of 4-lane positions, padding lane
/// excluded.
///
/// Returns `None` for an empty slice.
pub fn bounding_box(positions: &[Vector4<f32>]) -> Option<(Vector3<f32>, Vector3<f32>)> {
    let first = positions.first()?;
    let mut min = first.xyz();
    let mut max = min;

    for p in &positions[1..] {
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        min.z = min.z.min(p.z);
        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
        max.z = max.z.max(p.z);
    }

    Some((min, max))
}
