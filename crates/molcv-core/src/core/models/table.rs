use crate::engine::error::EngineError;
use nalgebra::{Point3, Vector4};
use std::ops::Range;

/// An immutable columnar store of atom positions and residue membership.
///
/// Positions are kept as fixed-width 4-lane vectors (x, y, z, padding) stored
/// contiguously in caller-supplied order, so the buffer layout matches the
/// 16-byte-stride layout the engine's inner loops are written against. The
/// padding lane is carried but never read by any computation.
///
/// Residue membership is defined positionally: residue `k` owns the contiguous
/// atom index range given by the prefix sums of the caller's per-residue atom
/// counts. The table precomputes those prefix sums once, so residue-of-atom
/// lookup is a binary search over the boundary array rather than a scan.
///
/// The table is built once per engine call and is read-only afterwards; every
/// spatial grid derived from it borrows it and cannot outlive it.
#[derive(Debug, Clone, PartialEq)]
pub struct AtomTable {
    /// Atom positions, one 4-lane vector per atom.
    positions: Vec<Vector4<f32>>,
    /// Residue boundary array: `offsets[k]..offsets[k + 1]` is residue `k`.
    /// Always has `residue_count() + 1` entries, starting at 0 and ending at
    /// `atom_count()`.
    offsets: Vec<u32>,
}

impl AtomTable {
    /// Builds a table from a packed row-major N×4 position buffer.
    ///
    /// This is the layout the engine's external callers hand over: four `f32`
    /// lanes per atom, the fourth being alignment padding.
    ///
    /// # Arguments
    ///
    /// * `atoms_data` - Packed positions, `4 * N` floats.
    /// * `residue_atom_counts` - Number of atoms in each residue, in order.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Shape`] if the buffer length is not a multiple
    /// of four, if any residue has a zero atom count, or if the counts do not
    /// sum to the number of atoms; [`EngineError::EmptyInput`] if there are no
    /// atoms or no residues.
    pub fn from_packed(
        atoms_data: &[f32],
        residue_atom_counts: &[u32],
    ) -> Result<Self, EngineError> {
        if atoms_data.len() % 4 != 0 {
            return Err(EngineError::Shape(format!(
                "position buffer length {} is not a multiple of 4",
                atoms_data.len()
            )));
        }

        let positions = atoms_data
            .chunks_exact(4)
            .map(|lanes| Vector4::new(lanes[0], lanes[1], lanes[2], lanes[3]))
            .collect();

        Self::new(positions, residue_atom_counts)
    }

    /// Builds a table from bare 3D points, zero-filling the padding lane.
    ///
    /// Convenience constructor for callers that hold per-atom coordinates
    /// rather than a packed buffer (the CLI's structure reader, tests).
    ///
    /// # Errors
    ///
    /// Same contract as [`AtomTable::from_packed`].
    pub fn from_points(
        points: &[Point3<f32>],
        residue_atom_counts: &[u32],
    ) -> Result<Self, EngineError> {
        let positions = points
            .iter()
            .map(|p| Vector4::new(p.x, p.y, p.z, 0.0))
            .collect();

        Self::new(positions, residue_atom_counts)
    }

    fn new(positions: Vec<Vector4<f32>>, residue_atom_counts: &[u32]) -> Result<Self, EngineError> {
        if positions.is_empty() {
            return Err(EngineError::EmptyInput("no atoms were provided"));
        }
        if residue_atom_counts.is_empty() {
            return Err(EngineError::EmptyInput("no residues were provided"));
        }

        let mut offsets = Vec::with_capacity(residue_atom_counts.len() + 1);
        let mut total: usize = 0;
        offsets.push(0);

        for (residue_index, &count) in residue_atom_counts.iter().enumerate() {
            if count == 0 {
                return Err(EngineError::Shape(format!(
                    "residue {} has a zero atom count",
                    residue_index
                )));
            }
            total += count as usize;
            if total > u32::MAX as usize {
                return Err(EngineError::Shape(format!(
                    "residue atom counts sum past {} atoms",
                    u32::MAX
                )));
            }
            offsets.push(total as u32);
        }

        if total != positions.len() {
            return Err(EngineError::Shape(format!(
                "residue atom counts sum to {} but {} atoms were provided",
                total,
                positions.len()
            )));
        }

        Ok(Self { positions, offsets })
    }

    /// Number of atoms in the table.
    pub fn atom_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of residues in the table.
    pub fn residue_count(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Position of one atom. The fourth lane is padding.
    #[inline]
    pub fn position(&self, atom: usize) -> &Vector4<f32> {
        &self.positions[atom]
    }

    /// All positions, in atom-index order.
    #[inline]
    pub fn positions(&self) -> &[Vector4<f32>] {
        &self.positions
    }

    /// Index of the residue that owns `atom`.
    ///
    /// Binary search over the residue boundary array.
    pub fn residue_of_atom(&self, atom: usize) -> usize {
        debug_assert!(atom < self.atom_count());
        self.offsets.partition_point(|&boundary| boundary as usize <= atom) - 1
    }

    /// The contiguous atom index range owned by `residue`.
    pub fn residue_atoms(&self, residue: usize) -> Range<usize> {
        self.offsets[residue] as usize..self.offsets[residue + 1] as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    fn points(n: usize) -> Vec<Point3<f32>> {
        (0..n).map(|i| Point3::new(i as f32, 0.0, 0.0)).collect()
    }

    #[test]
    fn from_points_builds_residue_boundaries() {
        let table = AtomTable::from_points(&points(10), &[3, 4, 3]).unwrap();

        assert_eq!(table.atom_count(), 10);
        assert_eq!(table.residue_count(), 3);
        assert_eq!(table.residue_atoms(0), 0..3);
        assert_eq!(table.residue_atoms(1), 3..7);
        assert_eq!(table.residue_atoms(2), 7..10);
    }

    #[test]
    fn from_packed_preserves_all_four_lanes() {
        let data = [1.0, 2.0, 3.0, 9.0, 4.0, 5.0, 6.0, 9.0];
        let table = AtomTable::from_packed(&data, &[2]).unwrap();

        assert_eq!(*table.position(0), Vector4::new(1.0, 2.0, 3.0, 9.0));
        assert_eq!(*table.position(1), Vector4::new(4.0, 5.0, 6.0, 9.0));
    }

    #[test]
    fn from_points_zero_fills_the_padding_lane() {
        let table = AtomTable::from_points(&[Point3::new(1.0, 2.0, 3.0)], &[1]).unwrap();
        assert_eq!(table.position(0).w, 0.0);
    }

    #[test]
    fn residue_of_atom_is_correct_at_boundaries() {
        let table = AtomTable::from_points(&points(10), &[3, 4, 3]).unwrap();

        assert_eq!(table.residue_of_atom(0), 0);
        assert_eq!(table.residue_of_atom(2), 0);
        assert_eq!(table.residue_of_atom(3), 1);
        assert_eq!(table.residue_of_atom(6), 1);
        assert_eq!(table.residue_of_atom(7), 2);
        assert_eq!(table.residue_of_atom(9), 2);
    }

    #[test]
    fn counts_not_summing_to_atom_count_is_a_shape_error() {
        let result = AtomTable::from_points(&points(10), &[3, 4, 4]);
        assert!(matches!(result, Err(EngineError::Shape(_))));

        let result = AtomTable::from_points(&points(10), &[3, 4]);
        assert!(matches!(result, Err(EngineError::Shape(_))));
    }

    #[test]
    fn zero_atom_residue_is_a_shape_error() {
        let result = AtomTable::from_points(&points(7), &[3, 0, 4]);
        assert!(matches!(result, Err(EngineError::Shape(_))));
    }

    #[test]
    fn ragged_packed_buffer_is_a_shape_error() {
        let data = [1.0, 2.0, 3.0, 0.0, 4.0, 5.0];
        let result = AtomTable::from_packed(&data, &[2]);
        assert!(matches!(result, Err(EngineError::Shape(_))));
    }

    #[test]
    fn empty_inputs_are_rejected() {
        let result = AtomTable::from_points(&[], &[1]);
        assert!(matches!(result, Err(EngineError::EmptyInput(_))));

        let result = AtomTable::from_points(&points(3), &[]);
        assert!(matches!(result, Err(EngineError::EmptyInput(_))));

        let result = AtomTable::from_packed(&[], &[]);
        assert!(matches!(result, Err(EngineError::EmptyInput(_))));
    }
}
