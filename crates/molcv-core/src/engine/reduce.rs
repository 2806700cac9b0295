use crate::core::models::table::AtomTable;
use std::ops::Range;

/// Folds per-atom CV values into one value per residue: the arithmetic mean
/// over each residue's contiguous atom range.
///
/// `per_atom` is indexed relative to the first atom of the first residue in
/// `residues` (the workflow only materializes CV values for the targeted
/// span). Zero-length residues cannot occur here; the atom table rejects
/// them at construction.
pub(crate) fn reduce_residues(
    table: &AtomTable,
    residues: Range<usize>,
    per_atom: &[f32],
    out_row: &mut [f32],
) {
    debug_assert_eq!(out_row.len(), residues.len());

    let base = table.residue_atoms(residues.start).start;

    for (slot, residue) in out_row.iter_mut().zip(residues) {
        let atoms = table.residue_atoms(residue);
        let values = &per_atom[atoms.start - base..atoms.end - base];
        let sum: f32 = values.iter().sum();
        *slot = sum / values.len() as f32;
    }
}
