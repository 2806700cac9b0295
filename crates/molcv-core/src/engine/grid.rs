use crate::core::models::table::AtomTable;
use crate::core::utils::geometry::{bounding_box, distance_squared};
use itertools::Either;
use std::collections::HashMap;
use tracing::debug;

type CellKey = (i32, i32, i32);

/// A uniform-cell spatial index over one atom table, valid for one query
/// radius.
///
/// The cell edge equals the query radius, so every atom within the radius of
/// a query point lies in the 3×3×3 block of cells around the query's cell.
/// The block scan is only a prefilter: the exact squared-distance test in
/// [`SpatialGrid::neighbors`] is authoritative. Empty cells are never
/// materialized.
///
/// When the structure is degenerate (fewer than two atoms) or the bounding
/// box would span more cells than the configured ceiling, the index is built
/// in exhaustive mode instead and every query degrades to a linear scan over
/// all atoms. Queries behave identically in both modes; only their cost
/// differs.
pub(crate) struct SpatialGrid<'a> {
    table: &'a AtomTable,
    index: Index,
}

enum Index {
    Cells {
        cell_edge: f32,
        cells: HashMap<CellKey, Vec<u32>>,
    },
    Exhaustive,
}

/// Cell coordinates are probed with a ±1 block around the query cell, so the
/// usable i32 range is shrunk by one on each side.
const CELL_COORD_LIMIT: f64 = (i32::MAX - 1) as f64;

impl<'a> SpatialGrid<'a> {
    /// Builds the index for one cutoff radius.
    ///
    /// `max_cells` caps how many cells the bounding box may span before the
    /// exhaustive fallback takes over; the fallback is a performance
    /// degradation, never an error.
    pub fn build(table: &'a AtomTable, cell_edge: f32, max_cells: usize) -> Self {
        debug_assert!(cell_edge > 0.0 && cell_edge.is_finite());

        if !Self::grid_is_viable(table, cell_edge, max_cells) {
            debug!(
                atoms = table.atom_count(),
                cell_edge, "Spatial grid not viable; using exhaustive scans"
            );
            return Self {
                table,
                index: Index::Exhaustive,
            };
        }

        let mut cells: HashMap<CellKey, Vec<u32>> = HashMap::new();
        for (atom, position) in table.positions().iter().enumerate() {
            cells
                .entry(cell_of(position.x, position.y, position.z, cell_edge))
                .or_default()
                .push(atom as u32);
        }

        debug!(
            atoms = table.atom_count(),
            occupied_cells = cells.len(),
            cell_edge,
            "Built spatial grid"
        );

        Self {
            table,
            index: Index::Cells { cell_edge, cells },
        }
    }

    /// The atoms strictly within `radius` of `atom`, excluding `atom` itself.
    ///
    /// Lazy: candidates stream out of the 27-cell block (or the whole table
    /// in exhaustive mode) and are filtered by the exact distance test as the
    /// iterator advances.
    pub fn neighbors(&self, atom: u32, radius: f32) -> impl Iterator<Item = u32> + '_ {
        let origin = self.table.position(atom as usize);
        let radius_squared = radius * radius;

        let candidates = match &self.index {
            Index::Cells { cell_edge, cells } => {
                let (cx, cy, cz) = cell_of(origin.x, origin.y, origin.z, *cell_edge);
                Either::Left((cx - 1..=cx + 1).flat_map(move |x| {
                    (cy - 1..=cy + 1).flat_map(move |y| {
                        (cz - 1..=cz + 1).flat_map(move |z| {
                            cells
                                .get(&(x, y, z))
                                .map(|bucket| bucket.as_slice())
                                .unwrap_or(&[])
                                .iter()
                                .copied()
                        })
                    })
                }))
            }
            Index::Exhaustive => Either::Right(0..self.table.atom_count() as u32),
        };

        candidates.filter(move |&candidate| {
            candidate != atom
                && distance_squared(self.table.position(candidate as usize), origin)
                    < radius_squared
        })
    }

    #[cfg(test)]
    pub fn is_exhaustive(&self) -> bool {
        matches!(self.index, Index::Exhaustive)
    }

    fn grid_is_viable(table: &AtomTable, cell_edge: f32, max_cells: usize) -> bool {
        if table.atom_count() < 2 {
            return false;
        }

        let Some((min, max)) = bounding_box(table.positions()) else {
            return false;
        };

        let edge = cell_edge as f64;
        let mut total_cells = 1.0f64;
        for (lo, hi) in [(min.x, max.x), (min.y, max.y), (min.z, max.z)] {
            let lo_cell = (lo as f64 / edge).floor();
            let hi_cell = (hi as f64 / edge).floor();
            if !lo_cell.is_finite()
                || !hi_cell.is_finite()
                || lo_cell.abs() > CELL_COORD_LIMIT
                || hi_cell.abs() > CELL_COORD_LIMIT
            {
                return false;
            }
            total_cells *= hi_cell - lo_cell + 1.0;
        }

        total_cells <= max_cells as f64
    }
}

#[inline]
fn cell_of(x: f32, y: f32, z: f32, cell_edge: f32) -> CellKey {
    (
        (x / cell_edge).floor() as i32,
        (y / cell_edge).floor() as i32,
        (z / cell_edge).floor() as i32,
    )
}
