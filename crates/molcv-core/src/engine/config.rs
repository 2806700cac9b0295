use super::error::EngineError;
use std::ops::{Bound, Range, RangeBounds};

/// Ceiling on the number of grid cells the spatial index may span before the
/// engine falls back to exhaustive linear-scan queries.
pub const DEFAULT_MAX_GRID_CELLS: usize = 16_777_216;

/// Tuning parameters for one engine call.
///
/// The cutoff radii are not part of the configuration; they are primary
/// input, passed alongside the atom table. The configuration covers the
/// optional knobs: which residues to produce output for, and how large the
/// spatial index may grow before the linear-scan fallback takes over.
#[derive(Debug, Clone, PartialEq)]
pub struct CvConfig {
    /// Residue range to compute CV for, as caller-supplied bounds. Neighbor
    /// search always sees every atom; only the output columns are restricted.
    pub(crate) residue_bounds: (Bound<usize>, Bound<usize>),
    /// Cell-count ceiling for the spatial grid.
    pub(crate) max_grid_cells: usize,
}

impl CvConfig {
    pub fn builder() -> CvConfigBuilder {
        CvConfigBuilder::new()
    }

    /// Resolves the configured residue bounds against the actual residue
    /// count.
    ///
    /// # Errors
    ///
    /// [`EngineError::Shape`] if the bounds are inverted or reach past the
    /// last residue; [`EngineError::EmptyInput`] if they select no residues.
    pub(crate) fn resolve_residue_range(
        &self,
        residue_count: usize,
    ) -> Result<Range<usize>, EngineError> {
        let start = match self.residue_bounds.0 {
            Bound::Included(s) => s,
            Bound::Excluded(s) => s + 1,
            Bound::Unbounded => 0,
        };
        let end = match self.residue_bounds.1 {
            Bound::Included(e) => e + 1,
            Bound::Excluded(e) => e,
            Bound::Unbounded => residue_count,
        };

        if start > end || end > residue_count {
            return Err(EngineError::Shape(format!(
                "target residue range {}..{} does not fit {} residues",
                start, end, residue_count
            )));
        }
        if start == end {
            return Err(EngineError::EmptyInput("target residue range is empty"));
        }

        Ok(start..end)
    }
}

impl Default for CvConfig {
    fn default() -> Self {
        Self {
            residue_bounds: (Bound::Unbounded, Bound::Unbounded),
            max_grid_cells: DEFAULT_MAX_GRID_CELLS,
        }
    }
}

/// Builder for [`CvConfig`]. Every knob has a default, so `build` cannot
/// fail; range validation happens at call time against the actual table.
#[derive(Debug, Default)]
pub struct CvConfigBuilder {
    residue_bounds: Option<(Bound<usize>, Bound<usize>)>,
    max_grid_cells: Option<usize>,
}

impl CvConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts output to a contiguous range of residues.
    pub fn residue_range<R: RangeBounds<usize>>(mut self, range: R) -> Self {
        self.residue_bounds = Some((range.start_bound().cloned(), range.end_bound().cloned()));
        self
    }

    /// Overrides the spatial grid's cell-count ceiling.
    pub fn max_grid_cells(mut self, cells: usize) -> Self {
        self.max_grid_cells = Some(cells);
        self
    }

    pub fn build(self) -> CvConfig {
        CvConfig {
            residue_bounds: self
                .residue_bounds
                .unwrap_or((Bound::Unbounded, Bound::Unbounded)),
            max_grid_cells: self.max_grid_cells.unwrap_or(DEFAULT_MAX_GRID_CELLS),
        }
    }
}
