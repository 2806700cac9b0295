use crate::core::models::table::AtomTable;
use crate::engine::config::CvConfig;
use crate::engine::error::EngineError;
use crate::engine::grid::SpatialGrid;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::reduce::reduce_residues;
use crate::engine::variance::circular_variance;
use ndarray::{Array1, Array2};
use tracing::{debug, info, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Atoms per progress increment. Coarse enough that reporting stays off the
/// hot path, fine enough that bars still move on small structures.
const PROGRESS_BATCH: usize = 1024;

/// Computes per-residue circular variance for every cutoff radius.
///
/// One row of the result per cutoff (caller order), one column per targeted
/// residue (table order). All validation happens before the first spatial
/// grid is built; the call either fails up front or runs to completion.
///
/// The per-atom loop runs in parallel when the `parallel` feature is on.
/// Each atom's value lands in its own output slot, so no synchronization is
/// involved; the only run-to-run variation is floating-point summation order
/// inside one atom's neighbor set, which stays within epsilon.
///
/// # Arguments
///
/// * `table` - The atom table to compute over.
/// * `cutoffs` - Cutoff radii, one output row each, in caller order.
/// * `config` - Target residue range and grid limits.
/// * `reporter` - Sink for progress events.
///
/// # Errors
///
/// [`EngineError::InvalidCutoff`] for a non-positive or non-finite cutoff,
/// [`EngineError::EmptyInput`] for an empty cutoff set or empty target range,
/// [`EngineError::Shape`] for a target range that does not fit the table.
#[instrument(skip_all, name = "cv_workflow")]
pub fn run(
    table: &AtomTable,
    cutoffs: &[f32],
    config: &CvConfig,
    reporter: &ProgressReporter,
) -> Result<Array2<f32>, EngineError> {
    if cutoffs.is_empty() {
        return Err(EngineError::EmptyInput("no cutoff radii were provided"));
    }
    for &radius in cutoffs {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(EngineError::InvalidCutoff { value: radius });
        }
    }

    let residues = config.resolve_residue_range(table.residue_count())?;
    let first_atom = table.residue_atoms(residues.start).start;
    let last_atom = table.residue_atoms(residues.end - 1).end;

    info!(
        atoms = table.atom_count(),
        residues = table.residue_count(),
        target_residues = residues.len(),
        cutoffs = cutoffs.len(),
        "Starting circular variance computation"
    );

    let mut matrix = Array2::zeros((cutoffs.len(), residues.len()));
    let mut per_atom = vec![0.0f32; last_atom - first_atom];

    for (row, &radius) in cutoffs.iter().enumerate() {
        reporter.report(Progress::CutoffStart {
            index: row,
            total: cutoffs.len(),
            radius,
            atoms: per_atom.len() as u64,
        });

        let grid = SpatialGrid::build(table, radius, config.max_grid_cells);
        compute_per_atom(table, &grid, radius, first_atom, &mut per_atom, reporter);

        let mut out_row = matrix.row_mut(row);
        let out_slice = out_row
            .as_slice_mut()
            .expect("rows of a standard-layout matrix are contiguous");
        reduce_residues(table, residues.clone(), &per_atom, out_slice);

        reporter.report(Progress::CutoffFinish);
        debug!(cutoff = radius, "Finished cutoff");
    }

    Ok(matrix)
}

#[cfg(feature = "parallel")]
fn compute_per_atom(
    table: &AtomTable,
    grid: &SpatialGrid<'_>,
    radius: f32,
    first_atom: usize,
    per_atom: &mut [f32],
    reporter: &ProgressReporter,
) {
    per_atom
        .par_chunks_mut(PROGRESS_BATCH)
        .enumerate()
        .for_each(|(chunk_index, chunk)| {
            let base = first_atom + chunk_index * PROGRESS_BATCH;
            for (offset, slot) in chunk.iter_mut().enumerate() {
                *slot = circular_variance(table, grid, (base + offset) as u32, radius);
            }
            reporter.report(Progress::AtomsProcessed {
                count: chunk.len() as u64,
            });
        });
}

#[cfg(not(feature = "parallel"))]
fn compute_per_atom(
    table: &AtomTable,
    grid: &SpatialGrid<'_>,
    radius: f32,
    first_atom: usize,
    per_atom: &mut [f32],
    reporter: &ProgressReporter,
) {
    for (chunk_index, chunk) in per_atom.chunks_mut(PROGRESS_BATCH).enumerate() {
        let base = first_atom + chunk_index * PROGRESS_BATCH;
        for (offset, slot) in chunk.iter_mut().enumerate() {
            *slot = circular_variance(table, grid, (base + offset) as u32, radius);
        }
        reporter.report(Progress::AtomsProcessed {
            count: chunk.len() as u64,
        });
    }
}

/// The packed-buffer entry point: builds the atom table from a row-major N×4
/// position buffer and runs the workflow over every residue with default
/// settings.
///
/// # Errors
///
/// Everything [`AtomTable::from_packed`] and [`run`] can report.
pub fn compute_cv(
    residue_atom_counts: &[u32],
    atom_positions: &[f32],
    cutoffs: &[f32],
) -> Result<Array2<f32>, EngineError> {
    let table = AtomTable::from_packed(atom_positions, residue_atom_counts)?;
    run(
        &table,
        cutoffs,
        &CvConfig::default(),
        &ProgressReporter::new(),
    )
}

/// Single-cutoff convenience form: the M = 1 result collapsed to a length-P
/// vector.
///
/// # Errors
///
/// Same contract as [`compute_cv`].
pub fn compute_cv_single(
    residue_atom_counts: &[u32],
    atom_positions: &[f32],
    cutoff: f32,
) -> Result<Array1<f32>, EngineError> {
    let matrix = compute_cv(residue_atom_counts, atom_positions, &[cutoff])?;
    Ok(matrix.row(0).to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn pack(points: &[Point3<f32>]) -> Vec<f32> {
        points
            .iter()
            .flat_map(|p| [p.x, p.y, p.z, 0.0])
            .collect()
    }

    fn random_structure(n: usize, seed: u64) -> Vec<Point3<f32>> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n)
            .map(|_| {
                Point3::new(
                    rng.gen_range(-15.0..15.0),
                    rng.gen_range(-15.0..15.0),
                    rng.gen_range(-15.0..15.0),
                )
            })
            .collect()
    }

    #[test]
    fn result_matrix_has_one_row_per_cutoff_and_one_column_per_residue() {
        let points = random_structure(10, 1);
        let matrix = compute_cv(&[3, 4, 3], &pack(&points), &[4.0, 8.0]).unwrap();
        assert_eq!(matrix.dim(), (2, 3));
    }

    #[test]
    fn every_value_lies_in_the_unit_interval() {
        let points = random_structure(500, 2);
        let counts = [100u32, 250, 150];
        let matrix = compute_cv(&counts, &pack(&points), &[2.0, 5.0, 12.0]).unwrap();

        for &value in matrix.iter() {
            assert!((0.0..=1.0).contains(&value), "CV {} out of range", value);
        }
    }

    #[test]
    fn counts_not_summing_to_atom_count_is_a_shape_error() {
        let points = random_structure(10, 3);
        let result = compute_cv(&[3, 3, 3], &pack(&points), &[4.0]);
        assert!(matches!(result, Err(EngineError::Shape(_))));
    }

    #[test]
    fn one_bad_cutoff_fails_the_whole_call() {
        let points = random_structure(10, 4);
        let packed = pack(&points);

        for bad in [0.0f32, -1.5, f32::NAN, f32::INFINITY] {
            let result = compute_cv(&[5, 5], &packed, &[4.0, bad]);
            assert!(matches!(result, Err(EngineError::InvalidCutoff { .. })));
        }
    }

    #[test]
    fn empty_cutoff_set_is_an_empty_input_error() {
        let points = random_structure(4, 5);
        let result = compute_cv(&[4], &pack(&points), &[]);
        assert!(matches!(result, Err(EngineError::EmptyInput(_))));
    }

    #[test]
    fn opposing_pair_cancels_through_the_full_pipeline() {
        // Per-atom residues make the kernel values directly observable: the
        // center sees two canceling directions, each flank sees only the
        // center.
        let points = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(-1.0, 0.0, 0.0),
        ];
        let matrix = compute_cv(&[1, 1, 1], &pack(&points), &[1.5]).unwrap();

        assert!((matrix[[0, 0]] - 1.0).abs() < 1e-6);
        assert!(matrix[[0, 1]].abs() < 1e-6);
        assert!(matrix[[0, 2]].abs() < 1e-6);
    }

    #[test]
    fn residue_mean_is_pulled_toward_zero_by_flank_atoms() {
        // Same geometry, one residue: mean of [1, 0, 0].
        let points = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(-1.0, 0.0, 0.0),
        ];
        let matrix = compute_cv(&[3], &pack(&points), &[1.5]).unwrap();

        assert!((matrix[[0, 0]] - 1.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn isolated_atoms_report_zero_everywhere() {
        let points = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1000.0, 0.0, 0.0),
            Point3::new(0.0, 1000.0, 0.0),
        ];
        let matrix = compute_cv(&[1, 2], &pack(&points), &[2.0, 5.0]).unwrap();

        for &value in matrix.iter() {
            assert_eq!(value, 0.0);
        }
    }

    #[test]
    fn repeated_calls_agree_within_tolerance() {
        let points = random_structure(300, 6);
        let counts = [120u32, 90, 90];
        let packed = pack(&points);
        let cutoffs = [3.0f32, 7.0];

        let first = compute_cv(&counts, &packed, &cutoffs).unwrap();
        let second = compute_cv(&counts, &packed, &cutoffs).unwrap();

        for (a, b) in first.iter().zip(second.iter()) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn target_range_matches_the_corresponding_full_run_columns() {
        let points = random_structure(60, 8);
        let counts = [10u32, 20, 15, 15];
        let cutoffs = [4.0f32, 9.0];

        let table = AtomTable::from_packed(&pack(&points), &counts).unwrap();
        let reporter = ProgressReporter::new();

        let full = run(&table, &cutoffs, &CvConfig::default(), &reporter).unwrap();
        let config = CvConfig::builder().residue_range(1..3).build();
        let partial = run(&table, &cutoffs, &config, &reporter).unwrap();

        assert_eq!(partial.dim(), (2, 2));
        for row in 0..2 {
            for (col, full_col) in (1..3).enumerate() {
                assert!((partial[[row, col]] - full[[row, full_col]]).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn grid_and_fallback_paths_produce_the_same_matrix() {
        let points = random_structure(200, 9);
        let counts = [50u32, 50, 100];

        let table = AtomTable::from_packed(&pack(&points), &counts).unwrap();
        let reporter = ProgressReporter::new();

        let gridded = run(&table, &[5.0], &CvConfig::default(), &reporter).unwrap();
        let config = CvConfig::builder().max_grid_cells(0).build();
        let scanned = run(&table, &[5.0], &config, &reporter).unwrap();

        for (a, b) in gridded.iter().zip(scanned.iter()) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn single_cutoff_form_collapses_to_a_vector() {
        let points = random_structure(12, 10);
        let packed = pack(&points);

        let vector = compute_cv_single(&[6, 6], &packed, 5.0).unwrap();
        let matrix = compute_cv(&[6, 6], &packed, &[5.0]).unwrap();

        assert_eq!(vector.len(), 2);
        for (col, value) in vector.iter().enumerate() {
            assert!((value - matrix[[0, col]]).abs() < 1e-6);
        }
    }

    #[test]
    fn progress_events_cover_every_cutoff_and_atom() {
        use std::sync::Mutex;

        let points = random_structure(40, 12);
        let table = AtomTable::from_packed(&pack(&points), &[40]).unwrap();

        let events: Mutex<(usize, u64)> = Mutex::new((0, 0));
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            let mut guard = events.lock().unwrap();
            match event {
                Progress::CutoffStart { .. } => guard.0 += 1,
                Progress::AtomsProcessed { count } => guard.1 += count,
                _ => {}
            }
        }));

        run(&table, &[3.0, 6.0], &CvConfig::default(), &reporter).unwrap();

        let guard = events.lock().unwrap();
        assert_eq!(guard.0, 2);
        assert_eq!(guard.1, 80);
    }
}
