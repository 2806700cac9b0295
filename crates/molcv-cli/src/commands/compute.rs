use crate::cli::ComputeArgs;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use molcv::core::models::table::AtomTable;
use molcv::engine::config::CvConfig;
use molcv::engine::progress::ProgressReporter;
use molcv::workflows::cv;
use nalgebra::Point3;
use ndarray::Array2;
use pdbtbx::StrictnessLevel;
use std::collections::HashSet;
use std::io::Write;
use tracing::{info, warn};

pub fn run(args: ComputeArgs) -> Result<()> {
    if args.output_pdb.is_some() && args.cutoffs.len() != 1 {
        return Err(CliError::Argument(
            "exactly one cutoff is supported when writing a PDB file".to_string(),
        ));
    }

    let input_path = args.input.to_string_lossy();
    let (mut structure, parse_warnings) = pdbtbx::open(input_path.as_ref(), StrictnessLevel::Loose)
        .map_err(|errors| CliError::FileParsing {
            path: args.input.clone(),
            source: anyhow::anyhow!("{:?}", errors),
        })?;

    if !parse_warnings.is_empty() {
        warn!(
            "Parsed '{}' with {} warnings.",
            args.input.display(),
            parse_warnings.len()
        );
    }

    let selected_chains = resolve_chain_selection(&structure, &args.chains)?;
    let is_chain_selected = |chain_id: &str| match &selected_chains {
        Some(ids) => ids.contains(chain_id),
        None => true,
    };

    let mut residue_atom_counts: Vec<u32> = Vec::new();
    let mut points: Vec<Point3<f32>> = Vec::new();

    for chain in structure.chains().filter(|c| is_chain_selected(c.id())) {
        for residue in chain.residues() {
            let count = residue.atoms().count();
            if count == 0 {
                warn!(
                    "Skipping residue {} in chain {}: it has no atoms.",
                    residue.serial_number(),
                    chain.id()
                );
                continue;
            }

            residue_atom_counts.push(count as u32);
            for atom in residue.atoms() {
                points.push(Point3::new(
                    atom.x() as f32,
                    atom.y() as f32,
                    atom.z() as f32,
                ));
            }
        }
    }

    info!(
        "Loaded {} atoms across {} residues from '{}'.",
        points.len(),
        residue_atom_counts.len(),
        args.input.display()
    );

    let table = AtomTable::from_points(&points, &residue_atom_counts)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.callback());
    let matrix = cv::run(&table, &args.cutoffs, &CvConfig::default(), &reporter)?;

    if let Some(pdb_output_path) = &args.output_pdb {
        write_pdb_output(&mut structure, &matrix, &is_chain_selected, pdb_output_path)?;
        info!("Wrote CV as B factors to '{}'.", pdb_output_path.display());
    }

    if let Some(npy_output_path) = &args.output_npy {
        ndarray_npy::write_npy(npy_output_path, &matrix)
            .map_err(|e| CliError::Other(anyhow::anyhow!("Failed to write npy file: {}", e)))?;
        info!("Wrote result matrix to '{}'.", npy_output_path.display());
    }

    if let Some(csv_output_path) = &args.output_csv {
        let writer = csv::Writer::from_path(csv_output_path)?;
        write_csv_table(writer, &args.cutoffs, &matrix)?;
        info!("Wrote result table to '{}'.", csv_output_path.display());
    } else if args.output_pdb.is_none() && args.output_npy.is_none() {
        let writer = csv::Writer::from_writer(std::io::stdout());
        write_csv_table(writer, &args.cutoffs, &matrix)?;
    }

    Ok(())
}

/// An empty `--chain` list means every chain; otherwise each requested id
/// must exist in the structure.
fn resolve_chain_selection(
    structure: &pdbtbx::PDB,
    requested: &[String],
) -> Result<Option<HashSet<String>>> {
    if requested.is_empty() {
        return Ok(None);
    }

    let available: HashSet<&str> = structure.chains().map(|chain| chain.id()).collect();
    for chain_id in requested {
        if !available.contains(chain_id.as_str()) {
            return Err(CliError::Argument(format!(
                "chain '{}' not found in input structure",
                chain_id
            )));
        }
    }

    Ok(Some(requested.iter().cloned().collect()))
}

/// Stores row 0 of the result as the B factor of every atom. Residues in
/// unselected chains get 0.0, mirroring how they were excluded from the
/// computation.
fn write_pdb_output(
    structure: &mut pdbtbx::PDB,
    matrix: &Array2<f32>,
    is_chain_selected: &dyn Fn(&str) -> bool,
    path: &std::path::Path,
) -> Result<()> {
    let mut residue_index = 0usize;

    for chain in structure.chains_mut() {
        let chain_selected = is_chain_selected(chain.id());

        for residue in chain.residues_mut() {
            let has_atoms = residue.atoms().next().is_some();
            let b_factor = if chain_selected && has_atoms {
                let value = matrix[[0, residue_index]];
                residue_index += 1;
                value as f64
            } else {
                0.0
            };

            for atom in residue.atoms_mut() {
                atom.set_b_factor(b_factor).map_err(|e| {
                    CliError::Other(anyhow::anyhow!("Failed to set B factor: {}", e))
                })?;
            }
        }
    }

    pdbtbx::save(structure, path.to_string_lossy().as_ref(), StrictnessLevel::Medium).map_err(
        |errors| CliError::FileParsing {
            path: path.to_path_buf(),
            source: anyhow::anyhow!("{:?}", errors),
        },
    )?;

    Ok(())
}

/// One row per residue, one CV column per cutoff.
fn write_csv_table<W: Write>(
    mut writer: csv::Writer<W>,
    cutoffs: &[f32],
    matrix: &Array2<f32>,
) -> Result<()> {
    let mut header = vec!["residue".to_string()];
    header.extend(cutoffs.iter().map(|c| format!("cv_{:.2}", c)));
    writer.write_record(&header)?;

    for residue in 0..matrix.ncols() {
        let mut record = vec![residue.to_string()];
        record.extend((0..matrix.nrows()).map(|row| format!("{:.6}", matrix[[row, residue]])));
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}
