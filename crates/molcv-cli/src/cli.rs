use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "molcv developers",
    version,
    about = "molcv CLI - Compute per-residue circular variance of molecular structures, a geometric descriptor of surface pockets and buried sites.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads for parallel computation.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compute circular variance for every residue of a structure.
    Compute(ComputeArgs),
}

/// Arguments for the `compute` subcommand.
#[derive(Args, Debug)]
pub struct ComputeArgs {
    /// Path to the input structure file in PDB format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Cutoff radius in Angstroms; may be given multiple times, one result
    /// row per radius.
    #[arg(short = 'c', long = "cutoff", required = true, value_name = "FLOAT")]
    pub cutoffs: Vec<f32>,

    /// Restrict the computation to these chain identifiers.
    /// If omitted, all chains are used.
    #[arg(long = "chain", value_name = "ID")]
    pub chains: Vec<String>,

    /// Write the structure with per-residue CV stored as the B factor.
    /// Requires exactly one cutoff.
    #[arg(long, value_name = "PATH")]
    pub output_pdb: Option<PathBuf>,

    /// Write the result matrix (cutoffs x residues) as a .npy file.
    #[arg(long, value_name = "PATH")]
    pub output_npy: Option<PathBuf>,

    /// Write the result table as CSV. When no output option is given at all,
    /// the CSV table goes to stdout instead.
    #[arg(long, value_name = "PATH")]
    pub output_csv: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn compute_args_parse_repeated_flags() {
        let cli = Cli::parse_from([
            "molcv", "compute", "-i", "in.pdb", "-c", "5.0", "-c", "8.0", "--chain", "A",
            "--chain", "B", "--output-npy", "out.npy",
        ]);

        let Commands::Compute(args) = cli.command;
        assert_eq!(args.input, PathBuf::from("in.pdb"));
        assert_eq!(args.cutoffs, vec![5.0, 8.0]);
        assert_eq!(args.chains, vec!["A".to_string(), "B".to_string()]);
        assert_eq!(args.output_npy, Some(PathBuf::from("out.npy")));
        assert_eq!(args.output_pdb, None);
    }

    #[test]
    fn verbosity_flags_are_global() {
        let cli = Cli::parse_from(["molcv", "compute", "-i", "in.pdb", "-c", "5.0", "-vv"]);
        assert_eq!(cli.verbose, 2);
        assert!(!cli.quiet);
    }
}
