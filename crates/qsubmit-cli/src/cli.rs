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
    author,
    version,
    about = "qsubmit - prepare batch submission scripts for MD and replica-exchange runs on PBS and SLURM clusters.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a submission script into each run directory.
    Submit(SubmitArgs),
    /// Write the analysis script described by ANALYZE_FILE into the top directory.
    Analyze(AnalyzeArgs),
    /// Load and validate a queue configuration, then print its profiles.
    Check(CheckArgs),
    /// Load one replica dimension file and print its per-replica input.
    Dim(DimArgs),
}

/// Options shared by every subcommand that reads a queue configuration.
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Path to the queue option file.
    #[arg(short = 'i', long = "input", required = true, value_name = "PATH")]
    pub config: PathBuf,

    /// Override a queue option after the file is read (e.g. -S NODES=4).
    /// May be given multiple times.
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE")]
    pub set_values: Vec<String>,
}

/// Arguments for the `submit` subcommand.
#[derive(Args, Debug)]
pub struct SubmitArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Directory the run directories are relative to.
    #[arg(long, default_value = ".", value_name = "DIR")]
    pub top: PathBuf,

    /// Run index of the first directory; later directories count up from it.
    #[arg(long, value_name = "N")]
    pub start: Option<usize>,

    /// Replace scripts that already exist in a run directory.
    #[arg(short = 'O', long)]
    pub overwrite: bool,

    /// Run directories, in submission order.
    #[arg(required = true, value_name = "RUN_DIR")]
    pub run_dirs: Vec<PathBuf>,
}

/// Arguments for the `analyze` subcommand.
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Directory the analysis script is written to.
    #[arg(long, default_value = ".", value_name = "DIR")]
    pub top: PathBuf,
}

/// Arguments for the `check` subcommand.
#[derive(Args, Debug)]
pub struct CheckArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Print the resolved profiles as TOML instead of the text summary.
    #[arg(long)]
    pub toml: bool,
}

/// Arguments for the `dim` subcommand.
#[derive(Args, Debug)]
pub struct DimArgs {
    /// Dimension key (TEMPERATURE, TOPOLOGY, AMD_DIHEDRAL, SGLD).
    #[arg(short, long, value_name = "KEY")]
    pub kind: String,

    /// Path to the dimension file.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submit_parses_overrides_and_run_dirs() {
        let cli = Cli::parse_from([
            "qsubmit", "-vv", "submit", "-i", "queue.in", "-O", "--start", "4", "-S",
            "NODES=2", "-S", "QSUB=SBATCH", "run.000", "run.001",
        ]);
        assert_eq!(cli.verbose, 2);
        let Commands::Submit(args) = cli.command else {
            panic!("expected submit subcommand");
        };
        assert_eq!(args.config.config, PathBuf::from("queue.in"));
        assert_eq!(args.config.set_values, vec!["NODES=2", "QSUB=SBATCH"]);
        assert!(args.overwrite);
        assert_eq!(args.start, Some(4));
        assert_eq!(args.top, PathBuf::from("."));
        assert_eq!(args.run_dirs.len(), 2);
    }

    #[test]
    fn submit_requires_run_dirs() {
        assert!(Cli::try_parse_from(["qsubmit", "submit", "-i", "queue.in"]).is_err());
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["qsubmit", "-q", "-v", "check", "-i", "q.in"]).is_err());
    }

    #[test]
    fn dim_takes_kind_and_file() {
        let cli = Cli::parse_from(["qsubmit", "dim", "--kind", "SGLD", "sgld.dim"]);
        let Commands::Dim(args) = cli.command else {
            panic!("expected dim subcommand");
        };
        assert_eq!(args.kind, "SGLD");
        assert_eq!(args.file, PathBuf::from("sgld.dim"));
    }
}
