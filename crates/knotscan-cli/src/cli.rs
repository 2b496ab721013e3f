use clap::{Args, Parser, Subcommand, ValueEnum};
use knotscan::core::models::chain::Terminus;
use knotscan::core::oracle::ClosureMethod;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Tony Kan, Ted Yu, William A. Goddard III, Victor Wai Tak Kam",
    version,
    about = "knotscan - detect, localize and classify knot formation in molecular dynamics trajectories.",
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

    /// Set the number of threads used for invariant calculations.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Find knotting events in a trajectory and report them as JSON.
    Analyze(AnalyzeArgs),
    /// Compute the knot core of a single structure.
    Core(CoreArgs),
}

/// Chain end that threads through the loop.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminusArg {
    N,
    C,
}

impl From<TerminusArg> for Terminus {
    fn from(arg: TerminusArg) -> Self {
        match arg {
            TerminusArg::N => Terminus::N,
            TerminusArg::C => Terminus::C,
        }
    }
}

/// Arguments for the `analyze` subcommand.
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    // --- Input ---
    /// Trajectory file (.pdb, or .xyz together with --topology).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Topology PDB for trajectory formats without atom records.
    #[arg(short, long, value_name = "PATH")]
    pub topology: Option<PathBuf>,

    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Path to a configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    // --- Detection ---
    /// Chain end that threads through the loop when the knot forms.
    #[arg(long, value_enum)]
    pub terminus: Option<TerminusArg>,

    /// Maximal number of knotted frames tolerated before a formation frame,
    /// times five (-g 10 allows two).
    #[arg(short = 'g', long, value_name = "FRAMES")]
    pub min_gap: Option<usize>,

    /// Number of frames after a formation frame that must stay knotted.
    #[arg(short, long, value_name = "FRAMES")]
    pub scope: Option<usize>,

    /// Minimal lifetime of a reported knot, in frames.
    #[arg(short = 'k', long, value_name = "FRAMES")]
    pub min_knot: Option<usize>,

    /// Use every n-th point of a frame for whole-chain classification.
    #[arg(long, value_name = "N")]
    pub scan_stride: Option<usize>,

    /// Knot core of the native structure, used to rate the loop behavior.
    #[arg(short, long, num_args = 2, value_names = ["BEGIN", "END"])]
    pub reference_core: Option<Vec<usize>>,

    #[command(flatten)]
    pub closure: ClosureArgs,

    #[command(flatten)]
    pub localizer: LocalizerArgs,

    #[command(flatten)]
    pub oracle: OracleArgs,

    // --- Output ---
    /// Write the JSON report to a file instead of standard output.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Report labeled records instead of positional tuples.
    #[arg(short, long)]
    pub detailed: bool,

    /// Write the knot-core profile of every event to a CSV file.
    #[arg(long, value_name = "PATH")]
    pub profile: Option<PathBuf>,

    /// Sampling step of the knot-core profile, in frames.
    #[arg(long, value_name = "FRAMES", requires = "profile")]
    pub profile_step: Option<usize>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S detection.min-knot=200
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `core` subcommand.
#[derive(Args, Debug)]
pub struct CoreArgs {
    /// Structure file (.pdb, .nxyz or .xyz).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Path to a configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub closure: ClosureArgs,

    #[command(flatten)]
    pub localizer: LocalizerArgs,

    #[command(flatten)]
    pub oracle: OracleArgs,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S closure.tries=100
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Atoms of a PDB file that make up the chain.
#[derive(Args, Debug, Clone, Default)]
pub struct SelectionArgs {
    /// Chain identifiers to keep (default: the first chain in the file).
    #[arg(long, value_delimiter = ',', value_name = "IDS")]
    pub chains: Vec<char>,

    /// Atom names to keep (default: CA).
    #[arg(long, value_delimiter = ',', value_name = "NAMES")]
    pub atoms: Vec<String>,
}

/// Overrides for the chain closure.
#[derive(Args, Debug, Clone, Default)]
pub struct ClosureArgs {
    /// Closure method, by name (e.g. 'mass-center', 'rays') or numeric code 0-6.
    #[arg(long, value_name = "METHOD")]
    pub closure: Option<ClosureMethod>,

    /// Number of closures sampled by stochastic methods.
    #[arg(long, value_name = "INT")]
    pub tries: Option<u32>,

    /// Maximal crossing count at which the invariant is still computed.
    #[arg(long, value_name = "INT")]
    pub max_cross: Option<u32>,
}

/// Overrides for knot-core localization.
#[derive(Args, Debug, Clone, Default)]
pub struct LocalizerArgs {
    /// Consecutive non-confirming trims tolerated before the localizer stops.
    #[arg(long, value_name = "INT")]
    pub gap: Option<usize>,

    /// Minimal probability of the knot type for a trim to count as confirming.
    #[arg(long, value_name = "FLOAT")]
    pub cutoff: Option<f64>,
}

/// The external invariant calculator.
#[derive(Args, Debug, Clone, Default)]
pub struct OracleArgs {
    /// Program that identifies the knot type of a chain file.
    #[arg(long = "oracle", value_name = "PROGRAM")]
    pub program: Option<PathBuf>,

    /// Extra argument passed to the oracle program before the chain file.
    /// Can be used multiple times.
    #[arg(long = "oracle-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub args: Vec<String>,

    /// Kill an oracle call that runs longer than this many seconds.
    #[arg(long = "oracle-timeout", value_name = "SECS")]
    pub timeout_secs: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn analyze_arguments_are_parsed() {
        let cli = Cli::parse_from([
            "knotscan",
            "-vv",
            "analyze",
            "-i",
            "traj.pdb",
            "--terminus",
            "c",
            "--reference-core",
            "12",
            "95",
            "--closure",
            "rays",
            "--chains",
            "A,B",
            "--oracle",
            "/usr/bin/knot-id",
            "--oracle-arg",
            "--quiet",
        ]);
        assert_eq!(cli.verbose, 2);
        let Commands::Analyze(args) = cli.command else {
            panic!("Expected 'analyze' subcommand");
        };
        assert_eq!(args.terminus, Some(TerminusArg::C));
        assert_eq!(args.reference_core, Some(vec![12, 95]));
        assert_eq!(args.closure.closure, Some(ClosureMethod::Rays));
        assert_eq!(args.selection.chains, vec!['A', 'B']);
        assert_eq!(args.oracle.args, vec!["--quiet".to_string()]);
        assert!(!args.detailed);
    }

    #[test]
    fn profile_step_requires_profile() {
        let result = Cli::try_parse_from([
            "knotscan",
            "analyze",
            "-i",
            "traj.pdb",
            "--profile-step",
            "50",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from(["knotscan", "-q", "-v", "core", "-i", "x.pdb"]);
        assert!(result.is_err());
    }
}
