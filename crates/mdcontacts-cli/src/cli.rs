use clap::{Args, Parser, Subcommand, ValueEnum};
use mdcontacts::core::selection::SelectionSyntax;
use serde::Deserialize;
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
    about = "mdcontacts CLI - Discover and validate interactions between molecular agents along a molecular dynamics trajectory.",
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
    /// Resolve, evaluate and save the interactions of a system.
    Interactions(InteractionsArgs),
}

/// Expression language used by every selection of a run.
#[derive(ValueEnum, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum SyntaxArg {
    /// Keyword expressions, e.g. `chain A and not resname HOH`.
    Vmd,
    /// Amber-style masks, e.g. `:1-10`.
    Mask,
}

impl From<SyntaxArg> for SelectionSyntax {
    fn from(arg: SyntaxArg) -> Self {
        match arg {
            SyntaxArg::Vmd => SelectionSyntax::Vmd,
            SyntaxArg::Mask => SelectionSyntax::Mask,
        }
    }
}

/// Arguments for the `interactions` subcommand.
#[derive(Args, Debug)]
pub struct InteractionsArgs {
    // --- Core Arguments ---
    /// Path to the system snapshot (topology and frames) in JSON format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub system: PathBuf,

    /// Path to the interactions configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Path of the interactions file. An existing compatible file is reused.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    // --- Resolution Overrides ---
    /// Generate interactions automatically: 'greedy', 'humble', 'ligands' or a chain letter.
    #[arg(short, long, value_name = "MODE")]
    pub auto: Option<String>,

    /// Atoms to ignore when deciding whether a chain may take part in automatic pairing.
    #[arg(long, value_name = "SELECTION")]
    pub pbc_selection: Option<String>,

    /// Override the selection syntax.
    #[arg(long, value_enum, value_name = "SYNTAX")]
    pub syntax: Option<SyntaxArg>,

    // --- Acceptance Overrides ---
    /// Turn failures of the given tests into warnings ('interact', 'stabonds', ... or 'all').
    /// Can be used multiple times or as a comma-separated list.
    #[arg(short, long, value_name = "FLAG", value_delimiter = ',', num_args(1..))]
    pub mercy: Vec<String>,

    /// Override the minimum fraction of frames an interaction must be in contact.
    #[arg(short = 'i', long, value_name = "FLOAT")]
    pub interaction_cutoff: Option<f64>,

    /// Override the maximum number of frames to analyse.
    #[arg(short = 'f', long, value_name = "INT")]
    pub frames_limit: Option<usize>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S frames-limit=100
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}
