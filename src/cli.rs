use a2kit::{DesiredState, ItemKind};
use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "a2state")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(
    about = "Declaratively enable and disable Apache modules, configurations and sites",
    long_about = None
)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file (defaults to ~/.config/a2state/config.toml)
    #[arg(long, global = true, env = "A2STATE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Bring the named units into the desired state
    Apply(ApplyArgs),

    /// List the enabled units of a kind
    Query(QueryArgs),

    /// Read JSON task parameters and print a JSON result
    Run(RunArgs),

    /// Show the resolved tool commands and report missing ones
    Doctor,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Apply / Query
// ============================================================================

#[derive(Parser)]
pub struct ApplyArgs {
    /// Kind of unit to manage
    #[arg(short, long, value_enum)]
    pub item: ItemArg,

    /// Unit name (repeatable); omit to only query
    #[arg(short, long = "name", value_name = "NAME", requires = "state")]
    pub names: Vec<String>,

    /// Desired state of the named units
    #[arg(short, long, value_enum)]
    pub state: Option<StateArg>,

    /// Report what would change without changing anything
    #[arg(long)]
    pub check: bool,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser)]
pub struct QueryArgs {
    /// Kind of unit to list
    #[arg(short, long, value_enum)]
    pub item: ItemArg,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser)]
pub struct RunArgs {
    /// Parameters file, or `-` for stdin
    #[arg(short, long, default_value = "-")]
    pub params: String,

    /// Report what would change without changing anything
    #[arg(long)]
    pub check: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ItemArg {
    Module,
    Config,
    Site,
}

impl From<ItemArg> for ItemKind {
    fn from(arg: ItemArg) -> Self {
        match arg {
            ItemArg::Module => ItemKind::Module,
            ItemArg::Config => ItemKind::Config,
            ItemArg::Site => ItemKind::Site,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "snake_case")]
pub enum StateArg {
    Present,
    Absent,
    ExclusivePresent,
}

impl From<StateArg> for DesiredState {
    fn from(arg: StateArg) -> Self {
        match arg {
            StateArg::Present => DesiredState::Present,
            StateArg::Absent => DesiredState::Absent,
            StateArg::ExclusivePresent => DesiredState::ExclusivePresent,
        }
    }
}
