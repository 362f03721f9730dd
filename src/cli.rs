use std::num::NonZeroUsize;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Debug, Clone, PartialEq, Parser)]
#[command(
    version,
    about = "Estimate the on-disk size of assets by summing their unique dependency closures"
)]
pub struct Cli {
    /// The project directory containing the logical root folder
    #[arg(short, long, env = "DEPSIZE_PROJECT", default_value = ".", global = true)]
    pub project: String,

    /// Name of the logical root folder that asset identifiers start with
    #[arg(long, env = "DEPSIZE_LOGICAL_ROOT", default_value = "Assets", global = true)]
    pub logical_root: String,

    /// What to do with identifiers that are outside the logical root
    #[arg(long, value_enum, default_value_t = UnrootedPolicy::Reject, global = true)]
    pub unrooted: UnrootedPolicy,

    /// Limit the number of threads used to index the project
    #[arg(short, long, global = true)]
    pub threads: Option<NonZeroUsize>,

    /// Do not draw progress bars
    #[arg(long, default_value = "false", global = true)]
    pub no_progress: bool,

    /// Log debug output
    #[arg(short, long, default_value = "false", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub tab: Tab,
}

#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum Tab {
    /// Total size of the selected assets and folders with all their dependencies
    Assets {
        /// Assets or folders, as logical identifiers or filesystem paths
        roots: Vec<String>,
    },
    /// Total size of the selected assets that are registered addressable entries
    Addressables {
        /// Assets, as logical identifiers or filesystem paths
        roots: Vec<String>,
    },
}

impl Tab {
    pub fn roots(&self) -> &[String] {
        match self {
            Tab::Assets { roots } | Tab::Addressables { roots } => roots,
        }
    }
}

/// Policy for identifiers whose first segment is not the logical root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum UnrootedPolicy {
    /// The identifier has no physical path and weighs nothing
    #[default]
    Reject,
    /// The identifier is joined verbatim onto the project directory
    Passthrough,
}
