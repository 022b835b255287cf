use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::paths;

#[derive(Parser)]
#[command(name = "arr-sync")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Declarative configuration for the *arr media stack", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the state document
    #[arg(
        short,
        long,
        global = true,
        env = paths::ENV_CONFIG,
        default_value = paths::DEFAULT_CONFIG
    )]
    pub config: String,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// State document path with `~` and variables expanded
    pub fn config_path(&self) -> PathBuf {
        paths::expand(&self.config)
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Show what changes would be made
    Plan(UserArgs),

    /// Apply changes to converge services to the desired state
    Apply(ApplyArgs),

    /// Show live status of every declared service
    Status(UserArgs),

    /// Print a state fragment read from a user's running services
    Import {
        /// User to import
        username: String,
    },

    /// Remove a cached API key so it is extracted again
    ForgetKey {
        /// Container the key was extracted from
        container: String,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args)]
pub struct UserArgs {
    /// Only act on this user
    #[arg(short, long)]
    pub user: Option<String>,
}

#[derive(Args)]
pub struct ApplyArgs {
    /// Only apply for this user
    #[arg(short, long)]
    pub user: Option<String>,

    /// Show the plan without applying (same as `plan`)
    #[arg(long)]
    pub dry_run: bool,

    /// Apply without asking for confirmation
    #[arg(short, long)]
    pub yes: bool,
}
