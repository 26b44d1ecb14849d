use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "polyver",
    version,
    about = "Manage Node.js, Python, and Ruby versions from one tool"
)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create the directory tree, write shims, and set up PATH
    Init {
        /// Install for the current user instead of system-wide
        #[arg(long)]
        user: bool,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Download and install a runtime version
    Install {
        /// Runtime name: node, python, or ruby
        runtime: String,
        /// Exact version or partial prefix, e.g. 22 or 22.15.1
        version: String,
    },
    /// Remove an installed runtime version
    Uninstall {
        runtime: String,
        version: String,
        /// Remove even if the version is currently active
        #[arg(long)]
        force: bool,
    },
    /// Show installed versions
    List { runtime: Option<String> },
    /// Show versions available for installation
    Available { runtime: String },
    /// Show or set the global default version
    Global {
        runtime: String,
        version: Option<String>,
    },
    /// Show or set the version for the current directory
    Local {
        runtime: String,
        version: Option<String>,
    },
    /// Show the effective version and where it comes from
    Current { runtime: Option<String> },
    /// Print the real executable path for the effective version
    Which { runtime: String },
    /// Regenerate shim executables
    Reshim { runtime: Option<String> },
    /// Find installations made by other tools and report how to migrate
    Migrate { runtime: String },
}
