//! Command-Line Interface

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// dApp Analyzer - Turn recorded dApp interactions into intent plans
#[derive(Parser, Debug)]
#[command(name = "dapp-analyze")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Parse from the process arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze a recording into patterns, intent steps and clarifications
    Analyze {
        /// Input recording file (JSON)
        input: PathBuf,

        /// Output directory (defaults to the recording's directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip the clarification pass
        #[arg(long)]
        no_clarifications: bool,
    },

    /// Validate a recording file and print a summary
    Validate {
        /// Input recording file (JSON)
        input: PathBuf,
    },

    /// Write a default configuration file
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },

    /// View configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,
}
