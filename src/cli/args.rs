//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

/// Roll the HSTS preload list: apply pending removals and additions while
/// keeping the hand-maintained layout intact
#[derive(Parser, Debug)]
#[command(name = "hstsroll")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Config file (overrides the global config)
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Remove pending removals and insert clean pending additions
    Roll {
        /// transport_security_state_static.json, rewritten in place
        #[arg(value_hint = ValueHint::FilePath)]
        preload_list_path: PathBuf,

        /// Pending scan results (JSON array of {domain, issues})
        #[arg(value_hint = ValueHint::FilePath)]
        pending_scan_path: PathBuf,

        /// Output file for rejected pending additions
        #[arg(value_hint = ValueHint::FilePath)]
        rejected_domains_path: PathBuf,

        /// Do not remove any entries
        #[arg(long, conflicts_with = "pending_removals")]
        skip_removals: bool,

        /// Read pending removals from a JSON file instead of hstspreload.org
        #[arg(long, value_hint = ValueHint::FilePath)]
        pending_removals: Option<PathBuf>,

        /// Ignore the automated removal queue
        #[arg(long)]
        no_automated_removals: bool,
    },

    /// Export the bulk-managed domains as a JSON object
    Bulk {
        /// Output file
        #[arg(value_hint = ValueHint::FilePath)]
        output_path: PathBuf,

        /// Use a local list instead of fetching it from Chromium source
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        list: Option<PathBuf>,
    },

    /// Validate a preload list without modifying it
    Check {
        #[arg(value_hint = ValueHint::FilePath)]
        preload_list_path: PathBuf,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Print config template
    Template,

    /// Show config paths
    Path,
}
