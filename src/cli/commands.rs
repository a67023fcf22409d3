//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - list/summary: show a tier's loops for the current period
//! - add/toggle/step/link: edit loops
//! - advance/back: move a tier's period pointer
//! - sync/migrate: talk to the sync server

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use loopcycle::domain::{LoopKind, Tier};

/// Loopcycle - daily, weekly and monthly goal loops
#[derive(Parser, Debug)]
#[command(name = "loopcycle")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Date to place the period pointer on (YYYY-MM-DD, defaults to today)
    #[arg(short, long, global = true, value_parser = parse_date)]
    pub date: Option<NaiveDate>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    loopcycle::calendar::parse_day(s).map_err(|e| e.to_string())
}

fn parse_tier(s: &str) -> Result<Tier, String> {
    s.parse()
}

/// Loop type as typed on the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindArg {
    Open,
    Windowed,
}

impl From<KindArg> for LoopKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Open => LoopKind::Open,
            KindArg::Windowed => LoopKind::Windowed,
        }
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List loops of every tier (or one tier) for the current periods
    List {
        /// Only this tier (daily, weekly, monthly)
        #[arg(short, long, value_parser = parse_tier)]
        tier: Option<Tier>,

        /// Include expired loops
        #[arg(short, long)]
        all: bool,
    },

    /// Add a loop to the current period of its tier
    Add {
        /// Tier of the new loop
        #[arg(value_parser = parse_tier)]
        tier: Tier,

        /// Title of the new loop
        title: String,

        /// Open loops carry forward; windowed loops expire
        #[arg(short, long, value_enum, default_value = "open")]
        kind: KindArg,

        /// Regenerate every period
        #[arg(short, long)]
        recurring: bool,

        /// Parent loop id one tier up
        #[arg(short, long)]
        link: Option<String>,

        /// Subtask text (repeatable)
        #[arg(short, long = "step")]
        steps: Vec<String>,
    },

    /// Toggle a subtask done/undone
    Toggle {
        /// Loop id
        loop_id: String,

        /// Subtask id
        subtask_id: String,
    },

    /// Append a subtask to a loop
    Step {
        /// Loop id
        loop_id: String,

        /// Subtask text
        text: String,
    },

    /// Link a loop to a parent one tier up, or unlink it
    Link {
        /// Loop id
        loop_id: String,

        /// Parent loop id; omit to unlink
        parent_id: Option<String>,
    },

    /// Show the end-of-period summary for a tier
    Summary {
        /// Tier to summarize
        #[arg(value_parser = parse_tier)]
        tier: Tier,
    },

    /// Roll a tier over into its next period
    Advance {
        /// Tier to advance
        #[arg(value_parser = parse_tier)]
        tier: Tier,

        /// Confirm the rollover without prompting
        #[arg(short, long)]
        yes: bool,
    },

    /// Show the previous period of a tier (never rolls over)
    Back {
        /// Tier to step back
        #[arg(value_parser = parse_tier)]
        tier: Tier,
    },

    /// Sync the local collection with the server
    Sync,

    /// First sync after signing in: adopt server data or push local data
    Migrate,
}
