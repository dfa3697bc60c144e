//! Command-line interface.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::data::DEFAULT_WORKBOOK;

/// Fab telemetry feed: replay workbook series or publish synthetic ticks.
#[derive(Debug, Parser)]
#[command(name = "fabfeed", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Replay per-day series from a simulation workbook.
    Stream(StreamArgs),
    /// Publish randomly sampled telemetry.
    Random(RandomArgs),
}

#[derive(Debug, clap::Args)]
pub struct StreamArgs {
    /// Workbook to load: a local path or an http(s) URL.
    #[arg(long, env = "FAB_FEED_WORKBOOK", default_value = DEFAULT_WORKBOOK)]
    pub workbook: String,

    /// Milliseconds between ticks.
    #[arg(long, default_value_t = 1000)]
    pub interval_ms: u64,

    /// Stop after this many ticks (runs until interrupted when omitted).
    #[arg(long)]
    pub ticks: Option<usize>,
}

#[derive(Debug, clap::Args)]
pub struct RandomArgs {
    /// Milliseconds between ticks.
    #[arg(long, default_value_t = 1000)]
    pub interval_ms: u64,

    /// Number of ticks to publish before exiting.
    #[arg(long, default_value_t = 100)]
    pub max_ticks: usize,

    /// First simulated day (YYYY-MM-DD); defaults to today.
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    /// Fixed RNG seed for reproducible output.
    #[arg(long)]
    pub seed: Option<u64>,
}
