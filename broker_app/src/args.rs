//! Command-line arguments for the dashboard binary.
//!
//! This module defines the CLI interface using `clap`. See `main` for end-to-end usage.
use std::path::PathBuf;

use broker_common::prices::DEFAULT_TICK_MS;
use clap::Parser;

/// Parsed command-line arguments.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Directory where account and profile records are stored.
    /// Created on startup if it does not exist.
    #[clap(long, default_value = "broker_data")]
    pub data_dir: PathBuf,

    /// Milliseconds between simulated price ticks.
    /// Values below the supported floor are raised to it.
    #[clap(long, default_value_t = DEFAULT_TICK_MS)]
    pub tick_ms: u64,
}
