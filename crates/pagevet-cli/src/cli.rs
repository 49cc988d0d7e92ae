use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "pagevet",
    version,
    about = "Pagevet - deterministic UI verification against fixture-backed pages"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one or more scenario files against a headless browser
    Run {
        /// Scenario JSON files, executed in order
        #[arg(required = true)]
        scenarios: Vec<PathBuf>,

        /// Directory for failure evidence screenshots
        #[arg(long, default_value = "evidence")]
        evidence_dir: PathBuf,

        /// Show the browser window instead of running headless
        #[arg(long)]
        headful: bool,

        /// Fail requests that no registered route matches
        #[arg(long)]
        block_unmatched: bool,

        /// Navigation timeout in milliseconds
        #[arg(long, default_value_t = 30_000)]
        navigation_timeout_ms: u64,

        /// Chrome/Chromium executable override
        #[arg(long, env = "PAGEVET_CHROME")]
        chrome: Option<PathBuf>,
    },
}
