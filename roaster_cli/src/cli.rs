//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use roaster_core::diag::DiagMode;
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

/// Config path used when `--config` is not given and the file exists.
pub const DEFAULT_CONFIG: &str = "etc/roaster.toml";

#[derive(Parser, Debug)]
#[command(name = "roaster", version, about = "Coffee roaster controller")]
pub struct Cli {
    /// Path to config TOML (default: etc/roaster.toml when present, else built-in defaults)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log and report as JSON lines instead of pretty text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); overrides [logging].level
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the roast control loop until Ctrl-C or a limit
    Run {
        /// Stop after this much wall time
        #[arg(long, value_name = "MS")]
        duration_ms: Option<u64>,
        /// Stop after this many ticks
        #[arg(long, value_name = "N")]
        max_ticks: Option<u64>,
        /// Override roast.target_charge_g
        #[arg(long = "target-g", value_name = "GRAMS")]
        target_g: Option<f32>,
        /// Stop once the roast reaches Done
        #[arg(long, action = ArgAction::SetTrue)]
        until_done: bool,
        /// Echo telemetry to stdout as well as to [telemetry].file
        #[arg(long, action = ArgAction::SetTrue)]
        tee: bool,
    },
    /// One acquisition pass; reports every sensor channel
    SelfCheck,
    /// Print one diagnostic screen
    Diag {
        /// buttons | pots | thermocouples | scale
        #[arg(long, value_name = "MODE")]
        mode: DiagMode,
    },
}
