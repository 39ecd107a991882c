//! CLI argument definitions and shared statics.

use bias_core::LockMode;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

/// Used when `--config` is not given; missing is not an error.
pub const DEFAULT_CONFIG: &str = "etc/bias_config.toml";

pub fn json_mode() -> bool {
    JSON_MODE.get().copied().unwrap_or(false)
}

#[derive(Parser, Debug)]
#[command(name = "bias", version, about = "Modulator bias-lock controller")]
pub struct Cli {
    /// Path to config TOML (typed). Defaults to etc/bias_config.toml when present.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log and print results as JSON lines instead of pretty text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sweep the full drive range and report peak, null and quadrature
    Sweep {
        /// Also write the swept curve as step,voltage CSV
        #[arg(long, value_name = "FILE")]
        csv: Option<PathBuf>,
    },
    /// Run detection over a recorded step,voltage CSV
    Detect {
        #[arg(long, value_name = "FILE")]
        csv: PathBuf,
    },
    /// Lock an operating point and hold it until Ctrl-C
    Lock {
        /// peak | null | quad-plus | quad-minus (overrides tracking.mode)
        #[arg(long, value_name = "MODE", value_parser = parse_mode)]
        mode: Option<LockMode>,
        /// Stop after this many control cycles
        #[arg(long, value_name = "N")]
        cycles: Option<u64>,
    },
    /// Inspect or change the persisted tuning
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Quick health check: one sensor read and actuator write round trip
    SelfCheck,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective tuning (stored record or boot defaults)
    Show,
    /// Change one tuning value (tolerance, quad_buffer, peak_buffer, null_buffer)
    Set {
        key: String,
        value: String,
        /// Persist the result to the tuning store
        #[arg(long, action = ArgAction::SetTrue)]
        save: bool,
    },
    /// Persist the effective tuning
    Save,
}

fn parse_mode(s: &str) -> Result<LockMode, String> {
    s.parse::<LockMode>().map_err(|e| e.to_string())
}
