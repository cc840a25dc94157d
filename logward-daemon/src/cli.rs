//! CLI argument definitions for logward-daemon.
//!
//! Uses `clap` v4 derive macros to parse command-line arguments.

use std::path::PathBuf;

use clap::Parser;

/// Logward log anomaly monitoring daemon.
///
/// Streams logs from the configured sources, buffers them into
/// fixed-duration windows per source, and reports rule hits
/// (crash loops, brute force, suspicious commands, ...) per window.
#[derive(Parser, Debug)]
#[command(name = "logward-daemon")]
#[command(version, about, long_about = None)]
pub struct DaemonCli {
    /// Path to logward.toml configuration file.
    ///
    /// If the file does not exist, built-in defaults are used.
    #[arg(short, long, default_value = "/etc/logward/logward.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_format: Option<String>,

    /// Validate configuration and exit without starting the daemon.
    #[arg(long)]
    pub validate: bool,
}
