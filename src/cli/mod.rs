//! Command-line interface definition

use crate::logging::{LogFormat, LogLevel};
use clap::Parser;
use std::path::PathBuf;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_COMMIT"),
    ", built ",
    env!("BUILD_TIME"),
    ", ",
    env!("TARGET_TRIPLE"),
    ")"
);

/// Network Speed Tester - measure latency, download and upload throughput
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "speedtest")]
#[command(version, long_version = LONG_VERSION, about, long_about = None)]
pub struct Cli {
    /// Base URL of the speed test endpoint
    #[arg(long)]
    pub url: Option<String>,

    /// Number of latency probes
    #[arg(short = 'l', long)]
    pub latency_probes: Option<u32>,

    /// Download plan as comma-separated BYTESxITERATIONS items
    #[arg(long, value_name = "PLAN")]
    pub download_plan: Option<String>,

    /// Upload plan as comma-separated BYTESxITERATIONS items
    #[arg(long, value_name = "PLAN")]
    pub upload_plan: Option<String>,

    /// Per-transfer timeout in seconds
    #[arg(short, long, value_parser = parse_duration)]
    pub timeout: Option<u64>,

    /// Reuse an idle connection between probes
    #[arg(long)]
    pub keep_alive: bool,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Force colored output
    #[arg(long, conflicts_with = "no_color")]
    pub color: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(long)]
    pub debug: bool,

    /// Minimum log level: trace, debug, info, warn or error
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Log output format: console, json or compact
    #[arg(long, value_name = "FORMAT")]
    pub log_format: Option<LogFormat>,

    /// Skip the server location and client address lookups
    #[arg(long)]
    pub skip_metadata: bool,

    /// Write an example .env file to PATH and exit
    #[arg(long, value_name = "PATH")]
    pub write_env_example: Option<PathBuf>,

    /// Show supported environment variables and exit
    #[arg(long)]
    pub env_help: bool,
}

impl Cli {
    /// Check if colors should be enabled, None when the flags leave it open
    pub fn color_override(&self) -> Option<bool> {
        if self.color {
            Some(true)
        } else if self.no_color || !supports_color() {
            Some(false)
        } else {
            None
        }
    }

    /// Get configuration summary for display
    pub fn get_config_summary(&self) -> String {
        let mut summary = String::new();

        summary.push_str("Command-line Overrides:\n");
        if let Some(ref url) = self.url {
            summary.push_str(&format!("  Server URL: {}\n", url));
        }
        if let Some(probes) = self.latency_probes {
            summary.push_str(&format!("  Latency probes: {}\n", probes));
        }
        if let Some(ref plan) = self.download_plan {
            summary.push_str(&format!("  Download plan: {}\n", plan));
        }
        if let Some(ref plan) = self.upload_plan {
            summary.push_str(&format!("  Upload plan: {}\n", plan));
        }
        if let Some(timeout) = self.timeout {
            summary.push_str(&format!("  Timeout: {}s\n", timeout));
        }
        summary.push_str(&format!("  Keep-alive: {}\n", self.keep_alive));
        summary.push_str(&format!("  JSON output: {}\n", self.json));
        summary.push_str(&format!("  Verbose mode: {}\n", self.verbose));
        summary.push_str(&format!("  Debug mode: {}\n", self.debug));
        if let Some(level) = self.log_level {
            summary.push_str(&format!("  Log level: {}\n", level.as_str()));
        }
        if let Some(format) = self.log_format {
            summary.push_str(&format!("  Log format: {:?}\n", format));
        }

        summary
    }
}

/// Parse duration from seconds string
fn parse_duration(s: &str) -> Result<u64, String> {
    if s.starts_with('+') || s.starts_with("0x") || s.starts_with("0X") {
        return Err(format!("Invalid duration: {}", s));
    }

    s.parse::<u64>()
        .map_err(|_| format!("Invalid duration: {}", s))
        .and_then(|secs| {
            if secs == 0 {
                Err("Duration must be greater than 0".to_string())
            } else if secs > crate::defaults::MAX_TIMEOUT_SECONDS {
                Err(format!(
                    "Duration cannot exceed {} seconds",
                    crate::defaults::MAX_TIMEOUT_SECONDS
                ))
            } else {
                Ok(secs)
            }
        })
}

/// Check if the environment allows color output
fn supports_color() -> bool {
    if let Ok(term) = std::env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }

    std::env::var("NO_COLOR").is_err()
}
