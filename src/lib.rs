//! Network Speed Tester
//!
//! Measures latency, download throughput and upload throughput against a
//! speed test endpoint, timing every connection phase of each transfer and
//! correcting for the processing time the server reports.

pub mod cli;
pub mod config;
pub mod error;
pub mod executor;
pub mod logging;
pub mod metadata;
pub mod models;
pub mod output;
pub mod stats;
pub mod throughput;
pub mod transfer;
pub mod types;

// Re-export commonly used types
pub use error::{AppError, Result};
pub use executor::SpeedTestExecutor;
pub use models::{Config, SpeedTestReport, TestPlan, TimingSample};
pub use stats::SummaryStatistics;
pub use throughput::throughput_mbps;
pub use transfer::{NetworkTransfer, TimedTransfer};
pub use types::Direction;

/// Application version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Default configuration values
pub mod defaults {
    use std::time::Duration;

    pub const DEFAULT_SERVER_URL: &str = "https://speed.cloudflare.com";
    pub const DEFAULT_LATENCY_PROBES: u32 = 20;
    pub const DEFAULT_LATENCY_PROBE_BYTES: u64 = 1000;
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
    pub const DEFAULT_ENABLE_COLOR: bool = true;

    /// Download sizes, iteration counts and labels
    pub const DEFAULT_DOWNLOAD_PLAN: &[(u64, u32, &str)] = &[
        (101_000, 10, "100kB"),
        (1_001_000, 8, "1MB"),
        (10_001_000, 6, "10MB"),
        (25_001_000, 4, "25MB"),
        (100_001_000, 1, "100MB"),
    ];

    pub const DEFAULT_UPLOAD_PLAN: &[(u64, u32, &str)] = &[
        (11_000, 10, "11kB"),
        (101_000, 10, "100kB"),
        (1_001_000, 8, "1MB"),
    ];

    /// Quantile reported as the headline throughput of a direction
    pub const HEADLINE_QUANTILE: f64 = 0.9;

    /// Length of `cfRequestDuration;dur=`, where the server time starts
    pub const SERVER_TIMING_OFFSET: usize = 22;

    pub const DOWNLOAD_PATH: &str = "/__down";
    pub const UPLOAD_PATH: &str = "/__up";
    pub const LOCATIONS_PATH: &str = "/locations";
    pub const TRACE_PATH: &str = "/cdn-cgi/trace";

    pub const MAX_ITERATIONS: u32 = 100;
    pub const MAX_PAYLOAD_BYTES: u64 = 1_000_000_000;
    pub const MAX_TIMEOUT_SECONDS: u64 = 300;
}
