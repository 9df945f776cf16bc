//! Configuration data model and validation

use crate::error::{AppError, Result};
use crate::logging::{LogFormat, LogLevel};
use crate::models::plan::{default_download_plan, default_upload_plan, parse_plan, PlanEntry, TestPlan};
use crate::types::Direction;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the speed test endpoint
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Number of latency probes
    #[serde(default = "default_latency_probes")]
    pub latency_probes: u32,

    /// Payload size of a latency probe in bytes
    #[serde(default = "default_latency_probe_bytes")]
    pub latency_probe_bytes: u64,

    /// Download sizes and iteration counts
    #[serde(default = "default_download_plan")]
    pub download_plan: Vec<PlanEntry>,

    /// Upload sizes and iteration counts
    #[serde(default = "default_upload_plan")]
    pub upload_plan: Vec<PlanEntry>,

    /// Per-transfer timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_seconds: u64,

    /// Reuse an idle connection between probes
    #[serde(default)]
    pub keep_alive: bool,

    /// Enable colored terminal output
    #[serde(default = "default_enable_color")]
    pub enable_color: bool,

    /// Enable verbose output
    #[serde(default)]
    pub verbose: bool,

    /// Enable debug output
    #[serde(default)]
    pub debug: bool,

    /// Minimum log level, overriding the one implied by verbose/debug
    #[serde(default)]
    pub log_level: Option<LogLevel>,

    /// Log output format, overriding the one implied by debug
    #[serde(default)]
    pub log_format: Option<LogFormat>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            latency_probes: default_latency_probes(),
            latency_probe_bytes: default_latency_probe_bytes(),
            download_plan: default_download_plan(),
            upload_plan: default_upload_plan(),
            timeout_seconds: default_timeout_secs(),
            keep_alive: false,
            enable_color: default_enable_color(),
            verbose: false,
            debug: false,
            log_level: None,
            log_format: None,
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Assemble the static plan the executor runs
    pub fn test_plan(&self) -> TestPlan {
        let entries = self
            .download_plan
            .iter()
            .chain(self.upload_plan.iter())
            .cloned()
            .collect();

        TestPlan {
            latency_probes: self.latency_probes,
            latency_probe_bytes: self.latency_probe_bytes,
            entries,
        }
    }

    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Result<()> {
        if self.server_url.is_empty() {
            return Err(AppError::config("Server URL cannot be empty"));
        }

        match url::Url::parse(&self.server_url) {
            Ok(parsed) => {
                if parsed.scheme() != "http" && parsed.scheme() != "https" {
                    return Err(AppError::config(format!(
                        "Server URL must use http or https: {}",
                        self.server_url
                    )));
                }
                if parsed.host_str().is_none() {
                    return Err(AppError::config(format!("Server URL has no host: {}", self.server_url)));
                }
            }
            Err(e) => {
                return Err(AppError::config(format!("Invalid server URL '{}': {}", self.server_url, e)));
            }
        }

        validate_count("Latency probe count", self.latency_probes)?;
        validate_size("Latency probe size", self.latency_probe_bytes)?;

        for (name, plan, direction) in [
            ("Download", &self.download_plan, Direction::Download),
            ("Upload", &self.upload_plan, Direction::Upload),
        ] {
            if plan.is_empty() {
                return Err(AppError::config(format!("{} plan cannot be empty", name)));
            }
            for entry in plan {
                if entry.direction != direction {
                    return Err(AppError::config(format!(
                        "{} plan contains a {} entry",
                        name, entry.direction
                    )));
                }
                validate_count(&format!("{} iteration count", name), entry.iterations)?;
                validate_size(&format!("{} payload size", name), entry.payload_bytes)?;
            }
        }

        if self.timeout_seconds == 0 {
            return Err(AppError::config("Timeout must be greater than 0"));
        }

        if self.timeout_seconds > crate::defaults::MAX_TIMEOUT_SECONDS {
            return Err(AppError::config(format!(
                "Timeout cannot exceed {} seconds",
                crate::defaults::MAX_TIMEOUT_SECONDS
            )));
        }

        Ok(())
    }

    /// Merge environment variables into this configuration
    pub fn merge_from_env(&mut self) -> Result<()> {
        if let Ok(server_url) = std::env::var("SPEEDTEST_URL") {
            let server_url = server_url.trim();
            if !server_url.is_empty() {
                self.server_url = server_url.trim_end_matches('/').to_string();
            }
        }

        if let Ok(probes) = std::env::var("LATENCY_PROBES") {
            self.latency_probes = probes
                .trim()
                .parse()
                .map_err(|e| AppError::config(format!("Invalid LATENCY_PROBES value '{}': {}", probes, e)))?;
        }

        if let Ok(bytes) = std::env::var("LATENCY_PROBE_BYTES") {
            self.latency_probe_bytes = bytes
                .trim()
                .parse()
                .map_err(|e| AppError::config(format!("Invalid LATENCY_PROBE_BYTES value '{}': {}", bytes, e)))?;
        }

        if let Ok(plan) = std::env::var("DOWNLOAD_PLAN") {
            self.download_plan = parse_plan(&plan, Direction::Download)
                .map_err(|e| AppError::config(format!("Invalid DOWNLOAD_PLAN value '{}': {}", plan, e)))?;
        }

        if let Ok(plan) = std::env::var("UPLOAD_PLAN") {
            self.upload_plan = parse_plan(&plan, Direction::Upload)
                .map_err(|e| AppError::config(format!("Invalid UPLOAD_PLAN value '{}': {}", plan, e)))?;
        }

        if let Ok(timeout) = std::env::var("TIMEOUT_SECONDS") {
            self.timeout_seconds = timeout
                .trim()
                .parse()
                .map_err(|e| AppError::config(format!("Invalid TIMEOUT_SECONDS value '{}': {}", timeout, e)))?;
        }

        if let Ok(keep_alive) = std::env::var("KEEP_ALIVE") {
            self.keep_alive = keep_alive
                .trim()
                .parse()
                .map_err(|e| AppError::config(format!("Invalid KEEP_ALIVE value '{}': {}", keep_alive, e)))?;
        }

        if let Ok(enable_color) = std::env::var("ENABLE_COLOR") {
            self.enable_color = enable_color
                .trim()
                .parse()
                .map_err(|e| AppError::config(format!("Invalid ENABLE_COLOR value '{}': {}", enable_color, e)))?;
        }

        if let Ok(level) = std::env::var("LOG_LEVEL") {
            self.log_level = Some(
                level
                    .trim()
                    .parse()
                    .map_err(|e| AppError::config(format!("Invalid LOG_LEVEL value '{}': {}", level, e)))?,
            );
        }

        if let Ok(format) = std::env::var("LOG_FORMAT") {
            self.log_format = Some(
                format
                    .trim()
                    .parse()
                    .map_err(|e| AppError::config(format!("Invalid LOG_FORMAT value '{}': {}", format, e)))?,
            );
        }

        Ok(())
    }
}

fn validate_count(what: &str, count: u32) -> Result<()> {
    if count == 0 {
        return Err(AppError::config(format!("{} must be greater than 0", what)));
    }
    if count > crate::defaults::MAX_ITERATIONS {
        return Err(AppError::config(format!(
            "{} cannot exceed {}",
            what,
            crate::defaults::MAX_ITERATIONS
        )));
    }
    Ok(())
}

fn validate_size(what: &str, bytes: u64) -> Result<()> {
    if bytes == 0 {
        return Err(AppError::config(format!("{} must be greater than 0", what)));
    }
    if bytes > crate::defaults::MAX_PAYLOAD_BYTES {
        return Err(AppError::config(format!(
            "{} cannot exceed {} bytes",
            what,
            crate::defaults::MAX_PAYLOAD_BYTES
        )));
    }
    Ok(())
}

// Default value functions for serde
fn default_server_url() -> String {
    crate::defaults::DEFAULT_SERVER_URL.to_string()
}

fn default_latency_probes() -> u32 {
    crate::defaults::DEFAULT_LATENCY_PROBES
}

fn default_latency_probe_bytes() -> u64 {
    crate::defaults::DEFAULT_LATENCY_PROBE_BYTES
}

fn default_timeout_secs() -> u64 {
    crate::defaults::DEFAULT_TIMEOUT.as_secs()
}

fn default_enable_color() -> bool {
    crate::defaults::DEFAULT_ENABLE_COLOR
}
