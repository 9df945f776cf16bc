//! Environment variable handling and .env file management

use crate::error::{AppError, Result};
use crate::logging::{LogFormat, LogLevel};
use crate::models::plan::parse_plan;
use crate::types::Direction;
use std::path::Path;

/// Environment variable configuration manager
pub struct EnvManager;

impl EnvManager {
    /// Load .env file from the working directory if it exists
    ///
    /// Returns whether a file was loaded. Variables already present in the
    /// process environment are not overwritten.
    pub fn load_env_file() -> Result<bool> {
        Self::load_env_file_from(Path::new(".env"))
    }

    pub fn load_env_file_from(path: &Path) -> Result<bool> {
        if !path.exists() {
            return Ok(false);
        }

        dotenv::from_path(path)
            .map_err(|e| AppError::config(format!("Failed to load {}: {}", path.display(), e)))?;
        Ok(true)
    }

    /// Create example .env file content
    pub fn create_example_env_content() -> String {
        let mut content = String::from(
            "# Network Speed Tester Configuration\n\
             #\n\
             # Values here are used as defaults and can be overridden by\n\
             # environment variables and command-line arguments.\n\n",
        );

        for (var, description, example) in Self::get_supported_env_vars() {
            content.push_str(&format!("# {}\n# {}={}\n\n", description, var, example));
        }

        content.push_str(
            "# Quick run against a local test server:\n\
             # SPEEDTEST_URL=http://127.0.0.1:8080\n\
             # LATENCY_PROBES=5\n\
             # DOWNLOAD_PLAN=101000x2\n\
             # UPLOAD_PLAN=11000x2\n",
        );

        content
    }

    /// Save example .env file to disk
    pub fn save_example_env_file(path: &Path) -> Result<()> {
        let content = Self::create_example_env_content();
        std::fs::write(path, content)
            .map_err(|e| AppError::config(format!("Failed to write example .env file: {}", e)))?;
        Ok(())
    }

    /// Validate environment variable format before parsing
    pub fn validate_env_var(key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match key {
            "SPEEDTEST_URL" => {
                let parsed = url::Url::parse(value)
                    .map_err(|e| AppError::config(format!("Invalid SPEEDTEST_URL '{}': {}", value, e)))?;
                if parsed.scheme() != "http" && parsed.scheme() != "https" {
                    return Err(AppError::config(format!("SPEEDTEST_URL must use http or https: {}", value)));
                }
            }
            "LATENCY_PROBES" => {
                let count: u32 = value
                    .parse()
                    .map_err(|e| AppError::config(format!("Invalid LATENCY_PROBES value '{}': {}", value, e)))?;
                if count == 0 || count > crate::defaults::MAX_ITERATIONS {
                    return Err(AppError::config(format!(
                        "LATENCY_PROBES must be between 1 and {}, got: {}",
                        crate::defaults::MAX_ITERATIONS,
                        count
                    )));
                }
            }
            "LATENCY_PROBE_BYTES" => {
                let bytes: u64 = value
                    .parse()
                    .map_err(|e| AppError::config(format!("Invalid LATENCY_PROBE_BYTES value '{}': {}", value, e)))?;
                if bytes == 0 {
                    return Err(AppError::config("LATENCY_PROBE_BYTES must be greater than 0"));
                }
            }
            "DOWNLOAD_PLAN" => {
                if parse_plan(value, Direction::Download)?.is_empty() {
                    return Err(AppError::config("DOWNLOAD_PLAN cannot be empty"));
                }
            }
            "UPLOAD_PLAN" => {
                if parse_plan(value, Direction::Upload)?.is_empty() {
                    return Err(AppError::config("UPLOAD_PLAN cannot be empty"));
                }
            }
            "TIMEOUT_SECONDS" => {
                let timeout: u64 = value
                    .parse()
                    .map_err(|e| AppError::config(format!("Invalid TIMEOUT_SECONDS value '{}': {}", value, e)))?;
                if timeout == 0 || timeout > crate::defaults::MAX_TIMEOUT_SECONDS {
                    return Err(AppError::config(format!(
                        "TIMEOUT_SECONDS must be between 1 and {}, got: {}",
                        crate::defaults::MAX_TIMEOUT_SECONDS,
                        timeout
                    )));
                }
            }
            "KEEP_ALIVE" | "ENABLE_COLOR" => {
                value
                    .parse::<bool>()
                    .map_err(|e| AppError::config(format!("Invalid {} value '{}': {}", key, value, e)))?;
            }
            "LOG_LEVEL" => {
                value
                    .parse::<LogLevel>()
                    .map_err(|e| AppError::config(format!("Invalid LOG_LEVEL value '{}': {}", value, e)))?;
            }
            "LOG_FORMAT" => {
                value
                    .parse::<LogFormat>()
                    .map_err(|e| AppError::config(format!("Invalid LOG_FORMAT value '{}': {}", value, e)))?;
            }
            _ => {
                // Unknown environment variable, ignore
            }
        }

        Ok(())
    }

    /// Get list of all supported environment variables with descriptions
    pub fn get_supported_env_vars() -> Vec<(&'static str, &'static str, &'static str)> {
        vec![
            ("SPEEDTEST_URL", "Base URL of the speed test endpoint", "https://speed.cloudflare.com"),
            ("LATENCY_PROBES", "Number of latency probes (1-100)", "20"),
            ("LATENCY_PROBE_BYTES", "Payload size of a latency probe in bytes", "1000"),
            ("DOWNLOAD_PLAN", "Download sizes as BYTESxITERATIONS items", "101000x10,1001000x8,10001000x6"),
            ("UPLOAD_PLAN", "Upload sizes as BYTESxITERATIONS items", "11000x10,101000x10,1001000x8"),
            ("TIMEOUT_SECONDS", "Per-transfer timeout in seconds (1-300)", "30"),
            ("KEEP_ALIVE", "Reuse connections between probes", "false"),
            ("ENABLE_COLOR", "Enable colored output", "true"),
            ("LOG_LEVEL", "Minimum log level (trace, debug, info, warn, error)", "info"),
            ("LOG_FORMAT", "Log output format (console, json, compact)", "compact"),
        ]
    }

    /// Display environment variable help
    pub fn display_env_help() -> String {
        let mut help = String::new();
        help.push_str("Supported Environment Variables:\n\n");

        for (var, description, example) in Self::get_supported_env_vars() {
            help.push_str(&format!("  {:<20} {}\n", var, description));
            help.push_str(&format!("  {:<20} Example: {}\n\n", "", example));
        }

        help.push_str("Configuration Priority (highest to lowest):\n");
        help.push_str("  1. Command-line arguments\n");
        help.push_str("  2. Environment variables\n");
        help.push_str("  3. .env file values\n");
        help.push_str("  4. Default values\n");

        help
    }

    /// Validate all currently set environment variables
    pub fn validate_current_env() -> Vec<String> {
        Self::get_supported_env_vars()
            .into_iter()
            .filter_map(|(var_name, _, _)| {
                let value = std::env::var(var_name).ok()?;
                Self::validate_env_var(var_name, &value)
                    .err()
                    .map(|e| format!("Warning: {}", e))
            })
            .collect()
    }

    /// Validate the lines of a .env file without loading it
    pub fn check_env_file(path: &Path) -> Result<Option<Vec<String>>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::config(format!("Failed to read {}: {}", path.display(), e)))?;

        let mut warnings = Vec::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                if let Err(e) = Self::validate_env_var(key.trim(), value.trim()) {
                    warnings.push(format!("Line '{}': {}", line, e));
                }
            }
        }

        Ok(Some(warnings))
    }
}
