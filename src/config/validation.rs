//! Configuration validation utilities and rules

use crate::{
    error::Result,
    models::{Config, PlanEntry},
};

/// Configuration validator producing non-fatal warnings on top of `Config::validate`
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate configuration with comprehensive checks
    pub fn validate_comprehensive(config: &Config) -> Result<Vec<ValidationWarning>> {
        config.validate()?;

        let mut warnings = Vec::new();
        warnings.extend(Self::validate_server_url(&config.server_url));
        warnings.extend(Self::validate_plan("download", &config.download_plan));
        warnings.extend(Self::validate_plan("upload", &config.upload_plan));
        warnings.extend(Self::validate_performance_settings(config));

        Ok(warnings)
    }

    fn validate_server_url(server_url: &str) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();
        let parsed = match url::Url::parse(server_url) {
            Ok(parsed) => parsed,
            Err(_) => return warnings,
        };

        if parsed.scheme() == "http" {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                format!("Server '{}' uses plain HTTP, no TLS handshake will be measured", server_url),
            ));
        }

        if let Some(url::Host::Ipv4(ip)) = parsed.host() {
            if ip.is_private() || ip.is_loopback() {
                warnings.push(ValidationWarning::new(
                    ValidationLevel::Info,
                    format!("Server '{}' targets a private or local network", server_url),
                ));
            }
        }

        if !parsed.path().is_empty() && parsed.path() != "/" {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Info,
                format!(
                    "Server '{}' includes path '{}', endpoints are resolved below it",
                    server_url,
                    parsed.path()
                ),
            ));
        }

        warnings
    }

    fn validate_plan(name: &str, plan: &[PlanEntry]) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        if plan.windows(2).any(|pair| pair[0].payload_bytes > pair[1].payload_bytes) {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Info,
                format!("The {} plan is not in ascending size order and will be run sorted", name),
            ));
        }

        for entry in plan {
            if entry.payload_bytes > LARGE_PAYLOAD_BYTES {
                warnings.push(ValidationWarning::new(
                    ValidationLevel::Warning,
                    format!(
                        "The {} plan transfers {} per probe, which may take a long time on slow links",
                        name, entry.label
                    ),
                ));
            }
        }

        warnings
    }

    fn validate_performance_settings(config: &Config) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        if config.latency_probes < 5 {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                format!(
                    "{} latency probes may not provide reliable statistics (recommended: >= 5)",
                    config.latency_probes
                ),
            ));
        }

        if config.timeout_seconds < 5 {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                format!(
                    "Timeout of {}s may be too short for large payloads",
                    config.timeout_seconds
                ),
            ));
        }

        let total_bytes: u64 = config
            .download_plan
            .iter()
            .chain(config.upload_plan.iter())
            .map(|entry| entry.payload_bytes * entry.iterations as u64)
            .sum();
        if total_bytes > LARGE_RUN_BYTES {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Info,
                format!("Configuration will transfer about {} MB in total", total_bytes / 1_000_000),
            ));
        }

        warnings
    }
}

const LARGE_PAYLOAD_BYTES: u64 = 250_000_000;
const LARGE_RUN_BYTES: u64 = 1_000_000_000;

/// Validation warning levels
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationLevel {
    Info,
    Warning,
}

impl ValidationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
        }
    }
}

/// Configuration validation warning
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub level: ValidationLevel,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(level: ValidationLevel, message: String) -> Self {
        Self { level, message }
    }

    /// Format warning for display
    pub fn format(&self, use_color: bool) -> String {
        use colored::Colorize;

        let label = format!("[{}]", self.level.as_str());
        let label = match (use_color, &self.level) {
            (false, _) => label,
            (true, ValidationLevel::Info) => label.blue().to_string(),
            (true, ValidationLevel::Warning) => label.yellow().to_string(),
        };
        format!("{} {}", label, self.message)
    }
}

/// Convenience function for comprehensive configuration validation
pub fn validate_config(config: &Config) -> Result<Vec<ValidationWarning>> {
    ConfigValidator::validate_comprehensive(config)
}
