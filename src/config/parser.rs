//! Configuration parsing from CLI arguments and environment variables

use crate::{
    cli::Cli,
    config::env::EnvManager,
    error::{AppError, Result},
    models::{plan::format_plan, plan::parse_plan, Config},
    types::Direction,
};

/// Configuration parser that combines CLI arguments with environment variables
pub struct ConfigParser {
    cli: Cli,
}

impl ConfigParser {
    /// Create a new configuration parser with CLI arguments
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Parse and build the complete configuration
    pub fn parse(&self) -> Result<Config> {
        let mut config = Config::default();

        EnvManager::load_env_file()?;
        config.merge_from_env()?;

        self.apply_cli_overrides(&mut config)?;
        config.validate()?;

        Ok(config)
    }

    /// Apply CLI argument overrides to configuration
    pub fn apply_cli_overrides(&self, config: &mut Config) -> Result<()> {
        if let Some(ref url) = self.cli.url {
            config.server_url = url.trim_end_matches('/').to_string();
        }

        if let Some(probes) = self.cli.latency_probes {
            config.latency_probes = probes;
        }

        if let Some(ref plan) = self.cli.download_plan {
            config.download_plan = parse_plan(plan, Direction::Download)
                .map_err(|e| AppError::config(format!("Invalid --download-plan '{}': {}", plan, e)))?;
        }

        if let Some(ref plan) = self.cli.upload_plan {
            config.upload_plan = parse_plan(plan, Direction::Upload)
                .map_err(|e| AppError::config(format!("Invalid --upload-plan '{}': {}", plan, e)))?;
        }

        if let Some(timeout) = self.cli.timeout {
            config.timeout_seconds = timeout;
        }

        if self.cli.keep_alive {
            config.keep_alive = true;
        }

        if let Some(enable_color) = self.cli.color_override() {
            config.enable_color = enable_color;
        }

        if let Some(level) = self.cli.log_level {
            config.log_level = Some(level);
        }

        if let Some(format) = self.cli.log_format {
            config.log_format = Some(format);
        }

        // CLI-only flags
        config.verbose = self.cli.verbose;
        config.debug = self.cli.debug;

        Ok(())
    }
}

/// Convenience function to load complete configuration from CLI arguments
pub fn load_config(cli: Cli) -> Result<Config> {
    ConfigParser::new(cli).parse()
}

/// Display configuration summary for debug purposes
pub fn display_config_summary(config: &Config) -> String {
    let summary = [
        format!("Server URL: {}", config.server_url),
        format!(
            "Latency Probes: {} x {} bytes",
            config.latency_probes, config.latency_probe_bytes
        ),
        format!("Download Plan: {}", format_plan(&config.download_plan)),
        format!("Upload Plan: {}", format_plan(&config.upload_plan)),
        format!("Timeout: {}s", config.timeout_seconds),
        format!("Keep-alive: {}", config.keep_alive),
        format!("Color Output: {}", config.enable_color),
        format!("Verbose: {}", config.verbose),
        format!("Debug: {}", config.debug),
        format!(
            "Log Level: {}",
            config.log_level.map_or("from verbose/debug", |level| level.as_str())
        ),
        format!(
            "Log Format: {}",
            config.log_format.map_or_else(|| "from debug".to_string(), |format| format!("{:?}", format))
        ),
    ];

    summary.join("\n")
}
