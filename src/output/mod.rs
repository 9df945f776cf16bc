//! Console rendering of speed test results
//!
//! Each stage can be rendered on its own so results appear as soon as a
//! stage completes; `format_report` renders a full run at once.

mod colored;

pub use self::colored::{ColorScheme, LatencyLevel, SpeedLevel};

use crate::{
    error::{AppError, Result},
    models::{ClientMetadata, Config, DirectionReport, LatencyReport, SizeReport, SpeedTestReport},
};
use ::colored::{Color, ColoredString, Colorize};
use std::fmt::Write as _;

const RULE_WIDTH: usize = 48;

fn fmt_err(e: std::fmt::Error) -> AppError {
    AppError::io(format!("Failed to format output: {}", e))
}

/// Renders reports as aligned, optionally colored, text
pub struct ReportFormatter {
    enable_color: bool,
    verbose: bool,
    color_scheme: ColorScheme,
}

impl ReportFormatter {
    pub fn new(enable_color: bool, verbose: bool) -> Self {
        Self {
            enable_color,
            verbose,
            color_scheme: ColorScheme::default(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.enable_color, config.verbose)
    }

    pub fn with_color_scheme(mut self, color_scheme: ColorScheme) -> Self {
        self.color_scheme = color_scheme;
        self
    }

    fn colorize(&self, text: &str, color: Color) -> ColoredString {
        if self.enable_color {
            text.color(color)
        } else {
            text.normal()
        }
    }

    fn bold(&self, text: &str) -> ColoredString {
        if self.enable_color {
            text.bold()
        } else {
            text.normal()
        }
    }

    fn label(&self, text: &str) -> ColoredString {
        self.colorize(&format!("{:<18}", text), self.color_scheme.label)
    }

    fn ms(&self, value: f64) -> ColoredString {
        self.colorize(&format!("{:.2} ms", value), LatencyLevel::from_latency(value).color())
    }

    fn mbps(&self, value: f64) -> ColoredString {
        self.colorize(&format!("{:.2} Mbps", value), SpeedLevel::from_mbps(value).color())
    }

    fn failures(&self, failed: u32) -> String {
        if failed == 0 {
            String::new()
        } else {
            format!(" {}", self.colorize(&format!("({} failed)", failed), self.color_scheme.warning))
        }
    }

    /// Section title followed by a rule
    pub fn format_header(&self, title: &str) -> Result<String> {
        let mut output = String::new();
        let title = if self.enable_color {
            title.bold().color(self.color_scheme.header)
        } else {
            title.normal()
        };
        writeln!(output, "{}", title).map_err(fmt_err)?;
        write!(output, "{}", self.colorize(&"─".repeat(RULE_WIDTH), self.color_scheme.muted)).map_err(fmt_err)?;
        Ok(output)
    }

    pub fn format_metadata(&self, server_url: &str, metadata: Option<&ClientMetadata>) -> Result<String> {
        let mut output = String::new();
        writeln!(output, "{}{}", self.label("Server"), server_url).map_err(fmt_err)?;

        let Some(metadata) = metadata else {
            return Ok(output);
        };

        let location = match (&metadata.city, &metadata.colo) {
            (Some(city), Some(colo)) => Some(format!("{} ({})", city, colo)),
            (None, Some(colo)) => Some(colo.clone()),
            (Some(city), None) => Some(city.clone()),
            (None, None) => None,
        };
        if let Some(location) = location {
            writeln!(output, "{}{}", self.label("Server location"), location).map_err(fmt_err)?;
        }
        if let Some(ip) = &metadata.ip {
            let ip = match &metadata.loc {
                Some(loc) => format!("{} ({})", ip, loc),
                None => ip.clone(),
            };
            writeln!(output, "{}{}", self.label("Your IP"), ip).map_err(fmt_err)?;
        }

        Ok(output)
    }

    pub fn format_latency(&self, report: &LatencyReport) -> Result<String> {
        let mut output = String::new();

        writeln!(
            output,
            "{}{}{}",
            self.label("Latency"),
            self.bold(&self.ms(report.median_ms).to_string()),
            self.failures(report.failed_probes)
        )
        .map_err(fmt_err)?;

        let jitter = match report.jitter_ms {
            Some(jitter) => self.ms(jitter).to_string(),
            None => self.colorize("n/a", self.color_scheme.muted).to_string(),
        };
        writeln!(output, "{}{}", self.label("Jitter"), jitter).map_err(fmt_err)?;
        writeln!(
            output,
            "{}min {} / avg {} / max {}",
            self.label(""),
            self.ms(report.min_ms),
            self.ms(report.average_ms),
            self.ms(report.max_ms)
        )
        .map_err(fmt_err)?;

        if self.verbose {
            let samples: Vec<String> = report.samples_ms.iter().map(|ms| format!("{:.1}", ms)).collect();
            writeln!(
                output,
                "{}{}",
                self.label("Samples (ms)"),
                self.colorize(&samples.join(" "), self.color_scheme.muted)
            )
            .map_err(fmt_err)?;
        }

        Ok(output)
    }

    fn format_size(&self, size: &SizeReport) -> Result<String> {
        let median = match size.median_mbps {
            Some(mbps) => self.mbps(mbps).to_string(),
            None => self.colorize("failed", self.color_scheme.error).to_string(),
        };
        let mut line = format!(
            "  {:<16}{}{}",
            format!("{} x{}", size.label, size.iterations),
            median,
            self.failures(size.failed_probes)
        );

        if self.verbose && !size.samples_mbps.is_empty() {
            let samples: Vec<String> = size.samples_mbps.iter().map(|mbps| format!("{:.1}", mbps)).collect();
            write!(line, "\n  {:<16}{}", "", self.colorize(&samples.join(" "), self.color_scheme.muted))
                .map_err(fmt_err)?;
        }

        Ok(line)
    }

    pub fn format_direction(&self, report: &DirectionReport) -> Result<String> {
        let mut output = String::new();
        let title = match report.direction {
            crate::types::Direction::Download => "Download",
            crate::types::Direction::Upload => "Upload",
        };

        writeln!(
            output,
            "{}{}",
            self.label(title),
            self.bold(&self.mbps(report.headline_mbps).to_string())
        )
        .map_err(fmt_err)?;

        for size in &report.sizes {
            writeln!(output, "{}", self.format_size(size)?).map_err(fmt_err)?;
        }

        Ok(output)
    }

    pub fn format_report(&self, report: &SpeedTestReport) -> Result<String> {
        let mut output = String::new();

        writeln!(output, "{}", self.format_header("Speed Test Results")?).map_err(fmt_err)?;
        write!(output, "{}", self.format_metadata(&report.server_url, report.metadata.as_ref())?).map_err(fmt_err)?;
        writeln!(output).map_err(fmt_err)?;
        write!(output, "{}", self.format_latency(&report.latency)?).map_err(fmt_err)?;
        writeln!(output).map_err(fmt_err)?;
        write!(output, "{}", self.format_direction(&report.download)?).map_err(fmt_err)?;
        writeln!(output).map_err(fmt_err)?;
        write!(output, "{}", self.format_direction(&report.upload)?).map_err(fmt_err)?;

        let failed = report.failed_probes();
        if failed > 0 {
            writeln!(
                output,
                "\n{}",
                self.colorize(
                    &format!("{} probe(s) failed and were left out of the results", failed),
                    self.color_scheme.warning
                )
            )
            .map_err(fmt_err)?;
        }

        Ok(output)
    }
}
