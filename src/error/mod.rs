//! Error handling for the network speed tester

use thiserror::Error;

/// Custom error types for the network speed tester
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// A single probe failed at the network, TLS or HTTP level
    #[error("Transfer failed: {0}")]
    TransferFailed(String),

    /// Statistics or throughput computation called with degenerate input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Server timing header missing or unparsable
    #[error("Malformed server response: {0}")]
    MalformedServerResponse(String),

    /// Location or client trace lookup failed
    #[error("Metadata lookup error: {0}")]
    Metadata(String),

    /// I/O errors (file operations, etc.)
    #[error("I/O error: {0}")]
    Io(String),

    /// Parsing errors (URLs, JSON, etc.)
    #[error("Parsing error: {0}")]
    Parse(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a new transfer failure
    pub fn transfer_failed<S: Into<String>>(message: S) -> Self {
        Self::TransferFailed(message.into())
    }

    /// Create a new invalid input error
    pub fn invalid_input<S: Into<String>>(message: S) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create a new malformed server response error
    pub fn malformed_response<S: Into<String>>(message: S) -> Self {
        Self::MalformedServerResponse(message.into())
    }

    /// Create a new metadata lookup error
    pub fn metadata<S: Into<String>>(message: S) -> Self {
        Self::Metadata(message.into())
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io(message.into())
    }

    /// Create a new parsing error
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse(message.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    /// Get error category for logging and reporting
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG",
            Self::TransferFailed(_) => "TRANSFER",
            Self::InvalidInput(_) => "INPUT",
            Self::MalformedServerResponse(_) => "RESPONSE",
            Self::Metadata(_) => "METADATA",
            Self::Io(_) => "IO",
            Self::Parse(_) => "PARSE",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// Whether a probe failing with this error may be skipped while the stage continues
    pub fn is_probe_failure(&self) -> bool {
        matches!(
            self,
            Self::TransferFailed(_) | Self::MalformedServerResponse(_) | Self::InvalidInput(_)
        )
    }

    /// Check if error is recoverable (can retry)
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::TransferFailed(_) | Self::MalformedServerResponse(_) | Self::Metadata(_) => true,
            Self::Config(_) | Self::InvalidInput(_) | Self::Parse(_) => false,
            Self::Io(_) | Self::Internal(_) => false,
        }
    }

    /// Get exit code for this error type
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Parse(_) => 1,  // Invalid configuration/usage
            Self::TransferFailed(_) | Self::Metadata(_) => 2,  // Network issues
            Self::MalformedServerResponse(_) => 3,
            Self::Io(_) => 5,
            Self::InvalidInput(_) => 6,  // A stage produced no usable samples
            Self::Internal(_) => 99,
        }
    }

    /// Format error for console display with color coding
    pub fn format_for_console(&self, use_color: bool) -> String {
        let category = self.category();
        let message = self.to_string();

        if use_color {
            use colored::Colorize;
            match self {
                Self::Config(_) | Self::Parse(_) => {
                    format!("[{}] {}", category.red().bold(), message.red())
                }
                Self::TransferFailed(_) | Self::Metadata(_) => {
                    format!("[{}] {}", category.yellow().bold(), message.yellow())
                }
                Self::MalformedServerResponse(_) => {
                    format!("[{}] {}", category.magenta().bold(), message.magenta())
                }
                Self::InvalidInput(_) | Self::Io(_) => {
                    format!("[{}] {}", category.cyan().bold(), message.cyan())
                }
                Self::Internal(_) => {
                    format!("[{}] {}", category.bright_red().bold(), message.bright_red())
                }
            }
        } else {
            format!("[{}] {}", category, message)
        }
    }
}

// Standard library error conversions
impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::io(error.to_string())
    }
}

impl From<url::ParseError> for AppError {
    fn from(error: url::ParseError) -> Self {
        Self::parse(format!("URL parse error: {}", error))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::parse(format!("JSON parse error: {}", error))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            Self::metadata(format!("Failed to decode response: {}", error))
        } else {
            Self::metadata(error.to_string())
        }
    }
}

impl From<hyper::Error> for AppError {
    fn from(error: hyper::Error) -> Self {
        Self::transfer_failed(format!("HTTP error: {}", error))
    }
}

impl From<http::Error> for AppError {
    fn from(error: http::Error) -> Self {
        Self::internal(format!("Failed to build request: {}", error))
    }
}

impl From<trust_dns_resolver::error::ResolveError> for AppError {
    fn from(error: trust_dns_resolver::error::ResolveError) -> Self {
        Self::transfer_failed(format!("DNS resolution failed: {}", error))
    }
}

impl From<dotenv::Error> for AppError {
    fn from(error: dotenv::Error) -> Self {
        Self::config(format!("Environment file error: {}", error))
    }
}

impl From<std::num::ParseIntError> for AppError {
    fn from(error: std::num::ParseIntError) -> Self {
        Self::parse(format!("Integer parse error: {}", error))
    }
}

impl From<std::num::ParseFloatError> for AppError {
    fn from(error: std::num::ParseFloatError) -> Self {
        Self::parse(format!("Float parse error: {}", error))
    }
}

impl From<std::str::ParseBoolError> for AppError {
    fn from(error: std::str::ParseBoolError) -> Self {
        Self::parse(format!("Boolean parse error: {}", error))
    }
}

// Anyhow integration
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::internal(error.to_string())
    }
}

/// Custom Result type for the application
pub type Result<T> = std::result::Result<T, AppError>;
