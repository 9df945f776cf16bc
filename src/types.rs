//! Type definitions and aliases

use serde::{Deserialize, Serialize};
use std::fmt;

// Re-export commonly used types
pub use crate::error::{AppError, Result};

/// Direction of a timed transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Server sends a body of the requested size
    Download,
    /// Client sends a body of the requested size
    Upload,
}

impl Direction {
    /// Lowercase name used in logs and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Download => "download",
            Direction::Upload => "upload",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Format a payload size with decimal units, e.g. `101000` -> `101kB`
pub fn format_size(bytes: u64) -> String {
    if bytes >= 1_000_000 {
        format!("{}MB", bytes / 1_000_000)
    } else if bytes >= 1_000 {
        format!("{}kB", bytes / 1_000)
    } else {
        format!("{}B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_names() {
        assert_eq!(Direction::Download.as_str(), "download");
        assert_eq!(Direction::Upload.to_string(), "upload");
        assert_eq!(serde_json::to_string(&Direction::Upload).unwrap(), "\"upload\"");
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(999), "999B");
        assert_eq!(format_size(11_000), "11kB");
        assert_eq!(format_size(101_000), "101kB");
        assert_eq!(format_size(25_001_000), "25MB");
    }
}
