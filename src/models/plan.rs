//! Payload sizes and iteration counts for each measurement stage

use crate::error::{AppError, Result};
use crate::types::{format_size, Direction};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One payload size and how many times to transfer it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanEntry {
    pub direction: Direction,
    pub payload_bytes: u64,
    pub iterations: u32,
    /// Human readable size, e.g. "10MB"
    pub label: String,
}

impl PlanEntry {
    pub fn new(direction: Direction, payload_bytes: u64, iterations: u32) -> Self {
        Self {
            direction,
            payload_bytes,
            iterations,
            label: format_size(payload_bytes),
        }
    }

    pub fn with_label<S: Into<String>>(mut self, label: S) -> Self {
        self.label = label.into();
        self
    }
}

impl fmt::Display for PlanEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.payload_bytes, self.iterations)
    }
}

/// Parse a plan of the form `101000x10,1001000x8`
///
/// Whitespace around items is ignored and an `X` separator is accepted.
/// Empty input yields an empty plan; validation decides whether that is allowed.
pub fn parse_plan(text: &str, direction: Direction) -> Result<Vec<PlanEntry>> {
    text.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| parse_plan_item(item, direction))
        .collect()
}

fn parse_plan_item(item: &str, direction: Direction) -> Result<PlanEntry> {
    let (bytes, iterations) = item
        .split_once(['x', 'X'])
        .ok_or_else(|| AppError::parse(format!("Plan item '{}' must look like BYTESxITERATIONS", item)))?;

    let payload_bytes: u64 = bytes
        .trim()
        .parse()
        .map_err(|e| AppError::parse(format!("Invalid payload size in plan item '{}': {}", item, e)))?;
    let iterations: u32 = iterations
        .trim()
        .parse()
        .map_err(|e| AppError::parse(format!("Invalid iteration count in plan item '{}': {}", item, e)))?;

    Ok(PlanEntry::new(direction, payload_bytes, iterations))
}

/// Render a plan back into its textual form
pub fn format_plan(entries: &[PlanEntry]) -> String {
    entries
        .iter()
        .map(|entry| entry.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Complete, static description of one speed test run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestPlan {
    /// Number of latency probes
    pub latency_probes: u32,
    /// Payload size of each latency probe
    pub latency_probe_bytes: u64,
    /// Download entries followed by upload entries
    pub entries: Vec<PlanEntry>,
}

impl TestPlan {
    /// Entries for one direction in ascending size order
    ///
    /// The sort is stable, so equal sizes keep their configured order.
    pub fn entries_for(&self, direction: Direction) -> Vec<&PlanEntry> {
        let mut entries: Vec<&PlanEntry> = self
            .entries
            .iter()
            .filter(|entry| entry.direction == direction)
            .collect();
        entries.sort_by_key(|entry| entry.payload_bytes);
        entries
    }

    /// Total number of transfers the run will attempt
    pub fn total_transfers(&self) -> u64 {
        self.latency_probes as u64
            + self
                .entries
                .iter()
                .map(|entry| entry.iterations as u64)
                .sum::<u64>()
    }
}

/// Default download plan with the labels the public speed test uses
pub fn default_download_plan() -> Vec<PlanEntry> {
    crate::defaults::DEFAULT_DOWNLOAD_PLAN
        .iter()
        .map(|&(bytes, iterations, label)| PlanEntry::new(Direction::Download, bytes, iterations).with_label(label))
        .collect()
}

pub fn default_upload_plan() -> Vec<PlanEntry> {
    crate::defaults::DEFAULT_UPLOAD_PLAN
        .iter()
        .map(|&(bytes, iterations, label)| PlanEntry::new(Direction::Upload, bytes, iterations).with_label(label))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plan() {
        let plan = parse_plan("101000x10, 1001000X8", Direction::Download).unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].payload_bytes, 101_000);
        assert_eq!(plan[0].iterations, 10);
        assert_eq!(plan[0].label, "101kB");
        assert_eq!(plan[1].payload_bytes, 1_001_000);
        assert_eq!(plan[1].iterations, 8);
        assert_eq!(plan[1].direction, Direction::Download);
    }

    #[test]
    fn test_parse_plan_errors() {
        assert!(parse_plan("101000", Direction::Upload).is_err());
        assert!(parse_plan("abcx10", Direction::Upload).is_err());
        assert!(parse_plan("1000x-1", Direction::Upload).is_err());
        assert!(parse_plan("", Direction::Upload).unwrap().is_empty());
    }

    #[test]
    fn test_format_plan() {
        let plan = parse_plan("11000x10,101000x10", Direction::Upload).unwrap();
        assert_eq!(format_plan(&plan), "11000x10,101000x10");
    }

    #[test]
    fn test_default_plans() {
        let download = default_download_plan();
        assert_eq!(download.len(), 5);
        assert_eq!(download[0].label, "100kB");
        assert_eq!(download[4].payload_bytes, 100_001_000);
        assert_eq!(download[4].iterations, 1);

        let upload = default_upload_plan();
        assert_eq!(upload.len(), 3);
        assert!(upload.iter().all(|entry| entry.direction == Direction::Upload));
        assert_eq!(upload[0].payload_bytes, 11_000);
    }

    #[test]
    fn test_entries_sorted_by_size() {
        let mut entries = parse_plan("1001000x2,101000x3", Direction::Download).unwrap();
        entries.extend(parse_plan("11000x1", Direction::Upload).unwrap());
        let plan = TestPlan {
            latency_probes: 20,
            latency_probe_bytes: 1000,
            entries,
        };

        let download = plan.entries_for(Direction::Download);
        assert_eq!(download.len(), 2);
        assert_eq!(download[0].payload_bytes, 101_000);
        assert_eq!(download[1].payload_bytes, 1_001_000);
        assert_eq!(plan.entries_for(Direction::Upload).len(), 1);
        assert_eq!(plan.total_transfers(), 20 + 2 + 3 + 1);
    }
}
