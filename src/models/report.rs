//! Result structures produced by the measurement stages

use crate::types::Direction;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Summary of the latency stage, all values in milliseconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatencyReport {
    /// Per-probe latencies in measurement order
    pub samples_ms: Vec<f64>,
    pub min_ms: f64,
    pub max_ms: f64,
    pub average_ms: f64,
    pub median_ms: f64,
    /// Absent when fewer than two probes succeeded
    pub jitter_ms: Option<f64>,
    pub failed_probes: u32,
}

/// Throughput results for one payload size
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizeReport {
    pub label: String,
    pub payload_bytes: u64,
    pub iterations: u32,
    pub samples_mbps: Vec<f64>,
    /// None when every probe of this size failed
    pub median_mbps: Option<f64>,
    pub failed_probes: u32,
}

impl SizeReport {
    pub fn successful_probes(&self) -> usize {
        self.samples_mbps.len()
    }
}

/// Throughput results for one direction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectionReport {
    pub direction: Direction,
    pub sizes: Vec<SizeReport>,
    /// 90th percentile over the samples of every size
    pub headline_mbps: f64,
}

impl DirectionReport {
    pub fn failed_probes(&self) -> u32 {
        self.sizes.iter().map(|size| size.failed_probes).sum()
    }

    /// Per-size report by label
    pub fn size(&self, label: &str) -> Option<&SizeReport> {
        self.sizes.iter().find(|size| size.label == label)
    }
}

/// Client and edge details gathered outside the measurement stages
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientMetadata {
    pub ip: Option<String>,
    /// Country code of the client
    pub loc: Option<String>,
    /// IATA code of the serving edge
    pub colo: Option<String>,
    /// City of the serving edge, resolved from its IATA code
    pub city: Option<String>,
}

/// Full result of a speed test run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeedTestReport {
    pub server_url: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ClientMetadata>,
    pub latency: LatencyReport,
    pub download: DirectionReport,
    pub upload: DirectionReport,
}

impl SpeedTestReport {
    pub fn with_metadata(mut self, metadata: ClientMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn failed_probes(&self) -> u32 {
        self.latency.failed_probes + self.download.failed_probes() + self.upload.failed_probes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn size(label: &str, failed: u32, median: Option<f64>) -> SizeReport {
        SizeReport {
            label: label.to_string(),
            payload_bytes: 1000,
            iterations: 2,
            samples_mbps: median.into_iter().collect(),
            median_mbps: median,
            failed_probes: failed,
        }
    }

    #[test]
    fn test_direction_report_lookup() {
        let report = DirectionReport {
            direction: Direction::Download,
            sizes: vec![size("1kB", 1, Some(5.0)), size("10kB", 2, None)],
            headline_mbps: 5.0,
        };

        assert_eq!(report.failed_probes(), 3);
        assert_eq!(report.size("1kB").unwrap().successful_probes(), 1);
        assert!(report.size("10kB").unwrap().median_mbps.is_none());
        assert!(report.size("1MB").is_none());
    }

    #[test]
    fn test_report_serializes_without_metadata() {
        let report = SpeedTestReport {
            server_url: "https://speed.example".to_string(),
            started_at: Utc::now(),
            completed_at: Utc::now(),
            metadata: None,
            latency: LatencyReport {
                samples_ms: vec![10.0],
                min_ms: 10.0,
                max_ms: 10.0,
                average_ms: 10.0,
                median_ms: 10.0,
                jitter_ms: None,
                failed_probes: 0,
            },
            download: DirectionReport {
                direction: Direction::Download,
                sizes: vec![],
                headline_mbps: 1.0,
            },
            upload: DirectionReport {
                direction: Direction::Upload,
                sizes: vec![],
                headline_mbps: 1.0,
            },
        };

        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("metadata").is_none());
        assert_eq!(json["download"]["direction"], "download");
        assert_eq!(json["latency"]["jitter_ms"], serde_json::Value::Null);

        let with_meta = report.with_metadata(ClientMetadata {
            colo: Some("AMS".to_string()),
            ..Default::default()
        });
        let json = serde_json::to_value(&with_meta).unwrap();
        assert_eq!(json["metadata"]["colo"], "AMS");
    }
}
