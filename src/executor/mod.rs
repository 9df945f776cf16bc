//! Measurement stages
//!
//! The executor runs the latency, download and upload stages strictly one
//! after another, issuing one transfer at a time. Failed probes are logged
//! and left out of the statistics. A stage in which every probe failed has
//! nothing to summarize and ends the run with `InvalidInput`.

use crate::{
    error::{AppError, Result},
    logging::ProbeLogger,
    models::{Config, DirectionReport, LatencyReport, PlanEntry, SizeReport, SpeedTestReport, TestPlan, TimingSample},
    stats::{self, SummaryStatistics},
    throughput::throughput_mbps,
    transfer::{NetworkTransfer, TimedTransfer},
    types::Direction,
};
use chrono::Utc;
use std::time::Instant;

/// Runs the measurement stages of a speed test against one transfer implementation
pub struct SpeedTestExecutor<T: TimedTransfer> {
    transfer: T,
    plan: TestPlan,
    server_url: String,
    logger: ProbeLogger,
}

impl SpeedTestExecutor<NetworkTransfer> {
    /// Executor performing real network transfers
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(NetworkTransfer::new(config)?, config))
    }
}

impl<T: TimedTransfer> SpeedTestExecutor<T> {
    pub fn new(transfer: T, config: &Config) -> Self {
        Self {
            transfer,
            plan: config.test_plan(),
            server_url: config.server_url.clone(),
            logger: ProbeLogger::new(config),
        }
    }

    pub fn with_logger(mut self, logger: ProbeLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn plan(&self) -> &TestPlan {
        &self.plan
    }

    /// Run all three stages and combine their results
    pub async fn run(&self) -> Result<SpeedTestReport> {
        let started_at = Utc::now();

        let latency = self.measure_latency().await?;
        let download = self.measure_download().await?;
        let upload = self.measure_upload().await?;

        Ok(SpeedTestReport {
            server_url: self.server_url.clone(),
            started_at,
            completed_at: Utc::now(),
            metadata: None,
            latency,
            download,
            upload,
        })
    }

    /// Latency stage: small downloads, each reduced to first-byte time minus server time
    pub async fn measure_latency(&self) -> Result<LatencyReport> {
        let stage_start = Instant::now();
        let bytes = self.plan.latency_probe_bytes;
        let mut samples_ms = Vec::with_capacity(self.plan.latency_probes as usize);
        let mut failed_probes = 0u32;

        for iteration in 1..=self.plan.latency_probes {
            match self.probe(Direction::Download, bytes, iteration).await {
                Ok(sample) => samples_ms.push(sample.latency_ms()),
                Err(e) if e.is_probe_failure() => failed_probes += 1,
                Err(e) => return Err(e),
            }
        }

        self.logger
            .log_stage_complete("latency", samples_ms.len(), failed_probes, stage_start.elapsed())
            .await;

        if samples_ms.is_empty() {
            return Err(AppError::invalid_input(format!(
                "Latency stage has no samples: all {} probes failed",
                failed_probes
            )));
        }

        let summary = SummaryStatistics::new(&samples_ms)?;
        let jitter_ms = if samples_ms.len() >= 2 {
            Some(stats::jitter(&samples_ms)?)
        } else {
            None
        };

        Ok(LatencyReport {
            min_ms: summary.min(),
            max_ms: summary.max(),
            average_ms: summary.average(),
            median_ms: summary.median(),
            jitter_ms,
            failed_probes,
            samples_ms,
        })
    }

    /// Download stage, timed from first byte to end of body
    pub async fn measure_download(&self) -> Result<DirectionReport> {
        self.measure_direction(Direction::Download).await
    }

    /// Upload stage, timed by the processing duration the server reports
    pub async fn measure_upload(&self) -> Result<DirectionReport> {
        self.measure_direction(Direction::Upload).await
    }

    async fn measure_direction(&self, direction: Direction) -> Result<DirectionReport> {
        let stage_start = Instant::now();
        let mut sizes = Vec::new();
        let mut all_samples = Vec::new();

        for entry in self.plan.entries_for(direction) {
            let size = self.measure_size(entry).await?;
            all_samples.extend_from_slice(&size.samples_mbps);
            sizes.push(size);
        }

        let failed: u32 = sizes.iter().map(|size| size.failed_probes).sum();
        self.logger
            .log_stage_complete(direction.as_str(), all_samples.len(), failed, stage_start.elapsed())
            .await;

        if all_samples.is_empty() {
            return Err(AppError::invalid_input(format!(
                "{} stage has no samples: all {} probes failed",
                direction, failed
            )));
        }

        let headline_mbps = stats::quantile(&all_samples, crate::defaults::HEADLINE_QUANTILE)?;

        Ok(DirectionReport {
            direction,
            sizes,
            headline_mbps,
        })
    }

    async fn measure_size(&self, entry: &PlanEntry) -> Result<SizeReport> {
        let mut samples_mbps = Vec::with_capacity(entry.iterations as usize);
        let mut failed_probes = 0u32;

        for iteration in 1..=entry.iterations {
            let sample = match self.probe(entry.direction, entry.payload_bytes, iteration).await {
                Ok(sample) => sample,
                Err(e) if e.is_probe_failure() => {
                    failed_probes += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };

            match self.throughput(entry, &sample) {
                Ok(mbps) => samples_mbps.push(mbps),
                Err(e) => {
                    self.logger
                        .log_probe_failure(entry.direction, entry.payload_bytes, iteration, &e)
                        .await;
                    failed_probes += 1;
                }
            }
        }

        Ok(SizeReport {
            label: entry.label.clone(),
            payload_bytes: entry.payload_bytes,
            iterations: entry.iterations,
            median_mbps: stats::median(&samples_mbps).ok(),
            samples_mbps,
            failed_probes,
        })
    }

    fn throughput(&self, entry: &PlanEntry, sample: &TimingSample) -> Result<f64> {
        let duration_ms = match entry.direction {
            Direction::Download => sample.transfer_ms(),
            Direction::Upload => sample.server_processing_ms(),
        };
        throughput_mbps(entry.payload_bytes, duration_ms)
    }

    /// One transfer, logged either way
    async fn probe(&self, direction: Direction, payload_bytes: u64, iteration: u32) -> Result<TimingSample> {
        match self.transfer.transfer(direction, payload_bytes).await {
            Ok(sample) => {
                self.logger.log_probe(direction, payload_bytes, iteration, &sample).await;
                Ok(sample)
            }
            Err(e) => {
                self.logger
                    .log_probe_failure(direction, payload_bytes, iteration, &e)
                    .await;
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PlanEntry;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Canned probe outcome
    #[derive(Clone)]
    enum Step {
        /// First-byte, body transfer and server times in milliseconds
        Ok { ttfb: u64, transfer: u64, server: u64 },
        Fail,
        /// Error that would repeat on every probe
        Fatal,
    }

    fn ok(ttfb: u64, transfer: u64, server: u64) -> Step {
        Step::Ok { ttfb, transfer, server }
    }

    /// Transfer replaying a fixed script and recording the requests it saw
    struct ScriptedTransfer {
        steps: Mutex<VecDeque<Step>>,
        requests: Mutex<Vec<(Direction, u64)>>,
    }

    impl ScriptedTransfer {
        fn new(steps: impl IntoIterator<Item = Step>) -> Self {
            Self {
                steps: Mutex::new(steps.into_iter().collect()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<(Direction, u64)> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TimedTransfer for ScriptedTransfer {
        async fn transfer(&self, direction: Direction, payload_bytes: u64) -> Result<TimingSample> {
            self.requests.lock().unwrap().push((direction, payload_bytes));
            let step = self
                .steps
                .lock()
                .unwrap()
                .pop_front()
                .expect("script exhausted");

            match step {
                Step::Ok { ttfb, transfer, server } => {
                    let started = Instant::now();
                    let time_to_first_byte = started + Duration::from_millis(ttfb);
                    Ok(TimingSample {
                        started,
                        dns_lookup: None,
                        tcp_handshake: Some(started),
                        ssl_handshake: None,
                        time_to_first_byte,
                        ended: time_to_first_byte + Duration::from_millis(transfer),
                        server_processing: Duration::from_millis(server),
                    })
                }
                Step::Fail => Err(AppError::transfer_failed("connection reset")),
                Step::Fatal => Err(AppError::config("Invalid TLS server name")),
            }
        }
    }

    fn config(latency_probes: u32, download: &[(u64, u32)], upload: &[(u64, u32)]) -> Config {
        Config {
            latency_probes,
            download_plan: download
                .iter()
                .map(|&(bytes, n)| PlanEntry::new(Direction::Download, bytes, n))
                .collect(),
            upload_plan: upload
                .iter()
                .map(|&(bytes, n)| PlanEntry::new(Direction::Upload, bytes, n))
                .collect(),
            ..Default::default()
        }
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!((actual - expected).abs() < 1e-6, "expected {}, got {}", expected, actual);
    }

    #[tokio::test]
    async fn test_latency_median_ignores_outlier() {
        let mut steps = vec![ok(20, 1, 5); 19];
        steps.push(ok(205, 1, 5));
        let executor = SpeedTestExecutor::new(ScriptedTransfer::new(steps), &config(20, &[], &[]));

        let report = executor.measure_latency().await.unwrap();
        assert_eq!(report.samples_ms.len(), 20);
        assert_close(report.median_ms, 15.0);
        assert_close(report.min_ms, 15.0);
        assert_close(report.max_ms, 200.0);
        assert!(report.average_ms > report.median_ms);
        assert!(report.jitter_ms.unwrap() > 0.0);
        assert_eq!(report.failed_probes, 0);
    }

    #[tokio::test]
    async fn test_latency_uses_small_downloads() {
        let transfer = ScriptedTransfer::new(vec![ok(10, 1, 0); 3]);
        let executor = SpeedTestExecutor::new(transfer, &config(3, &[], &[]));
        executor.measure_latency().await.unwrap();

        let requests = executor.transfer.requests();
        assert_eq!(requests, vec![(Direction::Download, 1000); 3]);
    }

    #[tokio::test]
    async fn test_latency_single_sample_has_no_jitter() {
        let executor = SpeedTestExecutor::new(ScriptedTransfer::new(vec![ok(10, 1, 0)]), &config(1, &[], &[]));
        let report = executor.measure_latency().await.unwrap();
        assert_eq!(report.jitter_ms, None);
        assert_close(report.median_ms, 10.0);
    }

    #[tokio::test]
    async fn test_failed_probe_is_excluded() {
        let steps = vec![ok(12, 1, 2), Step::Fail, ok(14, 1, 2), ok(16, 1, 2)];
        let executor = SpeedTestExecutor::new(ScriptedTransfer::new(steps), &config(4, &[], &[]));

        let report = executor.measure_latency().await.unwrap();
        assert_eq!(report.failed_probes, 1);
        assert_eq!(report.samples_ms.len(), 3);
        assert_close(report.median_ms, 12.0);
    }

    #[tokio::test]
    async fn test_all_latency_probes_failing_is_invalid_input() {
        let executor = SpeedTestExecutor::new(ScriptedTransfer::new(vec![Step::Fail; 3]), &config(3, &[], &[]));
        let result = executor.measure_latency().await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_download_headline_between_medians() {
        let mut steps = vec![ok(5, 50, 0); 10];
        steps.extend(vec![ok(5, 80, 0); 10]);
        let executor = SpeedTestExecutor::new(
            ScriptedTransfer::new(steps),
            &config(1, &[(11_000, 10), (101_000, 10)], &[]),
        );

        let report = executor.measure_download().await.unwrap();
        assert_eq!(report.sizes.len(), 2);
        let small = report.sizes[0].median_mbps.unwrap();
        let large = report.sizes[1].median_mbps.unwrap();
        assert_close(small, 1.76);
        assert_close(large, 10.1);

        assert!(report.headline_mbps >= small && report.headline_mbps <= large);
        assert!(large - report.headline_mbps < report.headline_mbps - small);
    }

    #[tokio::test]
    async fn test_download_runs_sizes_in_ascending_order() {
        let executor = SpeedTestExecutor::new(
            ScriptedTransfer::new(vec![ok(5, 10, 0); 3]),
            &config(1, &[(5_000, 1), (1_000, 2)], &[]),
        );
        executor.measure_download().await.unwrap();

        let sizes: Vec<u64> = executor.transfer.requests().iter().map(|(_, bytes)| *bytes).collect();
        assert_eq!(sizes, vec![1_000, 1_000, 5_000]);
    }

    #[tokio::test]
    async fn test_size_with_all_probes_failing_has_no_median() {
        let steps = vec![Step::Fail, Step::Fail, ok(5, 10, 0)];
        let executor = SpeedTestExecutor::new(
            ScriptedTransfer::new(steps),
            &config(1, &[(1_000, 2), (2_000, 1)], &[]),
        );

        let report = executor.measure_download().await.unwrap();
        assert_eq!(report.sizes[0].median_mbps, None);
        assert_eq!(report.sizes[0].failed_probes, 2);
        assert_close(report.sizes[1].median_mbps.unwrap(), 1.6);
        assert_close(report.headline_mbps, 1.6);
        assert_eq!(report.failed_probes(), 2);
    }

    #[tokio::test]
    async fn test_upload_is_timed_by_server() {
        // 11000 bytes over a 50ms server-reported duration, regardless of local timing
        let executor = SpeedTestExecutor::new(
            ScriptedTransfer::new(vec![ok(70, 3, 50); 2]),
            &config(1, &[], &[(11_000, 2)]),
        );

        let report = executor.measure_upload().await.unwrap();
        assert_eq!(report.direction, Direction::Upload);
        assert_close(report.sizes[0].median_mbps.unwrap(), 1.76);
        assert_eq!(executor.transfer.requests(), vec![(Direction::Upload, 11_000); 2]);
    }

    #[tokio::test]
    async fn test_zero_server_time_upload_counts_as_failure() {
        let executor = SpeedTestExecutor::new(
            ScriptedTransfer::new(vec![ok(10, 1, 0), ok(10, 1, 40)]),
            &config(1, &[], &[(10_000, 2)]),
        );

        let report = executor.measure_upload().await.unwrap();
        assert_eq!(report.sizes[0].failed_probes, 1);
        assert_eq!(report.sizes[0].samples_mbps.len(), 1);
        assert_close(report.headline_mbps, 2.0);
    }

    #[tokio::test]
    async fn test_empty_upload_stage_is_invalid_input() {
        let executor = SpeedTestExecutor::new(
            ScriptedTransfer::new(vec![Step::Fail; 2]),
            &config(1, &[], &[(1_000, 2)]),
        );
        assert!(matches!(executor.measure_upload().await, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_run_combines_stages() {
        let mut steps = vec![ok(10, 1, 2); 2];
        steps.extend(vec![ok(5, 8, 0); 2]);
        steps.extend(vec![ok(5, 8, 4); 1]);
        let executor = SpeedTestExecutor::new(
            ScriptedTransfer::new(steps),
            &config(2, &[(1_000, 2)], &[(1_000, 1)]),
        );

        let report = executor.run().await.unwrap();
        assert_close(report.latency.median_ms, 8.0);
        assert_close(report.download.headline_mbps, 1.0);
        assert_close(report.upload.headline_mbps, 2.0);
        assert!(report.metadata.is_none());
        assert!(report.completed_at >= report.started_at);
        assert_eq!(report.failed_probes(), 0);
    }

    #[tokio::test]
    async fn test_non_probe_error_aborts_stage() {
        let executor = SpeedTestExecutor::new(
            ScriptedTransfer::new(vec![ok(5, 10, 0), Step::Fatal, ok(5, 10, 0)]),
            &config(1, &[(1_000, 3)], &[]),
        );

        assert!(matches!(executor.measure_download().await, Err(AppError::Config(_))));
        assert_eq!(executor.transfer.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_run_stops_at_first_empty_stage() {
        let executor = SpeedTestExecutor::new(
            ScriptedTransfer::new(vec![Step::Fail; 2]),
            &config(2, &[(1_000, 1)], &[(1_000, 1)]),
        );

        assert!(matches!(executor.run().await, Err(AppError::InvalidInput(_))));
        // Download and upload never started
        assert_eq!(executor.transfer.requests().len(), 2);
    }
}
