//! Per-transfer lifecycle timestamps

use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Lifecycle timestamps of one completed transfer
///
/// Connection phases are optional: a literal IP host has no DNS phase, a
/// plain HTTP target has no TLS phase and a reused connection has none of
/// the three. An absent phase means "not observed", never zero.
#[derive(Debug, Clone, PartialEq)]
pub struct TimingSample {
    /// When the request was initiated
    pub started: Instant,

    /// When name resolution completed
    pub dns_lookup: Option<Instant>,

    /// When the TCP connection was established
    pub tcp_handshake: Option<Instant>,

    /// When the TLS handshake completed
    pub ssl_handshake: Option<Instant>,

    /// When the response head became readable
    pub time_to_first_byte: Instant,

    /// When the response body was fully consumed
    pub ended: Instant,

    /// Processing time reported by the server for this request
    pub server_processing: Duration,
}

impl TimingSample {
    /// Check the phase ordering invariant
    pub fn validate(&self) -> Result<()> {
        let mut previous = self.started;
        let phases = [
            ("dns_lookup", self.dns_lookup),
            ("tcp_handshake", self.tcp_handshake),
            ("ssl_handshake", self.ssl_handshake),
            ("time_to_first_byte", Some(self.time_to_first_byte)),
            ("ended", Some(self.ended)),
        ];

        for (name, at) in phases {
            if let Some(at) = at {
                if at < previous {
                    return Err(AppError::internal(format!("Timing phase '{}' precedes an earlier phase", name)));
                }
                previous = at;
            }
        }

        Ok(())
    }

    /// Network-only latency: time to first byte minus server processing
    pub fn latency_ms(&self) -> f64 {
        duration_ms(self.time_to_first_byte - self.started) - self.server_processing_ms()
    }

    /// Time spent draining the response body
    pub fn transfer_ms(&self) -> f64 {
        duration_ms(self.ended - self.time_to_first_byte)
    }

    pub fn server_processing_ms(&self) -> f64 {
        duration_ms(self.server_processing)
    }

    /// Whether a fresh connection was set up for this transfer
    pub fn is_fresh_connection(&self) -> bool {
        self.tcp_handshake.is_some()
    }

    /// Millisecond view of the phases for logging and reports
    pub fn phase_durations(&self) -> PhaseDurations {
        let dns_ms = self.dns_lookup.map(|at| duration_ms(at - self.started));

        let tcp_ms = self.tcp_handshake.map(|at| {
            let from = self.dns_lookup.unwrap_or(self.started);
            duration_ms(at - from)
        });

        let tls_ms = self.ssl_handshake.map(|at| {
            let from = self.tcp_handshake.or(self.dns_lookup).unwrap_or(self.started);
            duration_ms(at - from)
        });

        PhaseDurations {
            dns_ms,
            tcp_ms,
            tls_ms,
            first_byte_ms: duration_ms(self.time_to_first_byte - self.started),
            transfer_ms: self.transfer_ms(),
            total_ms: duration_ms(self.ended - self.started),
            server_ms: self.server_processing_ms(),
        }
    }
}

/// Phase lengths in milliseconds, each measured from the previous observed phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseDurations {
    pub dns_ms: Option<f64>,
    pub tcp_ms: Option<f64>,
    pub tls_ms: Option<f64>,
    /// From request start to first byte
    pub first_byte_ms: f64,
    /// From first byte to end of body
    pub transfer_ms: f64,
    pub total_ms: f64,
    pub server_ms: f64,
}

/// Collects phase timestamps while a transfer is in flight
#[derive(Debug, Clone)]
pub struct PhaseRecorder {
    started: Instant,
    dns_lookup: Option<Instant>,
    tcp_handshake: Option<Instant>,
    ssl_handshake: Option<Instant>,
    time_to_first_byte: Option<Instant>,
}

impl PhaseRecorder {
    /// Start recording now
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
            dns_lookup: None,
            tcp_handshake: None,
            ssl_handshake: None,
            time_to_first_byte: None,
        }
    }

    pub fn started(&self) -> Instant {
        self.started
    }

    pub fn dns_resolved(&mut self) {
        self.dns_lookup = Some(Instant::now());
    }

    pub fn tcp_connected(&mut self) {
        self.tcp_handshake = Some(Instant::now());
    }

    pub fn tls_established(&mut self) {
        self.ssl_handshake = Some(Instant::now());
    }

    pub fn first_byte(&mut self) {
        self.time_to_first_byte = Some(Instant::now());
    }

    /// Seal the record once the body is drained
    pub fn finish(self, server_processing: Duration) -> Result<TimingSample> {
        let ended = Instant::now();
        let time_to_first_byte = self
            .time_to_first_byte
            .ok_or_else(|| AppError::internal("Transfer finished before first byte was recorded"))?;

        let sample = TimingSample {
            started: self.started,
            dns_lookup: self.dns_lookup,
            tcp_handshake: self.tcp_handshake,
            ssl_handshake: self.ssl_handshake,
            time_to_first_byte,
            ended,
            server_processing,
        };
        sample.validate()?;
        Ok(sample)
    }
}

fn duration_ms(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}
