//! Conversion of transferred bytes and elapsed time into a bit rate

use crate::error::{AppError, Result};

/// Megabits per second for `bytes` transferred in `duration_ms` milliseconds
pub fn throughput_mbps(bytes: u64, duration_ms: f64) -> Result<f64> {
    if !duration_ms.is_finite() || duration_ms <= 0.0 {
        return Err(AppError::invalid_input(format!(
            "Transfer duration must be positive, got {}ms",
            duration_ms
        )));
    }

    let bits = bytes as f64 * 8.0;
    Ok(bits / (duration_ms / 1000.0) / 1_000_000.0)
}
