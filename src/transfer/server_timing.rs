//! Parsing of the server-reported processing time

use crate::error::{AppError, Result};
use std::time::Duration;

/// Response header carrying the processing time
pub const SERVER_TIMING_HEADER: &str = "server-timing";

/// Parse a `server-timing` value of the form `cfRequestDuration;dur=12.5`
///
/// The number starts at a fixed offset and extends as far as it parses,
/// so trailing parameters such as `;desc=...` are ignored.
pub fn parse_server_timing(value: &str) -> Result<Duration> {
    let offset = crate::defaults::SERVER_TIMING_OFFSET;
    let rest = value.get(offset..).ok_or_else(|| {
        AppError::malformed_response(format!("server-timing header too short: '{}'", value))
    })?;

    let millis = leading_float(rest.trim_start()).ok_or_else(|| {
        AppError::malformed_response(format!("server-timing header has no duration: '{}'", value))
    })?;

    if !millis.is_finite() || millis < 0.0 {
        return Err(AppError::malformed_response(format!(
            "server-timing duration must be a non-negative number, got {}",
            millis
        )));
    }

    Duration::try_from_secs_f64(millis / 1000.0).map_err(|e| {
        AppError::malformed_response(format!("server-timing duration {}ms is out of range: {}", millis, e))
    })
}

/// Longest prefix of `text` that parses as a float, e.g. `12.5` from `12.5e;desc`
fn leading_float(text: &str) -> Option<f64> {
    let candidate_len = text
        .find(|c: char| !(c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E')))
        .unwrap_or(text.len());

    (1..=candidate_len)
        .rev()
        .find_map(|len| text[..len].parse::<f64>().ok())
}
