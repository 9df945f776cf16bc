//! Timed HTTP transfers
//!
//! A transfer issues one download or upload request and records when each
//! connection phase completed together with the processing time the server
//! reports for the request.

pub mod network;
pub mod resolver;
pub mod server_timing;

#[cfg(test)]
mod integration_tests;

pub use network::NetworkTransfer;
pub use resolver::{HostResolver, ResolvedTarget};
pub use server_timing::parse_server_timing;

use crate::error::Result;
use crate::models::TimingSample;
use crate::types::Direction;
use async_trait::async_trait;

/// One instrumented request of a given payload size
#[async_trait]
pub trait TimedTransfer: Send + Sync {
    /// Perform the transfer and return its phase timestamps
    ///
    /// Fails with `TransferFailed` on network errors, non-success statuses
    /// and timeouts, and with `MalformedServerResponse` when the server
    /// timing header is missing or unreadable.
    async fn transfer(&self, direction: Direction, payload_bytes: u64) -> Result<TimingSample>;
}
