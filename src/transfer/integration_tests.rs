//! Transfer tests against a local mock speed test server

use super::*;
use crate::error::AppError;
use std::time::Duration;
use wiremock::{
    matchers::{body_string, header, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

const TIMING: &str = "cfRequestDuration;dur=2.5";

/// Mock speed test server with download and upload endpoints
pub struct MockSpeedServer {
    server: MockServer,
}

impl MockSpeedServer {
    pub async fn new() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn url(&self) -> String {
        self.server.uri()
    }

    /// Serve `bytes` bytes on the download endpoint
    pub async fn mock_download(&self, bytes: u64, template: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path("/__down"))
            .and(query_param("bytes", bytes.to_string()))
            .respond_with(template)
            .mount(&self.server)
            .await;
    }

    pub async fn mock_upload(&self, template: ResponseTemplate) {
        Mock::given(method("POST"))
            .and(path("/__up"))
            .respond_with(template)
            .mount(&self.server)
            .await;
    }

    pub fn body(bytes: u64) -> ResponseTemplate {
        ResponseTemplate::new(200)
            .insert_header("server-timing", TIMING)
            .set_body_bytes(vec![b'x'; bytes as usize])
    }
}

fn transfer(server: &MockSpeedServer, keep_alive: bool) -> NetworkTransfer {
    NetworkTransfer::with_options(&server.url(), Duration::from_secs(5), keep_alive).unwrap()
}

#[tokio::test]
async fn download_records_phases() {
    let server = MockSpeedServer::new().await;
    server.mock_download(1000, MockSpeedServer::body(1000)).await;

    let sample = transfer(&server, false)
        .transfer(Direction::Download, 1000)
        .await
        .unwrap();

    // Literal IP over plain HTTP: no lookup and no TLS handshake
    assert!(sample.dns_lookup.is_none());
    assert!(sample.tcp_handshake.is_some());
    assert!(sample.ssl_handshake.is_none());
    assert_eq!(sample.server_processing, Duration::from_micros(2500));
    assert!(sample.validate().is_ok());
    assert!(sample.transfer_ms() >= 0.0);
}

#[tokio::test]
async fn upload_sends_payload() {
    let server = MockSpeedServer::new().await;
    Mock::given(method("POST"))
        .and(path("/__up"))
        .and(header("content-length", "16"))
        .and(body_string("0".repeat(16)))
        .respond_with(ResponseTemplate::new(200).insert_header("server-timing", "cfRequestDuration;dur=7"))
        .expect(1)
        .mount(&server.server)
        .await;

    let sample = transfer(&server, false)
        .transfer(Direction::Upload, 16)
        .await
        .unwrap();

    assert_eq!(sample.server_processing, Duration::from_millis(7));
}

#[tokio::test]
async fn error_status_fails_transfer() {
    let server = MockSpeedServer::new().await;
    server
        .mock_download(1000, ResponseTemplate::new(503).insert_header("server-timing", TIMING))
        .await;

    let result = transfer(&server, false).transfer(Direction::Download, 1000).await;
    assert!(matches!(result, Err(AppError::TransferFailed(_))));
}

#[tokio::test]
async fn missing_server_timing_is_malformed() {
    let server = MockSpeedServer::new().await;
    server
        .mock_download(1000, ResponseTemplate::new(200).set_body_bytes(vec![b'x'; 1000]))
        .await;

    let result = transfer(&server, false).transfer(Direction::Download, 1000).await;
    assert!(matches!(result, Err(AppError::MalformedServerResponse(_))));
}

#[tokio::test]
async fn short_body_fails_transfer() {
    let server = MockSpeedServer::new().await;
    server.mock_download(1000, MockSpeedServer::body(400)).await;

    let result = transfer(&server, false).transfer(Direction::Download, 1000).await;
    assert!(matches!(result, Err(AppError::TransferFailed(_))));
}

#[tokio::test]
async fn slow_response_times_out() {
    let server = MockSpeedServer::new().await;
    server
        .mock_download(1000, MockSpeedServer::body(1000).set_delay(Duration::from_secs(3)))
        .await;

    let transfer = NetworkTransfer::with_options(&server.url(), Duration::from_secs(1), false).unwrap();
    let result = transfer.transfer(Direction::Download, 1000).await;

    match result {
        Err(AppError::TransferFailed(message)) => assert!(message.contains("timed out")),
        other => panic!("expected timeout, got {:?}", other),
    }
}

#[tokio::test]
async fn connection_refused_fails_transfer() {
    // Bind and drop a listener to get a port nothing listens on
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let transfer =
        NetworkTransfer::with_options(&format!("http://127.0.0.1:{}", port), Duration::from_secs(2), false).unwrap();
    let result = transfer.transfer(Direction::Download, 1000).await;
    assert!(matches!(result, Err(AppError::TransferFailed(_))));
}

#[tokio::test]
async fn keep_alive_reuses_connection() {
    let server = MockSpeedServer::new().await;
    server.mock_download(1000, MockSpeedServer::body(1000)).await;

    let transfer = transfer(&server, true);
    let first = transfer.transfer(Direction::Download, 1000).await.unwrap();
    let second = transfer.transfer(Direction::Download, 1000).await.unwrap();

    assert!(first.is_fresh_connection());
    assert!(!second.is_fresh_connection());
    assert!(second.dns_lookup.is_none());
}

#[tokio::test]
async fn fresh_connection_per_probe_by_default() {
    let server = MockSpeedServer::new().await;
    server.mock_download(1000, MockSpeedServer::body(1000)).await;

    let transfer = transfer(&server, false);
    for _ in 0..2 {
        let sample = transfer.transfer(Direction::Download, 1000).await.unwrap();
        assert!(sample.is_fresh_connection());
    }
}

#[tokio::test]
async fn upload_with_unreadable_timing_is_malformed() {
    let server = MockSpeedServer::new().await;
    server
        .mock_upload(ResponseTemplate::new(200).insert_header("server-timing", "cfRequestDuration;dur=soon"))
        .await;

    let result = transfer(&server, false).transfer(Direction::Upload, 100).await;
    assert!(matches!(result, Err(AppError::MalformedServerResponse(_))));
}

#[tokio::test]
async fn out_of_range_timing_is_malformed() {
    let server = MockSpeedServer::new().await;
    server
        .mock_download(
            1000,
            ResponseTemplate::new(200)
                .insert_header("server-timing", "cfRequestDuration;dur=1e300")
                .set_body_bytes(vec![b'x'; 1000]),
        )
        .await;

    let result = transfer(&server, false).transfer(Direction::Download, 1000).await;
    match result {
        Err(e) => {
            assert!(matches!(e, AppError::MalformedServerResponse(_)));
            assert!(e.is_probe_failure());
        }
        Ok(sample) => panic!("accepted out of range timing: {:?}", sample.server_processing),
    }
}
