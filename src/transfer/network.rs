//! Instrumented HTTP/1.1 transfers over TCP and rustls

use super::resolver::{parse_ip_literal, HostResolver};
use super::server_timing::{parse_server_timing, SERVER_TIMING_HEADER};
use super::TimedTransfer;
use crate::error::{AppError, Result};
use crate::models::{Config, PhaseRecorder, TimingSample};
use crate::types::Direction;
use async_trait::async_trait;
use bytes::Bytes;
use http::header::{CONTENT_LENGTH, CONTENT_TYPE, HOST, USER_AGENT};
use http::{Method, Request};
use http_body_util::{BodyExt, Full};
use hyper::client::conn::http1::{self, SendRequest};
use hyper_util::rt::TokioIo;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_rustls::rustls::{self, pki_types::ServerName, ClientConfig, RootCertStore};
use tokio_rustls::TlsConnector;
use url::Url;

/// Byte used to fill upload bodies
const UPLOAD_FILL: u8 = b'0';

trait Io: AsyncRead + AsyncWrite + Send + Unpin {}
impl<T: AsyncRead + AsyncWrite + Send + Unpin> Io for T {}

type Sender = SendRequest<Full<Bytes>>;

/// Timed transfers against a speed test server
///
/// Each transfer opens a fresh connection unless keep-alive is enabled, in
/// which case an idle connection left by the previous transfer is reused.
pub struct NetworkTransfer {
    host: String,
    port: u16,
    use_tls: bool,
    path_prefix: String,
    timeout: Duration,
    keep_alive: bool,
    resolver: HostResolver,
    tls: TlsConnector,
    idle: Mutex<Option<Sender>>,
}

impl NetworkTransfer {
    /// Create a transfer client from the configuration
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_options(&config.server_url, config.timeout(), config.keep_alive)
    }

    pub fn with_options(server_url: &str, timeout: Duration, keep_alive: bool) -> Result<Self> {
        let url = Url::parse(server_url)?;
        let use_tls = match url.scheme() {
            "https" => true,
            "http" => false,
            other => {
                return Err(AppError::config(format!("Unsupported URL scheme '{}'", other)));
            }
        };

        let host = url
            .host_str()
            .ok_or_else(|| AppError::config(format!("Server URL has no host: {}", server_url)))?
            .to_string();
        let port = url
            .port_or_known_default()
            .ok_or_else(|| AppError::config(format!("Server URL has no port: {}", server_url)))?;

        Ok(Self {
            host,
            port,
            use_tls,
            path_prefix: url.path().trim_end_matches('/').to_string(),
            timeout,
            keep_alive,
            resolver: HostResolver::from_system_conf(),
            tls: tls_connector()?,
            idle: Mutex::new(None),
        })
    }

    /// Value for the Host header, omitting default ports
    fn authority(&self) -> String {
        let default_port = if self.use_tls { 443 } else { 80 };
        if self.port == default_port {
            self.host.clone()
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// TLS name for the host; IP literals lose their URL brackets
    fn server_name(&self) -> Result<ServerName<'static>> {
        if let Some(ip) = parse_ip_literal(&self.host) {
            return Ok(ServerName::from(ip));
        }
        ServerName::try_from(self.host.clone())
            .map_err(|e| AppError::config(format!("Invalid TLS server name '{}': {}", self.host, e)))
    }

    fn build_request(&self, direction: Direction, payload_bytes: u64) -> Result<Request<Full<Bytes>>> {
        let builder = Request::builder()
            .header(HOST, self.authority())
            .header(USER_AGENT, concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")));

        let request = match direction {
            Direction::Download => builder
                .method(Method::GET)
                .uri(format!(
                    "{}{}?bytes={}",
                    self.path_prefix,
                    crate::defaults::DOWNLOAD_PATH,
                    payload_bytes
                ))
                .body(Full::new(Bytes::new()))?,
            Direction::Upload => {
                let len = usize::try_from(payload_bytes).map_err(|_| {
                    AppError::invalid_input(format!("Upload of {} bytes does not fit in memory", payload_bytes))
                })?;
                builder
                    .method(Method::POST)
                    .uri(format!("{}{}", self.path_prefix, crate::defaults::UPLOAD_PATH))
                    .header(CONTENT_TYPE, "text/plain")
                    .header(CONTENT_LENGTH, payload_bytes)
                    .body(Full::new(Bytes::from(vec![UPLOAD_FILL; len])))?
            }
        };

        Ok(request)
    }

    /// Take the idle connection if it can carry another request
    async fn take_idle(&self) -> Option<Sender> {
        let mut sender = self.idle.lock().await.take()?;
        if sender.is_closed() || sender.ready().await.is_err() {
            return None;
        }
        Some(sender)
    }

    async fn connect(&self, recorder: &mut PhaseRecorder) -> Result<Sender> {
        let target = self.resolver.resolve(&self.host, self.port).await?;
        if target.looked_up {
            recorder.dns_resolved();
        }

        let stream = TcpStream::connect(target.addr)
            .await
            .map_err(|e| AppError::transfer_failed(format!("TCP connect to {} failed: {}", target.addr, e)))?;
        recorder.tcp_connected();
        stream
            .set_nodelay(true)
            .map_err(|e| AppError::transfer_failed(format!("Failed to configure socket: {}", e)))?;

        let io: Box<dyn Io> = if self.use_tls {
            let server_name = self.server_name()?;
            let tls_stream = self
                .tls
                .connect(server_name, stream)
                .await
                .map_err(|e| AppError::transfer_failed(format!("TLS handshake with {} failed: {}", self.host, e)))?;
            recorder.tls_established();
            Box::new(tls_stream)
        } else {
            Box::new(stream)
        };

        let (sender, connection) = http1::handshake(TokioIo::new(io)).await?;
        tokio::spawn(async move {
            // Ends when the sender is dropped or the peer closes
            let _ = connection.await;
        });

        Ok(sender)
    }

    async fn run_transfer(&self, direction: Direction, payload_bytes: u64) -> Result<TimingSample> {
        let request = self.build_request(direction, payload_bytes)?;

        let mut recorder = PhaseRecorder::start();
        let mut sender = match self.take_idle().await {
            Some(sender) => sender,
            None => self.connect(&mut recorder).await?,
        };

        let response = sender.send_request(request).await?;
        recorder.first_byte();

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::transfer_failed(format!(
                "{} of {} bytes returned HTTP {}",
                direction, payload_bytes, status
            )));
        }

        let server_timing = response
            .headers()
            .get(SERVER_TIMING_HEADER)
            .ok_or_else(|| AppError::malformed_response("Response has no server-timing header"))?
            .to_str()
            .map_err(|_| AppError::malformed_response("server-timing header is not valid text"))
            .and_then(parse_server_timing)?;

        let mut body = response.into_body();
        let mut received: u64 = 0;
        while let Some(frame) = body.frame().await {
            if let Ok(data) = frame?.into_data() {
                received += data.len() as u64;
            }
        }
        let sample = recorder.finish(server_timing)?;

        if direction == Direction::Download && received != payload_bytes {
            return Err(AppError::transfer_failed(format!(
                "Expected {} bytes but received {}",
                payload_bytes, received
            )));
        }

        if self.keep_alive {
            *self.idle.lock().await = Some(sender);
        }

        Ok(sample)
    }
}

#[async_trait]
impl TimedTransfer for NetworkTransfer {
    async fn transfer(&self, direction: Direction, payload_bytes: u64) -> Result<TimingSample> {
        match tokio::time::timeout(self.timeout, self.run_transfer(direction, payload_bytes)).await {
            Ok(result) => result,
            Err(_) => Err(AppError::transfer_failed(format!(
                "{} of {} bytes timed out after {}s",
                direction,
                payload_bytes,
                self.timeout.as_secs()
            ))),
        }
    }
}

fn tls_connector() -> Result<TlsConnector> {
    let mut roots = RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let config = ClientConfig::builder_with_provider(Arc::new(rustls::crypto::ring::default_provider()))
        .with_safe_default_protocol_versions()
        .map_err(|e| AppError::internal(format!("Failed to configure TLS: {}", e)))?
        .with_root_certificates(roots)
        .with_no_client_auth();

    Ok(TlsConnector::from(Arc::new(config)))
}
