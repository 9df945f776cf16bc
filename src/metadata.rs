//! Server location and client address lookups
//!
//! These calls run outside the measurement stages, so they use a regular
//! HTTP client instead of the instrumented transfer path.

use crate::error::{AppError, Result};
use crate::models::{ClientMetadata, Config};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// Client details reported by the trace endpoint
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientTrace {
    pub ip: Option<String>,
    pub loc: Option<String>,
    pub colo: Option<String>,
}

/// One entry of the locations list
#[derive(Debug, Clone, Deserialize)]
struct Location {
    iata: String,
    city: String,
}

/// Parse `key=value` lines from the trace endpoint
///
/// Unknown keys and lines without `=` are ignored.
pub fn parse_trace(body: &str) -> ClientTrace {
    let mut trace = ClientTrace::default();

    for line in body.lines() {
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = value.trim();
        if value.is_empty() {
            continue;
        }

        match key.trim() {
            "ip" => trace.ip = Some(value.to_string()),
            "loc" => trace.loc = Some(value.to_string()),
            "colo" => trace.colo = Some(value.to_string()),
            _ => {}
        }
    }

    trace
}

/// Parse the locations JSON into an IATA code to city map
pub fn parse_locations(body: &str) -> Result<HashMap<String, String>> {
    let locations: Vec<Location> = serde_json::from_str(body)
        .map_err(|e| AppError::metadata(format!("Invalid locations response: {}", e)))?;

    Ok(locations
        .into_iter()
        .map(|location| (location.iata, location.city))
        .collect())
}

/// HTTP client for the metadata endpoints
pub struct MetadataClient {
    client: Client,
    base_url: String,
}

impl MetadataClient {
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_base_url(&config.server_url, config.timeout())
    }

    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::metadata(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_text(&self, path: &str) -> Result<String> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::metadata(format!("GET {} returned HTTP {}", url, status)));
        }

        Ok(response.text().await?)
    }

    /// Fetch the map of edge IATA codes to city names
    pub async fn fetch_locations(&self) -> Result<HashMap<String, String>> {
        let body = self.get_text(crate::defaults::LOCATIONS_PATH).await?;
        parse_locations(&body)
    }

    /// Fetch the client's address and serving edge
    pub async fn fetch_trace(&self) -> Result<ClientTrace> {
        let body = self.get_text(crate::defaults::TRACE_PATH).await?;
        Ok(parse_trace(&body))
    }

    /// Fetch both lookups concurrently and combine them
    ///
    /// Either lookup may fail independently; whatever succeeded is kept and
    /// the failures are returned alongside for logging.
    pub async fn fetch_client_metadata(&self) -> (ClientMetadata, Vec<AppError>) {
        let (trace, locations) = futures::join!(self.fetch_trace(), self.fetch_locations());
        let mut errors = Vec::new();

        let trace = trace.unwrap_or_else(|e| {
            errors.push(e);
            ClientTrace::default()
        });
        let locations = locations.unwrap_or_else(|e| {
            errors.push(e);
            HashMap::new()
        });

        let city = trace
            .colo
            .as_ref()
            .and_then(|colo| locations.get(colo))
            .cloned();

        let metadata = ClientMetadata {
            ip: trace.ip,
            loc: trace.loc,
            colo: trace.colo,
            city,
        };

        (metadata, errors)
    }
}
