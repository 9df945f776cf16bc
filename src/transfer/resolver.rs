//! Host name resolution for fresh connections

use crate::error::{AppError, Result};
use std::net::{IpAddr, SocketAddr};
use trust_dns_resolver::{
    config::{ResolverConfig, ResolverOpts},
    system_conf, TokioAsyncResolver,
};

/// Resolves the target host, skipping the lookup for literal addresses
#[derive(Clone)]
pub struct HostResolver {
    resolver: TokioAsyncResolver,
}

/// Address to connect to and whether a DNS lookup produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub addr: SocketAddr,
    pub looked_up: bool,
}

impl HostResolver {
    /// Resolver from the system configuration, falling back to public defaults
    pub fn from_system_conf() -> Self {
        let (config, opts) = system_conf::read_system_conf()
            .unwrap_or_else(|_| (ResolverConfig::default(), ResolverOpts::default()));

        Self {
            resolver: TokioAsyncResolver::tokio(config, opts),
        }
    }

    /// Resolve `host:port`, using the first address returned
    pub async fn resolve(&self, host: &str, port: u16) -> Result<ResolvedTarget> {
        if let Some(ip) = parse_ip_literal(host) {
            return Ok(ResolvedTarget {
                addr: SocketAddr::new(ip, port),
                looked_up: false,
            });
        }

        let response = self
            .resolver
            .lookup_ip(host)
            .await
            .map_err(|e| AppError::transfer_failed(format!("DNS lookup failed for {}: {}", host, e)))?;

        let ip = response
            .iter()
            .next()
            .ok_or_else(|| AppError::transfer_failed(format!("DNS lookup returned no addresses for {}", host)))?;

        Ok(ResolvedTarget {
            addr: SocketAddr::new(ip, port),
            looked_up: true,
        })
    }
}

/// Literal IPv4 or IPv6 host, accepting the bracketed URL form
pub(crate) fn parse_ip_literal(host: &str) -> Option<IpAddr> {
    host.trim_start_matches('[')
        .trim_end_matches(']')
        .parse()
        .ok()
}
