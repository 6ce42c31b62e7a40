//! Network-safety screening of outbound hosts.
//!
//! Resolves a host and rejects it when *any* address it resolves to is
//! private, loopback, link-local, reserved or multicast. Fail-closed: a
//! resolver error, an empty answer or a resolver timeout also rejects.
//! The returned address set is what the downloader pins its connection to.

mod classify;
mod resolver;

pub use classify::{classify, is_blocked, AddressClass};
pub use resolver::{HostResolver, StaticResolver, SystemResolver};

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use crate::error::FetchError;

/// Blocking check against the system resolver. Returns true (unsafe) unless
/// every resolved address is public unicast.
pub fn is_private_or_unsafe(host: &str) -> bool {
    Screener::new(Arc::new(SystemResolver)).is_private_or_unsafe(host)
}

/// Resolver plus the set of hostnames exempt from the category check.
#[derive(Clone)]
pub struct Screener {
    resolver: Arc<dyn HostResolver>,
    trusted_hosts: Vec<String>,
}

impl Screener {
    pub fn new(resolver: Arc<dyn HostResolver>) -> Self {
        Self {
            resolver,
            trusted_hosts: Vec::new(),
        }
    }

    /// Exempts exact hostnames (case-insensitive) from the category check.
    /// They must still resolve.
    pub fn with_trusted_hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.trusted_hosts = hosts
            .into_iter()
            .map(|h| h.as_ref().trim().to_ascii_lowercase())
            .filter(|h| !h.is_empty())
            .collect();
        self
    }

    fn is_trusted(&self, host: &str) -> bool {
        let host = host.to_ascii_lowercase();
        self.trusted_hosts.iter().any(|t| *t == host)
    }

    /// Synchronous screen in the calling thread.
    pub fn is_private_or_unsafe(&self, host: &str) -> bool {
        self.screen_blocking(host, 0).is_err()
    }

    /// Resolves and screens `host`, returning the screened address set.
    /// Runs the resolver on a blocking thread and gives up after `timeout`,
    /// which counts as unsafe.
    pub async fn screen(
        &self,
        host: &str,
        port: u16,
        timeout: Duration,
    ) -> Result<Vec<IpAddr>, FetchError> {
        let this = self.clone();
        let owned_host = host.to_string();
        let task = tokio::task::spawn_blocking(move || this.screen_blocking(&owned_host, port));
        match tokio::time::timeout(timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => {
                tracing::warn!(host, "resolver task failed: {}", join_err);
                Err(FetchError::UnsafeHost)
            }
            Err(_) => {
                tracing::debug!(host, "resolution timed out");
                Err(FetchError::UnsafeHost)
            }
        }
    }

    fn screen_blocking(&self, host: &str, port: u16) -> Result<Vec<IpAddr>, FetchError> {
        let host = host.trim_start_matches('[').trim_end_matches(']');
        if host.is_empty() {
            return Err(FetchError::UnsafeHost);
        }
        let addrs = match host.parse::<IpAddr>() {
            Ok(ip) => vec![ip],
            Err(_) => self.resolver.resolve(host, port).map_err(|e| {
                tracing::debug!(host, "resolution failed: {}", e);
                FetchError::UnsafeHost
            })?,
        };
        if addrs.is_empty() {
            tracing::debug!(host, "resolver returned no addresses");
            return Err(FetchError::UnsafeHost);
        }
        if self.is_trusted(host) {
            tracing::debug!(host, "trusted host, category check skipped");
            return Ok(addrs);
        }
        if let Some(ip) = addrs.iter().find(|ip| is_blocked(**ip)) {
            tracing::debug!(host, %ip, class = ?classify(*ip), "blocked address");
            return Err(FetchError::UnsafeHost);
        }
        Ok(addrs)
    }
}
