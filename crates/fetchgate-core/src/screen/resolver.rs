//! Host resolution seam for the screener.
//!
//! The screener only depends on this trait. The default uses the system
//! resolver; tests and operators can substitute fixed answers.

use std::collections::{HashMap, HashSet};
use std::io;
use std::net::{IpAddr, ToSocketAddrs};

/// Resolves a hostname to every address the resolver returns (all families).
///
/// Synchronous on purpose: `Screener::screen` runs it under `spawn_blocking`
/// with the call's deadline, the same thing `tokio::net::lookup_host` does
/// internally, and `is_private_or_unsafe` uses it from plain blocking code.
pub trait HostResolver: Send + Sync {
    fn resolve(&self, host: &str, port: u16) -> io::Result<Vec<IpAddr>>;
}

/// System resolver (`getaddrinfo`).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

impl HostResolver for SystemResolver {
    fn resolve(&self, host: &str, port: u16) -> io::Result<Vec<IpAddr>> {
        let ips = (host, port).to_socket_addrs()?.map(|a| a.ip());
        Ok(unique_in_order(ips))
    }
}

/// Drops repeated addresses (getaddrinfo returns one per socket type),
/// keeping first-seen order so the pin list follows the resolver's preference.
fn unique_in_order(ips: impl IntoIterator<Item = IpAddr>) -> Vec<IpAddr> {
    let mut seen = HashSet::new();
    ips.into_iter().filter(|ip| seen.insert(*ip)).collect()
}

/// Fixed name → address table. Unknown names fail to resolve.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    entries: HashMap<String, Option<Vec<IpAddr>>>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps `host` to `addrs`.
    pub fn with(mut self, host: &str, addrs: &[IpAddr]) -> Self {
        self.entries
            .insert(host.to_ascii_lowercase(), Some(addrs.to_vec()));
        self
    }

    /// Makes resolution of `host` fail with an I/O error.
    pub fn failing(mut self, host: &str) -> Self {
        self.entries.insert(host.to_ascii_lowercase(), None);
        self
    }
}

impl HostResolver for StaticResolver {
    fn resolve(&self, host: &str, _port: u16) -> io::Result<Vec<IpAddr>> {
        match self.entries.get(&host.to_ascii_lowercase()) {
            Some(Some(addrs)) => Ok(addrs.clone()),
            Some(None) => Err(io::Error::new(io::ErrorKind::Other, "resolution failed")),
            None => Err(io::Error::new(io::ErrorKind::NotFound, "unknown host")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_resolver_answers_and_failures() {
        let r = StaticResolver::new()
            .with("Files.Example", &["93.184.216.34".parse().unwrap()])
            .failing("broken.example");
        assert_eq!(r.resolve("files.example", 443).unwrap().len(), 1);
        assert!(r.resolve("broken.example", 443).is_err());
        assert_eq!(
            r.resolve("nowhere.example", 80).unwrap_err().kind(),
            io::ErrorKind::NotFound
        );
    }

    #[test]
    fn duplicates_removed_in_first_seen_order() {
        let ips: Vec<IpAddr> = ["10.0.0.1", "::1", "10.0.0.1", "8.8.8.8", "::1"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        let expected: Vec<IpAddr> = ["10.0.0.1", "::1", "8.8.8.8"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        assert_eq!(unique_in_order(ips), expected);
    }

    #[test]
    fn system_resolver_handles_ip_literals() {
        let ips = SystemResolver.resolve("127.0.0.1", 80).unwrap();
        assert_eq!(ips, vec!["127.0.0.1".parse::<IpAddr>().unwrap()]);
    }
}
