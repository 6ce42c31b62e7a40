//! The fetch gate: validate → screen → fetch, in that order, every time.
//!
//! A single deadline covers the whole call, including every redirect hop.
//! Each redirect target goes through validation and screening again before
//! anything connects to it.

mod redirect;
mod state;

pub use redirect::next_hop;
pub use state::FetchState;

use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use url::Url;

use crate::config::{GateConfig, MAX_TOTAL_TIMEOUT_SECS};
use crate::downloader::{self, Artifact, FetchOptions, PinnedHost, ProgressSender};
use crate::error::FetchError;
use crate::screen::{HostResolver, Screener, SystemResolver};
use crate::url_model;

/// A URL that passed validation and screening, with the addresses it was
/// screened against.
#[derive(Debug, Clone)]
pub struct Admitted {
    url: Url,
    host: String,
    port: u16,
    addrs: Vec<IpAddr>,
    deadline: Instant,
}

impl Admitted {
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Screened address set.
    pub fn addrs(&self) -> &[IpAddr] {
        &self.addrs
    }
}

/// Entry point for untrusted URLs.
#[derive(Clone)]
pub struct FetchGate {
    config: GateConfig,
    screener: Screener,
}

impl FetchGate {
    /// Gate using the system resolver.
    pub fn new(config: GateConfig) -> Self {
        Self::with_resolver(config, Arc::new(SystemResolver))
    }

    pub fn with_resolver(config: GateConfig, resolver: Arc<dyn HostResolver>) -> Self {
        let screener = Screener::new(resolver).with_trusted_hosts(&config.trusted_hosts);
        Self { config, screener }
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Validates and screens `raw` without connecting to it. Starts the
    /// call's deadline.
    pub async fn admit(&self, raw: &str) -> Result<Admitted, FetchError> {
        tracing::debug!(state = ?FetchState::Idle, "gate call started");
        let deadline = deadline_after(Instant::now(), self.config.total_timeout());
        tracing::debug!(state = ?FetchState::Validating, "checking URL");
        let url = match url_model::parse_candidate(raw.trim()) {
            Some(u) => u,
            None => {
                tracing::info!(state = ?FetchState::Rejected, "invalid URL");
                return Err(FetchError::InvalidUrl);
            }
        };
        self.screen_url(url, deadline).await
    }

    /// Downloads an admitted URL, following redirects. Every hop is screened.
    pub async fn download(
        &self,
        admitted: Admitted,
        progress: Option<ProgressSender>,
    ) -> Result<Artifact, FetchError> {
        let filename = url_model::suggested_filename(admitted.url.as_str());
        let deadline = admitted.deadline;
        let mut current = admitted;

        for hop in 0..=self.config.max_redirects {
            let remaining = remaining(deadline)?;
            let opts = self.fetch_options(&current, remaining);
            match downloader::fetch(current.url.as_str(), opts, progress.clone()).await {
                Ok(artifact) => {
                    tracing::info!(
                        state = ?FetchState::Finished,
                        host = %current.host,
                        bytes = artifact.bytes(),
                        "download finished"
                    );
                    return Ok(artifact.with_filename(filename));
                }
                Err(FetchError::Redirect(_)) if hop == self.config.max_redirects => break,
                Err(FetchError::Redirect(location)) => {
                    tracing::debug!(hop, host = %current.host, "following redirect");
                    let next = next_hop(&current.url, &location)?;
                    current = self.screen_url(next, deadline).await?;
                }
                Err(e) => {
                    tracing::info!(state = ?FetchState::after(&e), host = %current.host, "download failed: {}", e);
                    return Err(e);
                }
            }
        }

        tracing::info!(state = ?FetchState::Failed, "redirect limit reached");
        Err(FetchError::Transport("too many redirects".to_string()))
    }

    /// Full gate call: admit then download.
    pub async fn run(
        &self,
        raw: &str,
        progress: Option<ProgressSender>,
    ) -> Result<Artifact, FetchError> {
        let admitted = self.admit(raw).await?;
        self.download(admitted, progress).await
    }

    async fn screen_url(&self, url: Url, deadline: Instant) -> Result<Admitted, FetchError> {
        let host = url_model::host_of(&url).ok_or(FetchError::InvalidUrl)?;
        let port = url_model::port_of(&url);
        tracing::debug!(state = ?FetchState::Screening, host = %host, port, "screening host");
        // Out of budget before resolution counts as unresolvable.
        let budget = remaining(deadline).map_err(|_| FetchError::UnsafeHost)?;
        match self.screener.screen(&host, port, budget).await {
            Ok(addrs) => Ok(Admitted {
                url,
                host,
                port,
                addrs,
                deadline,
            }),
            Err(e) => {
                tracing::info!(state = ?FetchState::Rejected, host = %host, "host rejected");
                Err(e)
            }
        }
    }

    fn fetch_options(&self, admitted: &Admitted, remaining: Duration) -> FetchOptions {
        let mut opts = FetchOptions::new(self.config.max_download_bytes, remaining);
        opts.connect_timeout = self.config.connect_timeout().min(remaining);
        opts.chunk_size = self.config.chunk_size;
        opts.temp_dir = self.config.temp_dir();
        let is_literal = admitted.host.parse::<IpAddr>().is_ok();
        if self.config.pin_resolved_addresses && !is_literal {
            opts.pinned = Some(PinnedHost {
                host: admitted.host.clone(),
                port: admitted.port,
                addrs: admitted.addrs.clone(),
            });
        }
        opts
    }
}

/// `now + budget`, capped at `MAX_TOTAL_TIMEOUT_SECS` and never overflowing.
fn deadline_after(now: Instant, budget: Duration) -> Instant {
    let budget = budget.min(Duration::from_secs(MAX_TOTAL_TIMEOUT_SECS));
    now.checked_add(budget).unwrap_or(now)
}

fn remaining(deadline: Instant) -> Result<Duration, FetchError> {
    deadline
        .checked_duration_since(Instant::now())
        .filter(|d| !d.is_zero())
        .ok_or_else(|| FetchError::Transport("operation timed out".to_string()))
}
