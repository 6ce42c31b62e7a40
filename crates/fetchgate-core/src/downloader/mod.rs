//! Bounded streaming downloader.
//!
//! One GET per call via libcurl (`Easy2` + [`handler::FetchHandler`]). The
//! declared `Content-Length` is checked when the headers end; the observed
//! byte count is checked before each chunk is written. Every non-success
//! path drops the temp file, which deletes it.
//!
//! Callers are expected to have validated the URL and screened its host;
//! `FetchGate` composes those steps. Redirects are not followed here: a 3xx
//! with `Location` comes back as [`FetchError::Redirect`].

mod artifact;
mod handler;
mod headers;
mod progress;

pub use artifact::Artifact;
pub use headers::{parse_head, ResponseHead};
pub use progress::{FetchProgress, ProgressSender};

use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use curl::easy::{Easy2, List};

use crate::error::FetchError;
use crate::gate::FetchState;
use crate::url_model;
use handler::FetchHandler;

/// libcurl receive buffer size, i.e. the largest chunk handed to the sink.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

const USER_AGENT: &str = concat!("fetchgate/", env!("CARGO_PKG_VERSION"));

/// Addresses a hostname must connect to (libcurl `CURLOPT_RESOLVE`), so the
/// connection goes to the set that was screened rather than a fresh lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinnedHost {
    pub host: String,
    pub port: u16,
    pub addrs: Vec<IpAddr>,
}

impl PinnedHost {
    /// `host:port:addr[,addr...]`, IPv6 addresses in brackets.
    pub fn resolve_entry(&self) -> String {
        let addrs: Vec<String> = self
            .addrs
            .iter()
            .map(|ip| match ip {
                IpAddr::V4(v4) => v4.to_string(),
                IpAddr::V6(v6) => format!("[{}]", v6),
            })
            .collect();
        format!("{}:{}:{}", self.host, self.port, addrs.join(","))
    }
}

/// Limits and placement for one download.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Hard cap on body bytes.
    pub max_bytes: u64,
    /// Total wall-clock budget for the transfer.
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub chunk_size: usize,
    /// Directory for the temp file.
    pub temp_dir: PathBuf,
    /// Connection pinning; `None` lets libcurl resolve on its own.
    pub pinned: Option<PinnedHost>,
}

impl FetchOptions {
    pub fn new(max_bytes: u64, timeout: Duration) -> Self {
        Self {
            max_bytes,
            timeout,
            connect_timeout: Duration::from_secs(30),
            chunk_size: DEFAULT_CHUNK_SIZE,
            temp_dir: std::env::temp_dir(),
            pinned: None,
        }
    }
}

/// Downloads `url` into a fresh temp file. Runs in the current thread; use
/// [`fetch`] from async code.
pub fn fetch_blocking(
    url: &str,
    opts: &FetchOptions,
    progress: Option<ProgressSender>,
) -> Result<Artifact, FetchError> {
    let handler = FetchHandler::new(opts.max_bytes, opts.temp_dir.clone(), progress);
    let mut easy = Easy2::new(handler);
    configure(&mut easy, opts, url).map_err(|e| FetchError::from_curl(&e))?;

    tracing::debug!(state = ?FetchState::Connecting, limit = opts.max_bytes, "GET");
    let performed = easy.perform();
    let handler = easy.get_mut();

    // A handler-initiated abort surfaces from libcurl as a write error; the
    // recorded reason is the real one.
    if let Some(err) = handler.abort.take() {
        return Err(err);
    }
    if let Err(e) = performed {
        handler.file = None;
        tracing::debug!(state = ?FetchState::Failed, "transfer failed: {}", e);
        return Err(FetchError::from_curl(&e));
    }

    // Header-only responses with no body never reach the write callback.
    if handler.head.is_none() {
        handler.accept_head()?;
    }
    handler.open_temp_file()?;
    let file = match handler.file.take() {
        Some(f) => f,
        None => return Err(FetchError::Storage("temp file missing".to_string())),
    };
    file.as_file().sync_all().map_err(FetchError::storage)?;

    let bytes = handler.bytes_written;
    tracing::debug!(state = ?FetchState::Finished, bytes, "download complete");
    Ok(Artifact::new(
        file.into_temp_path(),
        bytes,
        url_model::suggested_filename(url),
    ))
}

/// Async wrapper: runs [`fetch_blocking`] on the blocking pool.
pub async fn fetch(
    url: &str,
    opts: FetchOptions,
    progress: Option<ProgressSender>,
) -> Result<Artifact, FetchError> {
    let url = url.to_string();
    tokio::task::spawn_blocking(move || fetch_blocking(&url, &opts, progress))
        .await
        .map_err(|e| FetchError::Transport(format!("download task failed: {}", e)))?
}

fn configure(
    easy: &mut Easy2<FetchHandler>,
    opts: &FetchOptions,
    url: &str,
) -> Result<(), curl::Error> {
    easy.url(url)?;
    easy.get(true)?;
    easy.follow_location(false)?;
    easy.signal(false)?;
    easy.useragent(USER_AGENT)?;
    easy.connect_timeout(opts.connect_timeout)?;
    // 0 would mean "no timeout" to libcurl.
    easy.timeout(opts.timeout.max(Duration::from_millis(1)))?;
    easy.buffer_size(opts.chunk_size)?;
    if let Some(pin) = &opts.pinned {
        let mut list = List::new();
        list.append(&pin.resolve_entry())?;
        easy.resolve(list)?;
    }
    Ok(())
}
