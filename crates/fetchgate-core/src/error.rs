//! Gate error taxonomy.
//!
//! Every path through the gate ends in either an artifact or one of these
//! variants; the `Display` text is what the relay shows the end user.

use thiserror::Error;

/// Classified rejection or failure of a single gate call.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Input is not a well-formed http/https URL with a host.
    #[error("not a valid URL")]
    InvalidUrl,
    /// Host resolves to a blocked address category, or could not be resolved.
    /// The message never says which category matched.
    #[error("cannot download from internal/private network addresses")]
    UnsafeHost,
    /// Remote answered with a status other than 200.
    #[error("HTTP status {0}")]
    HttpStatus(u32),
    /// Declared or observed body size exceeds the configured cap.
    #[error("file too large ({size} bytes, max {limit})")]
    TooLarge { size: u64, limit: u64 },
    /// Connection, timeout or stream failure. Carries a sanitized message.
    #[error("transport error: {0}")]
    Transport(String),
    /// Local temp-file I/O failed.
    #[error("storage error: {0}")]
    Storage(String),
    /// 3xx with a `Location` header. Consumed by the gate, which screens the
    /// target before following it; never returned from `FetchGate::run`.
    #[error("redirected to {0}")]
    Redirect(String),
}

impl FetchError {
    /// Transport error from a curl failure. Uses the libcurl error text only,
    /// which does not echo the URL or resolved address.
    pub(crate) fn from_curl(err: &curl::Error) -> Self {
        if err.is_operation_timedout() {
            return FetchError::Transport("operation timed out".to_string());
        }
        FetchError::Transport(err.description().to_string())
    }

    pub(crate) fn storage(err: std::io::Error) -> Self {
        FetchError::Storage(err.to_string())
    }

    /// True for outcomes decided before any connection was attempted.
    pub fn is_rejection(&self) -> bool {
        matches!(self, FetchError::InvalidUrl | FetchError::UnsafeHost)
    }
}
