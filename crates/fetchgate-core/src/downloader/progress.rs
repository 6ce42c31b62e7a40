//! Download progress events.
//!
//! The transfer thread sends snapshots over a bounded channel with
//! `try_send`; a single consumer task renders them. Snapshots are dropped
//! when the consumer lags, so the transfer never blocks on the UI.

use std::time::Duration;

/// Snapshot of one in-flight download.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchProgress {
    /// Bytes written to the temp file so far.
    pub bytes_done: u64,
    /// Declared `Content-Length`, if the server sent one.
    pub content_length: Option<u64>,
    /// Time since the transfer started.
    pub elapsed: Duration,
}

impl FetchProgress {
    /// Download rate in bytes per second (0 if no time has elapsed).
    pub fn bytes_per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs <= 0.0 {
            return 0.0;
        }
        self.bytes_done as f64 / secs
    }

    /// Fraction complete in [0.0, 1.0], when the total is known.
    pub fn fraction(&self) -> Option<f64> {
        match self.content_length {
            Some(0) => Some(1.0),
            Some(total) => Some((self.bytes_done as f64 / total as f64).min(1.0)),
            None => None,
        }
    }
}

/// Sender half handed to the downloader.
pub type ProgressSender = tokio::sync::mpsc::Sender<FetchProgress>;
