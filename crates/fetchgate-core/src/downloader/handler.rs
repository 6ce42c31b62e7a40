//! Easy2 handler: header gate, size-bounded temp-file sink, progress.
//!
//! Headers are judged once the header block ends, before any body arrives:
//! a non-200 status or an oversized `Content-Length` aborts the transfer
//! without creating a temp file. Body chunks are then counted against the
//! cap before they are written.

use std::io::Write;
use std::path::PathBuf;
use std::str;
use std::time::Instant;

use tempfile::NamedTempFile;

use super::headers::{parse_head, ResponseHead};
use super::progress::{FetchProgress, ProgressSender};
use crate::error::FetchError;
use crate::gate::FetchState;

/// Per-transfer state for one GET.
pub struct FetchHandler {
    pub(super) limit: u64,
    pub(super) temp_dir: PathBuf,
    pub(super) header_lines: Vec<String>,
    pub(super) head: Option<ResponseHead>,
    pub(super) file: Option<NamedTempFile>,
    pub(super) bytes_written: u64,
    /// First reason the handler aborted the transfer, if any.
    pub(super) abort: Option<FetchError>,
    progress: Option<ProgressSender>,
    started: Instant,
}

impl FetchHandler {
    pub(super) fn new(limit: u64, temp_dir: PathBuf, progress: Option<ProgressSender>) -> Self {
        Self {
            limit,
            temp_dir,
            header_lines: Vec::new(),
            head: None,
            file: None,
            bytes_written: 0,
            abort: None,
            progress,
            started: Instant::now(),
        }
    }

    /// Decides whether the body may be received; creates the temp file when it may.
    pub(super) fn accept_head(&mut self) -> Result<(), FetchError> {
        let head = parse_head(&self.header_lines);
        let result = self.judge(&head);
        if result.is_ok() {
            tracing::debug!(
                state = ?FetchState::Streaming,
                content_length = ?head.content_length,
                "headers accepted"
            );
        }
        self.head = Some(head);
        result
    }

    fn judge(&mut self, head: &ResponseHead) -> Result<(), FetchError> {
        let status = head.status.unwrap_or(0);
        if head.is_redirect() {
            if let Some(location) = &head.location {
                return Err(FetchError::Redirect(location.clone()));
            }
        }
        if status != 200 {
            return Err(FetchError::HttpStatus(status));
        }
        if let Some(declared) = head.content_length {
            if declared > self.limit {
                return Err(FetchError::TooLarge {
                    size: declared,
                    limit: self.limit,
                });
            }
        }
        self.open_temp_file()
    }

    pub(super) fn open_temp_file(&mut self) -> Result<(), FetchError> {
        if self.file.is_some() {
            return Ok(());
        }
        let file = tempfile::Builder::new()
            .prefix("fetchgate-")
            .tempfile_in(&self.temp_dir)
            .map_err(FetchError::storage)?;
        tracing::debug!(path = %file.path().display(), "temp file created");
        self.file = Some(file);
        Ok(())
    }

    fn fail(&mut self, err: FetchError) {
        // Dropping the NamedTempFile deletes the partial download.
        self.file = None;
        if self.abort.is_none() {
            self.abort = Some(err);
        }
    }

    fn emit_progress(&self) {
        if let Some(tx) = &self.progress {
            let _ = tx.try_send(FetchProgress {
                bytes_done: self.bytes_written,
                content_length: self.head.as_ref().and_then(|h| h.content_length),
                elapsed: self.started.elapsed(),
            });
        }
    }
}

impl curl::easy::Handler for FetchHandler {
    fn header(&mut self, data: &[u8]) -> bool {
        let line = match str::from_utf8(data) {
            Ok(s) => s.trim_end(),
            // Non-UTF-8 header values are irrelevant to the checks.
            Err(_) => return true,
        };
        if line.starts_with("HTTP/") {
            self.header_lines.clear();
            self.head = None;
        }
        if !line.is_empty() {
            self.header_lines.push(line.to_string());
            return true;
        }
        // Blank line: end of a header block. Interim 1xx blocks are skipped.
        let status = self
            .header_lines
            .first()
            .and_then(|l| super::headers::parse_status_line(l));
        if matches!(status, Some(100..=199)) || self.head.is_some() {
            return true;
        }
        match self.accept_head() {
            Ok(()) => true,
            Err(e) => {
                self.fail(e);
                false
            }
        }
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, curl::easy::WriteError> {
        if self.head.is_none() {
            if let Err(e) = self.accept_head() {
                self.fail(e);
                return Ok(0);
            }
        }
        let observed = self.bytes_written + data.len() as u64;
        if observed > self.limit {
            self.fail(FetchError::TooLarge {
                size: observed,
                limit: self.limit,
            });
            return Ok(0);
        }
        let file = match self.file.as_mut() {
            Some(f) => f,
            None => {
                self.fail(FetchError::Storage("temp file missing".to_string()));
                return Ok(0);
            }
        };
        if let Err(e) = file.write_all(data) {
            tracing::warn!("download write failed: {}", e);
            self.fail(FetchError::storage(e));
            return Ok(0);
        }
        self.bytes_written = observed;
        self.emit_progress();
        Ok(data.len())
    }
}
