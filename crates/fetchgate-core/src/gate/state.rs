//! Per-call lifecycle of a gate invocation.

use crate::error::FetchError;

/// `Idle → Validating → Screening → Connecting → Streaming → {Finished | Rejected | Failed}`.
///
/// Only used for structured logging; the control flow itself is the
/// sequence of awaits in `FetchGate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchState {
    /// Logged when a gate call starts.
    Idle,
    Validating,
    Screening,
    Connecting,
    Streaming,
    Finished,
    Rejected,
    Failed,
}

impl FetchState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            FetchState::Finished | FetchState::Rejected | FetchState::Failed
        )
    }

    /// Terminal state reached by `err`.
    pub fn after(err: &FetchError) -> FetchState {
        if err.is_rejection() {
            FetchState::Rejected
        } else {
            FetchState::Failed
        }
    }
}
