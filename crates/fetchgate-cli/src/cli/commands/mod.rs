//! CLI command handlers, one per file.

mod check;
mod get;
mod progress;
mod relay;

pub use check::run_check;
pub use get::run_get;
pub use relay::run_relay;
