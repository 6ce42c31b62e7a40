pub mod config;
pub mod logging;

pub mod dispatch;
pub mod downloader;
pub mod error;
pub mod gate;
pub mod screen;
pub mod url_model;

pub use downloader::{Artifact, FetchProgress};
pub use error::FetchError;
pub use gate::{Admitted, FetchGate};
