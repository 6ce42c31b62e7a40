//! `fetchgate get`: download one URL through the gate.

use anyhow::Result;
use fetchgate_core::{Artifact, FetchGate};
use std::path::{Path, PathBuf};

use super::progress;

pub async fn run_get(gate: &FetchGate, url: &str, output: Option<&Path>) -> Result<()> {
    let (progress_tx, printer) = progress::spawn_printer();
    let result = gate.run(url, Some(progress_tx)).await;
    // The sender was moved into the download and is dropped by now.
    let _ = printer.await;

    let artifact = result?;
    let name = artifact.filename().to_string();
    let bytes = artifact.bytes();
    let path = place(artifact, output)?;
    println!("{}  {} bytes  {}", name, bytes, path.display());
    Ok(())
}

/// Moves the artifact into `output`, or keeps it where it is.
pub(super) fn place(artifact: Artifact, output: Option<&Path>) -> Result<PathBuf> {
    let path = match output {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            artifact.persist_to(dir)?
        }
        None => artifact.keep()?,
    };
    tracing::info!(path = %path.display(), "artifact saved");
    Ok(path)
}
