//! CLI for the fetchgate URL relay.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use fetchgate_core::config;
use fetchgate_core::FetchGate;
use std::path::PathBuf;

use commands::{run_check, run_get, run_relay};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "fetchgate")]
#[command(about = "fetchgate: download untrusted URLs without reaching internal networks", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download one URL through the gate.
    Get {
        /// Direct HTTP/HTTPS URL.
        url: String,
        /// Move the finished file here instead of leaving it in the temp dir.
        #[arg(long, short = 'o', value_name = "DIR")]
        output: Option<PathBuf>,
    },

    /// Validate and screen a URL without downloading it.
    Check {
        url: String,
    },

    /// Read messages from stdin, one per line, and answer each like the chat relay.
    Relay {
        /// Where delivered documents are saved (default: kept in the temp dir).
        #[arg(long, short = 'o', value_name = "DIR")]
        output: Option<PathBuf>,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load()?;
        tracing::debug!("loaded config: {:?}", cfg);
        let gate = FetchGate::new(cfg);

        match cli.command {
            CliCommand::Get { url, output } => run_get(&gate, &url, output.as_deref()).await?,
            CliCommand::Check { url } => run_check(&gate, &url).await?,
            CliCommand::Relay { output } => run_relay(gate, output.as_deref()).await?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
