//! `fetchgate relay`: line-oriented stand-in for the chat loop.
//!
//! Each stdin line is one inbound message. Replies are printed in order;
//! a failed message never ends the loop.

use anyhow::Result;
use fetchgate_core::dispatch::{Dispatcher, Reply};
use fetchgate_core::FetchGate;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::get::place;
use super::progress;

pub async fn run_relay(gate: FetchGate, output: Option<&Path>) -> Result<()> {
    let dispatcher = Dispatcher::new(gate);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let (progress_tx, printer) = progress::spawn_printer();
        dispatcher.handle(&line, &tx, Some(progress_tx)).await;
        drop(tx);
        let _ = printer.await;

        while let Some(reply) = rx.recv().await {
            print_reply(reply, output);
        }
    }
    tracing::debug!("stdin closed, relay finished");
    Ok(())
}

fn print_reply(reply: Reply, output: Option<&Path>) {
    match reply {
        Reply::Text(text) => println!("{}", text),
        Reply::Document { artifact, caption } => {
            let bytes = artifact.bytes();
            match place(artifact, output) {
                Ok(path) => println!("[document] {} ({} bytes)\n{}", path.display(), bytes, caption),
                Err(e) => {
                    tracing::warn!("could not save document: {:#}", e);
                    println!("Failed to save the downloaded file.");
                }
            }
        }
    }
}
