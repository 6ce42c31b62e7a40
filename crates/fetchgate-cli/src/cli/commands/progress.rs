//! Progress line on stderr, fed by the downloader's channel.

use std::time::{Duration, Instant};

use fetchgate_core::downloader::ProgressSender;
use fetchgate_core::FetchProgress;
use tokio::task::JoinHandle;

const PROGRESS_INTERVAL: Duration = Duration::from_millis(500);

/// Spawns the printer task. It ends once the sender is dropped.
pub fn spawn_printer() -> (ProgressSender, JoinHandle<()>) {
    let (tx, mut rx) = tokio::sync::mpsc::channel::<FetchProgress>(16);
    let handle = tokio::spawn(async move {
        let mut last_print: Option<Instant> = None;
        let mut printed = false;
        while let Some(p) = rx.recv().await {
            let now = Instant::now();
            let due = last_print.map_or(true, |t| now.duration_since(t) >= PROGRESS_INTERVAL);
            let done = p.fraction() == Some(1.0);
            if due || done {
                eprint!("\r  {}  ", render(&p));
                last_print = Some(now);
                printed = true;
            }
        }
        if printed {
            eprintln!();
        }
    });
    (tx, handle)
}

fn render(p: &FetchProgress) -> String {
    let done_mib = p.bytes_done as f64 / 1_048_576.0;
    let rate_mib = p.bytes_per_sec() / 1_048_576.0;
    match (p.content_length, p.fraction()) {
        (Some(total), Some(f)) => format!(
            "{:.1} / {:.1} MiB ({:.1}%)  {:.2} MiB/s",
            done_mib,
            total as f64 / 1_048_576.0,
            f * 100.0,
            rate_mib
        ),
        _ => format!("{:.1} MiB  {:.2} MiB/s", done_mib, rate_mib),
    }
}
