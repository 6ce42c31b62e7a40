//! Inbound message dispatch for the relay.
//!
//! Turns one chat-style text message into gate calls and replies:
//! `/start` greets, `/get <url>` and bare text fetch, other commands are
//! ignored. Replies go out over a channel so the consumer decides how to
//! render or deliver them.

use tokio::sync::mpsc::UnboundedSender;

use crate::downloader::{Artifact, ProgressSender};
use crate::gate::FetchGate;

pub const GREETING: &str =
    "Hi! Send me a direct file URL (http/https) and I'll download it and send it back to you.";
pub const USAGE: &str = "Usage: /get <direct-file-url>";
pub const STARTING: &str = "Starting download...";

/// What an inbound message asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    /// Fetch the given (still untrusted) text.
    Get(String),
    /// `/get` without an argument.
    Usage,
    /// Unknown command or empty message: no reply.
    Ignore,
}

/// Parses a message. Commands may carry a `@botname` suffix (`/get@relay_bot url`).
pub fn parse_message(text: &str) -> Command {
    let msg = text.trim();
    if msg.is_empty() {
        return Command::Ignore;
    }
    let rest = match msg.strip_prefix('/') {
        Some(r) => r,
        None => return Command::Get(msg.to_string()),
    };
    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((n, a)) => (n, a.trim()),
        None => (rest, ""),
    };
    let name = name.split('@').next().unwrap_or(name);
    match name {
        "start" => Command::Start,
        "get" if arg.is_empty() => Command::Usage,
        "get" => Command::Get(arg.to_string()),
        _ => Command::Ignore,
    }
}

/// Outbound message.
#[derive(Debug)]
pub enum Reply {
    Text(String),
    /// Finished download; the receiver owns the artifact.
    Document { artifact: Artifact, caption: String },
}

impl Reply {
    pub fn text(&self) -> Option<&str> {
        match self {
            Reply::Text(t) => Some(t.as_str()),
            Reply::Document { .. } => None,
        }
    }
}

/// Caption attached to a delivered document.
pub fn caption_for(url: &str) -> String {
    format!("Downloaded from: {}", url)
}

/// Routes messages through a gate.
#[derive(Clone)]
pub struct Dispatcher {
    gate: FetchGate,
}

impl Dispatcher {
    pub fn new(gate: FetchGate) -> Self {
        Self { gate }
    }

    pub fn gate(&self) -> &FetchGate {
        &self.gate
    }

    /// Handles one message. Never fails: every outcome becomes a reply.
    /// Send errors (receiver gone) are ignored.
    pub async fn handle(
        &self,
        text: &str,
        replies: &UnboundedSender<Reply>,
        progress: Option<ProgressSender>,
    ) {
        let url = match parse_message(text) {
            Command::Start => {
                let _ = replies.send(Reply::Text(GREETING.to_string()));
                return;
            }
            Command::Usage => {
                let _ = replies.send(Reply::Text(USAGE.to_string()));
                return;
            }
            Command::Ignore => return,
            Command::Get(url) => url,
        };

        let admitted = match self.gate.admit(&url).await {
            Ok(a) => a,
            Err(e) => {
                let _ = replies.send(Reply::Text(e.to_string()));
                return;
            }
        };

        let _ = replies.send(Reply::Text(STARTING.to_string()));
        let reply = match self.gate.download(admitted, progress).await {
            Ok(artifact) => Reply::Document {
                artifact,
                caption: caption_for(&url),
            },
            Err(e) => Reply::Text(e.to_string()),
        };
        let _ = replies.send(reply);
    }
}
