//! Minimal HTTP/1.1 server for integration tests.
//!
//! Serves canned responses keyed by request path and counts accepted
//! connections, so tests can assert that a rejected URL was never contacted.
//! Every response closes the connection.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// How the `Content-Length` header relates to the body actually sent.
#[derive(Debug, Clone, Copy)]
pub enum Length {
    /// Header matches the body.
    Exact,
    /// No header; the body ends when the connection closes.
    Omit,
    /// Header claims this many bytes regardless of the body.
    Declared(u64),
}

#[derive(Debug, Clone)]
pub struct Route {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub length: Length,
    /// Pause between the header block and the body.
    pub body_delay: Option<Duration>,
}

impl Route {
    pub fn ok(body: Vec<u8>) -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            body,
            length: Length::Exact,
            body_delay: None,
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            ..Self::ok(b"error page".to_vec())
        }
    }

    pub fn redirect(location: &str) -> Self {
        Self {
            status: 302,
            headers: vec![("Location".to_string(), location.to_string())],
            ..Self::ok(Vec::new())
        }
    }

    pub fn length(mut self, length: Length) -> Self {
        self.length = length;
        self
    }

    pub fn body_delay(mut self, delay: Duration) -> Self {
        self.body_delay = Some(delay);
        self
    }
}

/// Running server. Lives until the process exits.
pub struct FileServer {
    pub port: u16,
    hits: Arc<AtomicUsize>,
}

impl FileServer {
    /// `http://127.0.0.1:<port>`
    pub fn base(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    /// URL on `host` (which the test resolver maps to 127.0.0.1).
    pub fn url_on(&self, host: &str, path: &str) -> String {
        format!("http://{}:{}{}", host, self.port, path)
    }

    /// Connections accepted so far.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

pub fn start(routes: Vec<(&str, Route)>) -> FileServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let routes: Arc<HashMap<String, Route>> = Arc::new(
        routes
            .into_iter()
            .map(|(p, r)| (p.to_string(), r))
            .collect(),
    );
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            counter.fetch_add(1, Ordering::SeqCst);
            let routes = Arc::clone(&routes);
            thread::spawn(move || handle(stream, &routes));
        }
    });
    FileServer { port, hits }
}

fn handle(mut stream: TcpStream, routes: &HashMap<String, Route>) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(5)));
    let path = match read_request_path(&mut stream) {
        Some(p) => p,
        None => return,
    };
    let route = match routes.get(&path) {
        Some(r) => r.clone(),
        None => Route::status(404),
    };

    let mut head = format!("HTTP/1.1 {} {}\r\n", route.status, reason(route.status));
    match route.length {
        Length::Exact => head.push_str(&format!("Content-Length: {}\r\n", route.body.len())),
        Length::Declared(n) => head.push_str(&format!("Content-Length: {}\r\n", n)),
        Length::Omit => {}
    }
    for (name, value) in &route.headers {
        head.push_str(&format!("{}: {}\r\n", name, value));
    }
    head.push_str("Connection: close\r\n\r\n");
    if stream.write_all(head.as_bytes()).is_err() {
        return;
    }
    let _ = stream.flush();
    if let Some(delay) = route.body_delay {
        thread::sleep(delay);
    }
    // The client may hang up early (size cap, timeout); write errors are expected.
    for chunk in route.body.chunks(4096) {
        if stream.write_all(chunk).is_err() {
            return;
        }
    }
    let _ = stream.flush();
}

/// Reads up to the end of the request head and returns the request path.
fn read_request_path(stream: &mut TcpStream) -> Option<String> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut chunk).ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if buf.len() > 64 * 1024 {
            return None;
        }
    }
    let text = String::from_utf8_lossy(&buf);
    let request_line = text.lines().next()?;
    let target = request_line.split_whitespace().nth(1)?;
    Some(target.split('?').next().unwrap_or(target).to_string())
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        301 => "Moved Permanently",
        302 => "Found",
        403 => "Forbidden",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}
