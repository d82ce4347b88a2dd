//! Shared test utilities.
//!
//! [`FakeDav`] is a tiny HTTP/1.1 server on a random localhost port that answers
//! from a route table, records every request it receives, and can cut a body short
//! to simulate a connection dropped mid-read. One request is served per connection.

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use url::Url;

/// A canned response.
#[derive(Debug, Clone)]
pub enum Reply {
    Full {
        status: u16,
        content_type: &'static str,
        body: String,
    },
    /// Declares a longer `Content-Length` than it sends, then closes the socket.
    Truncated { body: String },
}

impl Reply {
    pub fn ok(body: &str) -> Self {
        Reply::Full {
            status: 200,
            content_type: "text/markdown; charset=utf-8",
            body: body.to_string(),
        }
    }

    pub fn status(status: u16, body: &str) -> Self {
        Reply::Full {
            status,
            content_type: "text/plain",
            body: body.to_string(),
        }
    }

    pub fn multistatus(xml: String) -> Self {
        Reply::Full {
            status: 207,
            content_type: "application/xml; charset=utf-8",
            body: xml,
        }
    }

    pub fn truncated(body: &str) -> Self {
        Reply::Truncated {
            body: body.to_string(),
        }
    }
}

/// A request as seen by the fake server.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RecordedRequest {
    /// Header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<String> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.clone())
    }
}

type Routes = HashMap<(String, String), VecDeque<Reply>>;

#[derive(Default)]
struct State {
    routes: Routes,
    requests: Vec<RecordedRequest>,
}

/// In-process fake WebDAV server.
pub struct FakeDav {
    base: Url,
    state: Arc<Mutex<State>>,
    task: JoinHandle<()>,
}

impl FakeDav {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(Mutex::new(State::default()));

        let server_state = Arc::clone(&state);
        let task = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let state = Arc::clone(&server_state);
                tokio::spawn(async move {
                    let _ = serve(stream, state).await;
                });
            }
        });

        Self {
            base: Url::parse(&format!("http://{addr}/")).unwrap(),
            state,
            task,
        }
    }

    /// Absolute URL for a server path.
    pub fn url(&self, path: &str) -> Url {
        self.base.join(path).unwrap()
    }

    /// Always answer `method path` with `reply`.
    pub fn route(&self, method: &str, path: &str, reply: Reply) {
        self.route_sequence(method, path, vec![reply]);
    }

    /// Answer successive requests in order; the last reply repeats.
    pub fn route_sequence(&self, method: &str, path: &str, replies: Vec<Reply>) {
        self.state
            .lock()
            .unwrap()
            .routes
            .insert((method.to_string(), path.to_string()), replies.into());
    }

    /// Every request received so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    /// Paths requested with `method`, in order.
    pub fn paths(&self, method: &str) -> Vec<String> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method)
            .map(|r| r.path)
            .collect()
    }
}

impl Drop for FakeDav {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn next_reply(state: &Mutex<State>, method: &str, path: &str) -> Reply {
    let mut state = state.lock().unwrap();
    match state.routes.get_mut(&(method.to_string(), path.to_string())) {
        Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
        Some(queue) => queue.front().cloned().unwrap(),
        None => Reply::status(404, "not found"),
    }
}

async fn serve(mut stream: TcpStream, state: Arc<Mutex<State>>) -> std::io::Result<()> {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 4096];

    let head_end = loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buffer.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buffer.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buffer[..head_end]).into_owned();
    let mut lines = head.split("\r\n");
    let request_line = lines.next().unwrap_or_default();
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let path = parts.next().unwrap_or_default().to_string();

    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect();

    let content_length = headers
        .iter()
        .find(|(k, _)| k == "content-length")
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);

    let mut body = buffer[head_end..].to_vec();
    while body.len() < content_length {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }

    let reply = next_reply(&state, &method, &path);
    state.lock().unwrap().requests.push(RecordedRequest {
        method,
        path,
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    });

    match reply {
        Reply::Full {
            status,
            content_type,
            body,
        } => {
            let response = format!(
                "HTTP/1.1 {status} Status\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).await?;
        }
        Reply::Truncated { body } => {
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len() + 64
            );
            stream.write_all(response.as_bytes()).await?;
        }
    }

    stream.flush().await?;
    stream.shutdown().await
}

/// Build a multi-status document from `(href, is_collection)` pairs.
pub fn multistatus(members: &[(&str, bool)]) -> String {
    let mut xml = String::from(r#"<?xml version="1.0"?><d:multistatus xmlns:d="DAV:">"#);
    for (href, is_collection) in members {
        let resourcetype = if *is_collection {
            "<d:resourcetype><d:collection/></d:resourcetype>"
        } else {
            "<d:resourcetype/>"
        };
        xml.push_str(&format!(
            "<d:response><d:href>{href}</d:href><d:propstat><d:prop>{resourcetype}</d:prop>\
             <d:status>HTTP/1.1 200 OK</d:status></d:propstat></d:response>"
        ));
    }
    xml.push_str("</d:multistatus>");
    xml
}

/// Write a file, creating parent directories.
pub fn write_file(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

/// A post with the given front-matter lines and a short body.
pub fn post(front_matter: &str) -> String {
    format!("---\n{front_matter}\n---\n# Heading\n\nBody text.\n")
}
