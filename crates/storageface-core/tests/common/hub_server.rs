//! Minimal HTTP/1.1 hub for integration tests.
//!
//! Understands the four endpoints the client calls: whoami, repo info,
//! repo creation and the single-file commit. One request per connection.
//! Commits whose destination contains "reject" get a 422.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

pub const GOOD_TOKEN: &str = "hf_good";
pub const USER: &str = "alice";

#[derive(Debug, Default)]
pub struct HubState {
    /// "kind/owner/name" of every repository that exists.
    pub repos: HashSet<String>,
    /// Committed files per repository: destination -> decoded content.
    pub files: BTreeMap<String, BTreeMap<String, Vec<u8>>>,
    /// Bodies of `POST /api/repos/create`.
    pub create_requests: Vec<serde_json::Value>,
    pub commit_attempts: usize,
}

pub struct HubServer {
    pub url: String,
    pub state: Arc<Mutex<HubState>>,
}

impl HubServer {
    /// Adds a repository before any request arrives.
    pub fn with_repo(self, key: &str) -> Self {
        self.state.lock().unwrap().repos.insert(key.to_string());
        self
    }

    pub fn files(&self, key: &str) -> BTreeMap<String, Vec<u8>> {
        self.state
            .lock()
            .unwrap()
            .files
            .get(key)
            .cloned()
            .unwrap_or_default()
    }
}

/// Starts the hub in a background thread. It runs until the process exits.
pub fn start() -> HubServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let state = Arc::new(Mutex::new(HubState::default()));
    let shared = Arc::clone(&state);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let state = Arc::clone(&shared);
            thread::spawn(move || handle(stream, &state));
        }
    });
    HubServer {
        url: format!("http://127.0.0.1:{}/", port),
        state,
    }
}

struct Request {
    method: String,
    path: String,
    authorization: Option<String>,
    body: Vec<u8>,
}

fn read_request(stream: &mut TcpStream) -> Option<Request> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 8192];
    let header_end = loop {
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
        let n = stream.read(&mut chunk).ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    };
    let head = String::from_utf8_lossy(&buf[..header_end]).into_owned();
    let mut lines = head.lines();
    let mut first = lines.next()?.split_whitespace();
    let method = first.next()?.to_string();
    let path = first.next()?.to_string();
    let mut authorization = None;
    let mut content_length = 0usize;
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            let value = value.trim();
            if name.trim().eq_ignore_ascii_case("authorization") {
                authorization = value.strip_prefix("Bearer ").map(str::to_string);
            } else if name.trim().eq_ignore_ascii_case("content-length") {
                content_length = value.parse().unwrap_or(0);
            }
        }
    }
    let mut body = buf[header_end..].to_vec();
    while body.len() < content_length {
        let n = stream.read(&mut chunk).ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }
    Some(Request {
        method,
        path,
        authorization,
        body,
    })
}

fn respond(stream: &mut TcpStream, status: &str, body: &str) {
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes());
}

fn error(stream: &mut TcpStream, status: &str, message: &str) {
    respond(stream, status, &serde_json::json!({ "error": message }).to_string());
}

fn handle(mut stream: TcpStream, state: &Mutex<HubState>) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(5)));
    let Some(req) = read_request(&mut stream) else {
        return;
    };
    if req.authorization.as_deref() != Some(GOOD_TOKEN) {
        error(&mut stream, "401 Unauthorized", "Invalid credentials in Authorization header");
        return;
    }
    let segments: Vec<&str> = req.path.trim_start_matches('/').split('/').collect();
    match (req.method.as_str(), segments.as_slice()) {
        ("GET", ["api", "whoami-v2"]) => {
            respond(&mut stream, "200 OK", &serde_json::json!({ "name": USER }).to_string());
        }
        ("POST", ["api", "repos", "create"]) => {
            let body: serde_json::Value = serde_json::from_slice(&req.body).unwrap_or_default();
            let kind = match body["type"].as_str() {
                Some("dataset") => "datasets",
                Some("space") => "spaces",
                _ => "models",
            };
            let key = format!(
                "{}/{}/{}",
                kind,
                body["organization"].as_str().unwrap_or(""),
                body["name"].as_str().unwrap_or("")
            );
            let mut st = state.lock().unwrap();
            st.create_requests.push(body);
            if !st.repos.insert(key) {
                drop(st);
                error(&mut stream, "409 Conflict", "You already created this repo");
                return;
            }
            drop(st);
            respond(&mut stream, "200 OK", r#"{"url":"created"}"#);
        }
        ("GET", ["api", kind, owner, name]) => {
            let key = format!("{}/{}/{}", kind, owner, name);
            let st = state.lock().unwrap();
            if !st.repos.contains(&key) {
                drop(st);
                error(&mut stream, "404 Not Found", "Repository not found");
                return;
            }
            let siblings: Vec<serde_json::Value> = st
                .files
                .get(&key)
                .map(|files| {
                    files
                        .keys()
                        .map(|p| serde_json::json!({ "rfilename": p }))
                        .collect()
                })
                .unwrap_or_default();
            drop(st);
            let body = serde_json::json!({ "private": false, "siblings": siblings });
            respond(&mut stream, "200 OK", &body.to_string());
        }
        ("POST", ["api", kind, owner, name, "commit", "main"]) => {
            let key = format!("{}/{}/{}", kind, owner, name);
            let mut st = state.lock().unwrap();
            st.commit_attempts += 1;
            if !st.repos.contains(&key) {
                drop(st);
                error(&mut stream, "404 Not Found", "Repository not found");
                return;
            }
            let Some((path, content)) = parse_commit(&req.body) else {
                drop(st);
                error(&mut stream, "400 Bad Request", "malformed commit body");
                return;
            };
            if path.contains("reject") {
                drop(st);
                error(&mut stream, "422 Unprocessable Entity", "file rejected by hub");
                return;
            }
            st.files.entry(key).or_default().insert(path, content);
            drop(st);
            respond(&mut stream, "200 OK", r#"{"success":true}"#);
        }
        _ => error(&mut stream, "404 Not Found", "no such endpoint"),
    }
}

/// Returns (path, decoded content) from the NDJSON file line.
fn parse_commit(body: &[u8]) -> Option<(String, Vec<u8>)> {
    let text = std::str::from_utf8(body).ok()?;
    for line in text.lines() {
        let value: serde_json::Value = serde_json::from_str(line).ok()?;
        if value["key"] == "file" {
            let path = value["value"]["path"].as_str()?.to_string();
            let content = STANDARD.decode(value["value"]["content"].as_str()?).ok()?;
            return Some((path, content));
        }
    }
    None
}
