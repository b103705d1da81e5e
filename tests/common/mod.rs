//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use image::{GrayImage, Luma};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

// ── Mock Ollama ─────────────────────────────────────────────────────────────

/// One request seen by [`MockOllama`].
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub body: Vec<u8>,
}

impl Recorded {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("request body is JSON")
    }
}

/// Minimal HTTP/1.1 server answering `/api/tags` and `/api/generate`.
///
/// Every `/api/generate` call gets the same `generate_body`.
pub struct MockOllama {
    pub url: String,
    pub requests: Arc<Mutex<Vec<Recorded>>>,
}

impl MockOllama {
    pub async fn start(generate_body: impl Into<String>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let generate_body: Arc<str> = generate_body.into().into();

        let seen = requests.clone();
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    return;
                };
                let seen = seen.clone();
                let body = generate_body.clone();
                tokio::spawn(async move {
                    let _ = serve(stream, seen, &body).await;
                });
            }
        });

        Self { url, requests }
    }

    /// A Generate reply whose `response` field is `text`.
    pub async fn replying(text: &str) -> Self {
        Self::start(serde_json::json!({ "model": "gemma3", "response": text, "done": true }).to_string())
            .await
    }

    pub fn generate_calls(&self) -> Vec<Recorded> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.path == "/api/generate")
            .cloned()
            .collect()
    }
}

async fn serve(
    mut stream: TcpStream,
    seen: Arc<Mutex<Vec<Recorded>>>,
    generate_body: &str,
) -> std::io::Result<()> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 8192];
    let header_end = loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = find(&buf, b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut request_line = head.lines().next().unwrap_or_default().split_whitespace();
    let method = request_line.next().unwrap_or_default().to_string();
    let path = request_line.next().unwrap_or_default().to_string();
    let content_length = head
        .lines()
        .filter_map(|l| l.split_once(':'))
        .find(|(k, _)| k.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let body = buf[header_end..].to_vec();
    seen.lock().unwrap().push(Recorded {
        method,
        path: path.clone(),
        body,
    });

    let (status, payload) = match path.as_str() {
        "/api/tags" => ("200 OK", r#"{"models":[]}"#.to_string()),
        "/api/generate" => ("200 OK", generate_body.to_string()),
        _ => ("404 Not Found", "{}".to_string()),
    };
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{payload}",
        payload.len()
    );
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Accepts connections and never answers.
pub async fn silent_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });
    url
}

/// A local URL with nothing listening on it.
pub fn refused_url() -> String {
    let port = {
        let l = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        l.local_addr().unwrap().port()
    };
    format!("http://127.0.0.1:{port}")
}

// ── Images ──────────────────────────────────────────────────────────────────

/// White page with one ruled table of `cols`×`rows` cells, 2px rules.
pub fn ruled_table_image(cols: u32, rows: u32) -> GrayImage {
    let (cell_w, cell_h, margin) = (160, 60, 80);
    let width = margin * 2 + cols * cell_w;
    let height = margin * 2 + rows * cell_h;
    let mut img = GrayImage::from_pixel(width, height, Luma([255]));

    let right = margin + cols * cell_w;
    let bottom = margin + rows * cell_h;
    for r in 0..=rows {
        let y = margin + r * cell_h;
        for t in 0..2 {
            for x in margin..right + 2 {
                img.put_pixel(x, y + t, Luma([0]));
            }
        }
    }
    for c in 0..=cols {
        let x = margin + c * cell_w;
        for t in 0..2 {
            for y in margin..bottom + 2 {
                img.put_pixel(x + t, y, Luma([0]));
            }
        }
    }
    img
}

/// Save a small white PNG and return its path.
pub fn write_png(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    GrayImage::from_pixel(64, 48, Luma([255])).save(&path).unwrap();
    path
}

// ── Fake engines ────────────────────────────────────────────────────────────

/// Write an executable shell script standing in for an external engine.
#[cfg(unix)]
pub fn fake_engine(dir: &Path, name: &str, script: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{script}")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}
