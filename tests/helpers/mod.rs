//! Shared fixtures for integration tests
//!
//! - paths into `tests/fixtures/`
//! - a minimal HTTP/1.1 file server for remote profile entries
//! - a shell-script stand-in for the `kcl` binary

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use claim_machinery::config::FetchSettings;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

pub fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

pub fn templates_dir() -> PathBuf {
    fixtures_dir().join("templates")
}

pub fn profile_fixture(name: &str) -> PathBuf {
    fixtures_dir().join("profile").join(name)
}

/// Short timeouts so unreachable entries fail fast
pub fn fast_fetch() -> FetchSettings {
    FetchSettings {
        probe_timeout: Duration::from_secs(2),
        download_timeout: Duration::from_secs(5),
    }
}

/// An address nothing listens on
pub async fn closed_port_url(path: &str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}{}", addr, path)
}

/// How the test server answers one path
#[derive(Clone)]
pub struct Route {
    pub status: u16,
    pub head_status: Option<u16>,
    pub body: String,
}

impl Route {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            head_status: None,
            body: body.into(),
        }
    }

    /// Serves `body` on GET but rejects HEAD with 405
    pub fn get_only(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            head_status: Some(405),
            body: body.into(),
        }
    }
}

/// Serve `routes` on an ephemeral port; unknown paths answer 404.
pub async fn serve(routes: HashMap<String, Route>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let routes = Arc::new(routes);

    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            let routes = Arc::clone(&routes);
            tokio::spawn(async move {
                let _ = handle(stream, &routes).await;
            });
        }
    });

    addr
}

async fn handle(mut stream: TcpStream, routes: &HashMap<String, Route>) -> std::io::Result<()> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let request = String::from_utf8_lossy(&buf);
    let mut first = request.lines().next().unwrap_or_default().split_whitespace();
    let method = first.next().unwrap_or_default().to_string();
    let path = first.next().unwrap_or_default().to_string();

    let (status, body) = match routes.get(&path) {
        Some(route) if method == "HEAD" => (route.head_status.unwrap_or(route.status), route.body.clone()),
        Some(route) => (route.status, route.body.clone()),
        None => (404, "not found".to_string()),
    };

    let mut response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/yaml\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        reason(status),
        body.len()
    );
    if method != "HEAD" {
        response.push_str(&body);
    }
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        404 => "Not Found",
        405 => "Method Not Allowed",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}

/// Write an executable shell script standing in for `kcl`.
#[cfg(unix)]
pub fn fake_kcl(dir: &Path, script_body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("kcl");
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", script_body)).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}
