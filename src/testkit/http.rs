//! Minimal HTTP server for adapter tests.
//!
//! [`StubServer`] listens on an ephemeral localhost port and answers every
//! request, whatever its path, with one canned response. Requests are
//! recorded so tests can assert on what the adapter sent.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

#[derive(Debug, Clone)]
struct Recorded {
    head: String,
    body: String,
}

#[derive(Debug, Clone)]
enum Reply {
    Respond { status: u16, body: String },
    Silent,
}

/// One-route HTTP stub bound to `127.0.0.1:0`.
pub struct StubServer {
    addr: std::net::SocketAddr,
    requests: Arc<Mutex<Vec<Recorded>>>,
    task: JoinHandle<()>,
}

impl StubServer {
    /// Answer every request with `status` and `body`.
    pub async fn respond(status: u16, body: &str) -> Self {
        Self::start(Reply::Respond {
            status,
            body: body.to_string(),
        })
        .await
    }

    /// Accept and read requests but never answer, to exercise timeouts.
    pub async fn silent() -> Self {
        Self::start(Reply::Silent).await
    }

    async fn start(reply: Reply) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind stub server");
        let addr = listener.local_addr().expect("stub server address");
        let requests = Arc::new(Mutex::new(Vec::new()));

        let recorded = Arc::clone(&requests);
        let task = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let recorded = Arc::clone(&recorded);
                let reply = reply.clone();
                tokio::spawn(async move {
                    let _ = serve(stream, reply, recorded).await;
                });
            }
        });

        Self {
            addr,
            requests,
            task,
        }
    }

    /// Base URL, e.g. `http://127.0.0.1:41234`.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Number of requests received so far.
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Body of the most recent request.
    pub fn last_body(&self) -> Option<String> {
        self.requests.lock().last().map(|r| r.body.clone())
    }

    /// Request line and headers of the most recent request.
    pub fn last_head(&self) -> Option<String> {
        self.requests.lock().last().map(|r| r.head.clone())
    }

    /// Wait until a request with a non-empty body arrives and return it.
    pub async fn wait_for_body(&self, timeout: Duration) -> Option<String> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let body = self
                .requests
                .lock()
                .iter()
                .find(|r| !r.body.is_empty())
                .map(|r| r.body.clone());
            if body.is_some() {
                return body;
            }
            if tokio::time::Instant::now() >= deadline {
                return None;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve(
    mut stream: TcpStream,
    reply: Reply,
    requests: Arc<Mutex<Vec<Recorded>>>,
) -> std::io::Result<()> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = find(&buf, b"\r\n\r\n") {
            break pos;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    let mut body = buf[header_end + 4..].to_vec();
    while body.len() < content_length {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }

    requests.lock().push(Recorded {
        head,
        body: String::from_utf8_lossy(&body).to_string(),
    });

    match reply {
        Reply::Respond { status, body } => {
            let response = format!(
                "HTTP/1.1 {status} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                reason(status),
                body.len(),
            );
            stream.write_all(response.as_bytes()).await?;
            stream.shutdown().await
        }
        Reply::Silent => {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        }
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

const fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        204 => "No Content",
        400 => "Bad Request",
        404 => "Not Found",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "Status",
    }
}
