#![allow(dead_code)]

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use rdalle::{Config, OpenAiClient};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

pub const API_KEY: &str = "sk-test-key";
pub const IMAGE_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nfake image body";

/// How long `/slow/*` holds each request.
pub const SLOW_DELAY: Duration = Duration::from_millis(150);
/// How long `/stall/*` holds each request.
pub const STALL_DELAY: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub body: Value,
    pub authorization: Option<String>,
    pub user_agent: Option<String>,
    pub content_type: Option<String>,
}

pub struct MockState {
    pub base_url: String,
    pub status: StatusCode,
    pub data: Vec<Value>,
    pub requests: Mutex<Vec<CapturedRequest>>,
    pub in_flight: AtomicUsize,
    pub peak_in_flight: AtomicUsize,
}

pub struct MockServer {
    pub state: Arc<MockState>,
}

impl MockServer {
    pub fn base_url(&self) -> &str {
        &self.state.base_url
    }

    /// Base URL of the mocked generation API (`.../v1/images`).
    pub fn api_url(&self) -> String {
        format!("{}/v1/images", self.state.base_url)
    }

    /// URL the mocked host serves an image from.
    pub fn image_url(&self, name: &str) -> String {
        format!("{}/files/{}", self.state.base_url, name)
    }

    /// URL the mocked host answers with 404.
    pub fn missing_url(&self, name: &str) -> String {
        format!("{}/missing/{}", self.state.base_url, name)
    }

    /// Image URL answered after [`SLOW_DELAY`].
    pub fn slow_url(&self, name: &str) -> String {
        format!("{}/slow/{}", self.state.base_url, name)
    }

    /// Image URL answered after [`STALL_DELAY`].
    pub fn stall_url(&self, name: &str) -> String {
        format!("{}/stall/{}", self.state.base_url, name)
    }

    /// Highest number of slow or stalled requests served at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.state.peak_in_flight.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn client(&self) -> OpenAiClient {
        client_for(&self.api_url())
    }
}

pub fn client_for(api_url: &str) -> OpenAiClient {
    let config = Config::new()
        .with_api_key(API_KEY)
        .with_base_url(api_url)
        .with_progress(false);
    OpenAiClient::new(&config).unwrap()
}

/// Starts a mock that answers generation calls with `status`. On 200 the
/// `data` array is built by `data`, which receives the server's base URL.
pub async fn spawn(status: StatusCode, data: impl FnOnce(&str) -> Vec<Value>) -> MockServer {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    let state = Arc::new(MockState {
        data: data(&base_url),
        base_url,
        status,
        requests: Mutex::new(Vec::new()),
        in_flight: AtomicUsize::new(0),
        peak_in_flight: AtomicUsize::new(0),
    });

    let app = Router::new()
        .route("/v1/images/generations", post(generations))
        .route("/files/:name", get(image_file))
        .route("/slow/:name", get(slow_image_file))
        .route("/stall/:name", get(stalled_image_file))
        .with_state(state.clone());

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockServer { state }
}

pub fn url_results(urls: &[String]) -> Vec<Value> {
    urls.iter().map(|url| json!({ "url": url })).collect()
}

/// Starts a bare HTTP/1.1 server that answers every request with
/// `status_line`, a `Content-Length` of 1000 and only `partial_body`, then
/// closes the connection. Returns the server's base URL.
pub async fn spawn_truncating(status_line: &'static str, partial_body: &'static [u8]) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            tokio::spawn(async move {
                if read_request(&mut socket).await.is_err() {
                    return;
                }
                let head = format!(
                    "HTTP/1.1 {}\r\nContent-Length: 1000\r\nConnection: close\r\n\r\n",
                    status_line
                );
                let _ = socket.write_all(head.as_bytes()).await;
                let _ = socket.write_all(partial_body).await;
                let _ = socket.flush().await;
                let _ = socket.shutdown().await;
            });
        }
    });

    base_url
}

/// Reads the request head and any declared body so closing the socket does
/// not reset the connection under the client.
async fn read_request(socket: &mut tokio::net::TcpStream) -> std::io::Result<()> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    let head_end = loop {
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).to_ascii_lowercase();
    let body_len = head
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    let mut received = buf.len() - head_end;
    while received < body_len {
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        received += n;
    }
    Ok(())
}

async fn generations(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let header_str = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    state.requests.lock().unwrap().push(CapturedRequest {
        body,
        authorization: header_str(header::AUTHORIZATION),
        user_agent: header_str(header::USER_AGENT),
        content_type: header_str(header::CONTENT_TYPE),
    });

    if state.status != StatusCode::OK {
        return (state.status, "upstream says no").into_response();
    }

    Json(json!({ "created": 1_700_000_000, "data": state.data })).into_response()
}

async fn image_file(Path(_name): Path<String>) -> Response {
    ([(header::CONTENT_TYPE, "image/png")], IMAGE_BYTES).into_response()
}

async fn delayed_image_file(state: &MockState, delay: Duration) -> Response {
    let now = state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    state.peak_in_flight.fetch_max(now, Ordering::SeqCst);
    tokio::time::sleep(delay).await;
    state.in_flight.fetch_sub(1, Ordering::SeqCst);
    ([(header::CONTENT_TYPE, "image/png")], IMAGE_BYTES).into_response()
}

async fn slow_image_file(
    State(state): State<Arc<MockState>>,
    Path(_name): Path<String>,
) -> Response {
    delayed_image_file(&state, SLOW_DELAY).await
}

async fn stalled_image_file(
    State(state): State<Arc<MockState>>,
    Path(_name): Path<String>,
) -> Response {
    delayed_image_file(&state, STALL_DELAY).await
}
