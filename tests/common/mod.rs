//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::http::{Method, Request, StatusCode};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use request_router::exception::Failure;
use request_router::filter::{filter_fn, Filter, Next};
use request_router::http::{response, HttpRequest, HttpResponse};
use request_router::routing::Route;
use request_router::thrift::{ThriftRequest, ThriftResponse};

/// Ordered side-effect log shared between filters and callbacks.
pub type Log = Arc<Mutex<Vec<String>>>;

pub fn entries(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// A filter logging `<name>.pre` before and `<name>.post` after the rest of the chain.
pub fn recording_filter(name: &'static str, log: Log) -> impl Filter<HttpRequest, HttpResponse> {
    recording(name, log)
}

/// `recording_filter` for Thrift chains.
pub fn thrift_recording_filter(name: &'static str, log: Log) -> impl Filter<ThriftRequest, ThriftResponse> {
    recording(name, log)
}

fn recording<Req, Rep>(name: &'static str, log: Log) -> impl Filter<Req, Rep>
where
    Req: Send + 'static,
    Rep: Send + 'static,
{
    filter_fn(move |req: Req, next: Next<Req, Rep>| {
        let log = log.clone();
        async move {
            log.lock().unwrap().push(format!("{name}.pre"));
            let rep = next.run(req).await;
            log.lock().unwrap().push(format!("{name}.post"));
            rep
        }
    })
}

/// A route logging `T` and answering `status`.
pub fn recording_route(method: Method, template: &str, status: StatusCode, log: Log) -> Route {
    Route::new(method, template, move |_req: HttpRequest| {
        let log = log.clone();
        async move {
            log.lock().unwrap().push("T".to_string());
            Ok::<_, Failure>(response::empty(status))
        }
    })
    .unwrap()
}

pub fn request(method: Method, uri: &str, body: &'static str) -> HttpRequest {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Bytes::from_static(body.as_bytes()))
        .unwrap()
}

pub fn body_json(response: &HttpResponse) -> serde_json::Value {
    serde_json::from_slice(response.body()).unwrap()
}

/// Poll `condition` until it holds or `timeout` elapses.
pub async fn wait_until(timeout: Duration, condition: impl Fn() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}

/// A raw HTTP/1.1 backend bound to an ephemeral port.
pub struct MockBackend {
    pub addr: SocketAddr,
    hits: Arc<AtomicUsize>,
    heads: Arc<Mutex<Vec<String>>>,
}

impl MockBackend {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    /// Request heads (request line and headers) in arrival order.
    pub fn heads(&self) -> Vec<String> {
        self.heads.lock().unwrap().clone()
    }
}

/// Start a backend that returns a fixed `200` response.
pub async fn start_mock_backend(response: &'static str) -> MockBackend {
    start_programmable_backend(move || async move { (200, response.to_string()) }).await
}

/// Start a backend whose status and body come from `f`, evaluated per request.
pub async fn start_programmable_backend<F, Fut>(f: F) -> MockBackend
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let heads = Arc::new(Mutex::new(Vec::new()));
    let f = Arc::new(f);

    let backend = MockBackend {
        addr,
        hits: hits.clone(),
        heads: heads.clone(),
    };

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let f = f.clone();
            let hits = hits.clone();
            let heads = heads.clone();
            tokio::spawn(async move {
                let Some(head) = read_request(&mut socket).await else {
                    return;
                };
                heads.lock().unwrap().push(head);
                hits.fetch_add(1, Ordering::SeqCst);

                let (status, body) = f().await;
                let status_text = match status {
                    200 => "200 OK",
                    201 => "201 Created",
                    404 => "404 Not Found",
                    500 => "500 Internal Server Error",
                    503 => "503 Service Unavailable",
                    _ => "200 OK",
                };
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status_text,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    backend
}

/// Read one request, returning its head; the body is consumed and dropped.
async fn read_request(socket: &mut TcpStream) -> Option<String> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let head_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    let mut remaining = (head_end + content_length).saturating_sub(buf.len());
    while remaining > 0 {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        remaining = remaining.saturating_sub(n);
    }

    Some(head)
}
