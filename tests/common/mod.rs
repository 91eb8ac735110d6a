//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use catalog_gateway::config::GatewayConfig;
use catalog_gateway::fetch::RetryingFetcher;
use catalog_gateway::http::GatewayServer;
use catalog_gateway::lifecycle::Shutdown;
use catalog_gateway::upstream::{FaultInjectingUpstream, HttpUpstream, UpstreamSource};

/// Canned reply the mock upstream sends to every request.
#[derive(Debug, Clone)]
struct Reply {
    status: u16,
    body: String,
    delay: Duration,
}

/// A programmable upstream served over raw TCP.
///
/// The reply can be swapped between requests to simulate outages.
#[derive(Clone)]
pub struct MockUpstream {
    pub addr: SocketAddr,
    reply: Arc<Mutex<Reply>>,
    hits: Arc<AtomicUsize>,
}

impl MockUpstream {
    pub async fn start(status: u16, body: impl Into<String>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let mock = Self {
            addr,
            reply: Arc::new(Mutex::new(Reply {
                status,
                body: body.into(),
                delay: Duration::ZERO,
            })),
            hits: Arc::new(AtomicUsize::new(0)),
        };

        let server = mock.clone();
        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                let server = server.clone();
                tokio::spawn(async move { server.serve(socket).await });
            }
        });

        mock
    }

    /// An upstream serving `{"products": products}` with 200.
    pub async fn with_products(products: Vec<Value>) -> Self {
        Self::start(200, json!({ "products": products }).to_string()).await
    }

    async fn serve(&self, mut socket: TcpStream) {
        read_request_head(&mut socket).await;
        self.hits.fetch_add(1, Ordering::SeqCst);

        let reply = self.reply.lock().unwrap().clone();
        if !reply.delay.is_zero() {
            tokio::time::sleep(reply.delay).await;
        }

        let response = format!(
            "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            reply.status,
            reason(reply.status),
            reply.body.len(),
            reply.body
        );
        let _ = socket.write_all(response.as_bytes()).await;
        let _ = socket.shutdown().await;
    }

    pub fn set_reply(&self, status: u16, body: impl Into<String>) {
        let mut reply = self.reply.lock().unwrap();
        reply.status = status;
        reply.body = body.into();
    }

    pub fn set_delay(&self, delay: Duration) {
        self.reply.lock().unwrap().delay = delay;
    }

    /// Switch to failing every request with a 500.
    pub fn fail(&self) {
        self.set_reply(500, r#"{"message":"boom"}"#);
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn url(&self) -> String {
        format!("http://{}/products", self.addr)
    }
}

async fn read_request_head(socket: &mut TcpStream) {
    let mut buf = Vec::with_capacity(1024);
    let mut chunk = [0u8; 512];
    loop {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => {
                buf.extend_from_slice(&chunk[..n]);
                if buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    return;
                }
            }
        }
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        404 => "Not Found",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

/// A well-formed product record.
pub fn product(id: i64, price: f64, category: &str) -> Value {
    json!({
        "id": id,
        "title": format!("Product {id}"),
        "price": price,
        "category": category,
        "meta": {
            "createdAt": "2024-05-01T10:00:00.000Z",
            "updatedAt": "2024-05-02T10:00:00.000Z"
        }
    })
}

/// Config pointed at `upstream_url` with delays short enough for tests.
pub fn test_config(upstream_url: &str) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.upstream.url = upstream_url.into();
    config.upstream.timeout_ms = 500;
    config.retries.base_delay_ms = 10;
    config.observability.metrics_enabled = false;
    config
}

pub fn build_fetcher(config: &GatewayConfig) -> Arc<RetryingFetcher> {
    let http = HttpUpstream::from_config(&config.upstream).unwrap();
    let upstream: Arc<dyn UpstreamSource> = if config.upstream.inject_faults {
        Arc::new(FaultInjectingUpstream::new(http))
    } else {
        Arc::new(http)
    };
    Arc::new(RetryingFetcher::new(upstream, config))
}

/// A gateway running on an ephemeral port.
pub struct TestGateway {
    pub base_url: String,
    pub fetcher: Arc<RetryingFetcher>,
    pub shutdown: Shutdown,
    pub handle: tokio::task::JoinHandle<Result<(), std::io::Error>>,
}

pub async fn start_gateway(config: GatewayConfig) -> TestGateway {
    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let fetcher = build_fetcher(&config);
    let shutdown = Shutdown::new();
    let server = GatewayServer::new(config, fetcher.clone());
    let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));

    TestGateway {
        base_url: format!("http://{addr}"),
        fetcher,
        shutdown,
        handle,
    }
}
