//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

use sgo_playground::config::PlaygroundConfig;
use sgo_playground::lifecycle::Shutdown;
use sgo_playground::toolchain::{Toolchain, ToolchainError};
use sgo_playground::HttpServer;

pub type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// A compile-and-run service stand-in that counts hits and keeps request bodies.
pub struct MockCompileBackend {
    pub addr: SocketAddr,
    hits: Arc<AtomicU32>,
    bodies: Arc<Mutex<Vec<String>>>,
}

impl MockCompileBackend {
    pub fn endpoint(&self) -> String {
        format!("http://{}/compile", self.addr)
    }

    pub fn hits(&self) -> u32 {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn bodies(&self) -> Vec<String> {
        self.bodies.lock().unwrap().clone()
    }
}

/// Start a mock backend that always answers with `body`.
pub async fn start_compile_backend(body: &'static str) -> MockCompileBackend {
    start_programmable_backend(move |_| async move { (200, body.to_string()) }).await
}

/// Start a programmable mock backend; `f` receives the zero-based hit number.
pub async fn start_programmable_backend<F, Fut>(f: F) -> MockCompileBackend
where
    F: Fn(u32) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicU32::new(0));
    let bodies = Arc::new(Mutex::new(Vec::new()));
    let f = Arc::new(f);

    {
        let hits = hits.clone();
        let bodies = bodies.clone();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let f = f.clone();
                let hits = hits.clone();
                let bodies = bodies.clone();
                tokio::spawn(async move {
                    let request_body = read_request_body(&mut socket).await;
                    bodies.lock().unwrap().push(request_body);
                    let hit = hits.fetch_add(1, Ordering::SeqCst);

                    let (status, body) = f(hit).await;
                    let status_text = match status {
                        200 => "200 OK",
                        500 => "500 Internal Server Error",
                        502 => "502 Bad Gateway",
                        _ => "200 OK",
                    };
                    let response = format!(
                        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        status_text,
                        body.len(),
                        body
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });
    }

    MockCompileBackend { addr, hits, bodies }
}

/// Read one HTTP/1.1 request and return its body.
async fn read_request_body(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return String::new(),
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    };

    let headers = String::from_utf8_lossy(&buf[..header_end]).to_ascii_lowercase();
    let content_length = headers
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }

    String::from_utf8_lossy(&buf[header_end..]).into_owned()
}

/// Deterministic toolchain used in place of the external binaries.
///
/// - source containing `panic` makes either operation panic
/// - source containing `hang` makes translate never finish
/// - source containing `syntax error` fails translation with two diagnostics
/// - source containing `unformattable` fails formatting
/// - otherwise format trims and appends a newline, translate uppercases
pub struct ScriptedToolchain;

#[async_trait]
impl Toolchain for ScriptedToolchain {
    async fn format(&self, source: &str) -> Result<String, ToolchainError> {
        if source.contains("panic") {
            let lines: Vec<&str> = Vec::new();
            let _ = lines[source.len()];
        }
        if source.contains("unformattable") {
            return Err(ToolchainError::Failed("gofmt exited with exit status: 2".to_string()));
        }
        Ok(format!("{}\n", source.trim()))
    }

    async fn translate(&self, source: &str) -> Result<String, ToolchainError> {
        if source.contains("panic") {
            panic!("translator invariant violated");
        }
        if source.contains("hang") {
            std::future::pending::<()>().await;
        }
        if source.contains("syntax error") {
            return Err(ToolchainError::Diagnostics(vec![
                "prog.sgo:1:1: syntax error: unexpected newline".to_string(),
                "prog.sgo:2:5: undefined: x".to_string(),
            ]));
        }
        Ok(source.to_uppercase())
    }
}

/// A server running on an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub config_updates: mpsc::UnboundedSender<PlaygroundConfig>,
}

impl TestServer {
    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    pub fn http_url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn connect(&self) -> Client {
        let (client, _) = connect_async(self.ws_url()).await.expect("websocket connect");
        client
    }
}

/// Default configuration pointed at `endpoint`, listening on an ephemeral port.
pub fn test_config(endpoint: &str) -> PlaygroundConfig {
    let mut config = PlaygroundConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.execution.endpoint = endpoint.to_string();
    config.execution.timeout_secs = 5;
    config.toolchain.timeout_secs = 1;
    config
}

/// Start the server with the scripted toolchain.
pub async fn start_server(config: PlaygroundConfig) -> TestServer {
    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let (config_tx, config_updates) = mpsc::unbounded_channel();
    let server = HttpServer::new(config).with_toolchain(Arc::new(ScriptedToolchain));
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, config_updates, server_shutdown).await;
    });

    TestServer {
        addr,
        shutdown,
        config_updates: config_tx,
    }
}

pub async fn send(client: &mut Client, kind: &str, value: &str) {
    let message = json!({ "type": kind, "value": value });
    client.send(Message::text(message.to_string())).await.unwrap();
}

pub async fn send_raw(client: &mut Client, text: &str) {
    client.send(Message::text(text.to_string())).await.unwrap();
}

pub async fn send_binary(client: &mut Client, bytes: &[u8]) {
    client.send(Message::binary(bytes.to_vec())).await.unwrap();
}

/// Next response frame, decoded. Panics after five seconds.
pub async fn recv(client: &mut Client) -> Value {
    try_recv(client, Duration::from_secs(5))
        .await
        .expect("no response within timeout")
}

/// Next response frame, or `None` if nothing arrives within `wait`.
pub async fn try_recv(client: &mut Client, wait: Duration) -> Option<Value> {
    let deadline = tokio::time::Instant::now() + wait;
    loop {
        let frame = tokio::time::timeout_at(deadline, client.next()).await.ok()??;
        match frame {
            Ok(Message::Text(text)) => return Some(serde_json::from_str(text.as_str()).unwrap()),
            Ok(Message::Close(_)) | Err(_) => return None,
            Ok(_) => continue,
        }
    }
}
