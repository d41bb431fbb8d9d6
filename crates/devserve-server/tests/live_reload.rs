//! End-to-end tests against a bound server.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use devserve_server::{
    ChannelRegistry, INJECTION_MARKER, LiveServer, RELOAD_MESSAGE, RELOAD_PATH, ServerConfig,
};
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

const TIMEOUT: Duration = Duration::from_secs(5);

async fn start(root: &Path) -> (SocketAddr, Arc<ChannelRegistry>) {
    let config = ServerConfig {
        host: "127.0.0.1".to_owned(),
        port: 0,
        root_dir: root.to_path_buf(),
    };
    let server = LiveServer::bind(config).await.unwrap();
    let addr = server.local_addr().unwrap();
    let registry = server.registry();
    tokio::spawn(server.serve());
    (addr, registry)
}

/// Poll until the registry holds `expected` channels.
async fn wait_for_channels(registry: &ChannelRegistry, expected: usize) {
    tokio::time::timeout(TIMEOUT, async {
        while registry.len() != expected {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("registry never reached {expected} channels"));
}

/// Minimal HTTP/1.1 GET returning the raw response.
async fn http_get(addr: SocketAddr, path: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!("GET {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    String::from_utf8(response).unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_page_served_with_reload_client() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<html><body>hi</body></html>").unwrap();
    let (addr, _registry) = start(dir.path()).await;

    let response = http_get(addr, "/").await;

    assert!(response.starts_with("HTTP/1.1 200"));
    assert!(response.contains(INJECTION_MARKER));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_missing_page_is_404() {
    let dir = tempfile::tempdir().unwrap();
    let (addr, _registry) = start(dir.path()).await;

    let response = http_get(addr, "/nope.html").await;

    assert!(response.starts_with("HTTP/1.1 404"));
    assert!(response.contains("content-length: 0"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_channel_open_close_nets_zero() {
    let dir = tempfile::tempdir().unwrap();
    let (addr, registry) = start(dir.path()).await;
    assert_eq!(registry.len(), 0);

    let (mut socket, _) = connect_async(format!("ws://{addr}{RELOAD_PATH}"))
        .await
        .unwrap();
    wait_for_channels(&registry, 1).await;

    socket.close(None).await.unwrap();
    wait_for_channels(&registry, 0).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_dropped_connection_is_unregistered() {
    let dir = tempfile::tempdir().unwrap();
    let (addr, registry) = start(dir.path()).await;

    let (socket, _) = connect_async(format!("ws://{addr}{RELOAD_PATH}"))
        .await
        .unwrap();
    wait_for_channels(&registry, 1).await;

    drop(socket);
    wait_for_channels(&registry, 0).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_file_change_reloads_every_channel() {
    let dir = tempfile::tempdir().unwrap();
    let (addr, registry) = start(dir.path()).await;

    let url = format!("ws://{addr}{RELOAD_PATH}");
    let (mut first, _) = connect_async(&url).await.unwrap();
    let (mut second, _) = connect_async(&url).await.unwrap();
    wait_for_channels(&registry, 2).await;

    std::fs::write(dir.path().join("app.js"), "console.log('changed');").unwrap();

    for socket in [&mut first, &mut second] {
        let message = tokio::time::timeout(TIMEOUT, socket.next())
            .await
            .expect("no reload within timeout")
            .expect("stream ended")
            .unwrap();
        assert_eq!(message, Message::text(RELOAD_MESSAGE));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_inbound_messages_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let (addr, registry) = start(dir.path()).await;

    let (mut socket, _) = connect_async(format!("ws://{addr}{RELOAD_PATH}"))
        .await
        .unwrap();
    wait_for_channels(&registry, 1).await;

    socket.send(Message::text("hello")).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(registry.len(), 1);
}
