//! The hyper listener over a real socket.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tessera_http::response;
use tessera_middleware::{handler_fn, MiddlewareCatalog, MiddlewareRegistry};
use tessera_router::{RouteTarget, Router};
use tessera_server::{ControllerRegistry, Dispatcher, Server, ServerConfig, ShutdownSignal};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

async fn start(max_body_size: usize) -> (std::net::SocketAddr, ShutdownSignal, tokio::task::JoinHandle<()>) {
    let target = RouteTarget::new("", "echo", "peer");
    let router = Router::builder().any("/peer", target.clone()).build().unwrap();
    let mut controllers = ControllerRegistry::new();
    controllers.register(
        target,
        handler_fn(|req| async move { Ok(response::html(req.remote_ip().to_string())) }),
    );

    let mut registry = MiddlewareRegistry::builder();
    registry
        .load(&json!({"@": ["static_file"]}), "", &MiddlewareCatalog::with_defaults())
        .unwrap();
    let dispatcher = Arc::new(
        Dispatcher::builder(router, registry.build())
            .controllers(controllers)
            .build(),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = ShutdownSignal::new();
    let server = Server::new(
        ServerConfig::builder()
            .max_body_size(max_body_size)
            .shutdown_timeout(Duration::from_millis(200))
            .build(),
        dispatcher,
    );
    let signal = shutdown.clone();
    let handle = tokio::spawn(async move {
        server.serve(listener, signal).await.unwrap();
    });
    (addr, shutdown, handle)
}

async fn roundtrip(addr: std::net::SocketAddr, raw: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(raw.as_bytes()).await.unwrap();
    let mut out = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut out))
        .await
        .unwrap()
        .unwrap();
    String::from_utf8_lossy(&out).into_owned()
}

#[tokio::test]
async fn serves_requests_with_peer_address() {
    let (addr, shutdown, handle) = start(1024).await;

    let reply = roundtrip(addr, "GET /peer HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n").await;
    assert!(reply.starts_with("HTTP/1.1 200 OK"));
    assert!(reply.to_ascii_lowercase().contains("access-control-allow-origin: *"));
    assert!(reply.ends_with("127.0.0.1"));

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), handle).await.unwrap().unwrap();
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let (addr, shutdown, handle) = start(8).await;

    let reply = roundtrip(
        addr,
        "POST /peer HTTP/1.1\r\nHost: localhost\r\nContent-Length: 16\r\nConnection: close\r\n\r\n0123456789abcdef",
    )
    .await;
    assert!(reply.starts_with("HTTP/1.1 413"));

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), handle).await.unwrap().unwrap();
}
