//! Tests against a real bound server.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::harness::test_config;
use holdboard::nullable::NullTransport;
use holdboard::ServerBuilder;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_health_over_tcp_and_graceful_shutdown() {
    let config = holdboard::AppConfig {
        listen: SocketAddr::from(([127, 0, 0, 1], 0)),
        ..test_config()
    };
    let mut server = ServerBuilder::new(config)
        .with_transport(Arc::new(NullTransport::new()))
        .build()
        .await
        .expect("build");
    let addr = server.local_addr();
    let handle = server.shutdown_handle();
    let task = tokio::spawn(async move { server.run().await });

    let response = reqwest::get(format!("http://{addr}/health"))
        .await
        .expect("request");
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.expect("json");
    assert_eq!(body["status"], "ok");
    assert_eq!(body["oauthEnabled"], false);

    handle.shutdown();
    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("shutdown in time")
        .expect("join")
        .expect("run");
}
