//! Test harness that drives the API router in-process.
//!
//! The `TestHarness` wires the real application state over a scripted
//! [`NullTransport`], so Reddit and market responses are fully controlled
//! and no socket is opened. Requests go straight through the axum router
//! with `tower::ServiceExt::oneshot`.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use holdboard::api::{router, AppState};
use holdboard::config::{AppConfig, CheckMode};
use holdboard::entry::{normalize_username, total_nominal, HoldingEntry, ValidEntry};
use holdboard::nullable::NullTransport;
use holdboard::store::{EntryStore, MemoryStore};
use holdboard::transport::{HttpTransport, TransportError};
use holdboard::ServerBuilder;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

/// In-process application under test.
pub struct TestHarness {
    /// Scripted outbound HTTP.
    pub transport: Arc<NullTransport>,
    /// Backing store, shared with the router.
    pub store: Arc<MemoryStore>,
    router: Router,
}

impl TestHarness {
    /// Harness with default config (strict mode, dev mode off).
    pub fn setup() -> Self {
        Self::setup_with_config(test_config())
    }

    /// Harness with dev mode enabled.
    pub fn setup_dev() -> Self {
        Self::setup_with_config(AppConfig {
            dev_mode: true,
            ..test_config()
        })
    }

    /// Harness in soft check mode.
    pub fn setup_soft() -> Self {
        let mut config = test_config();
        config.reddit.check_mode = CheckMode::Soft;
        Self::setup_with_config(config)
    }

    /// Harness with a custom configuration.
    pub fn setup_with_config(config: AppConfig) -> Self {
        let transport = Arc::new(NullTransport::new());
        let store = Arc::new(MemoryStore::new());
        let state: AppState = ServerBuilder::new(config)
            .with_transport(Arc::clone(&transport) as Arc<dyn HttpTransport>)
            .with_store(Arc::clone(&store) as Arc<dyn EntryStore>)
            .build_state()
            .expect("state");

        Self {
            transport,
            store,
            router: router(Arc::new(state)),
        }
    }

    /// Script `username` as an existing Reddit account on every mirror.
    pub fn reddit_user_exists(&self, username: &str) {
        let body = serde_json::json!({"data": {"name": username}}).to_string();
        self.transport
            .respond(&format!("/user/{username}/"), 200, &body);
    }

    /// Script `username` as suspended.
    pub fn reddit_user_suspended(&self, username: &str) {
        let body =
            serde_json::json!({"data": {"name": username, "is_suspended": true}}).to_string();
        self.transport
            .respond(&format!("/user/{username}/"), 200, &body);
    }

    /// Make every Reddit host time out.
    pub fn reddit_down(&self) {
        self.transport.fail("reddit.com", TransportError::Timeout);
    }

    /// Serve a quote page with `price` in its meta tag.
    pub fn market_price(&self, price: f64) {
        let html = format!(r#"<html><meta itemprop="price" content="{price}"></html>"#);
        self.transport.respond("finance/quote", 200, &html);
    }

    /// Insert an entry directly into the store, bypassing verification.
    pub async fn seed(&self, username: &str, lots: u64, avg_price: f64) -> HoldingEntry {
        self.store
            .create(HoldingEntry::new(&ValidEntry {
                username: normalize_username(username),
                lots,
                avg_price,
                total_nominal: total_nominal(avg_price, lots),
            }))
            .await
            .expect("seed")
    }

    /// Number of stored entries.
    pub async fn entry_count(&self) -> usize {
        self.store.list().await.expect("list").len()
    }

    /// POST a raw body to `uri`.
    pub async fn post(&self, uri: &str, body: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request");
        self.send(request).await
    }

    /// POST a JSON value to `uri`.
    pub async fn post_json(&self, uri: &str, body: &Value) -> (StatusCode, Value) {
        self.post(uri, &body.to_string()).await
    }

    /// GET `uri`.
    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("request");
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, json)
    }
}

/// Defaults with retries disabled so scripted failures resolve instantly.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.reddit.retries = 0;
    config.reddit.backoff_ms = 0;
    config
}
