//! `POST /api/dev/reddit-audit` end-to-end tests.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::TestHarness;
use axum::http::StatusCode;
use serde_json::json;

const AUDIT: &str = "/api/dev/reddit-audit";

#[tokio::test]
async fn test_audit_is_hidden_outside_dev_mode() {
    let harness = TestHarness::setup();
    harness.seed("ghost", 1, 1.0).await;

    let (status, _) = harness
        .post_json(AUDIT, &json!({"action": "clean", "dryRun": false, "confirmText": "CLEAN"}))
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(harness.entry_count().await, 1);
    assert!(harness.transport.requests().is_empty());
}

#[tokio::test]
async fn test_single_check() {
    let harness = TestHarness::setup_dev();
    harness.reddit_user_exists("spez");

    let (status, body) = harness
        .post_json(AUDIT, &json!({"action": "single", "username": "spez"}))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["action"], "single");
    assert_eq!(body["checkStrategy"], "public");
    assert_eq!(body["status"], "exists");
}

#[tokio::test]
async fn test_oauth_single_without_credentials_is_unavailable() {
    let harness = TestHarness::setup_dev();

    let (status, body) = harness
        .post_json(
            AUDIT,
            &json!({"action": "single", "username": "spez", "checkStrategy": "oauth"}),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "unavailable");
    assert!(harness.transport.requests().is_empty());
}

#[tokio::test]
async fn test_bulk_scans_every_entry_under_limit() {
    let harness = TestHarness::setup_dev();
    for i in 0..40 {
        let name = format!("user{i}");
        if i % 2 == 0 {
            harness.reddit_user_exists(&name);
        }
        harness.seed(&name, 1, 1.0).await;
    }

    let (status, body) = harness
        .post_json(AUDIT, &json!({"action": "bulk", "limit": 100}))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["scannedCount"], 40);
    assert_eq!(body["summary"]["exists"], 20);
    assert_eq!(body["summary"]["not_found"], 20);

    let results = body["results"].as_array().expect("results");
    assert_eq!(results.len(), 40);
    assert_eq!(results[0]["usernameKey"], "user0");
    assert_eq!(results[39]["usernameKey"], "user39");
}

#[tokio::test]
async fn test_clean_requires_confirmation() {
    let harness = TestHarness::setup_dev();
    harness.seed("ghost", 1, 1.0).await;

    let (status, body) = harness
        .post_json(AUDIT, &json!({"action": "clean", "dryRun": false, "confirmText": "yes"}))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fieldErrors"]["confirmText"].is_array());
    assert_eq!(harness.entry_count().await, 1);
}

#[tokio::test]
async fn test_clean_defaults_to_dry_run() {
    let harness = TestHarness::setup_dev();
    harness.seed("ghost", 1, 1.0).await;

    let (status, body) = harness.post_json(AUDIT, &json!({"action": "clean"})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["dryRun"], true);
    assert_eq!(body["candidateCount"], 1);
    assert!(body.get("deletedCount").is_none());
    assert_eq!(harness.entry_count().await, 1);
}

#[tokio::test]
async fn test_confirmed_clean_deletes_candidates() {
    let harness = TestHarness::setup_dev();
    harness.reddit_user_exists("alive");
    harness.seed("alive", 1, 1.0).await;
    harness.seed("ghost", 1, 1.0).await;

    let (status, body) = harness
        .post_json(AUDIT, &json!({"action": "clean", "dryRun": false, "confirmText": "CLEAN"}))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deletedCount"], 1);
    assert_eq!(body["candidateStatuses"], json!(["not_found", "suspended"]));
    assert_eq!(harness.entry_count().await, 1);
}

#[tokio::test]
async fn test_unknown_action_is_rejected() {
    let harness = TestHarness::setup_dev();

    let (status, _) = harness.post_json(AUDIT, &json!({"action": "nuke"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = harness.post(AUDIT, "][").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid JSON payload.");
}
