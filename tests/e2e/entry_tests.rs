//! `POST /api/entry` end-to-end tests.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::TestHarness;
use axum::http::StatusCode;
use serde_json::json;

#[tokio::test]
async fn test_verified_submission_is_created() {
    let harness = TestHarness::setup();
    harness.reddit_user_exists("Spez");

    let (status, body) = harness
        .post_json(
            "/api/entry",
            &json!({"username": "  Spez ", "lots": 12, "avgPrice": 150.5}),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["rank"], 1);
    assert_eq!(body["entry"]["usernameDisplay"], "Spez");
    assert_eq!(body["entry"]["usernameKey"], "spez");
    assert_eq!(body["entry"]["lots"], 12);
    assert_eq!(body["entry"]["totalNominal"], 180_600.0);
    assert_eq!(harness.entry_count().await, 1);
}

#[tokio::test]
async fn test_rank_reflects_existing_entries() {
    let harness = TestHarness::setup();
    harness.seed("whale", 500, 100.0).await;
    harness.seed("shrimp", 1, 100.0).await;
    harness.reddit_user_exists("middle");

    let (status, body) = harness
        .post_json(
            "/api/entry",
            &json!({"username": "middle", "lots": "20", "avgPrice": "99"}),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["rank"], 2);
}

#[tokio::test]
async fn test_malformed_json_is_rejected() {
    let harness = TestHarness::setup();

    let (status, body) = harness.post("/api/entry", "{not json").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid JSON payload.");
    assert!(harness.transport.requests().is_empty());
}

#[tokio::test]
async fn test_field_errors_are_collected() {
    let harness = TestHarness::setup();

    let (status, body) = harness
        .post_json(
            "/api/entry",
            &json!({"username": "bad-name", "lots": 0, "avgPrice": "abc"}),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let fields = body["fieldErrors"].as_object().expect("fieldErrors");
    assert!(fields.contains_key("username"));
    assert!(fields.contains_key("lots"));
    assert!(fields.contains_key("avgPrice"));
    assert!(harness.transport.requests().is_empty());
}

#[tokio::test]
async fn test_duplicate_username_conflicts_case_insensitively() {
    let harness = TestHarness::setup();
    harness.seed("Spez", 1, 1.0).await;

    let (status, body) = harness
        .post_json("/api/entry", &json!({"username": "SPEZ", "lots": 1, "avgPrice": 1}))
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().is_some());
    assert!(harness.transport.requests().is_empty());
    assert_eq!(harness.entry_count().await, 1);
}

#[tokio::test]
async fn test_unknown_reddit_account_is_rejected() {
    let harness = TestHarness::setup();

    let (status, body) = harness
        .post_json(
            "/api/entry",
            &json!({"username": "totally_invalid_zzz", "lots": 1, "avgPrice": 1}),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fieldErrors"]["username"][0], "Reddit account not found.");
    assert_eq!(harness.entry_count().await, 0);
}

#[tokio::test]
async fn test_suspended_reddit_account_is_rejected() {
    let harness = TestHarness::setup();
    harness.reddit_user_suspended("banned_user");

    let (status, body) = harness
        .post_json(
            "/api/entry",
            &json!({"username": "banned_user", "lots": 1, "avgPrice": 1}),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fieldErrors"]["username"][0], "Reddit account is suspended.");
}

#[tokio::test]
async fn test_unavailable_verification_is_503_in_strict_mode() {
    let harness = TestHarness::setup();
    harness.reddit_down();

    let (status, body) = harness
        .post_json("/api/entry", &json!({"username": "someone", "lots": 1, "avgPrice": 1}))
        .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body.get("fieldErrors").is_none());
    assert_eq!(harness.entry_count().await, 0);
}

#[tokio::test]
async fn test_unavailable_verification_is_accepted_in_soft_mode() {
    let harness = TestHarness::setup_soft();
    harness.reddit_down();

    let (status, body) = harness
        .post_json("/api/entry", &json!({"username": "someone", "lots": 1, "avgPrice": 1}))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["entry"]["usernameKey"], "someone");
}

#[tokio::test]
async fn test_nominal_ceiling_is_enforced_after_verification() {
    let harness = TestHarness::setup();
    harness.reddit_user_exists("rich");

    let (status, body) = harness
        .post_json(
            "/api/entry",
            &json!({"username": "rich", "lots": 1_000_000_000u64, "avgPrice": 1e8}),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fieldErrors"]["avgPrice"].is_array());
    assert_eq!(harness.entry_count().await, 0);
}
