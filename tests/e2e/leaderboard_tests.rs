//! `GET /api/leaderboard` end-to-end tests.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::TestHarness;
use axum::http::StatusCode;

#[tokio::test]
async fn test_empty_board_without_market() {
    let harness = TestHarness::setup();

    let (status, body) = harness.get("/api/leaderboard").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stats"]["holdersCount"], 0);
    assert_eq!(body["stats"]["meanAvgPrice"], 0.0);
    assert_eq!(body["top10"].as_array().map(Vec::len), Some(0));
    assert_eq!(body["top10Losers"].as_array().map(Vec::len), Some(0));
    assert_eq!(body["hiddenCount"], 0);
    assert_eq!(body["market"]["source"], "unavailable");
    assert!(body["market"]["price"].is_null());
    assert!(body.get("myRank").is_none());
}

#[tokio::test]
async fn test_board_order_stats_and_hidden_count() {
    let harness = TestHarness::setup();
    for i in 0..12u64 {
        harness.seed(&format!("holder{i}"), i + 1, 10.0).await;
    }

    let (status, body) = harness.get("/api/leaderboard").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stats"]["holdersCount"], 12);
    assert_eq!(body["stats"]["totalLots"], 78);
    assert_eq!(body["stats"]["meanAvgPrice"], 10.0);
    assert_eq!(body["hiddenCount"], 2);

    let top = body["top10"].as_array().expect("top10");
    assert_eq!(top.len(), 10);
    assert_eq!(top[0]["usernameKey"], "holder11");
    assert_eq!(top[0]["rank"], 1);
    assert_eq!(top[9]["rank"], 10);
}

#[tokio::test]
async fn test_top_losers_use_market_price() {
    let harness = TestHarness::setup();
    harness.market_price(100.0);
    harness.seed("profit", 10, 50.0).await;
    harness.seed("deep", 1, 400.0).await;
    harness.seed("shallow", 5, 110.0).await;

    let (status, body) = harness.get("/api/leaderboard").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["market"]["price"], 100.0);
    assert_eq!(body["market"]["source"], "google-finance");

    let losers = body["top10Losers"].as_array().expect("losers");
    assert_eq!(losers.len(), 2);
    assert_eq!(losers[0]["usernameKey"], "deep");
    assert_eq!(losers[0]["lossRank"], 1);
    assert_eq!(losers[0]["overallRank"], 3);
    assert_eq!(losers[0]["pnlPercent"], -75.0);
    assert_eq!(losers[0]["pnlNominal"], -30_000.0);
    assert_eq!(losers[1]["usernameKey"], "shallow");
}

#[tokio::test]
async fn test_my_rank_lookup_is_case_insensitive() {
    let harness = TestHarness::setup();
    harness.seed("Alice", 5, 1.0).await;
    harness.seed("bob", 9, 1.0).await;

    let (status, body) = harness.get("/api/leaderboard?username=%20ALICE%20").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["myRank"]["rank"], 2);
    assert_eq!(body["myRank"]["entry"]["usernameDisplay"], "Alice");

    let (_, body) = harness.get("/api/leaderboard?username=nobody").await;
    assert!(body.get("myRank").is_none());
}

#[tokio::test]
async fn test_malformed_username_query_is_rejected() {
    let harness = TestHarness::setup();

    let (status, body) = harness.get("/api/leaderboard?username=not-valid").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().is_some());
}

#[tokio::test]
async fn test_market_snapshot_is_cached() {
    let harness = TestHarness::setup();
    harness.market_price(120.0);

    harness.get("/api/leaderboard").await;
    harness.get("/api/leaderboard").await;

    assert_eq!(harness.transport.request_count("finance/quote"), 1);
}
