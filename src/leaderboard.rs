//! Leaderboard ranking.
//!
//! Pure functions over stored entries. Ordering is lots descending, then
//! total nominal descending, then username key ascending. Ranks are dense
//! and start at 1.

use crate::entry::{HoldingEntry, SHARES_PER_LOT};
use serde::Serialize;
use std::cmp::Ordering;

/// Entries shown on the public board and in the losers list.
pub const TOP_LIMIT: usize = 10;

/// An entry with its leaderboard position.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedEntry {
    /// The stored entry.
    #[serde(flatten)]
    pub entry: HoldingEntry,
    /// 1-based position.
    pub rank: usize,
}

/// Aggregate figures across every entry.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardStats {
    /// Number of entries.
    pub holders_count: usize,
    /// Sum of lots.
    pub total_lots: u64,
    /// Mean of average prices, 2dp.
    pub mean_avg_price: f64,
    /// Sum of nominals, 2dp.
    pub total_nominal: f64,
}

/// Ranked board with the visible slice.
#[derive(Debug, Clone, PartialEq)]
pub struct Leaderboard {
    /// Aggregates.
    pub stats: LeaderboardStats,
    /// First [`TOP_LIMIT`] ranked entries.
    pub top: Vec<RankedEntry>,
    /// Entries not shown in `top`.
    pub hidden_count: usize,
    /// Every entry, ranked.
    pub ranked: Vec<RankedEntry>,
}

/// Position lookup result for one user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MyRank {
    /// 1-based position.
    pub rank: usize,
    /// The user's entry.
    pub entry: HoldingEntry,
}

/// An entry currently under water against the market price.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopLoserEntry {
    /// The stored entry.
    #[serde(flatten)]
    pub entry: HoldingEntry,
    /// 1-based position among losers.
    pub loss_rank: usize,
    /// Position on the main leaderboard.
    pub overall_rank: usize,
    /// Price used for the comparison.
    pub market_price: f64,
    /// Loss in percent of the average price, 2dp.
    pub pnl_percent: f64,
    /// Loss in currency, 2dp.
    pub pnl_nominal: f64,
}

/// Round half away from zero to 2 decimal places.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn compare(a: &HoldingEntry, b: &HoldingEntry) -> Ordering {
    b.lots
        .cmp(&a.lots)
        .then_with(|| b.total_nominal.total_cmp(&a.total_nominal))
        .then_with(|| a.username_key.cmp(&b.username_key))
}

/// Sort entries into leaderboard order and assign ranks.
#[must_use]
pub fn rank(entries: &[HoldingEntry]) -> Vec<RankedEntry> {
    let mut sorted = entries.to_vec();
    sorted.sort_by(compare);
    sorted
        .into_iter()
        .enumerate()
        .map(|(i, entry)| RankedEntry { entry, rank: i + 1 })
        .collect()
}

/// Aggregate stats over `entries`.
#[must_use]
pub fn build_stats(entries: &[HoldingEntry]) -> LeaderboardStats {
    let holders_count = entries.len();
    let total_lots = entries.iter().map(|e| e.lots).sum();
    let total_avg: f64 = entries.iter().map(|e| e.avg_price).sum();
    let total_nominal: f64 = entries.iter().map(|e| e.total_nominal).sum();

    #[allow(clippy::cast_precision_loss)]
    let mean_avg_price = if holders_count > 0 {
        round2(total_avg / holders_count as f64)
    } else {
        0.0
    };

    LeaderboardStats {
        holders_count,
        total_lots,
        mean_avg_price,
        total_nominal: round2(total_nominal),
    }
}

/// Rank entries and split off the visible top.
#[must_use]
pub fn build_leaderboard(entries: &[HoldingEntry]) -> Leaderboard {
    let ranked = rank(entries);
    Leaderboard {
        stats: build_stats(entries),
        top: ranked.iter().take(TOP_LIMIT).cloned().collect(),
        hidden_count: ranked.len().saturating_sub(TOP_LIMIT),
        ranked,
    }
}

/// Find a user's position by username key.
#[must_use]
pub fn find_my_rank(ranked: &[RankedEntry], username_key: &str) -> Option<MyRank> {
    ranked
        .iter()
        .find(|r| r.entry.username_key == username_key)
        .map(|r| MyRank {
            rank: r.rank,
            entry: r.entry.clone(),
        })
}

/// Entries losing the most against `market_price`, worst first.
#[must_use]
pub fn build_top_losers(ranked: &[RankedEntry], market_price: f64) -> Vec<TopLoserEntry> {
    let mut losers: Vec<TopLoserEntry> = ranked
        .iter()
        .filter(|r| r.entry.avg_price > 0.0 && market_price < r.entry.avg_price)
        .map(|r| {
            let diff = market_price - r.entry.avg_price;
            #[allow(clippy::cast_precision_loss)]
            let shares = r.entry.lots as f64 * SHARES_PER_LOT;
            TopLoserEntry {
                entry: r.entry.clone(),
                loss_rank: 0,
                overall_rank: r.rank,
                market_price,
                pnl_percent: round2(diff / r.entry.avg_price * 100.0),
                pnl_nominal: round2(diff * shares),
            }
        })
        .collect();

    losers.sort_by(|a, b| {
        a.pnl_percent
            .total_cmp(&b.pnl_percent)
            .then_with(|| a.pnl_nominal.total_cmp(&b.pnl_nominal))
            .then_with(|| a.entry.username_key.cmp(&b.entry.username_key))
    });
    losers.truncate(TOP_LIMIT);
    for (i, loser) in losers.iter_mut().enumerate() {
        loser.loss_rank = i + 1;
    }
    losers
}
