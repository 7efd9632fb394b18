//! # holdboard
//!
//! A public holder leaderboard. Users submit a stock position tied to a
//! Reddit username; the service verifies the Reddit account, ranks every
//! submission and reports top holders and top losers against the latest
//! scraped market price.
//!
//! ## Modules
//!
//! - [`reddit`]: Reddit identity verification (OAuth, public JSON mirrors, HTML fallback)
//! - [`leaderboard`]: Ranking, aggregate stats and top-loser computation
//! - [`audit`]: Bulk verification and clean-up of stored entries
//! - [`entry`]: Holding entry model and input validation
//! - [`store`]: Entry storage
//! - [`market`]: Market price snapshot scraper
//! - [`transport`]: Outbound HTTP abstraction
//! - [`nullable`]: Deterministic transport and clock for tests
//! - [`api`]: HTTP API routes
//! - [`server`]: Server lifecycle

pub mod api;
pub mod audit;
pub mod config;
pub mod entry;
pub mod error;
pub mod html;
pub mod leaderboard;
pub mod market;
pub mod nullable;
pub mod reddit;
pub mod server;
pub mod store;
pub mod transport;

pub use config::AppConfig;
pub use error::{Error, Result};
pub use server::{RunningServer, ServerBuilder};
