//! End-to-end tests for the holdboard HTTP API.
//!
//! Most tests drive the router in-process through [`TestHarness`]; the
//! server tests bind a real socket.

mod harness;

mod audit_tests;
mod entry_tests;
mod leaderboard_tests;
mod server_tests;

pub use harness::TestHarness;
