//! Verification outcomes and strategy selection.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Terminal classification of one verification attempt chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    /// The account exists and is active.
    Exists,
    /// No account goes by that name.
    NotFound,
    /// The account exists but is suspended.
    Suspended,
    /// Reddit could not be reached or answered ambiguously.
    Unavailable,
}

impl CheckStatus {
    /// All statuses, in summary order.
    pub const ALL: [Self; 4] = [
        Self::Exists,
        Self::NotFound,
        Self::Suspended,
        Self::Unavailable,
    ];

    /// Returns true if no other endpoint can change this result.
    #[must_use]
    pub fn is_conclusive(&self) -> bool {
        matches!(self, Self::Exists | Self::Suspended)
    }

    /// Wire name of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exists => "exists",
            Self::NotFound => "not_found",
            Self::Suspended => "suspended",
            Self::Unavailable => "unavailable",
        }
    }
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verification path selected by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStrategy {
    /// Unauthenticated JSON mirrors, then HTML scraping.
    #[default]
    Public,
    /// OAuth endpoint only.
    Oauth,
    /// OAuth when configured, public path when OAuth is unavailable.
    Auto,
}

impl CheckStrategy {
    /// Wire name of the strategy.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Oauth => "oauth",
            Self::Auto => "auto",
        }
    }
}

impl fmt::Display for CheckStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CheckStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "public" => Ok(Self::Public),
            "oauth" => Ok(Self::Oauth),
            "auto" => Ok(Self::Auto),
            other => Err(format!("unknown check strategy: {other}")),
        }
    }
}
