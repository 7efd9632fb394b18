//! Holding entries and submission validation.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Longest accepted username.
pub const MAX_USERNAME_LENGTH: usize = 20;

/// Largest accepted lot count.
pub const MAX_LOTS: u64 = 1_000_000_000;

#[allow(clippy::cast_precision_loss)]
const MAX_LOTS_F64: f64 = MAX_LOTS as f64;

/// Largest accepted money value (price or nominal).
pub const MAX_MONEY_VALUE: f64 = 1e15;

/// Shares per lot.
pub const SHARES_PER_LOT: f64 = 100.0;

static USERNAME_RE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]{1,20}$").ok());

/// Returns true if `username` (already trimmed) is well-formed.
#[must_use]
pub fn is_valid_username(username: &str) -> bool {
    USERNAME_RE
        .as_ref()
        .is_some_and(|re| re.is_match(username))
}

/// Display and lookup forms of a username.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedUsername {
    /// Trimmed, case preserved.
    pub display: String,
    /// Lowercased display form; unique across entries.
    pub key: String,
}

/// Trim and lowercase a username.
#[must_use]
pub fn normalize_username(username: &str) -> NormalizedUsername {
    let display = username.trim().to_string();
    let key = display.to_lowercase();
    NormalizedUsername { display, key }
}

/// Field name to error messages.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// A stored holding position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldingEntry {
    /// Entry id.
    pub id: Uuid,
    /// Username as submitted (trimmed).
    pub username_display: String,
    /// Lowercased username.
    pub username_key: String,
    /// Lots held.
    pub lots: u64,
    /// Average buy price per share.
    pub avg_price: f64,
    /// `avg_price * lots * 100`.
    pub total_nominal: f64,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl HoldingEntry {
    /// Create a new entry stamped with the current time.
    #[must_use]
    pub fn new(input: &ValidEntry) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            username_display: input.username.display.clone(),
            username_key: input.username.key.clone(),
            lots: input.lots,
            avg_price: input.avg_price,
            total_nominal: input.total_nominal,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Raw submission payload.
///
/// Numeric fields accept numbers or numeric strings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryInput {
    /// Reddit username.
    #[serde(default)]
    pub username: Option<serde_json::Value>,
    /// Lots held.
    #[serde(default)]
    pub lots: Option<serde_json::Value>,
    /// Average price.
    #[serde(default)]
    pub avg_price: Option<serde_json::Value>,
}

/// A submission that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidEntry {
    /// Normalized username.
    pub username: NormalizedUsername,
    /// Lots held.
    pub lots: u64,
    /// Average price.
    pub avg_price: f64,
    /// Derived nominal.
    pub total_nominal: f64,
}

fn coerce_number(value: Option<&serde_json::Value>) -> Option<f64> {
    match value? {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn push(errors: &mut FieldErrors, field: &str, message: &str) {
    errors
        .entry(field.to_string())
        .or_default()
        .push(message.to_string());
}

impl EntryInput {
    /// Validate the payload, collecting every field error.
    ///
    /// # Errors
    ///
    /// Returns the field error map if any field is invalid.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn validate(&self) -> Result<ValidEntry, FieldErrors> {
        let mut errors = FieldErrors::new();

        let username = match self.username.as_ref() {
            Some(serde_json::Value::String(s)) => {
                let normalized = normalize_username(s);
                if normalized.display.is_empty() {
                    push(&mut errors, "username", "Username is required");
                } else if normalized.display.chars().count() > MAX_USERNAME_LENGTH {
                    push(&mut errors, "username", "At most 20 characters");
                } else if !is_valid_username(&normalized.display) {
                    push(
                        &mut errors,
                        "username",
                        "Username may only contain letters, digits and underscore (_)",
                    );
                }
                Some(normalized)
            }
            _ => {
                push(&mut errors, "username", "Username is required");
                None
            }
        };

        let lots = match coerce_number(self.lots.as_ref()) {
            None => {
                push(&mut errors, "lots", "Lots must be a number");
                None
            }
            Some(v) if !v.is_finite() => {
                push(&mut errors, "lots", "Lots must be a number");
                None
            }
            Some(v) if v.fract() != 0.0 => {
                push(&mut errors, "lots", "Lots must be a whole number");
                None
            }
            Some(v) if v < 1.0 => {
                push(&mut errors, "lots", "Lots must be at least 1");
                None
            }
            Some(v) if v > MAX_LOTS_F64 => {
                push(&mut errors, "lots", "Value too large");
                None
            }
            Some(v) => Some(v as u64),
        };

        let avg_price = match coerce_number(self.avg_price.as_ref()) {
            Some(v) if !v.is_finite() => {
                push(&mut errors, "avgPrice", "Average must be a number");
                None
            }
            None => {
                push(&mut errors, "avgPrice", "Average must be a number");
                None
            }
            Some(v) if v < 0.0 => {
                push(&mut errors, "avgPrice", "Average must be at least 0");
                None
            }
            Some(v) if v > MAX_MONEY_VALUE => {
                push(&mut errors, "avgPrice", "Value too large");
                None
            }
            Some(v) => Some(v),
        };

        match (username, lots, avg_price) {
            (Some(username), Some(lots), Some(avg_price)) if errors.is_empty() => Ok(ValidEntry {
                username,
                lots,
                avg_price,
                total_nominal: total_nominal(avg_price, lots),
            }),
            _ => Err(errors),
        }
    }
}

/// `avg_price * lots * 100`.
#[must_use]
pub fn total_nominal(avg_price: f64, lots: u64) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let lots = lots as f64;
    avg_price * lots * SHARES_PER_LOT
}

impl ValidEntry {
    /// Check the derived nominal against the money ceiling.
    ///
    /// # Errors
    ///
    /// Returns an `avgPrice` field error if the nominal is too large.
    pub fn check_nominal(&self) -> Result<(), FieldErrors> {
        if self.total_nominal > MAX_MONEY_VALUE {
            let mut errors = FieldErrors::new();
            push(&mut errors, "avgPrice", "Value too large");
            return Err(errors);
        }
        Ok(())
    }
}
