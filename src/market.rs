//! Market price snapshot.
//!
//! Scrapes the latest quote for one ticker from a Google Finance quote page.
//! Extraction tries, in order: the `itemprop="price"` meta tag, a JSON-LD
//! `"price"` field, then a currency-prefixed number near the
//! `TICKER • EXCHANGE` marker in the visible text. Scraping never fails:
//! any problem yields a snapshot with no price and source `unavailable`.

use crate::config::MarketConfig;
use crate::html::html_to_text;
use crate::reddit::{Clock, SystemClock};
use crate::transport::{HttpRequest, HttpTransport};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::Regex;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Quote page base URL.
pub const QUOTE_BASE: &str = "https://www.google.com/finance/quote";

/// Quoted currency.
pub const CURRENCY: &str = "IDR";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(8);

const USER_AGENT: &str = "Mozilla/5.0 (compatible; LeaderboardHolder/1.0)";
const ACCEPT_LANGUAGE: &str = "id-ID,id;q=0.9,en-US;q=0.8,en;q=0.7";

/// Characters after the ticker marker searched for a price.
const MARKER_WINDOW_CHARS: usize = 1200;

static META_PRICE_RE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r#"(?i)itemprop="price"\s+content="([0-9.]+)""#).ok());
static JSON_LD_PRICE_RE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r#"(?i)"price"\s*:\s*"([0-9.]+)""#).ok());
static TEXT_PRICE_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\bRp\s*([0-9.,]+)",
        r"(?i)\bIDR\s*([0-9.,]+)",
        r"(?i)([0-9.,]+)\s*IDR\b",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});
static AS_OF_RE: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"\b([A-Z][a-z]{2}\s+\d{1,2},\s+\d{1,2}:\d{2}:\d{2}\s*(?:AM|PM)\s*GMT[+-]\d+)\b")
        .ok()
});

/// Where a snapshot's price came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PriceSource {
    /// Scraped successfully.
    GoogleFinance,
    /// No price could be obtained.
    Unavailable,
}

/// Latest known price for one ticker.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketPriceSnapshot {
    /// Ticker symbol.
    pub emiten: String,
    /// Exchange code.
    pub exchange: String,
    /// Last price, if found.
    pub price: Option<f64>,
    /// Quote currency.
    pub currency: String,
    /// Quote timestamp as shown on the page.
    pub as_of: Option<String>,
    /// Price provenance.
    pub source: PriceSource,
    /// Page the price was scraped from.
    pub quote_url: String,
}

impl MarketPriceSnapshot {
    /// A snapshot with no price.
    #[must_use]
    pub fn unavailable(emiten: &str, exchange: &str) -> Self {
        Self {
            emiten: emiten.to_string(),
            exchange: exchange.to_string(),
            price: None,
            currency: CURRENCY.to_string(),
            as_of: None,
            source: PriceSource::Unavailable,
            quote_url: quote_url(emiten, exchange),
        }
    }
}

/// Quote page URL for `emiten` on `exchange`.
#[must_use]
pub fn quote_url(emiten: &str, exchange: &str) -> String {
    let symbol = format!("{emiten}:{exchange}");
    match url::Url::parse(QUOTE_BASE) {
        Ok(mut url) => {
            if let Ok(mut segments) = url.path_segments_mut() {
                segments.push(&symbol);
            }
            url.to_string()
        }
        Err(_) => format!("{QUOTE_BASE}/{symbol}"),
    }
}

/// Parse a number that may use `.` thousands and `,` decimal separators.
///
/// With both separators present, `.` groups thousands and `,` is the
/// decimal point. A lone `,` is the decimal point. Anything else parses
/// as-is.
#[must_use]
pub fn parse_localized_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let has_dot = cleaned.contains('.');
    let has_comma = cleaned.contains(',');
    let normalized = if has_dot && has_comma {
        cleaned.replace('.', "").replace(',', ".")
    } else if has_comma {
        cleaned.replace(',', ".")
    } else {
        cleaned
    };

    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn first_capture(re: &Lazy<Option<Regex>>, haystack: &str) -> Option<String> {
    re.as_ref()?
        .captures(haystack)?
        .get(1)
        .map(|m| m.as_str().to_string())
}

/// Price from structured markup in the raw page.
#[must_use]
pub fn parse_price_from_html(html: &str) -> Option<f64> {
    [&META_PRICE_RE, &JSON_LD_PRICE_RE]
        .into_iter()
        .filter_map(|re| first_capture(re, html))
        .find_map(|raw| raw.parse::<f64>().ok().filter(|v| v.is_finite()))
}

/// Price from visible text, searched near the `TICKER • EXCHANGE` marker.
///
/// Falls back to the whole text when the marker is absent.
#[must_use]
pub fn parse_price_from_text(text: &str, emiten: &str, exchange: &str) -> Option<f64> {
    let marker = Regex::new(&format!(
        r"(?i){}\s*•\s*{}",
        regex::escape(emiten),
        regex::escape(exchange)
    ))
    .ok();

    let area = match marker.as_ref().and_then(|re| re.find(text)) {
        Some(m) => {
            let rest = &text[m.start()..];
            let end = rest
                .char_indices()
                .nth(MARKER_WINDOW_CHARS)
                .map_or(rest.len(), |(i, _)| i);
            &rest[..end]
        }
        None => text,
    };

    TEXT_PRICE_RES.iter().find_map(|re| {
        re.captures(area)
            .and_then(|c| c.get(1))
            .and_then(|m| parse_localized_number(m.as_str()))
    })
}

/// Quote timestamp such as `Okt 17, 4:10:00 PM GMT+7`.
#[must_use]
pub fn parse_as_of(text: &str) -> Option<String> {
    first_capture(&AS_OF_RE, text)
}

/// Build a snapshot from a fetched quote page.
#[must_use]
pub fn snapshot_from_html(html: &str, emiten: &str, exchange: &str) -> MarketPriceSnapshot {
    let text = html_to_text(html);
    let price = parse_price_from_html(html).or_else(|| parse_price_from_text(&text, emiten, exchange));

    MarketPriceSnapshot {
        price,
        as_of: parse_as_of(&text),
        source: if price.is_some() {
            PriceSource::GoogleFinance
        } else {
            PriceSource::Unavailable
        },
        ..MarketPriceSnapshot::unavailable(emiten, exchange)
    }
}

/// Fetches and caches market snapshots.
pub struct MarketClient {
    config: MarketConfig,
    transport: Arc<dyn HttpTransport>,
    clock: Arc<dyn Clock>,
    timeout: Duration,
    cache: Mutex<Option<(Instant, MarketPriceSnapshot)>>,
}

impl MarketClient {
    /// Create a client.
    #[must_use]
    pub fn new(
        config: MarketConfig,
        transport: Arc<dyn HttpTransport>,
        clock: Arc<dyn Clock>,
        timeout: Duration,
    ) -> Self {
        Self {
            config,
            transport,
            clock,
            timeout,
            cache: Mutex::new(None),
        }
    }

    /// Create a client on the system clock with the default timeout.
    #[must_use]
    pub fn with_transport(config: MarketConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self::new(config, transport, Arc::new(SystemClock), DEFAULT_TIMEOUT)
    }

    /// Latest snapshot, served from cache while fresh.
    pub async fn snapshot(&self) -> MarketPriceSnapshot {
        if self.config.disabled {
            return MarketPriceSnapshot::unavailable(&self.config.emiten, &self.config.exchange);
        }

        let now = self.clock.now();
        if let Some((fetched_at, snapshot)) = self.cache.lock().as_ref() {
            if now.saturating_duration_since(*fetched_at) < self.config.cache_ttl() {
                return snapshot.clone();
            }
        }

        let snapshot = self.fetch().await;
        *self.cache.lock() = Some((self.clock.now(), snapshot.clone()));
        snapshot
    }

    async fn fetch(&self) -> MarketPriceSnapshot {
        let emiten = &self.config.emiten;
        let exchange = &self.config.exchange;
        let url = quote_url(emiten, exchange);
        let request = HttpRequest::get(url.clone())
            .header("User-Agent", USER_AGENT)
            .header("Accept-Language", ACCEPT_LANGUAGE);

        let response =
            match tokio::time::timeout(self.timeout, self.transport.send(&request)).await {
                Ok(Ok(response)) => response,
                Ok(Err(e)) => {
                    warn!("Market quote request failed for {url}: {e}");
                    return MarketPriceSnapshot::unavailable(emiten, exchange);
                }
                Err(_) => {
                    warn!("Market quote request timed out for {url}");
                    return MarketPriceSnapshot::unavailable(emiten, exchange);
                }
            };

        if !response.is_success() {
            warn!("Market quote request returned {} for {url}", response.status);
            return MarketPriceSnapshot::unavailable(emiten, exchange);
        }

        let snapshot = snapshot_from_html(&response.body, emiten, exchange);
        debug!("Market snapshot for {emiten}:{exchange}: {:?}", snapshot.price);
        snapshot
    }
}
