//! Nullable infrastructure for deterministic testing.
//!
//! [`NullTransport`] answers requests from a script instead of the network
//! and records everything it was asked to send. [`NullClock`] only moves
//! when told to.

use crate::reddit::Clock;
use crate::transport::{HttpRequest, HttpResponse, HttpTransport, TransportError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
enum Scripted {
    Respond(HttpResponse),
    Fail(TransportError),
}

#[derive(Debug)]
struct Route {
    pattern: String,
    queue: VecDeque<Scripted>,
}

/// A transport that replays scripted responses.
///
/// Routes are matched by substring against the request URL; when several
/// match, the longest pattern wins. Each route replays its queue in order and
/// keeps repeating the last entry. Unmatched requests get an empty 404.
#[derive(Debug, Default)]
pub struct NullTransport {
    routes: Mutex<Vec<Route>>,
    sent: Mutex<Vec<HttpRequest>>,
}

impl NullTransport {
    /// Create an empty transport.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an HTTP response for URLs containing `pattern`.
    pub fn respond(&self, pattern: &str, status: u16, body: &str) {
        self.push(pattern, Scripted::Respond(HttpResponse::new(status, body)));
    }

    /// Queue a network failure for URLs containing `pattern`.
    pub fn fail(&self, pattern: &str, error: TransportError) {
        self.push(pattern, Scripted::Fail(error));
    }

    fn push(&self, pattern: &str, item: Scripted) {
        let mut routes = self.routes.lock();
        if let Some(route) = routes.iter_mut().find(|r| r.pattern == pattern) {
            route.queue.push_back(item);
        } else {
            routes.push(Route {
                pattern: pattern.to_string(),
                queue: VecDeque::from([item]),
            });
        }
    }

    /// All requests received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.sent.lock().clone()
    }

    /// Number of requests whose URL contains `pattern`.
    #[must_use]
    pub fn request_count(&self, pattern: &str) -> usize {
        self.sent
            .lock()
            .iter()
            .filter(|r| r.url.contains(pattern))
            .count()
    }

    /// Forget recorded requests (routes are kept).
    pub fn clear_requests(&self) {
        self.sent.lock().clear();
    }

    fn next_for(&self, url: &str) -> Scripted {
        let mut routes = self.routes.lock();
        let route = routes
            .iter_mut()
            .filter(|r| url.contains(&r.pattern))
            .max_by_key(|r| r.pattern.len());

        match route {
            Some(route) if route.queue.len() > 1 => route
                .queue
                .pop_front()
                .unwrap_or_else(|| Scripted::Respond(HttpResponse::new(404, ""))),
            Some(route) => route
                .queue
                .front()
                .cloned()
                .unwrap_or_else(|| Scripted::Respond(HttpResponse::new(404, ""))),
            None => Scripted::Respond(HttpResponse::new(404, "")),
        }
    }
}

#[async_trait]
impl HttpTransport for NullTransport {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.sent.lock().push(request.clone());
        match self.next_for(&request.url) {
            Scripted::Respond(response) => Ok(response),
            Scripted::Fail(error) => Err(error),
        }
    }
}

/// A deterministic clock for testing.
#[derive(Debug)]
pub struct NullClock {
    current: Mutex<Instant>,
}

impl NullClock {
    /// Create a clock frozen at the current instant.
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: Mutex::new(Instant::now()),
        }
    }

    /// Advance time.
    pub fn advance(&self, by: Duration) {
        let mut current = self.current.lock();
        *current += by;
    }
}

impl Default for NullClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for NullClock {
    fn now(&self) -> Instant {
        *self.current.lock()
    }
}
