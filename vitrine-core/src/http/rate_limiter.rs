//! Per-host rate limiting for HTTP requests.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::time::{Duration, Instant};
use tokio::time::sleep;

/// Per-host rate limiter so parallel downloads don't hammer a single image host.
pub struct RateLimiter {
    /// Minimum delay between requests to the same host.
    min_delay: Duration,
    /// Time of the most recent request slot handed out per host.
    last_request: DashMap<String, Instant>,
}

impl RateLimiter {
    /// Create a new rate limiter with the given minimum delay between requests.
    pub fn new(min_delay: Duration) -> Self {
        Self {
            min_delay,
            last_request: DashMap::new(),
        }
    }

    /// Wait if necessary before making a request to this host.
    ///
    /// The slot is reserved before sleeping, so concurrent callers for the same
    /// host queue up behind each other instead of all waking at once.
    pub async fn wait(&self, host: &str) {
        if self.min_delay.is_zero() {
            return;
        }

        let now = Instant::now();
        let slot = match self.last_request.entry(host.to_string()) {
            Entry::Occupied(mut last) => {
                let slot = (*last.get() + self.min_delay).max(now);
                last.insert(slot);
                slot
            }
            Entry::Vacant(vacant) => {
                vacant.insert(now);
                now
            }
        };

        if slot > now {
            sleep(slot - now).await;
        }
    }
}
