//! Time-to-live cache for GET responses.
//!
//! Entries are keyed by the request URL followed by the serialized query
//! parameters. Nothing is evicted proactively: an expired entry stays in the
//! map until it is overwritten or cleared, but it is never served.

use crate::request::Params;
use crate::response::Response;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

/// Default time-to-live for [`Client::get_cached`](crate::Client::get_cached).
pub const DEFAULT_TTL: Duration = Duration::from_millis(60_000);

// Expiry used when `now + ttl` does not fit in an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

#[derive(Debug, Clone)]
struct CacheEntry {
    response: Response,
    expires_at: Instant,
}

/// A response cache shared by every clone of a client.
#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl ResponseCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the cache key for a URL and its parameters.
    ///
    /// ```
    /// use biblio_http::cache::ResponseCache;
    /// use serde_json::json;
    ///
    /// let params = json!({"page": 2});
    /// let key = ResponseCache::key("/api/books", params.as_object().unwrap());
    /// assert_eq!(key, r#"/api/books{"page":2}"#);
    /// ```
    pub fn key(url: &str, params: &Params) -> String {
        let serialized = serde_json::to_string(params).unwrap_or_default();
        format!("{url}{serialized}")
    }

    /// Returns the cached response for `key` if it has not expired.
    pub fn get(&self, key: &str) -> Option<Response> {
        self.get_at(key, Instant::now())
    }

    fn get_at(&self, key: &str, now: Instant) -> Option<Response> {
        let entries = self.entries.lock();
        entries
            .get(key)
            .filter(|entry| now < entry.expires_at)
            .map(|entry| entry.response.clone())
    }

    /// Stores `response` under `key` for `ttl`.
    ///
    /// A `ttl` too large to represent (such as `Duration::MAX`) keeps the
    /// entry for the lifetime of the process.
    pub fn insert(&self, key: String, response: Response, ttl: Duration) {
        let now = Instant::now();
        let expires_at = now.checked_add(ttl).unwrap_or(now + FAR_FUTURE);
        self.entries
            .lock()
            .insert(key, CacheEntry { response, expires_at });
    }

    /// Removes every entry whose key starts with `prefix`.
    pub fn clear_prefix(&self, prefix: &str) {
        self.entries.lock().retain(|key, _| !key.starts_with(prefix));
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
