//! Reply cache — memoize extracted replies per normalized command.
//!
//! Keyed by lower-cased, trimmed command text so identical commands hit cache
//! even when their history context differs — an intentional tradeoff favoring
//! speed over context-sensitivity. Entries expire after a fixed TTL and are
//! evicted lazily on lookup. One process-wide instance is shared across
//! sessions and across both entry paths.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use metrics::counter;
use tracing::debug;
use vox_core::ParsedReply;
use vox_core::metrics::{REPLY_CACHE_EXPIRATIONS_TOTAL, REPLY_CACHE_HITS_TOTAL};

/// Default entry lifetime.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// A time source the cache consults on insert and lookup.
///
/// Injectable so tests can advance time without sleeping.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> Instant;
}

/// Production clock backed by the system monotonic clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

struct CachedReply {
    reply: ParsedReply,
    inserted_at: Instant,
}

/// TTL-bounded reply cache.
///
/// Concurrent inserts on the same key are last-write-wins: cached values for
/// the same normalized command are expected to be equivalent, so a lost
/// update costs at most one redundant model call.
pub struct ReplyCache {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    entries: DashMap<String, CachedReply>,
}

impl ReplyCache {
    /// Cache with the given TTL and the system clock.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    /// Cache with an injected clock (tests).
    #[must_use]
    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            entries: DashMap::new(),
        }
    }

    /// Normalize a command into its cache key: trim, lower-case. Internal
    /// whitespace and punctuation are left alone.
    #[must_use]
    pub fn normalize_key(command: &str) -> String {
        command.trim().to_lowercase()
    }

    /// Look up a live entry; an expired entry is evicted and reported absent.
    #[must_use]
    pub fn get(&self, command: &str) -> Option<ParsedReply> {
        let key = Self::normalize_key(command);
        let now = self.clock.now();

        // Clone out under the shard lock, then evict outside it — removing
        // while holding the `Ref` would deadlock the shard.
        let hit = self
            .entries
            .get(&key)
            .map(|e| (e.reply.clone(), e.inserted_at));

        match hit {
            Some((reply, inserted_at)) if now.duration_since(inserted_at) < self.ttl => {
                counter!(REPLY_CACHE_HITS_TOTAL).increment(1);
                debug!(key, "cache hit");
                Some(reply)
            }
            Some(_) => {
                let _ = self.entries.remove(&key);
                counter!(REPLY_CACHE_EXPIRATIONS_TOTAL).increment(1);
                None
            }
            None => None,
        }
    }

    /// Insert a reply for a command. Last write wins.
    pub fn insert(&self, command: &str, reply: ParsedReply) {
        let key = Self::normalize_key(command);
        let _ = self.entries.insert(
            key,
            CachedReply {
                reply,
                inserted_at: self.clock.now(),
            },
        );
    }

    /// Number of stored (possibly expired) entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    /// Manual clock: starts at a fixed instant, advances only on demand.
    struct ManualClock {
        base: Instant,
        offset: Mutex<Duration>,
    }

    impl ManualClock {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                base: Instant::now(),
                offset: Mutex::new(Duration::ZERO),
            })
        }

        fn advance(&self, by: Duration) {
            *self.offset.lock() += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            self.base + *self.offset.lock()
        }
    }

    fn reply(text: &str) -> ParsedReply {
        ParsedReply::general("cmd", text)
    }

    #[test]
    fn get_returns_inserted_value() {
        let cache = ReplyCache::new(DEFAULT_TTL);
        cache.insert("What Time Is It", reply("3pm"));
        let hit = cache.get("what time is it").unwrap();
        assert_eq!(hit.response, "3pm");
    }

    #[test]
    fn key_normalization_trims_and_lowercases() {
        assert_eq!(ReplyCache::normalize_key("  Open YouTube  "), "open youtube");
        // Internal whitespace untouched.
        assert_eq!(ReplyCache::normalize_key("a  b"), "a  b");
    }

    #[test]
    fn miss_for_unknown_key() {
        let cache = ReplyCache::new(DEFAULT_TTL);
        assert!(cache.get("never seen").is_none());
    }

    #[test]
    fn expired_entry_is_absent_and_evicted() {
        let clock = ManualClock::new();
        let cache = ReplyCache::with_clock(Duration::from_secs(300), Arc::clone(&clock) as Arc<dyn Clock>);
        cache.insert("hello", reply("hi"));

        clock.advance(Duration::from_secs(299));
        assert!(cache.get("hello").is_some());

        clock.advance(Duration::from_secs(2));
        assert!(cache.get("hello").is_none());
        // Lazy eviction removed the stale entry.
        assert!(cache.is_empty());
    }

    #[test]
    fn expiry_only_on_lookup() {
        let clock = ManualClock::new();
        let cache = ReplyCache::with_clock(Duration::from_secs(1), Arc::clone(&clock) as Arc<dyn Clock>);
        cache.insert("a", reply("1"));
        clock.advance(Duration::from_secs(10));
        // Nothing proactive: entry still stored until someone asks.
        assert_eq!(cache.len(), 1);
        assert!(cache.get("a").is_none());
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn insert_is_last_write_wins() {
        let cache = ReplyCache::new(DEFAULT_TTL);
        cache.insert("x", reply("first"));
        cache.insert("x", reply("second"));
        assert_eq!(cache.get("x").unwrap().response, "second");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn reinsert_resets_age() {
        let clock = ManualClock::new();
        let cache = ReplyCache::with_clock(Duration::from_secs(10), Arc::clone(&clock) as Arc<dyn Clock>);
        cache.insert("x", reply("old"));
        clock.advance(Duration::from_secs(8));
        cache.insert("x", reply("fresh"));
        clock.advance(Duration::from_secs(8));
        // 16s after first insert, 8s after second: still live.
        assert_eq!(cache.get("x").unwrap().response, "fresh");
    }
}
