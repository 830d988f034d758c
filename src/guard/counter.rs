//! Sliding-window attempt counters.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::time::Duration;

use super::key::ActorKey;

/// Attempt counter for a single actor key within a fixed window.
///
/// `count` only reflects attempts inside
/// `[window_start, window_start + window)`; once the window has elapsed the
/// counter resets before the next increment, so stale counts never leak
/// into a new window.
#[derive(Debug, Clone)]
pub struct WindowCounter {
    /// Attempts recorded in the current window
    count: u64,
    /// When the current window started
    window_start: DateTime<Utc>,
}

impl WindowCounter {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            count: 0,
            window_start: now,
        }
    }

    fn expired(&self, now: DateTime<Utc>, window: Duration) -> bool {
        now - self.window_start >= to_chrono(window)
    }
}

fn to_chrono(d: Duration) -> chrono::Duration {
    chrono::Duration::milliseconds(d.as_millis().min(i64::MAX as u128) as i64)
}

/// Store of per-key attempt counters.
///
/// Thread-safe; mutation of one key holds only that key's entry lock, so
/// concurrent checks for different actors never contend and increments to
/// a single key are linearizable.
pub struct CounterStore {
    counters: DashMap<ActorKey, WindowCounter>,
}

impl CounterStore {
    /// Create an empty counter store.
    pub fn new() -> Self {
        Self {
            counters: DashMap::new(),
        }
    }

    /// Record an attempt and return the resulting count.
    ///
    /// Creates the counter on first use and resets it when `now` falls
    /// outside the current window. Always succeeds; absence is treated as
    /// zero, not an error.
    pub fn increment_and_get(&self, key: &ActorKey, now: DateTime<Utc>, window: Duration) -> u64 {
        let mut entry = self
            .counters
            .entry(key.clone())
            .or_insert_with(|| WindowCounter::new(now));

        if entry.expired(now, window) {
            entry.count = 0;
            entry.window_start = now;
        }
        entry.count += 1;
        entry.count
    }

    /// Read the current count without recording an attempt.
    ///
    /// Returns `None` if no counter exists for the key. An expired window
    /// reads as zero but is not reset; only `increment_and_get` mutates.
    pub fn peek(&self, key: &ActorKey, now: DateTime<Utc>, window: Duration) -> Option<u64> {
        let entry = self.counters.get(key)?;
        if entry.expired(now, window) {
            Some(0)
        } else {
            Some(entry.count)
        }
    }

    /// Remove the counter for a key.
    ///
    /// Returns `true` if a counter existed.
    pub fn reset(&self, key: &ActorKey) -> bool {
        self.counters.remove(key).is_some()
    }

    /// Get the number of active counters.
    pub fn len(&self) -> usize {
        self.counters.len()
    }

    /// Whether the store holds no counters.
    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }

    /// Clear all counters.
    ///
    /// This is primarily useful for testing.
    pub fn clear(&self) {
        self.counters.clear();
    }
}

impl Default for CounterStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guard::ActionKind;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    const WINDOW: Duration = Duration::from_secs(60);

    #[test]
    fn test_first_increment_creates_counter() {
        let store = CounterStore::new();
        let key = ActorKey::new("alice", ActionKind::Login);

        assert_eq!(store.increment_and_get(&key, t0(), WINDOW), 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_increments_accumulate_within_window() {
        let store = CounterStore::new();
        let key = ActorKey::new("alice", ActionKind::Login);

        for expected in 1..=4 {
            let now = t0() + chrono::Duration::seconds(expected as i64 * 10);
            assert_eq!(store.increment_and_get(&key, now, WINDOW), expected);
        }
    }

    #[test]
    fn test_window_rollover_resets_count() {
        let store = CounterStore::new();
        let key = ActorKey::new("alice", ActionKind::Login);

        for _ in 0..3 {
            store.increment_and_get(&key, t0(), WINDOW);
        }

        // One second past the window end: counter restarts, not 4
        let later = t0() + chrono::Duration::seconds(61);
        assert_eq!(store.increment_and_get(&key, later, WINDOW), 1);
    }

    #[test]
    fn test_peek_does_not_mutate() {
        let store = CounterStore::new();
        let key = ActorKey::new("alice", ActionKind::Login);

        assert_eq!(store.peek(&key, t0(), WINDOW), None);

        store.increment_and_get(&key, t0(), WINDOW);
        assert_eq!(store.peek(&key, t0(), WINDOW), Some(1));
        assert_eq!(store.peek(&key, t0(), WINDOW), Some(1));

        // Expired window reads as zero without resetting the entry
        let later = t0() + chrono::Duration::seconds(120);
        assert_eq!(store.peek(&key, later, WINDOW), Some(0));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_separate_keys_have_separate_counters() {
        let store = CounterStore::new();
        let login = ActorKey::new("alice", ActionKind::Login);
        let export = ActorKey::new("alice", ActionKind::BulkExport);

        store.increment_and_get(&login, t0(), WINDOW);
        store.increment_and_get(&login, t0(), WINDOW);
        store.increment_and_get(&export, t0(), WINDOW);

        assert_eq!(store.peek(&login, t0(), WINDOW), Some(2));
        assert_eq!(store.peek(&export, t0(), WINDOW), Some(1));
    }

    #[test]
    fn test_reset_removes_counter() {
        let store = CounterStore::new();
        let key = ActorKey::new("alice", ActionKind::Login);

        store.increment_and_get(&key, t0(), WINDOW);
        assert!(store.reset(&key));
        assert!(!store.reset(&key));
        assert_eq!(store.peek(&key, t0(), WINDOW), None);
    }

    #[test]
    fn test_concurrent_increments_lose_nothing() {
        use std::sync::Arc;

        let store = Arc::new(CounterStore::new());
        let key = ActorKey::new("alice", ActionKind::Login);
        let now = t0();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                let key = key.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        store.increment_and_get(&key, now, WINDOW);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.peek(&key, now, WINDOW), Some(800));
    }
}
