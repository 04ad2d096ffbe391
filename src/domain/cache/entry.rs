//! Local-tier cache entry.

use std::time::Duration;
use tokio::time::Instant;

/// A value held in the local tier.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub value: String,
    pub created_at: Instant,
    pub ttl: Duration,
    /// Insertion order, breaks ties between entries created at the same instant.
    pub sequence: u64,
    /// Set once the refresh-ahead signal has fired for this entry.
    pub refresh_signalled: bool,
}

impl CacheEntry {
    pub fn new(value: String, ttl: Duration, created_at: Instant, sequence: u64) -> Self {
        Self {
            value,
            created_at,
            ttl,
            sequence,
            refresh_signalled: false,
        }
    }

    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.created_at)
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        self.age(now) >= self.ttl
    }

    /// True once the entry has lived `refresh_threshold` of its TTL.
    pub fn is_refresh_due(&self, now: Instant, refresh_threshold: f64) -> bool {
        self.age(now).as_secs_f64() >= self.ttl.as_secs_f64() * refresh_threshold
    }

    pub fn remaining_ttl(&self, now: Instant) -> Duration {
        self.ttl.saturating_sub(self.age(now))
    }

    /// Ordering key for eviction: oldest first.
    pub fn eviction_rank(&self) -> (Instant, u64) {
        (self.created_at, self.sequence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(now: Instant) -> CacheEntry {
        CacheEntry::new("v".to_string(), Duration::from_secs(10), now, 0)
    }

    #[test]
    fn expires_exactly_at_ttl() {
        let now = Instant::now();
        let e = entry(now);
        assert!(!e.is_expired(now + Duration::from_millis(9_999)));
        assert!(e.is_expired(now + Duration::from_secs(10)));
    }

    #[test]
    fn refresh_due_at_threshold_fraction() {
        let now = Instant::now();
        let e = entry(now);
        assert!(!e.is_refresh_due(now + Duration::from_secs(7), 0.8));
        assert!(e.is_refresh_due(now + Duration::from_secs(8), 0.8));
    }

    #[test]
    fn remaining_ttl_saturates_at_zero() {
        let now = Instant::now();
        let e = entry(now);
        assert_eq!(e.remaining_ttl(now + Duration::from_secs(4)), Duration::from_secs(6));
        assert_eq!(e.remaining_ttl(now + Duration::from_secs(60)), Duration::ZERO);
    }

    #[test]
    fn sequence_breaks_creation_ties() {
        let now = Instant::now();
        let first = CacheEntry::new("a".to_string(), Duration::from_secs(1), now, 1);
        let second = CacheEntry::new("b".to_string(), Duration::from_secs(1), now, 2);
        assert!(first.eviction_rank() < second.eviction_rank());
    }
}
