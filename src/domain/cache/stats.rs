//! Cache statistics snapshot.

use serde::Serialize;

/// Cumulative counters for a multi-tier cache.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    pub local_hits: u64,
    pub remote_hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub deletes: u64,
    /// Remote-tier failures absorbed by the cache.
    pub errors: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub refresh_signals: u64,
    pub local_size: usize,
    pub max_size: usize,
    pub remote_enabled: bool,
}

impl CacheStats {
    pub fn hits(&self) -> u64 {
        self.local_hits + self.remote_hits
    }

    /// hits / (hits + misses), 0 before the first lookup.
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.hits() + self.misses;
        if lookups == 0 {
            0.0
        } else {
            self.hits() as f64 / lookups as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_rate_is_zero_without_lookups() {
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
    }

    #[test]
    fn hit_rate_counts_both_tiers() {
        let stats = CacheStats {
            local_hits: 2,
            remote_hits: 1,
            misses: 1,
            ..Default::default()
        };
        assert_eq!(stats.hits(), 3);
        assert!((stats.hit_rate() - 0.75).abs() < f64::EPSILON);
    }
}
