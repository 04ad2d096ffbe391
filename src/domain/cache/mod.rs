//! Cache domain: entries, invalidation patterns and statistics.

mod entry;
mod pattern;
mod stats;

pub use entry::CacheEntry;
pub use pattern::KeyPattern;
pub use stats::CacheStats;
