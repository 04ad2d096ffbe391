//! Per-key sliding window log.
//!
//! Keeps the instants of admitted requests inside the trailing window. This
//! is a windowed log, not a token bucket: a full quota can be spent in one
//! burst, and the next slot frees up exactly `window` after the oldest
//! admission. Callers may rely on that burst tolerance.

use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct SlidingWindow {
    admitted: VecDeque<Instant>,
    last_seen: Instant,
}

impl SlidingWindow {
    pub fn new(now: Instant) -> Self {
        Self {
            admitted: VecDeque::new(),
            last_seen: now,
        }
    }

    /// Drop admissions that fell out of the window ending at `now`.
    pub fn prune(&mut self, now: Instant, window: Duration) {
        while let Some(oldest) = self.admitted.front() {
            if now.saturating_duration_since(*oldest) >= window {
                self.admitted.pop_front();
            } else {
                break;
            }
        }
    }

    /// Prune, then admit if fewer than `limit` admissions remain.
    pub fn try_admit(&mut self, now: Instant, limit: u32, window: Duration) -> bool {
        self.last_seen = now;
        self.prune(now, window);
        if self.admitted.len() >= limit as usize {
            return false;
        }
        self.admitted.push_back(now);
        true
    }

    pub fn count(&self) -> usize {
        self.admitted.len()
    }

    /// When the oldest retained admission leaves the window.
    pub fn reset_at(&self, window: Duration) -> Option<Instant> {
        self.admitted.front().map(|oldest| *oldest + window)
    }

    /// No admissions left in the window and untouched for `idle_ttl`.
    pub fn is_idle(&mut self, now: Instant, window: Duration, idle_ttl: Duration) -> bool {
        self.prune(now, window);
        self.admitted.is_empty() && now.saturating_duration_since(self.last_seen) >= idle_ttl
    }
}
