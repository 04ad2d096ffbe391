//! Rate limit domain: the per-key sliding window.

mod window;

pub use window::SlidingWindow;
