//! Resilience core - circuit breakers, multi-tier caching, rate limiting and
//! health aggregation for services that call flaky dependencies.
//!
//! Layout follows ports and adapters: `domain` holds pure state and rules,
//! `ports` the seams to external stores, `adapters` their implementations,
//! and `application` the async components callers use, wired together by
//! [`application::ResilienceContext`].

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;
