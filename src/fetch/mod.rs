//! Fault-tolerant HTTP fetching
//!
//! This module provides:
//! - `FetchClient`: pooled HTTP GET with exponential backoff and jitter
//! - Per-host circuit breaking with host-unreachable fast-fail
//! - Lock-free metrics counters and non-blocking snapshots

mod breaker;
mod client;
mod metrics;

pub use breaker::{
    CircuitBreaker, CIRCUIT_BREAKER_RESET, CIRCUIT_BREAKER_THRESHOLD, FAILURE_WINDOW,
};
pub use client::{FetchClient, RetryPolicy};
pub use metrics::{Metrics, MetricsSnapshot};
