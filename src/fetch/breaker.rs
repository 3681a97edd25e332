//! Per-host circuit breaker
//!
//! State transitions per host:
//! - Closed -> Open: failure count in the rolling window reaches the
//!   threshold, or a host-unreachable error trips the circuit directly
//! - Open -> probe: after the reset interval one request is let through;
//!   the trip time is refreshed so concurrent callers keep failing fast
//! - probe success -> Closed, probe failure -> Open
//!
//! The host map is guarded by one mutex; reads far outnumber writes at
//! this host cardinality so a coarse lock is fine.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Failures per rolling window that open the circuit
pub const CIRCUIT_BREAKER_THRESHOLD: usize = 5;

/// Cool-down before a probe request is allowed through an open circuit
pub const CIRCUIT_BREAKER_RESET: Duration = Duration::from_secs(30);

/// Width of the rolling failure window
pub const FAILURE_WINDOW: Duration = Duration::from_secs(60);

#[derive(Debug, Default)]
struct HostCircuit {
    open: bool,
    last_trip: Option<Instant>,
    failures: VecDeque<Instant>,
}

/// Circuit breaker keyed by host
#[derive(Debug)]
pub struct CircuitBreaker {
    hosts: Mutex<HashMap<String, HostCircuit>>,
    threshold: usize,
    reset_after: Duration,
    window: Duration,
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new()
    }
}

impl CircuitBreaker {
    /// Create a breaker with the default threshold and reset interval
    pub fn new() -> Self {
        Self::with_settings(CIRCUIT_BREAKER_THRESHOLD, CIRCUIT_BREAKER_RESET)
    }

    /// Create a breaker with custom settings (tests use short intervals)
    pub fn with_settings(threshold: usize, reset_after: Duration) -> Self {
        Self {
            hosts: Mutex::new(HashMap::new()),
            threshold,
            reset_after,
            window: FAILURE_WINDOW,
        }
    }

    /// Whether a request to `host` may proceed.
    ///
    /// Open circuits fail fast until the reset interval elapses, then
    /// admit a single probe. Admitting the probe refreshes the trip time,
    /// so other callers stay blocked until the probe resolves.
    pub fn allow_request(&self, host: &str) -> bool {
        let mut hosts = self.hosts.lock().unwrap_or_else(|e| e.into_inner());
        match hosts.get_mut(host) {
            Some(circuit) if circuit.open => {
                let elapsed = circuit
                    .last_trip
                    .map(|t| t.elapsed())
                    .unwrap_or(self.reset_after);
                if elapsed >= self.reset_after {
                    circuit.last_trip = Some(Instant::now());
                    true
                } else {
                    false
                }
            }
            _ => true,
        }
    }

    /// Record one failure for `host` in the rolling window.
    ///
    /// Returns true if this failure newly opened the circuit.
    pub fn record_failure(&self, host: &str) -> bool {
        let now = Instant::now();
        let mut hosts = self.hosts.lock().unwrap_or_else(|e| e.into_inner());
        let circuit = hosts.entry(host.to_string()).or_default();

        circuit.failures.push_back(now);
        while let Some(front) = circuit.failures.front() {
            if now.duration_since(*front) > self.window {
                circuit.failures.pop_front();
            } else {
                break;
            }
        }

        if circuit.open {
            // Failed probe: restart the cool-down
            circuit.last_trip = Some(now);
            return false;
        }

        if circuit.failures.len() >= self.threshold {
            circuit.open = true;
            circuit.last_trip = Some(now);
            return true;
        }
        false
    }

    /// Open the circuit immediately (host-unreachable fast path).
    ///
    /// Returns true if the circuit was not already open.
    pub fn trip(&self, host: &str) -> bool {
        let mut hosts = self.hosts.lock().unwrap_or_else(|e| e.into_inner());
        let circuit = hosts.entry(host.to_string()).or_default();
        let newly_tripped = !circuit.open;
        circuit.open = true;
        circuit.last_trip = Some(Instant::now());
        newly_tripped
    }

    /// Close the circuit and clear the failure window after a success
    pub fn record_success(&self, host: &str) {
        let mut hosts = self.hosts.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(circuit) = hosts.get_mut(host) {
            circuit.open = false;
            circuit.last_trip = None;
            circuit.failures.clear();
        }
    }

    /// Whether the circuit for `host` is currently open
    pub fn is_open(&self, host: &str) -> bool {
        let hosts = self.hosts.lock().unwrap_or_else(|e| e.into_inner());
        hosts.get(host).map(|c| c.open).unwrap_or(false)
    }
}
