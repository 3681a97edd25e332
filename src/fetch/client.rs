//! Resilient HTTP fetch client
//!
//! Wraps a pooled reqwest client with:
//! - Exponential backoff retry with uniform jitter
//! - Per-host circuit breaking with host-unreachable fast-fail
//! - Atomic metrics on every path
//! - An optional per-call deadline covering the whole retry loop

use std::sync::OnceLock;
use std::time::{Duration, Instant};

use rand::Rng;
use regex::RegexSet;
use reqwest::{Client, StatusCode, Url};
use tracing::debug;

use crate::error::FetchError;
use crate::fetch::breaker::CircuitBreaker;
use crate::fetch::metrics::{Metrics, MetricsSnapshot};

/// Transport-level response timeout, fixed at construction
const RESPONSE_TIMEOUT: Duration = Duration::from_secs(30);

/// Default User-Agent header
const DEFAULT_USER_AGENT: &str = concat!("upcheck/", env!("CARGO_PKG_VERSION"));

/// Retry and backoff tuning, overridable for tests
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Sleep before the first retry
    pub initial_backoff: Duration,
    /// Backoff growth cap
    pub max_backoff: Duration,
    /// Backoff growth factor per retry
    pub multiplier: f64,
    /// Uniform jitter fraction applied to each sleep
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(5),
            multiplier: 2.0,
            jitter: 0.2,
        }
    }
}

/// HTTP client with retry, circuit breaking, and metrics
#[derive(Debug)]
pub struct FetchClient {
    client: Client,
    policy: RetryPolicy,
    breaker: CircuitBreaker,
    metrics: Metrics,
    deadline: Option<Duration>,
}

impl FetchClient {
    /// Create a client with default policy and breaker settings
    pub fn new() -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(RESPONSE_TIMEOUT)
            .user_agent(DEFAULT_USER_AGENT)
            .build()
            .map_err(|e| FetchError::Network {
                url: String::new(),
                attempts: 0,
                message: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            policy: RetryPolicy::default(),
            breaker: CircuitBreaker::new(),
            metrics: Metrics::new(),
            deadline: None,
        })
    }

    /// Override the retry policy
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Override circuit breaker threshold and reset interval
    pub fn with_breaker_settings(mut self, threshold: usize, reset_after: Duration) -> Self {
        self.breaker = CircuitBreaker::with_settings(threshold, reset_after);
        self
    }

    /// Set a deadline covering the whole retry loop of each call
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Metrics counters shared by all calls on this client
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Snapshot of the metrics counters
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// GET `url` with retry, backoff, and circuit breaking.
    ///
    /// If the target host's circuit is open and the reset interval has not
    /// elapsed, fails immediately without touching the network. Responses
    /// with non-retryable 4xx statuses are returned as-is for the caller
    /// to inspect.
    pub async fn get_with_retry(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> Result<reqwest::Response, FetchError> {
        let host = host_of(url)?;

        if !self.breaker.allow_request(&host) {
            return Err(FetchError::CircuitOpen { host });
        }

        match self.deadline {
            Some(deadline) => {
                tokio::time::timeout(deadline, self.attempt_loop(url, headers, &host))
                    .await
                    .map_err(|_| FetchError::DeadlineExceeded {
                        url: url.to_string(),
                    })?
            }
            None => self.attempt_loop(url, headers, &host).await,
        }
    }

    async fn attempt_loop(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        host: &str,
    ) -> Result<reqwest::Response, FetchError> {
        let start = Instant::now();
        let mut backoff = self.policy.initial_backoff;
        let mut last_error = None;

        for attempt in 0..=self.policy.max_retries {
            if attempt > 0 {
                self.metrics.record_retry();
                let jitter = rand::thread_rng().gen_range(-self.policy.jitter..=self.policy.jitter);
                let sleep = backoff.mul_f64((1.0 + jitter).max(0.0));
                debug!(url, attempt, sleep_ms = sleep.as_millis() as u64, "retrying");
                tokio::time::sleep(sleep).await;
                backoff = backoff.mul_f64(self.policy.multiplier).min(self.policy.max_backoff);
            }

            self.metrics.record_request();
            let mut request = self.client.get(url);
            for (name, value) in headers {
                request = request.header(*name, *value);
            }

            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        self.metrics.record_success();
                        self.metrics.record_latency(start.elapsed());
                        self.breaker.record_success(host);
                        return Ok(response);
                    }

                    self.metrics.record_failure();
                    if self.breaker.record_failure(host) {
                        self.metrics.record_circuit_trip();
                    }

                    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
                        last_error = Some(FetchError::Network {
                            url: url.to_string(),
                            attempts: attempt + 1,
                            message: format!("HTTP {status}"),
                        });
                        continue;
                    }

                    // Other 4xx: not retryable, the caller inspects the status
                    self.metrics.record_latency(start.elapsed());
                    return Ok(response);
                }
                Err(e) => {
                    self.metrics.record_failure();

                    if is_host_unreachable(&e) {
                        // Dead host: don't burn the retry budget on it
                        self.breaker.record_failure(host);
                        if self.breaker.trip(host) {
                            self.metrics.record_circuit_trip();
                        }
                        self.metrics.record_latency(start.elapsed());
                        return Err(FetchError::HostUnreachable {
                            host: host.to_string(),
                            message: e.to_string(),
                        });
                    }

                    if self.breaker.record_failure(host) {
                        self.metrics.record_circuit_trip();
                    }
                    last_error = Some(FetchError::Network {
                        url: url.to_string(),
                        attempts: attempt + 1,
                        message: e.to_string(),
                    });
                }
            }
        }

        self.metrics.record_latency(start.elapsed());
        Err(last_error.unwrap_or_else(|| FetchError::Network {
            url: url.to_string(),
            attempts: self.policy.max_retries + 1,
            message: "unknown error".to_string(),
        }))
    }
}

/// Extract the host component of a URL
fn host_of(url: &str) -> Result<String, FetchError> {
    let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl {
        url: url.to_string(),
        message: e.to_string(),
    })?;
    parsed
        .host_str()
        .map(|h| h.to_string())
        .ok_or_else(|| FetchError::InvalidUrl {
            url: url.to_string(),
            message: "no host component".to_string(),
        })
}

/// Transport errors that mean the host itself is unreachable.
///
/// These trip the circuit immediately instead of being retried: DNS
/// failures, refused connections, timeouts, and routing failures.
fn is_host_unreachable(error: &reqwest::Error) -> bool {
    if error.is_timeout() || error.is_connect() {
        return true;
    }

    static PATTERNS: OnceLock<RegexSet> = OnceLock::new();
    let patterns = PATTERNS.get_or_init(|| {
        RegexSet::new([
            r"(?i)dns error",
            r"(?i)failed to lookup",
            r"(?i)name or service not known",
            r"(?i)connection refused",
            r"(?i)no route to host",
            r"(?i)host unreachable",
            r"(?i)network unreachable",
        ])
        .expect("host-unreachable patterns are valid regexes")
    });

    let mut message = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(inner) = source {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        source = inner.source();
    }
    patterns.is_match(&message)
}
