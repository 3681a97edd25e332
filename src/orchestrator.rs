//! Update orchestrator for coordinating a whole check run
//!
//! This module provides:
//! - Graph construction from declared dependencies
//! - Bounded worker pool fan-out of registry fetches
//! - Candidate validation through the dependency graph
//! - Partial continuation: no single package or host failure is fatal
//!
//! Workers are a fixed pool fed by a job channel, sized
//! `min(2 x CPU count, jobs)`, so very large dependency sets cannot pile
//! up unbounded tasks.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

use crate::error::{GraphError, RegistryError};
use crate::fetch::{FetchClient, MetricsSnapshot};
use crate::graph::DependencyGraph;
use crate::registry::Registry;
use crate::version::VersionCache;

/// Synthetic node every declared dependency hangs off of
const ROOT: &str = "root";

/// A declared dependency: package name plus its constraint string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    /// Package name
    pub name: String,
    /// Constraint as declared (may be empty for unconstrained deps)
    pub constraint: String,
}

impl Dependency {
    /// Creates a new declared dependency
    pub fn new(name: impl Into<String>, constraint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            constraint: constraint.into(),
        }
    }
}

/// Why a package was not advanced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Registry fetch failed (network, circuit open, not found)
    FetchFailed(String),
    /// The candidate violates a recorded constraint
    ConstraintViolation(String),
    /// The candidate version string could not be parsed
    InvalidVersion(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::FetchFailed(msg) => write!(f, "fetch failed: {msg}"),
            SkipReason::ConstraintViolation(msg) => write!(f, "constraint violation: {msg}"),
            SkipReason::InvalidVersion(msg) => write!(f, "invalid version: {msg}"),
        }
    }
}

/// A package that was checked but not advanced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedPackage {
    pub name: String,
    pub reason: SkipReason,
}

/// Result of one orchestrator run
#[derive(Debug, Default)]
pub struct RunOutcome {
    /// Accepted advances: package name to new version
    pub accepted: HashMap<String, String>,
    /// Packages checked but not advanced, with reasons
    pub skipped: Vec<SkippedPackage>,
    /// Cycles found in the declared dependencies (warned, never fatal)
    pub cycles: Vec<Vec<String>>,
}

impl RunOutcome {
    /// True if any skip was caused by a fetch failure
    pub fn has_fetch_failures(&self) -> bool {
        self.skipped
            .iter()
            .any(|s| matches!(s.reason, SkipReason::FetchFailed(_)))
    }
}

/// Coordinates graph building, fetching, and validation for one run
pub struct Orchestrator {
    registry: Arc<dyn Registry>,
    client: Arc<FetchClient>,
    cache: Arc<VersionCache>,
    graph: Option<Arc<DependencyGraph>>,
}

impl Orchestrator {
    /// Create an orchestrator over a registry adapter and fetch client
    pub fn new(registry: Arc<dyn Registry>, client: Arc<FetchClient>) -> Self {
        Self {
            registry,
            client,
            cache: Arc::new(VersionCache::new()),
            graph: None,
        }
    }

    /// Run a full check: build the graph, fetch candidates concurrently,
    /// validate each one, and collect the accepted advances.
    pub async fn run(&mut self, dependencies: &[Dependency]) -> RunOutcome {
        let mut graph = DependencyGraph::new();
        for dep in dependencies {
            graph.add_dependency(ROOT, &dep.name, &dep.constraint);
        }

        let cycles = graph.detect_cycles();
        for cycle in &cycles {
            warn!(cycle = %cycle.join(" -> "), "dependency cycle detected; continuing");
        }

        let graph = Arc::new(graph);
        self.graph = Some(Arc::clone(&graph));

        let jobs: Vec<String> = graph
            .update_order()
            .into_iter()
            .filter(|name| name != ROOT)
            .collect();

        let mut outcome = RunOutcome {
            cycles,
            ..RunOutcome::default()
        };
        if jobs.is_empty() {
            return outcome;
        }

        let worker_count = jobs.len().min(2 * num_cpus::get()).max(1);
        debug!(jobs = jobs.len(), workers = worker_count, "dispatching fetch jobs");

        let (job_tx, job_rx) = mpsc::channel::<String>(jobs.len());
        let job_rx = Arc::new(Mutex::new(job_rx));
        let (result_tx, mut result_rx) =
            mpsc::channel::<(String, Result<String, SkipReason>)>(jobs.len());

        for _ in 0..worker_count {
            let job_rx = Arc::clone(&job_rx);
            let result_tx = result_tx.clone();
            let registry = Arc::clone(&self.registry);
            let graph = Arc::clone(&graph);
            let cache = Arc::clone(&self.cache);

            tokio::spawn(async move {
                loop {
                    let job = { job_rx.lock().await.recv().await };
                    let Some(name) = job else { break };
                    let result = check_package(registry.as_ref(), &graph, &cache, &name).await;
                    if result_tx.send((name, result)).await.is_err() {
                        break;
                    }
                }
            });
        }
        drop(result_tx);

        for name in jobs {
            let _ = job_tx.send(name).await;
        }
        drop(job_tx);

        while let Some((name, result)) = result_rx.recv().await {
            match result {
                Ok(version) => {
                    outcome.accepted.insert(name, version);
                }
                Err(reason) => {
                    warn!(package = %name, %reason, "package not advanced");
                    outcome.skipped.push(SkippedPackage { name, reason });
                }
            }
        }
        outcome.skipped.sort_by(|a, b| a.name.cmp(&b.name));

        info!(
            accepted = outcome.accepted.len(),
            skipped = outcome.skipped.len(),
            "check run complete"
        );
        outcome
    }

    /// Resolve the latest acceptable version for one package.
    ///
    /// Narrow interface for file-rewriting collaborators.
    pub async fn resolve_latest(&self, package: &str) -> Result<String, RegistryError> {
        self.registry.fetch_latest(package).await
    }

    /// Validate a proposed version against the constraints recorded in the
    /// last run's graph. Collaborators call this before committing a
    /// rewrite.
    pub fn validate_proposed_version(&self, package: &str, version: &str) -> Result<(), GraphError> {
        match &self.graph {
            Some(graph) => graph.validate_update(package, version),
            None => Err(GraphError::UnknownPackage {
                package: package.to_string(),
            }),
        }
    }

    /// Snapshot of the fetch client's metrics
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.client.metrics_snapshot()
    }
}

/// Fetch, parse, and validate one package's candidate version
async fn check_package(
    registry: &dyn Registry,
    graph: &DependencyGraph,
    cache: &VersionCache,
    name: &str,
) -> Result<String, SkipReason> {
    let latest = registry
        .fetch_latest(name)
        .await
        .map_err(|e| SkipReason::FetchFailed(e.to_string()))?;

    cache
        .get_or_parse(&latest)
        .map_err(|e| SkipReason::InvalidVersion(e.to_string()))?;

    graph.validate_update(name, &latest).map_err(|e| match e {
        GraphError::InvalidVersion { .. } => SkipReason::InvalidVersion(e.to_string()),
        other => SkipReason::ConstraintViolation(other.to_string()),
    })?;

    Ok(latest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap as Map;

    use crate::error::RegistryError;

    /// Stub registry serving a fixed version table
    struct StubRegistry {
        versions: Map<String, String>,
    }

    impl StubRegistry {
        fn new(entries: &[(&str, &str)]) -> Arc<Self> {
            Arc::new(Self {
                versions: entries
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            })
        }
    }

    #[async_trait]
    impl Registry for StubRegistry {
        fn name(&self) -> &'static str {
            "stub"
        }

        async fn fetch_latest(&self, package: &str) -> Result<String, RegistryError> {
            self.versions
                .get(package)
                .cloned()
                .ok_or_else(|| RegistryError::package_not_found(package, "stub"))
        }
    }

    fn orchestrator(registry: Arc<StubRegistry>) -> Orchestrator {
        Orchestrator::new(registry, Arc::new(FetchClient::new().unwrap()))
    }

    #[tokio::test]
    async fn test_run_accepts_satisfying_candidates() {
        let registry = StubRegistry::new(&[("serde", "1.9.0"), ("tokio", "2.1.0")]);
        let mut orch = orchestrator(registry);

        let deps = vec![
            Dependency::new("serde", ">=1.0.0,<2.0.0"),
            Dependency::new("tokio", ">=1.0.0"),
        ];
        let outcome = orch.run(&deps).await;

        assert_eq!(outcome.accepted.get("serde").map(String::as_str), Some("1.9.0"));
        assert_eq!(outcome.accepted.get("tokio").map(String::as_str), Some("2.1.0"));
        assert!(outcome.skipped.is_empty());
        assert!(outcome.cycles.is_empty());
    }

    #[tokio::test]
    async fn test_run_skips_constraint_violation() {
        let registry = StubRegistry::new(&[("serde", "2.0.0")]);
        let mut orch = orchestrator(registry);

        let outcome = orch
            .run(&[Dependency::new("serde", ">=1.0.0,<2.0.0")])
            .await;

        assert!(outcome.accepted.is_empty());
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].name, "serde");
        assert!(matches!(
            outcome.skipped[0].reason,
            SkipReason::ConstraintViolation(_)
        ));
    }

    #[tokio::test]
    async fn test_run_skips_missing_package_and_continues() {
        let registry = StubRegistry::new(&[("left", "1.1.0")]);
        let mut orch = orchestrator(registry);

        let outcome = orch
            .run(&[
                Dependency::new("left", ">=1.0.0"),
                Dependency::new("missing", ">=1.0.0"),
            ])
            .await;

        assert_eq!(outcome.accepted.len(), 1);
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].name, "missing");
        assert!(matches!(outcome.skipped[0].reason, SkipReason::FetchFailed(_)));
        assert!(outcome.has_fetch_failures());
    }

    #[tokio::test]
    async fn test_run_skips_unparseable_candidate() {
        let registry = StubRegistry::new(&[("weird", "latest")]);
        let mut orch = orchestrator(registry);

        let outcome = orch.run(&[Dependency::new("weird", ">=1.0.0")]).await;

        assert_eq!(outcome.skipped.len(), 1);
        assert!(matches!(
            outcome.skipped[0].reason,
            SkipReason::InvalidVersion(_)
        ));
    }

    #[tokio::test]
    async fn test_run_empty_dependency_list() {
        let registry = StubRegistry::new(&[]);
        let mut orch = orchestrator(registry);
        let outcome = orch.run(&[]).await;
        assert!(outcome.accepted.is_empty());
        assert!(outcome.skipped.is_empty());
    }

    #[tokio::test]
    async fn test_self_loop_cycle_is_warned_not_fatal() {
        // A dependency literally named "root" closes a self-loop on the
        // synthetic root node.
        let registry = StubRegistry::new(&[("root", "1.0.0")]);
        let mut orch = orchestrator(registry);

        let outcome = orch.run(&[Dependency::new("root", "")]).await;
        assert_eq!(outcome.cycles.len(), 1);
    }

    #[tokio::test]
    async fn test_validate_proposed_version_after_run() {
        let registry = StubRegistry::new(&[("serde", "1.5.0")]);
        let mut orch = orchestrator(registry);

        assert!(orch.validate_proposed_version("serde", "1.5.0").is_err());

        orch.run(&[Dependency::new("serde", ">=1.0.0,<2.0.0")]).await;

        assert!(orch.validate_proposed_version("serde", "1.5.0").is_ok());
        assert!(orch.validate_proposed_version("serde", "2.5.0").is_err());
    }

    #[tokio::test]
    async fn test_resolve_latest_narrow_interface() {
        let registry = StubRegistry::new(&[("flask", "3.0.1")]);
        let orch = orchestrator(registry);
        assert_eq!(orch.resolve_latest("flask").await.unwrap(), "3.0.1");
        assert!(orch.resolve_latest("missing").await.is_err());
    }

    #[tokio::test]
    async fn test_metrics_snapshot_accessible() {
        let registry = StubRegistry::new(&[]);
        let orch = orchestrator(registry);
        let snap = orch.metrics_snapshot();
        assert_eq!(snap.requests, 0);
    }

    #[tokio::test]
    async fn test_many_jobs_bounded_pool() {
        let entries: Vec<(String, String)> = (0..64)
            .map(|i| (format!("pkg{i:02}"), "1.2.0".to_string()))
            .collect();
        let registry = Arc::new(StubRegistry {
            versions: entries.into_iter().collect(),
        });
        let mut orch = Orchestrator::new(registry, Arc::new(FetchClient::new().unwrap()));

        let deps: Vec<Dependency> = (0..64)
            .map(|i| Dependency::new(format!("pkg{i:02}"), ">=1.0.0"))
            .collect();
        let outcome = orch.run(&deps).await;
        assert_eq!(outcome.accepted.len(), 64);
    }
}
