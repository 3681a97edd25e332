//! Application error types using thiserror
//!
//! Error hierarchy:
//! - VersionError: Malformed version strings
//! - GraphError: Constraint violations and cycle reporting
//! - FetchError: Network transport, circuit breaker, deadline failures
//! - RegistryError: Registry protocol and response issues
//!
//! No variant here is fatal to a whole run; the orchestrator degrades
//! package-by-package and host-by-host.

use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Version parsing related errors
    #[error(transparent)]
    Version(#[from] VersionError),

    /// Dependency graph related errors
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// Fetch client related errors
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Package registry related errors
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Errors from parsing version strings
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    /// Empty version string
    #[error("empty version string")]
    Empty,

    /// Version string with no numeric dot-separated segment
    #[error("invalid version string '{input}': no numeric segment")]
    Invalid { input: String },
}

/// Errors from dependency graph validation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// A proposed version violates a recorded constraint
    #[error("version '{version}' for '{package}' violates constraint '{constraint}'")]
    ConstraintViolation {
        package: String,
        version: String,
        constraint: String,
    },

    /// The proposed version could not be parsed
    #[error("cannot validate '{package}': {source}")]
    InvalidVersion {
        package: String,
        #[source]
        source: VersionError,
    },

    /// A recorded constraint clause has an unparseable bound
    #[error("malformed constraint '{constraint}' on '{package}': {source}")]
    InvalidConstraint {
        package: String,
        constraint: String,
        #[source]
        source: VersionError,
    },

    /// Validation was requested for a package not in the graph
    #[error("package '{package}' is not in the dependency graph")]
    UnknownPackage { package: String },
}

/// Errors from the resilient fetch client
#[derive(Error, Debug)]
pub enum FetchError {
    /// The per-host circuit is open; no network attempt was made
    #[error("circuit open for host '{host}': failing fast")]
    CircuitOpen { host: String },

    /// Host-unreachable transport failure (DNS, refused, timeout, no route)
    #[error("host '{host}' unreachable: {message}")]
    HostUnreachable { host: String, message: String },

    /// Other transport-level failure after retries were exhausted
    #[error("request to {url} failed after {attempts} attempts: {message}")]
    Network {
        url: String,
        attempts: u32,
        message: String,
    },

    /// The caller-supplied deadline elapsed mid-retry
    #[error("deadline exceeded while fetching {url}")]
    DeadlineExceeded { url: String },

    /// The URL could not be parsed or has no host component
    #[error("invalid url '{url}': {message}")]
    InvalidUrl { url: String, message: String },
}

/// Errors from registry protocol handling
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Package not found in registry
    #[error("package '{package}' not found in {registry} registry")]
    PackageNotFound { package: String, registry: String },

    /// Registry returned a non-success status the client does not retry
    #[error("{registry} returned HTTP {status} for '{package}'")]
    HttpStatus {
        package: String,
        registry: String,
        status: u16,
    },

    /// Response body did not match the registry's wire format
    #[error("invalid response from {registry} for '{package}': {message}")]
    InvalidResponse {
        package: String,
        registry: String,
        message: String,
    },

    /// No usable version found in an otherwise valid response
    #[error("no valid version found for '{package}' in {registry}")]
    NoVersions { package: String, registry: String },

    /// Transport-level failure surfaced from the fetch client
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl GraphError {
    /// Creates a new ConstraintViolation error
    pub fn constraint_violation(
        package: impl Into<String>,
        version: impl Into<String>,
        constraint: impl Into<String>,
    ) -> Self {
        GraphError::ConstraintViolation {
            package: package.into(),
            version: version.into(),
            constraint: constraint.into(),
        }
    }
}

impl RegistryError {
    /// Creates a new PackageNotFound error
    pub fn package_not_found(package: impl Into<String>, registry: impl Into<String>) -> Self {
        RegistryError::PackageNotFound {
            package: package.into(),
            registry: registry.into(),
        }
    }

    /// Creates a new InvalidResponse error
    pub fn invalid_response(
        package: impl Into<String>,
        registry: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        RegistryError::InvalidResponse {
            package: package.into(),
            registry: registry.into(),
            message: message.into(),
        }
    }

    /// Creates a new NoVersions error
    pub fn no_versions(package: impl Into<String>, registry: impl Into<String>) -> Self {
        RegistryError::NoVersions {
            package: package.into(),
            registry: registry.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_error_empty() {
        let msg = VersionError::Empty.to_string();
        assert!(msg.contains("empty version"));
    }

    #[test]
    fn test_version_error_invalid() {
        let err = VersionError::Invalid {
            input: "not-a-version".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("not-a-version"));
        assert!(msg.contains("no numeric segment"));
    }

    #[test]
    fn test_graph_error_constraint_violation() {
        let err = GraphError::constraint_violation("requests", "3.0.0", "<3.0.0");
        let msg = err.to_string();
        assert!(msg.contains("requests"));
        assert!(msg.contains("3.0.0"));
        assert!(msg.contains("<3.0.0"));
    }

    #[test]
    fn test_fetch_error_circuit_open() {
        let err = FetchError::CircuitOpen {
            host: "pypi.org".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("circuit open"));
        assert!(msg.contains("pypi.org"));
    }

    #[test]
    fn test_fetch_error_host_unreachable() {
        let err = FetchError::HostUnreachable {
            host: "registry.npmjs.org".to_string(),
            message: "connection refused".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("unreachable"));
        assert!(msg.contains("connection refused"));
    }

    #[test]
    fn test_registry_error_package_not_found() {
        let err = RegistryError::package_not_found("nonexistent", "PyPI");
        let msg = err.to_string();
        assert!(msg.contains("nonexistent"));
        assert!(msg.contains("PyPI"));
    }

    #[test]
    fn test_registry_error_from_fetch_error() {
        let fetch = FetchError::DeadlineExceeded {
            url: "https://pypi.org/pypi/requests/json".to_string(),
        };
        let err: RegistryError = fetch.into();
        assert!(err.to_string().contains("deadline exceeded"));
    }

    #[test]
    fn test_app_error_from_graph_error() {
        let graph = GraphError::UnknownPackage {
            package: "flask".to_string(),
        };
        let app: AppError = graph.into();
        assert!(app.to_string().contains("flask"));
    }
}
