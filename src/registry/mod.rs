//! Registry adapters for resolving the latest version of a package
//!
//! This module provides:
//! - PyPI JSON API adapter
//! - PyPI-compatible simple/HTML index adapter (private mirrors)
//! - npm registry adapter
//!
//! Wire formats belong to the upstream registries and are honored as-is;
//! adapters only extract a version string from each response.

mod npm;
mod pypi;
mod simple_index;

pub use npm::NpmRegistry;
pub use pypi::PyPiJsonRegistry;
pub use simple_index::SimpleIndexRegistry;

use std::sync::Arc;

use async_trait::async_trait;
use clap::ValueEnum;

use crate::error::RegistryError;
use crate::fetch::FetchClient;

/// Trait for registry adapters
#[async_trait]
pub trait Registry: Send + Sync {
    /// Human-readable registry name for error messages
    fn name(&self) -> &'static str;

    /// Resolve the latest published version of a package
    async fn fetch_latest(&self, package: &str) -> Result<String, RegistryError>;
}

/// Which registry protocol to speak
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RegistryKind {
    /// PyPI JSON API (`{index}/{package}/json`)
    PypiJson,
    /// PyPI-compatible simple/HTML index (`{index}/{package}/`)
    PypiSimple,
    /// npm registry (`{registry}/{package}/latest`)
    Npm,
}

impl RegistryKind {
    /// Public index URL for this protocol
    pub fn default_index_url(self) -> &'static str {
        match self {
            RegistryKind::PypiJson => "https://pypi.org/pypi",
            RegistryKind::PypiSimple => "https://pypi.org/simple",
            RegistryKind::Npm => "https://registry.npmjs.org",
        }
    }
}

/// Create a registry adapter for the given protocol and index URL
pub fn create_registry(
    kind: RegistryKind,
    index_url: impl Into<String>,
    client: Arc<FetchClient>,
) -> Box<dyn Registry> {
    match kind {
        RegistryKind::PypiJson => Box::new(PyPiJsonRegistry::new(client, index_url)),
        RegistryKind::PypiSimple => Box::new(SimpleIndexRegistry::new(client, index_url)),
        RegistryKind::Npm => Box::new(NpmRegistry::new(client, index_url)),
    }
}

/// Map a non-success response to the registry error taxonomy
pub(crate) fn status_error(
    status: reqwest::StatusCode,
    package: &str,
    registry: &'static str,
) -> RegistryError {
    if status == reqwest::StatusCode::NOT_FOUND {
        RegistryError::package_not_found(package, registry)
    } else {
        RegistryError::HttpStatus {
            package: package.to_string(),
            registry: registry.to_string(),
            status: status.as_u16(),
        }
    }
}
