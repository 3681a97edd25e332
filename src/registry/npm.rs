//! npm registry adapter
//!
//! API endpoint: `GET {registry}/{package}/latest` -> `{"version": "<str>"}`

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::RegistryError;
use crate::fetch::FetchClient;
use crate::registry::{status_error, Registry};

/// npm registry adapter
pub struct NpmRegistry {
    client: Arc<FetchClient>,
    registry_url: String,
}

/// npm dist-tag response for `latest`
#[derive(Debug, Deserialize)]
struct NpmLatestResponse {
    version: String,
}

impl NpmRegistry {
    /// Create a new npm adapter
    pub fn new(client: Arc<FetchClient>, registry_url: impl Into<String>) -> Self {
        Self {
            client,
            registry_url: registry_url.into(),
        }
    }

    /// Build the URL for a package's latest dist-tag
    fn build_url(&self, package: &str) -> String {
        format!("{}/{}/latest", self.registry_url.trim_end_matches('/'), package)
    }
}

#[async_trait]
impl Registry for NpmRegistry {
    fn name(&self) -> &'static str {
        "npm"
    }

    async fn fetch_latest(&self, package: &str) -> Result<String, RegistryError> {
        let url = self.build_url(package);
        let response = self.client.get_with_retry(&url, &[]).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status, package, self.name()));
        }

        let parsed: NpmLatestResponse = response.json().await.map_err(|e| {
            RegistryError::invalid_response(package, self.name(), format!("bad JSON: {e}"))
        })?;

        if parsed.version.is_empty() {
            return Err(RegistryError::no_versions(package, self.name()));
        }
        Ok(parsed.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter(url: &str) -> NpmRegistry {
        NpmRegistry::new(Arc::new(FetchClient::new().unwrap()), url)
    }

    #[test]
    fn test_build_url() {
        let registry = adapter("https://registry.npmjs.org");
        assert_eq!(
            registry.build_url("lodash"),
            "https://registry.npmjs.org/lodash/latest"
        );
    }

    #[test]
    fn test_build_url_scoped_package() {
        let registry = adapter("https://registry.npmjs.org/");
        assert_eq!(
            registry.build_url("@types/node"),
            "https://registry.npmjs.org/@types/node/latest"
        );
    }

    #[test]
    fn test_response_shape() {
        let body = r#"{"name": "lodash", "version": "4.17.21"}"#;
        let parsed: NpmLatestResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.version, "4.17.21");
    }
}
