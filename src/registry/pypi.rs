//! PyPI JSON API adapter
//!
//! API endpoint: `GET {index}/{package}/json` -> `{"info": {"version": "<str>"}}`

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::RegistryError;
use crate::fetch::FetchClient;
use crate::registry::{status_error, Registry};

/// PyPI JSON API adapter
pub struct PyPiJsonRegistry {
    client: Arc<FetchClient>,
    index_url: String,
}

/// PyPI package metadata response
#[derive(Debug, Deserialize)]
struct PyPiResponse {
    info: PyPiInfo,
}

#[derive(Debug, Deserialize)]
struct PyPiInfo {
    version: String,
}

impl PyPiJsonRegistry {
    /// Create a new PyPI JSON adapter
    pub fn new(client: Arc<FetchClient>, index_url: impl Into<String>) -> Self {
        Self {
            client,
            index_url: index_url.into(),
        }
    }

    /// Build the URL for a package
    fn build_url(&self, package: &str) -> String {
        format!("{}/{}/json", self.index_url.trim_end_matches('/'), package)
    }
}

#[async_trait]
impl Registry for PyPiJsonRegistry {
    fn name(&self) -> &'static str {
        "PyPI"
    }

    async fn fetch_latest(&self, package: &str) -> Result<String, RegistryError> {
        let url = self.build_url(package);
        let response = self.client.get_with_retry(&url, &[]).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status, package, self.name()));
        }

        let parsed: PyPiResponse = response.json().await.map_err(|e| {
            RegistryError::invalid_response(package, self.name(), format!("bad JSON: {e}"))
        })?;

        if parsed.info.version.is_empty() {
            return Err(RegistryError::no_versions(package, self.name()));
        }
        Ok(parsed.info.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter(index_url: &str) -> PyPiJsonRegistry {
        PyPiJsonRegistry::new(Arc::new(FetchClient::new().unwrap()), index_url)
    }

    #[test]
    fn test_build_url() {
        let registry = adapter("https://pypi.org/pypi");
        assert_eq!(
            registry.build_url("requests"),
            "https://pypi.org/pypi/requests/json"
        );
    }

    #[test]
    fn test_build_url_trailing_slash() {
        let registry = adapter("https://pypi.org/pypi/");
        assert_eq!(
            registry.build_url("flask-restful"),
            "https://pypi.org/pypi/flask-restful/json"
        );
    }

    #[test]
    fn test_response_shape() {
        let body = r#"{"info": {"version": "2.32.0", "name": "requests"}}"#;
        let parsed: PyPiResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.info.version, "2.32.0");
    }
}
