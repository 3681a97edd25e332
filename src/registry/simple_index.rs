//! PyPI-compatible simple/HTML index adapter
//!
//! Private artifact mirrors often expose only the simple index:
//! `GET {index}/{package}/` returns HTML with `<a href="{version}/...">`
//! links. The highest valid version among the href path segments is
//! selected, preferring a stable release whenever any exists.

use std::sync::Arc;
use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;

use crate::error::RegistryError;
use crate::fetch::FetchClient;
use crate::registry::{status_error, Registry};
use crate::version::Version;

/// Simple/HTML index adapter
pub struct SimpleIndexRegistry {
    client: Arc<FetchClient>,
    index_url: String,
}

impl SimpleIndexRegistry {
    /// Create a new simple-index adapter
    pub fn new(client: Arc<FetchClient>, index_url: impl Into<String>) -> Self {
        Self {
            client,
            index_url: index_url.into(),
        }
    }

    /// Build the URL for a package listing
    fn build_url(&self, package: &str) -> String {
        format!("{}/{}/", self.index_url.trim_end_matches('/'), package)
    }
}

/// Extract version candidates from href attributes in an index page.
///
/// Each href's first path segment (query and fragment stripped) is treated
/// as a candidate; segments that do not parse as versions are ignored.
fn extract_versions(html: &str) -> Vec<Version> {
    static HREF: OnceLock<Regex> = OnceLock::new();
    let href = HREF.get_or_init(|| {
        Regex::new(r#"href\s*=\s*"([^"]+)""#).expect("href pattern is a valid regex")
    });

    let mut versions = Vec::new();
    for capture in href.captures_iter(html) {
        let target = &capture[1];
        let target = target.split(['?', '#']).next().unwrap_or(target);
        let segment = target
            .trim_start_matches("./")
            .trim_start_matches('/')
            .split('/')
            .next()
            .unwrap_or("");
        if let Ok(version) = Version::parse(segment) {
            versions.push(version);
        }
    }
    versions
}

/// Pick the highest version, preferring stable over pre-release
fn select_latest(versions: Vec<Version>) -> Option<Version> {
    let (stable, pre): (Vec<_>, Vec<_>) = versions.into_iter().partition(|v| !v.is_pre_release);
    let pool = if stable.is_empty() { pre } else { stable };
    pool.into_iter().max_by(|a, b| a.compare(b))
}

#[async_trait]
impl Registry for SimpleIndexRegistry {
    fn name(&self) -> &'static str {
        "simple index"
    }

    async fn fetch_latest(&self, package: &str) -> Result<String, RegistryError> {
        let url = self.build_url(package);
        let response = self.client.get_with_retry(&url, &[]).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status, package, self.name()));
        }

        let html = response.text().await.map_err(|e| {
            RegistryError::invalid_response(package, self.name(), format!("bad body: {e}"))
        })?;

        select_latest(extract_versions(&html))
            .map(|v| v.raw)
            .ok_or_else(|| RegistryError::no_versions(package, self.name()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_url() {
        let registry = SimpleIndexRegistry::new(
            Arc::new(FetchClient::new().unwrap()),
            "https://mirror.internal/simple",
        );
        assert_eq!(
            registry.build_url("requests"),
            "https://mirror.internal/simple/requests/"
        );
    }

    #[test]
    fn test_extract_versions_from_links() {
        let html = r#"
            <html><body>
            <a href="1.0.0/requests-1.0.0.tar.gz">1.0.0</a>
            <a href="2.1.0/">2.1.0</a>
            <a href="not-a-version/">junk</a>
            </body></html>
        "#;
        let versions = extract_versions(html);
        let raws: Vec<&str> = versions.iter().map(|v| v.raw.as_str()).collect();
        assert_eq!(raws, vec!["1.0.0", "2.1.0"]);
    }

    #[test]
    fn test_extract_versions_strips_query_and_leading_slash() {
        let html = r#"<a href="/3.2.1/pkg.whl?sha=abc#frag">x</a>"#;
        let versions = extract_versions(html);
        assert_eq!(versions.len(), 1);
        assert_eq!(versions[0].raw, "3.2.1");
    }

    #[test]
    fn test_select_latest_prefers_stable() {
        let versions = vec![
            Version::parse("2.0.0rc1").unwrap(),
            Version::parse("1.9.0").unwrap(),
            Version::parse("1.8.0").unwrap(),
        ];
        assert_eq!(select_latest(versions).unwrap().raw, "1.9.0");
    }

    #[test]
    fn test_select_latest_all_prerelease() {
        let versions = vec![
            Version::parse("2.0.0rc1").unwrap(),
            Version::parse("2.0.0rc2").unwrap(),
        ];
        assert_eq!(select_latest(versions).unwrap().raw, "2.0.0rc2");
    }

    #[test]
    fn test_select_latest_empty() {
        assert!(select_latest(Vec::new()).is_none());
    }
}
