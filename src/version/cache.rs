//! Concurrent memoization of parsed versions
//!
//! Fetch workers parse the same version strings repeatedly (bound versions
//! in constraints recur across packages). The cache is an explicit value
//! owned by the orchestrator, not a global, so test instances stay
//! isolated. Reads vastly outnumber writes; a read lock is taken first and
//! the insert is double-checked under the write lock so a racing parse is
//! not stored twice.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::VersionError;
use crate::version::Version;

/// Read-mostly cache of successfully parsed versions, keyed by raw string
#[derive(Debug, Default)]
pub struct VersionCache {
    entries: RwLock<HashMap<String, Version>>,
}

impl VersionCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached parse for `raw`, parsing and storing on a miss.
    ///
    /// Parse failures are returned as errors and never cached.
    pub fn get_or_parse(&self, raw: &str) -> Result<Version, VersionError> {
        if let Some(version) = self
            .entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(raw)
        {
            return Ok(version.clone());
        }

        let parsed = Version::parse(raw)?;

        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let version = entries
            .entry(raw.to_string())
            .or_insert_with(|| parsed)
            .clone();
        Ok(version)
    }

    /// Number of cached versions
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// True if nothing has been cached yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_cache_hit_returns_same_parse() {
        let cache = VersionCache::new();
        let first = cache.get_or_parse("1.2.3").unwrap();
        let second = cache.get_or_parse("1.2.3").unwrap();
        assert_eq!(first, second);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_invalid_version_not_cached() {
        let cache = VersionCache::new();
        assert!(cache.get_or_parse("garbage").is_err());
        assert!(cache.get_or_parse("").is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_distinct_raw_strings_are_distinct_entries() {
        let cache = VersionCache::new();
        cache.get_or_parse("1.0.0").unwrap();
        cache.get_or_parse("1.0").unwrap();
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_concurrent_access() {
        let cache = Arc::new(VersionCache::new());
        let mut handles = Vec::new();

        for i in 0..8 {
            let cache = Arc::clone(&cache);
            handles.push(std::thread::spawn(move || {
                for j in 0..100 {
                    let raw = format!("1.{}.{}", i % 4, j % 10);
                    cache.get_or_parse(&raw).unwrap();
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        // 4 majors x 10 patches
        assert_eq!(cache.len(), 40);
    }
}
