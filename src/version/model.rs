//! Loose version string parsing and comparison
//!
//! Registries publish version strings that are close to, but not always,
//! strict semver (`1.2`, `2.0.0rc1`, `1.4.0-beta.2`, `3.1.0+build5`). The
//! parser accepts anything with at least one numeric dot-separated segment
//! and normalizes it to three zero-padded numeric parts plus a suffix.

use std::cmp::Ordering;

use crate::error::VersionError;

/// A parsed version: numeric parts plus an optional pre-release suffix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    /// The original string as given to the parser
    pub raw: String,
    /// Numeric parts, zero-padded to at least three entries
    pub parts: Vec<u64>,
    /// Pre-release/build suffix (empty for stable versions)
    pub suffix: String,
    /// True if a suffix was stripped during parsing
    pub is_pre_release: bool,
}

impl Version {
    /// Parse a loosely-structured version string.
    ///
    /// The suffix starts at the first `-`, `+`, or letter; the remaining
    /// numeric prefix is split on `.` and every segment must be purely
    /// digits. Empty input and inputs without a numeric segment are errors.
    pub fn parse(raw: &str) -> Result<Self, VersionError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(VersionError::Empty);
        }

        let split_at = trimmed.find(|c: char| c == '-' || c == '+' || c.is_ascii_alphabetic());
        let (numeric, suffix) = match split_at {
            Some(idx) => (&trimmed[..idx], &trimmed[idx..]),
            None => (trimmed, ""),
        };

        // "2.0.rc1" style suffixes leave a dangling dot on the prefix
        let numeric = numeric.trim_end_matches('.');
        if numeric.is_empty() {
            return Err(VersionError::Invalid {
                input: raw.to_string(),
            });
        }

        let mut parts = Vec::with_capacity(3);
        for segment in numeric.split('.') {
            if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
                return Err(VersionError::Invalid {
                    input: raw.to_string(),
                });
            }
            let value = segment.parse::<u64>().map_err(|_| VersionError::Invalid {
                input: raw.to_string(),
            })?;
            parts.push(value);
        }

        while parts.len() < 3 {
            parts.push(0);
        }

        Ok(Self {
            raw: raw.to_string(),
            parts,
            suffix: suffix.to_string(),
            is_pre_release: !suffix.is_empty(),
        })
    }

    /// Major component (first numeric part)
    pub fn major(&self) -> u64 {
        self.parts[0]
    }

    /// Minor component (second numeric part)
    pub fn minor(&self) -> u64 {
        self.parts[1]
    }

    /// Patch component (third numeric part)
    pub fn patch(&self) -> u64 {
        self.parts[2]
    }

    /// Compare two versions.
    ///
    /// The first three numeric parts are compared positionally. On a
    /// numeric tie a stable version is greater than a pre-release; two
    /// versions of the same kind fall back to lexicographic suffix order.
    pub fn compare(&self, other: &Self) -> Ordering {
        for i in 0..3 {
            match self.parts[i].cmp(&other.parts[i]) {
                Ordering::Equal => continue,
                ord => return ord,
            }
        }

        match (self.is_pre_release, other.is_pre_release) {
            (false, true) => Ordering::Greater,
            (true, false) => Ordering::Less,
            _ => self.suffix.cmp(&other.suffix),
        }
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw)
    }
}
