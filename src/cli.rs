//! CLI argument parsing module for upcheck

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::orchestrator::Dependency;
use crate::registry::RegistryKind;

/// Parse a deadline like `30s` or `1500ms` into a Duration
fn parse_deadline(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if let Some(ms) = s.strip_suffix("ms") {
        let value: u64 = ms
            .parse()
            .map_err(|_| format!("invalid number in deadline: {ms}"))?;
        return Ok(Duration::from_millis(value));
    }
    if let Some(secs) = s.strip_suffix('s') {
        let value: u64 = secs
            .parse()
            .map_err(|_| format!("invalid number in deadline: {secs}"))?;
        return Ok(Duration::from_secs(value));
    }
    Err(format!("invalid deadline format: {s} (expected e.g. 30s or 1500ms)"))
}

/// Safe dependency advance checker
#[derive(Parser, Debug, Clone)]
#[command(name = "upcheck", version, about = "Safe dependency advance checker")]
pub struct CliArgs {
    /// File of declared dependencies, one `name<constraint>` line per
    /// entry (e.g. `requests>=2.28,<3.0`)
    pub deps_file: PathBuf,

    /// Registry protocol to query
    #[arg(long, value_enum, default_value = "pypi-json")]
    pub registry: RegistryKind,

    /// Base URL of the registry index (defaults to the public index)
    #[arg(long)]
    pub index_url: Option<String>,

    /// Per-package fetch deadline covering all retries (e.g. 30s, 1500ms)
    #[arg(long, value_parser = parse_deadline)]
    pub deadline: Option<Duration>,

    /// Show fetch metrics and per-package details
    #[arg(long)]
    pub verbose: bool,

    /// Minimal output
    #[arg(short, long)]
    pub quiet: bool,
}

impl CliArgs {
    /// Index URL to use: explicit flag or the protocol's public default
    pub fn effective_index_url(&self) -> String {
        self.index_url
            .clone()
            .unwrap_or_else(|| self.registry.default_index_url().to_string())
    }
}

/// Parse one declared dependency line.
///
/// The package name runs up to the first operator character or
/// whitespace; the rest of the line is the constraint. Blank lines and
/// `#` comments yield None.
pub fn parse_dependency_line(line: &str) -> Option<Dependency> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let split_at = line
        .find(|c: char| matches!(c, '>' | '<' | '=' | '~' | '^') || c.is_whitespace())
        .unwrap_or(line.len());
    let (name, constraint) = line.split_at(split_at);
    let name = name.trim();
    if name.is_empty() {
        return None;
    }

    Some(Dependency::new(name, constraint.trim()))
}
