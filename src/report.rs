//! Human-readable run report
//!
//! This module provides:
//! - Accepted advances with major/minor/patch change classification
//! - Skipped packages with reasons
//! - Optional fetch metrics block for verbose runs

use std::io::{self, Write};

use colored::Colorize;

use crate::fetch::MetricsSnapshot;
use crate::orchestrator::RunOutcome;
use crate::version::Version;

/// Semantic change type between the declared bound and the new version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Major,
    Minor,
    Patch,
    Unknown,
}

impl ChangeKind {
    /// Classify the jump from an old version string to a new one
    pub fn from_versions(old: &str, new: &str) -> Self {
        match (Version::parse(old), Version::parse(new)) {
            (Ok(old), Ok(new)) => {
                if new.major() != old.major() {
                    ChangeKind::Major
                } else if new.minor() != old.minor() {
                    ChangeKind::Minor
                } else {
                    ChangeKind::Patch
                }
            }
            _ => ChangeKind::Unknown,
        }
    }

    fn colored_label(self) -> String {
        match self {
            ChangeKind::Major => "major".red().bold().to_string(),
            ChangeKind::Minor => "minor".yellow().to_string(),
            ChangeKind::Patch => "patch".green().to_string(),
            ChangeKind::Unknown => "?".dimmed().to_string(),
        }
    }
}

/// Write the run outcome to `out`.
///
/// `constraints` maps package names to their declared constraint strings,
/// used only for display next to accepted advances.
pub fn render(
    outcome: &RunOutcome,
    constraints: &std::collections::HashMap<String, String>,
    metrics: Option<&MetricsSnapshot>,
    out: &mut impl Write,
) -> io::Result<()> {
    for cycle in &outcome.cycles {
        writeln!(
            out,
            "{} dependency cycle: {}",
            "warning:".yellow().bold(),
            cycle.join(" -> ")
        )?;
    }

    if outcome.accepted.is_empty() {
        writeln!(out, "No packages can be advanced.")?;
    } else {
        writeln!(
            out,
            "{} package(s) can be advanced:",
            outcome.accepted.len().to_string().bold()
        )?;
        let mut names: Vec<&String> = outcome.accepted.keys().collect();
        names.sort();
        for name in names {
            let version = &outcome.accepted[name];
            let declared = constraints.get(name).map(String::as_str).unwrap_or("");
            let kind = ChangeKind::from_versions(declared_bound(declared), version);
            writeln!(
                out,
                "  {} {} -> {} [{}]",
                name.bold(),
                declared.dimmed(),
                version.green(),
                kind.colored_label()
            )?;
        }
    }

    if !outcome.skipped.is_empty() {
        writeln!(out)?;
        writeln!(out, "{} package(s) skipped:", outcome.skipped.len())?;
        for skipped in &outcome.skipped {
            writeln!(
                out,
                "  {} - {}",
                skipped.name,
                skipped.reason.to_string().dimmed()
            )?;
        }
    }

    if let Some(snapshot) = metrics {
        writeln!(out)?;
        writeln!(out, "Fetch metrics:")?;
        writeln!(out, "  requests:      {}", snapshot.requests)?;
        writeln!(out, "  successes:     {}", snapshot.successes)?;
        writeln!(out, "  failures:      {}", snapshot.failures)?;
        writeln!(out, "  retries:       {}", snapshot.retries)?;
        writeln!(out, "  circuit trips: {}", snapshot.circuit_trips)?;
        writeln!(
            out,
            "  total latency: {:.1}ms",
            snapshot.total_latency_ns as f64 / 1_000_000.0
        )?;
    }

    Ok(())
}

/// The first version-looking token of a constraint, for change
/// classification display
fn declared_bound(constraint: &str) -> &str {
    constraint
        .split(',')
        .next()
        .unwrap_or("")
        .trim_start_matches(['>', '<', '=', '~', '^', ' '])
}
