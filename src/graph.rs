//! Dependency graph with cycle detection and update validation
//!
//! Nodes are packages; an edge `A -> B` with a constraint means "A requires
//! B at a version matching the constraint". The graph is built
//! single-threaded before the fetch phase and only read afterwards.
//!
//! Cycles are warnings, not errors: manifest declarations are not expected
//! to be strictly acyclic the way a build graph would be, so detection
//! reports them and processing continues.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::GraphError;
use crate::version::{Constraint, ConstraintOp, Version};

/// A package node and the constraints its dependents impose on it
#[derive(Debug, Clone, Default)]
pub struct Node {
    /// Packages this node depends on
    pub dependencies: BTreeSet<String>,
    /// Packages that depend on this node
    pub dependents: BTreeSet<String>,
    /// One constraint entry per dependent edge; duplicates are checked
    /// independently
    pub constraints: Vec<String>,
}

/// Directed dependency graph scoped to one update run
#[derive(Debug, Default)]
pub struct DependencyGraph {
    nodes: BTreeMap<String, Node>,
}

impl DependencyGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensure a node exists; repeated adds are idempotent
    pub fn add_node(&mut self, name: &str) {
        self.nodes.entry(name.to_string()).or_default();
    }

    /// Record that `from` depends on `to` under `constraint`.
    ///
    /// Both nodes are created if absent. The constraint is appended to the
    /// target node, one entry per edge.
    pub fn add_dependency(&mut self, from: &str, to: &str, constraint: &str) {
        self.add_node(from);
        self.add_node(to);

        if let Some(node) = self.nodes.get_mut(from) {
            node.dependencies.insert(to.to_string());
        }
        if let Some(node) = self.nodes.get_mut(to) {
            node.dependents.insert(from.to_string());
            node.constraints.push(constraint.to_string());
        }
    }

    /// Look up a node by name
    pub fn node(&self, name: &str) -> Option<&Node> {
        self.nodes.get(name)
    }

    /// Number of nodes in the graph
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if the graph has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Detect every cycle in the graph.
    ///
    /// Nodes and neighbors are visited in lexicographic order so output is
    /// deterministic. Each cycle is returned as a closed path
    /// (`["A", "B", "A"]`) rotated to start at its lexicographically
    /// smallest member so the same loop is never reported under two
    /// different starting points.
    pub fn detect_cycles(&self) -> Vec<Vec<String>> {
        let mut cycles = Vec::new();
        let mut finished: BTreeSet<&str> = BTreeSet::new();
        let mut path: Vec<&str> = Vec::new();

        for name in self.nodes.keys() {
            if !finished.contains(name.as_str()) {
                self.cycle_dfs(name, &mut path, &mut finished, &mut cycles);
            }
        }

        cycles
    }

    fn cycle_dfs<'a>(
        &'a self,
        name: &'a str,
        path: &mut Vec<&'a str>,
        finished: &mut BTreeSet<&'a str>,
        cycles: &mut Vec<Vec<String>>,
    ) {
        if let Some(pos) = path.iter().position(|n| *n == name) {
            cycles.push(canonical_cycle(&path[pos..]));
            return;
        }
        if finished.contains(name) {
            return;
        }

        path.push(name);
        if let Some(node) = self.nodes.get(name) {
            for dep in &node.dependencies {
                self.cycle_dfs(dep, path, finished, cycles);
            }
        }
        path.pop();
        finished.insert(name);
    }

    /// Dependency-first traversal order.
    ///
    /// Post-order DFS from root nodes (no dependents) in sorted order: if A
    /// depends on B, B appears before A. Nodes reachable only through
    /// cycles are appended afterwards in sorted order so no declared
    /// package is dropped.
    pub fn update_order(&self) -> Vec<String> {
        let mut order = Vec::new();
        let mut visited: BTreeSet<&str> = BTreeSet::new();

        for (name, node) in &self.nodes {
            if node.dependents.is_empty() {
                self.post_order(name, &mut visited, &mut order);
            }
        }
        for name in self.nodes.keys() {
            if !visited.contains(name.as_str()) {
                self.post_order(name, &mut visited, &mut order);
            }
        }

        order
    }

    fn post_order<'a>(
        &'a self,
        name: &'a str,
        visited: &mut BTreeSet<&'a str>,
        order: &mut Vec<String>,
    ) {
        if !visited.insert(name) {
            return;
        }
        if let Some(node) = self.nodes.get(name) {
            for dep in &node.dependencies {
                self.post_order(dep, visited, order);
            }
        }
        order.push(name.to_string());
    }

    /// Validate a proposed new version against every constraint recorded
    /// on the package's node.
    ///
    /// Clauses are checked exactly as `is_compatible`, with one exception:
    /// an `==X` clause accepts any version strictly greater than X. A
    /// dependent that pinned X is taken to mean "X or any later release",
    /// so an advance past the pin is allowed while a downgrade or sidegrade
    /// is not. The first violated clause aborts with an error naming it.
    pub fn validate_update(&self, name: &str, new_version: &str) -> Result<(), GraphError> {
        let node = self
            .nodes
            .get(name)
            .ok_or_else(|| GraphError::UnknownPackage {
                package: name.to_string(),
            })?;

        let candidate =
            Version::parse(new_version).map_err(|source| GraphError::InvalidVersion {
                package: name.to_string(),
                source,
            })?;

        for constraint in &node.constraints {
            for clause in constraint.split(',') {
                let clause = clause.trim();
                if clause.is_empty() {
                    continue;
                }
                let parsed =
                    Constraint::parse(clause).map_err(|source| GraphError::InvalidConstraint {
                        package: name.to_string(),
                        constraint: clause.to_string(),
                        source,
                    })?;

                let satisfied = match parsed.op {
                    ConstraintOp::Exact => {
                        candidate.compare(&parsed.bound) == std::cmp::Ordering::Greater
                    }
                    _ => parsed.matches(&candidate),
                };

                if !satisfied {
                    return Err(GraphError::constraint_violation(name, new_version, clause));
                }
            }
        }

        Ok(())
    }
}

/// Rotate a cycle path so it starts at its smallest member, then close it
/// by repeating the start.
fn canonical_cycle(path: &[&str]) -> Vec<String> {
    let min_pos = path
        .iter()
        .enumerate()
        .min_by_key(|(_, n)| **n)
        .map(|(i, _)| i)
        .unwrap_or(0);

    let mut cycle: Vec<String> = path[min_pos..]
        .iter()
        .chain(path[..min_pos].iter())
        .map(|n| n.to_string())
        .collect();
    if let Some(first) = cycle.first().cloned() {
        cycle.push(first);
    }
    cycle
}
