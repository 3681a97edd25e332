//! upcheck - Safe dependency advance checker library
//!
//! This library determines which declared package dependencies can be
//! safely advanced to a newer version:
//! - Version model: loose parsing, comparison, constraint evaluation
//! - Dependency graph: cycle detection, update order, update validation
//! - Resilient fetch client: retry/backoff, per-host circuit breaking
//! - Update orchestrator: bounded-concurrency fetch and validation

pub mod cli;
pub mod error;
pub mod fetch;
pub mod graph;
pub mod orchestrator;
pub mod registry;
pub mod report;
pub mod version;
