//! Version model: parsing, comparison, and constraint evaluation
//!
//! This module provides:
//! - Loose version string parsing into comparable numeric+suffix form
//! - Total-order comparison with stable-beats-prerelease tie breaking
//! - Single and comma-joined AND constraint evaluation
//! - A concurrent parse cache shared across fetch workers

mod cache;
mod constraint;
mod model;

pub use cache::VersionCache;
pub use constraint::{is_compatible, Constraint, ConstraintOp};
pub use model::Version;
