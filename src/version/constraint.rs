//! Version constraint parsing and evaluation
//!
//! Handles constraints like:
//! - Exact: `==1.2.3` or bare `1.2.3`
//! - Thresholds: `>=1.2.3`, `<=1.2.3`, `>1.2.3`, `<1.2.3`
//! - Compatible release: `~=2.2` (same major, minor no lower than 2)
//! - Caret: `^1.2.3` (left-most non-zero component locked)
//! - Conjunction: `>=1.0.0,<2.0.0` (every clause must hold)

use std::cmp::Ordering;

use crate::error::VersionError;
use crate::version::Version;

/// The operator of a single constraint clause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintOp {
    /// `==X` - exact match
    Exact,
    /// `>=X`
    GreaterOrEqual,
    /// `<=X`
    LessOrEqual,
    /// `>X`
    Greater,
    /// `<X`
    Less,
    /// `~=X` - compatible release
    CompatibleRelease,
    /// `^X` - caret range
    Caret,
    /// Bare version with no operator - exact match
    Bare,
}

/// A single constraint clause: an operator plus a bound version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    /// The clause operator
    pub op: ConstraintOp,
    /// The bound version the operator compares against
    pub bound: Version,
    /// The clause as written
    pub raw: String,
}

impl Constraint {
    /// Parse a single clause (no commas)
    pub fn parse(clause: &str) -> Result<Self, VersionError> {
        let clause = clause.trim();
        let (op, rest) = if let Some(rest) = clause.strip_prefix(">=") {
            (ConstraintOp::GreaterOrEqual, rest)
        } else if let Some(rest) = clause.strip_prefix("<=") {
            (ConstraintOp::LessOrEqual, rest)
        } else if let Some(rest) = clause.strip_prefix("==") {
            (ConstraintOp::Exact, rest)
        } else if let Some(rest) = clause.strip_prefix("~=") {
            (ConstraintOp::CompatibleRelease, rest)
        } else if let Some(rest) = clause.strip_prefix('>') {
            (ConstraintOp::Greater, rest)
        } else if let Some(rest) = clause.strip_prefix('<') {
            (ConstraintOp::Less, rest)
        } else if let Some(rest) = clause.strip_prefix('^') {
            (ConstraintOp::Caret, rest)
        } else {
            (ConstraintOp::Bare, clause)
        };

        let bound = Version::parse(rest)?;
        Ok(Self {
            op,
            bound,
            raw: clause.to_string(),
        })
    }

    /// Check whether a version satisfies this clause
    pub fn matches(&self, version: &Version) -> bool {
        let ord = version.compare(&self.bound);
        match self.op {
            ConstraintOp::Exact | ConstraintOp::Bare => ord == Ordering::Equal,
            ConstraintOp::GreaterOrEqual => ord != Ordering::Less,
            ConstraintOp::LessOrEqual => ord != Ordering::Greater,
            ConstraintOp::Greater => ord == Ordering::Greater,
            ConstraintOp::Less => ord == Ordering::Less,
            ConstraintOp::CompatibleRelease => self.matches_compatible_release(version),
            ConstraintOp::Caret => self.matches_caret(version, ord),
        }
    }

    /// `~=X.Y[.Z]`: same major, and minor greater or minor equal with
    /// patch at least the bound's patch
    fn matches_compatible_release(&self, version: &Version) -> bool {
        version.major() == self.bound.major()
            && (version.minor() > self.bound.minor()
                || (version.minor() == self.bound.minor()
                    && version.patch() >= self.bound.patch()))
    }

    /// `^X`: any change that does not touch the left-most non-zero
    /// component, and no downgrade below the bound
    fn matches_caret(&self, version: &Version, ord: Ordering) -> bool {
        if ord == Ordering::Less {
            return false;
        }
        if self.bound.major() > 0 {
            version.major() == self.bound.major()
        } else if self.bound.minor() > 0 {
            version.major() == 0 && version.minor() == self.bound.minor()
        } else {
            version.major() == 0
                && version.minor() == 0
                && version.patch() == self.bound.patch()
        }
    }
}

impl std::fmt::Display for Constraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// Evaluate a full constraint string against a version.
///
/// Comma-separated clauses form a conjunction; every clause must hold.
/// Empty clauses are ignored; an entirely empty constraint always holds.
pub fn is_compatible(version: &Version, constraint: &str) -> Result<bool, VersionError> {
    for clause in constraint.split(',') {
        let clause = clause.trim();
        if clause.is_empty() {
            continue;
        }
        if !Constraint::parse(clause)?.matches(version) {
            return Ok(false);
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn test_parse_operators() {
        assert_eq!(Constraint::parse(">=1.0.0").unwrap().op, ConstraintOp::GreaterOrEqual);
        assert_eq!(Constraint::parse("<=1.0.0").unwrap().op, ConstraintOp::LessOrEqual);
        assert_eq!(Constraint::parse("==1.0.0").unwrap().op, ConstraintOp::Exact);
        assert_eq!(Constraint::parse("~=2.2").unwrap().op, ConstraintOp::CompatibleRelease);
        assert_eq!(Constraint::parse(">1.0.0").unwrap().op, ConstraintOp::Greater);
        assert_eq!(Constraint::parse("<1.0.0").unwrap().op, ConstraintOp::Less);
        assert_eq!(Constraint::parse("^1.0.0").unwrap().op, ConstraintOp::Caret);
        assert_eq!(Constraint::parse("1.0.0").unwrap().op, ConstraintOp::Bare);
    }

    #[test]
    fn test_parse_invalid_bound() {
        assert!(Constraint::parse(">=abc").is_err());
        assert!(Constraint::parse("").is_err());
    }

    #[test]
    fn test_exact_and_bare() {
        assert!(Constraint::parse("==1.2.3").unwrap().matches(&v("1.2.3")));
        assert!(!Constraint::parse("==1.2.3").unwrap().matches(&v("1.2.4")));
        assert!(Constraint::parse("1.2.3").unwrap().matches(&v("1.2.3")));
        assert!(!Constraint::parse("1.2.3").unwrap().matches(&v("1.3.0")));
    }

    #[test]
    fn test_thresholds() {
        let ge = Constraint::parse(">=1.5.0").unwrap();
        assert!(ge.matches(&v("1.5.0")));
        assert!(ge.matches(&v("2.0.0")));
        assert!(!ge.matches(&v("1.4.9")));

        let lt = Constraint::parse("<2.0.0").unwrap();
        assert!(lt.matches(&v("1.9.9")));
        assert!(!lt.matches(&v("2.0.0")));

        let gt = Constraint::parse(">1.0.0").unwrap();
        assert!(!gt.matches(&v("1.0.0")));
        assert!(gt.matches(&v("1.0.1")));

        let le = Constraint::parse("<=1.0.0").unwrap();
        assert!(le.matches(&v("1.0.0")));
        assert!(!le.matches(&v("1.0.1")));
    }

    #[test]
    fn test_compatible_release_bounds() {
        let c = Constraint::parse("~=2.2").unwrap();
        assert!(c.matches(&v("2.2.0")));
        assert!(c.matches(&v("2.9.0")));
        assert!(!c.matches(&v("3.0.0")));
        assert!(!c.matches(&v("2.1.9")));
    }

    #[test]
    fn test_compatible_release_with_patch() {
        let c = Constraint::parse("~=1.4.2").unwrap();
        assert!(c.matches(&v("1.4.2")));
        assert!(c.matches(&v("1.4.9")));
        assert!(c.matches(&v("1.5.0")));
        assert!(!c.matches(&v("1.4.1")));
        assert!(!c.matches(&v("2.0.0")));
    }

    #[test]
    fn test_caret_major_locked() {
        let c = Constraint::parse("^1.0.0").unwrap();
        assert!(c.matches(&v("1.0.0")));
        assert!(c.matches(&v("1.9.9")));
        assert!(!c.matches(&v("2.0.0")));
        assert!(!c.matches(&v("0.9.0")));
    }

    #[test]
    fn test_caret_minor_locked() {
        let c = Constraint::parse("^0.3.1").unwrap();
        assert!(c.matches(&v("0.3.1")));
        assert!(c.matches(&v("0.3.9")));
        assert!(!c.matches(&v("0.4.0")));
        assert!(!c.matches(&v("1.0.0")));
    }

    #[test]
    fn test_caret_patch_locked() {
        let c = Constraint::parse("^0.0.3").unwrap();
        assert!(c.matches(&v("0.0.3")));
        assert!(!c.matches(&v("0.0.4")));
        assert!(!c.matches(&v("0.1.0")));
    }

    #[test]
    fn test_compound_conjunction() {
        let version = v("1.5.0");
        assert!(is_compatible(&version, ">=1.0.0,<2.0.0").unwrap());
        assert!(!is_compatible(&version, ">=1.0.0,<1.5.0").unwrap());
        assert!(!is_compatible(&v("2.0.0"), ">=1.0.0,<2.0.0").unwrap());
    }

    #[test]
    fn test_compound_with_spaces() {
        assert!(is_compatible(&v("1.5.0"), ">=1.0.0, <2.0.0").unwrap());
    }

    #[test]
    fn test_empty_constraint_always_holds() {
        assert!(is_compatible(&v("1.0.0"), "").unwrap());
        assert!(is_compatible(&v("1.0.0"), " , ").unwrap());
    }

    #[test]
    fn test_malformed_clause_is_error() {
        assert!(is_compatible(&v("1.0.0"), ">=nope").is_err());
    }
}
