//! Version constraint parsing and matching
//!
//! Constraints arrive in npm-flavoured syntax (`^1.2.0`, `>=1.0.0 <2.0.0`,
//! `1.0.0 - 2.0.0`, `1.x || 2.x`, `*`, `latest`) and are translated into one
//! `semver::VersionReq` per `||` alternative.
//!
//! When prereleases are admitted, comparators are evaluated by plain semver
//! ordering, so `*` matches `5.10.0-SNAPSHOT.123`. When they are not, the
//! stock `semver` matching rules apply.

use crate::domain::PreReleaseFilter;
use crate::version::normalize::parse_version;
use regex::Regex;
use semver::{Comparator, Op, Version, VersionReq};
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

/// `<from> - <to>` hyphen range
static HYPHEN_RANGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\S+)\s+-\s+(\S+)\s*$").unwrap());

/// Literal accepted as "any version"
pub const LATEST: &str = "latest";

/// A constraint string that could not be parsed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid version constraint '{raw}': {message}")]
pub struct InvalidConstraint {
    pub raw: String,
    pub message: String,
}

/// A parsed version constraint (any of several alternatives)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionConstraint {
    raw: String,
    alternatives: Vec<VersionReq>,
}

impl VersionConstraint {
    /// Parse a constraint expression
    pub fn parse(raw: &str) -> Result<Self, InvalidConstraint> {
        let mut alternatives = Vec::new();

        for part in raw.split("||") {
            let translated = translate_alternative(part);
            let req = VersionReq::parse(&translated).map_err(|e| InvalidConstraint {
                raw: raw.to_string(),
                message: e.to_string(),
            })?;
            alternatives.push(req);
        }

        Ok(Self {
            raw: raw.to_string(),
            alternatives,
        })
    }

    /// The original expression
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Check a parsed version against the constraint
    pub fn matches(&self, version: &Version, include_prerelease: bool) -> bool {
        self.alternatives.iter().any(|req| {
            if include_prerelease {
                req.comparators
                    .iter()
                    .all(|cmp| comparator_matches(cmp, version))
            } else {
                req.matches(version)
            }
        })
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// Translate one `||` alternative into `semver` crate syntax
fn translate_alternative(part: &str) -> String {
    let part = part.trim();
    if part.is_empty() || part.eq_ignore_ascii_case(LATEST) || part == "x" || part == "X" {
        return "*".to_string();
    }

    if let Some(caps) = HYPHEN_RANGE_RE.captures(part) {
        return format!(">={}, <={}", &caps[1], &caps[2]);
    }

    // Re-attach operators separated from their version by whitespace (">= 1.0.0")
    let mut comparators: Vec<String> = Vec::new();
    let mut pending_op = String::new();
    for token in part.split(|c: char| c.is_whitespace() || c == ',') {
        if token.is_empty() {
            continue;
        }
        if token.chars().all(|c| "<>=^~".contains(c)) {
            pending_op.push_str(token);
            continue;
        }
        let token = format!("{}{}", pending_op, token);
        pending_op.clear();
        comparators.push(bare_version_as_exact(&token));
    }

    comparators.join(", ")
}

/// A bare version without an operator means "exactly this" (or this
/// partial version), not the `semver` crate's implicit caret.
fn bare_version_as_exact(token: &str) -> String {
    let starts_with_digit = token.chars().next().is_some_and(|c| c.is_ascii_digit());
    let core = token.split(['-', '+']).next().unwrap_or(token);
    let has_wildcard = core.contains(['*', 'x', 'X']);
    if starts_with_digit && !has_wildcard {
        format!("={}", token)
    } else {
        token.to_string()
    }
}

/// Comparator evaluation by plain ordering, admitting prereleases
fn comparator_matches(cmp: &Comparator, ver: &Version) -> bool {
    match cmp.op {
        Op::Exact | Op::Wildcard => matches_exact(cmp, ver),
        Op::Greater => matches_greater(cmp, ver),
        Op::GreaterEq => matches_exact(cmp, ver) || matches_greater(cmp, ver),
        Op::Less => matches_less(cmp, ver),
        Op::LessEq => matches_exact(cmp, ver) || matches_less(cmp, ver),
        Op::Tilde => matches_tilde(cmp, ver),
        Op::Caret => matches_caret(cmp, ver),
        _ => false,
    }
}

fn matches_exact(cmp: &Comparator, ver: &Version) -> bool {
    if ver.major != cmp.major {
        return false;
    }
    if let Some(minor) = cmp.minor {
        if ver.minor != minor {
            return false;
        }
    }
    match cmp.patch {
        Some(patch) => ver.patch == patch && ver.pre == cmp.pre,
        None => true,
    }
}

fn matches_greater(cmp: &Comparator, ver: &Version) -> bool {
    if ver.major != cmp.major {
        return ver.major > cmp.major;
    }
    match cmp.minor {
        None => return false,
        Some(minor) if ver.minor != minor => return ver.minor > minor,
        Some(_) => {}
    }
    match cmp.patch {
        None => return false,
        Some(patch) if ver.patch != patch => return ver.patch > patch,
        Some(_) => {}
    }
    ver.pre > cmp.pre
}

fn matches_less(cmp: &Comparator, ver: &Version) -> bool {
    if ver.major != cmp.major {
        return ver.major < cmp.major;
    }
    match cmp.minor {
        None => return false,
        Some(minor) if ver.minor != minor => return ver.minor < minor,
        Some(_) => {}
    }
    match cmp.patch {
        None => return false,
        Some(patch) if ver.patch != patch => return ver.patch < patch,
        Some(_) => {}
    }
    ver.pre < cmp.pre
}

fn matches_tilde(cmp: &Comparator, ver: &Version) -> bool {
    if ver.major != cmp.major {
        return false;
    }
    if let Some(minor) = cmp.minor {
        if ver.minor != minor {
            return false;
        }
    }
    match cmp.patch {
        Some(patch) if ver.patch != patch => ver.patch > patch,
        Some(_) => ver.pre >= cmp.pre,
        None => true,
    }
}

fn matches_caret(cmp: &Comparator, ver: &Version) -> bool {
    if ver.major != cmp.major {
        return false;
    }
    let minor = match cmp.minor {
        None => return true,
        Some(minor) => minor,
    };
    let patch = match cmp.patch {
        None if cmp.major > 0 => return ver.minor >= minor,
        None => return ver.minor == minor,
        Some(patch) => patch,
    };

    if cmp.major > 0 {
        if ver.minor != minor {
            return ver.minor > minor;
        } else if ver.patch != patch {
            return ver.patch > patch;
        }
    } else if minor > 0 {
        if ver.minor != minor {
            return false;
        } else if ver.patch != patch {
            return ver.patch > patch;
        }
    } else if ver.minor != minor || ver.patch != patch {
        return false;
    }

    ver.pre >= cmp.pre
}

/// Returns true if the prerelease policy admits a version
pub fn prerelease_admitted(filter: Option<PreReleaseFilter>, version: &Version) -> bool {
    let is_prerelease = !version.pre.is_empty();
    match filter {
        Some(PreReleaseFilter::Only) => is_prerelease,
        Some(PreReleaseFilter::False) => !is_prerelease,
        Some(PreReleaseFilter::True) | None => true,
    }
}

/// Returns true if range matching should admit prerelease versions
pub fn includes_prerelease(filter: Option<PreReleaseFilter>) -> bool {
    !matches!(filter, Some(PreReleaseFilter::False))
}

/// Normalizes, parses and tests a candidate against a constraint and policy.
///
/// Returns the parsed (normalized) version when the candidate is eligible.
pub fn eligible_version(
    candidate: &str,
    constraint: &VersionConstraint,
    filter: Option<PreReleaseFilter>,
) -> Option<Version> {
    let parsed = parse_version(candidate)?;
    if !prerelease_admitted(filter, &parsed) {
        return None;
    }
    if !constraint.matches(&parsed, includes_prerelease(filter)) {
        return None;
    }
    Some(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        parse_version(s).unwrap()
    }

    fn c(s: &str) -> VersionConstraint {
        VersionConstraint::parse(s).unwrap()
    }

    #[test]
    fn test_star_and_latest() {
        assert!(c("*").matches(&v("1.0.0"), false));
        assert!(c("latest").matches(&v("3.1.4"), false));
        assert!(!c("*").matches(&v("5.10.0-SNAPSHOT.123"), false));
        assert!(c("*").matches(&v("5.10.0-SNAPSHOT.123"), true));
    }

    #[test]
    fn test_caret_with_prerelease_admitted() {
        let constraint = c("^5.9.0");
        assert!(constraint.matches(&v("5.10.0-SNAPSHOT.1"), true));
        assert!(!constraint.matches(&v("5.10.0-SNAPSHOT.1"), false));
        assert!(!constraint.matches(&v("5.9.0-SNAPSHOT.1"), true));
        assert!(!constraint.matches(&v("6.0.0"), true));
    }

    #[test]
    fn test_space_separated_range() {
        let constraint = c(">=1.0.0 <2.0.0");
        assert!(constraint.matches(&v("1.5.0"), false));
        assert!(!constraint.matches(&v("2.0.0"), false));
        assert!(constraint.matches(&v("2.0.0-SNAPSHOT.3"), true));
    }

    #[test]
    fn test_detached_operator() {
        let constraint = c(">= 1.2.0");
        assert!(constraint.matches(&v("1.2.0"), false));
        assert!(!constraint.matches(&v("1.1.9"), false));
    }

    #[test]
    fn test_hyphen_range() {
        let constraint = c("1.0.0 - 2.0.0");
        assert!(constraint.matches(&v("2.0.0"), false));
        assert!(!constraint.matches(&v("2.0.1"), false));
    }

    #[test]
    fn test_alternatives() {
        let constraint = c("1.x || 3.x");
        assert!(constraint.matches(&v("1.4.0"), false));
        assert!(constraint.matches(&v("3.0.0"), false));
        assert!(!constraint.matches(&v("2.0.0"), false));
    }

    #[test]
    fn test_bare_version_is_exact_inside_range() {
        let constraint = c("1.2.3 || 2.0.0");
        assert!(constraint.matches(&v("1.2.3"), false));
        assert!(!constraint.matches(&v("1.2.4"), false));
    }

    #[test]
    fn test_bare_prerelease_with_x_is_exact() {
        let constraint = c("1.0.0-next.1 || 2.0.0");
        assert!(constraint.matches(&v("1.0.0-next.1"), true));
        assert!(!constraint.matches(&v("1.5.0"), false));
        assert!(!constraint.matches(&v("1.0.0-next.2"), true));
    }

    #[test]
    fn test_tilde_partial_admits_prerelease() {
        let constraint = c("~5.9");
        assert!(constraint.matches(&v("5.9.3-SNAPSHOT.2"), true));
        assert!(!constraint.matches(&v("5.10.0"), true));
    }

    #[test]
    fn test_snapshot_patch_normalized_for_matching() {
        // 11.0.109900000000247 normalizes to 11.0.0-109900000000247
        let constraint = c("^11.0.0");
        assert!(!constraint.matches(&v("11.0.109900000000247"), true));
        let constraint = c(">=10.0.0");
        assert!(constraint.matches(&v("11.0.109900000000247"), true));
    }

    #[test]
    fn test_invalid_constraint() {
        let err = VersionConstraint::parse(">>1.0").unwrap_err();
        assert_eq!(err.raw, ">>1.0");
        assert!(err.to_string().contains("invalid version constraint"));
    }

    #[test]
    fn test_prerelease_admitted() {
        let pre = v("1.0.0-SNAPSHOT");
        let rel = v("1.0.0");
        assert!(prerelease_admitted(Some(PreReleaseFilter::Only), &pre));
        assert!(!prerelease_admitted(Some(PreReleaseFilter::Only), &rel));
        assert!(!prerelease_admitted(Some(PreReleaseFilter::False), &pre));
        assert!(prerelease_admitted(Some(PreReleaseFilter::False), &rel));
        assert!(prerelease_admitted(Some(PreReleaseFilter::True), &pre));
        assert!(prerelease_admitted(None, &pre));
        assert!(prerelease_admitted(None, &rel));
    }

    #[test]
    fn test_eligible_version() {
        let constraint = c("*");
        assert!(eligible_version("5.9.0", &constraint, Some(PreReleaseFilter::True)).is_some());
        assert!(eligible_version("5.10.0-SNAPSHOT.123", &constraint, None).is_some());
        assert!(
            eligible_version("5.10.0-SNAPSHOT.123", &constraint, Some(PreReleaseFilter::False))
                .is_none()
        );
        assert!(eligible_version("garbage", &constraint, None).is_none());
    }
}
