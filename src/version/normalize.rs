//! Version string normalization
//!
//! UI module snapshot builds are published with an oversized numeric patch
//! (`11.0.109900000000247`) instead of a prerelease suffix. They are rewritten
//! to `<major>.<minor>.0-<patch>` before any semver parsing so ordering and
//! range inclusion treat them as prereleases.

use regex::Regex;
use semver::Version;
use std::cmp::Ordering;
use std::sync::LazyLock;

/// Minimum number of patch digits marking a snapshot-encoded version
const SNAPSHOT_PATCH_DIGITS: usize = 5;

/// Plain `major.minor.patch` with a purely numeric patch
static PLAIN_VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\.(\d+)\.(\d+)$").unwrap());

/// Rewrites snapshot-encoded versions into semver prerelease form.
///
/// Versions already carrying `-` or `+`, or whose patch is not numeric or has
/// fewer than five digits, are returned unchanged. Never apply this to range
/// expressions.
pub fn normalize_version(version: &str) -> String {
    if version.contains('-') || version.contains('+') {
        return version.to_string();
    }

    match PLAIN_VERSION_RE.captures(version) {
        Some(caps) if caps[3].len() >= SNAPSHOT_PATCH_DIGITS => {
            format!("{}.{}.0-{}", &caps[1], &caps[2], &caps[3])
        }
        _ => version.to_string(),
    }
}

/// Parses a version after normalization
pub fn parse_version(version: &str) -> Option<Version> {
    Version::parse(normalize_version(version.trim()).as_str()).ok()
}

/// Returns true if the string is an exact semantic version (after normalization)
pub fn is_exact_version(version: &str) -> bool {
    parse_version(version).is_some()
}

/// Returns true if the version parses and carries a prerelease component
pub fn is_prerelease(version: &str) -> bool {
    parse_version(version)
        .map(|v| !v.pre.is_empty())
        .unwrap_or(false)
}

/// Compares two version strings by parsed semver; unparsable versions sort first
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    match (parse_version(a), parse_version(b)) {
        (Some(va), Some(vb)) => va.cmp(&vb),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => a.cmp(b),
    }
}

/// Sorts version strings descending by parsed semver, dropping unparsable ones
pub fn sort_descending(versions: Vec<String>) -> Vec<String> {
    let mut parsed: Vec<(Version, String)> = versions
        .into_iter()
        .filter_map(|v| parse_version(&v).map(|p| (p, v)))
        .collect();
    parsed.sort_by(|a, b| b.0.cmp(&a.0));
    parsed.into_iter().map(|(_, v)| v).collect()
}

/// Increments the patch component, keeping prerelease and build metadata.
///
/// Returns `None` when the version is not a well-formed semver.
pub fn increment_patch(version: &str) -> Option<String> {
    let mut parsed = Version::parse(version.trim()).ok()?;
    parsed.patch += 1;
    Some(parsed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_snapshot_patch() {
        assert_eq!(
            normalize_version("11.0.109900000000247"),
            "11.0.0-109900000000247"
        );
        assert_eq!(normalize_version("2.1.10000"), "2.1.0-10000");
    }

    #[test]
    fn test_normalize_leaves_short_patch() {
        assert_eq!(normalize_version("19.6.361"), "19.6.361");
        assert_eq!(normalize_version("1.0.9999"), "1.0.9999");
    }

    #[test]
    fn test_normalize_leaves_prerelease_and_build() {
        assert_eq!(
            normalize_version("19.6.0-SNAPSHOT.361"),
            "19.6.0-SNAPSHOT.361"
        );
        assert_eq!(normalize_version("1.0.123456+build"), "1.0.123456+build");
    }

    #[test]
    fn test_normalize_leaves_non_numeric() {
        assert_eq!(normalize_version("1.0.x"), "1.0.x");
        assert_eq!(normalize_version("latest"), "latest");
        assert_eq!(normalize_version("^1.0.12345"), "^1.0.12345");
    }

    #[test]
    fn test_parse_version_normalized() {
        let v = parse_version("11.0.109900000000247").unwrap();
        assert_eq!(v.major, 11);
        assert_eq!(v.patch, 0);
        assert_eq!(v.pre.as_str(), "109900000000247");
        assert!(parse_version("not-a-version").is_none());
    }

    #[test]
    fn test_is_exact_version() {
        assert!(is_exact_version("1.2.3"));
        assert!(is_exact_version("5.10.0-SNAPSHOT.123"));
        assert!(!is_exact_version("^1.2.3"));
        assert!(!is_exact_version("latest"));
        assert!(!is_exact_version("1.2"));
    }

    #[test]
    fn test_is_prerelease() {
        assert!(is_prerelease("1.0.0-SNAPSHOT"));
        assert!(is_prerelease("11.0.109900000000247"));
        assert!(!is_prerelease("1.0.0"));
        assert!(!is_prerelease("garbage"));
    }

    #[test]
    fn test_snapshot_sorts_below_release() {
        assert_eq!(
            compare_versions("11.0.109900000000247", "11.0.0"),
            Ordering::Less
        );
        assert_eq!(compare_versions("1.10.0", "1.9.0"), Ordering::Greater);
    }

    #[test]
    fn test_sort_descending_drops_unparsable() {
        let sorted = sort_descending(vec![
            "1.0.0".to_string(),
            "bogus".to_string(),
            "2.0.0".to_string(),
            "1.5.0-SNAPSHOT".to_string(),
        ]);
        assert_eq!(sorted, vec!["2.0.0", "1.5.0-SNAPSHOT", "1.0.0"]);
    }

    #[test]
    fn test_increment_patch() {
        assert_eq!(increment_patch("1.0.0").as_deref(), Some("1.0.1"));
        assert_eq!(
            increment_patch("2.3.9-SNAPSHOT.4").as_deref(),
            Some("2.3.10-SNAPSHOT.4")
        );
        assert_eq!(increment_patch("1.0"), None);
    }
}
