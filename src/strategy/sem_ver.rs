use super::{parse_component, VersioningStrategy};
use crate::domain::{ReleaseBranch, ReleaseBranchNumber, ReleaseTag, Version, VersionSource};
use crate::error::{ReleaseFlowError, Result};
use crate::git::CommitInfo;
use regex::Regex;
use std::cmp::Ordering;
use std::sync::LazyLock;

static BRANCH_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(0|[1-9][0-9]*)(?:\.(0|[1-9][0-9]*))?$").expect("branch number pattern is valid")
});

static SEMVER_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^v(0|[1-9][0-9]*)\.(0|[1-9][0-9]*)\.(0|[1-9][0-9]*)$")
        .expect("semver tag pattern is valid")
});

fn parse_branch_number(segment: &str) -> Option<ReleaseBranchNumber> {
    let caps = BRANCH_NUMBER.captures(segment)?;
    let major = parse_component(&caps[1])?;
    let minor = match caps.get(2) {
        Some(m) => parse_component(m.as_str())?,
        None => 0,
    };
    Some(ReleaseBranchNumber::SemVer { major, minor })
}

/// Dotted `major.minor` release branches with `vX.Y.Z` release tags
#[derive(Debug, Clone)]
pub struct SemVerStrategy {
    base: Version,
}

impl SemVerStrategy {
    /// Create the strategy with a `major[.minor]` base number
    ///
    /// # Errors
    /// Configuration error if `base_number` is not a valid release branch number.
    pub fn new(base_number: &str) -> Result<Self> {
        let base = parse_branch_number(base_number)
            .map(|n| n.version())
            .ok_or_else(|| {
                ReleaseFlowError::config(format!(
                    "Invalid base_number '{}' in options",
                    base_number
                ))
            })?;
        Ok(SemVerStrategy { base })
    }
}

fn semver_tag(source: &VersionSource, side: &str) -> Result<ReleaseTag> {
    match source {
        VersionSource::Tag {
            tag: tag @ ReleaseTag::SemVer { .. },
            ..
        } => Ok(*tag),
        _ => Err(ReleaseFlowError::invariant(format!(
            "Incorrect release tag type ({}): {}",
            side, source
        ))),
    }
}

impl VersioningStrategy for SemVerStrategy {
    fn kind(&self) -> &'static str {
        "SemVer"
    }

    fn try_parse_release_branch_number(&self, segment: &str) -> Option<ReleaseBranchNumber> {
        parse_branch_number(segment)
    }

    fn try_parse_version_source_from_tag(
        &self,
        tag: &str,
        commit: &CommitInfo,
    ) -> Option<VersionSource> {
        let caps = SEMVER_TAG.captures(tag)?;
        Some(VersionSource::Tag {
            commit: commit.clone(),
            tag: ReleaseTag::SemVer {
                major: parse_component(&caps[1])?,
                minor: parse_component(&caps[2])?,
                patch: parse_component(&caps[3])?,
            },
        })
    }

    fn base_version(&self) -> Version {
        self.base
    }

    fn next_primary_version(&self, version: Version) -> Version {
        Version::new(version.major, version.minor.saturating_add(1), 0)
    }

    fn next_patch_version(&self, version: Version) -> Version {
        Version::new(version.major, version.minor, version.patch.saturating_add(1))
    }

    fn compare_version_tags(
        &self,
        left: &VersionSource,
        right: &VersionSource,
    ) -> Result<Ordering> {
        let left = semver_tag(left, "left")?;
        let right = semver_tag(right, "right")?;
        Ok(left.version().cmp(&right.version()))
    }

    fn create_release_branch(
        &self,
        name: &str,
        fork_point: CommitInfo,
        number: ReleaseBranchNumber,
    ) -> Result<ReleaseBranch> {
        if !matches!(number, ReleaseBranchNumber::SemVer { .. }) {
            return Err(ReleaseFlowError::invariant(format!(
                "Release branch number '{}' is not major.minor",
                number
            )));
        }
        Ok(ReleaseBranch::new(name, fork_point, number))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strategy() -> SemVerStrategy {
        SemVerStrategy::new("0.0").unwrap()
    }

    fn commit() -> CommitInfo {
        CommitInfo::for_sha("2".repeat(40))
    }

    fn tag_version(tag: &str) -> Option<Version> {
        strategy()
            .try_parse_version_source_from_tag(tag, &commit())
            .map(|vs| vs.version())
    }

    #[test]
    fn test_parse_release_branch_number() {
        let s = strategy();
        assert_eq!(
            s.try_parse_release_branch_number("1.4"),
            Some(ReleaseBranchNumber::SemVer { major: 1, minor: 4 })
        );
        assert_eq!(
            s.try_parse_release_branch_number("0.10"),
            Some(ReleaseBranchNumber::SemVer {
                major: 0,
                minor: 10
            })
        );
    }

    #[test]
    fn test_minor_defaults_to_zero() {
        assert_eq!(
            strategy().try_parse_release_branch_number("3"),
            Some(ReleaseBranchNumber::SemVer { major: 3, minor: 0 })
        );
    }

    #[test]
    fn test_parse_release_branch_number_rejects_invalid() {
        let s = strategy();
        for segment in ["01", "1.01", "1.", ".1", "1.2.3", "v1.2", "R1", "", "1.99999999999"] {
            assert!(
                s.try_parse_release_branch_number(segment).is_none(),
                "{} should not parse",
                segment
            );
        }
    }

    #[test]
    fn test_parse_tags() {
        assert_eq!(tag_version("v1.2.3"), Some(Version::new(1, 2, 3)));
        assert_eq!(tag_version("v0.0.0"), Some(Version::new(0, 0, 0)));
        assert_eq!(tag_version("v10.20.30"), Some(Version::new(10, 20, 30)));
    }

    #[test]
    fn test_parse_tags_rejects_invalid() {
        for tag in ["v1.2", "1.2.3", "v01.2.3", "v1.02.3", "v1.2.03", "v1.2.3-beta", "v1.2.3.4"] {
            assert_eq!(tag_version(tag), None, "{} should not parse", tag);
        }
    }

    #[test]
    fn test_tag_round_trip() {
        for tag in ["v1.0.0", "v2.11.4"] {
            let v = tag_version(tag).unwrap();
            assert_eq!(tag_version(&format!("v{}", v)), Some(v));
        }
    }

    #[test]
    fn test_increments_bump_minor_then_patch() {
        let s = strategy();
        assert_eq!(
            s.next_primary_version(Version::new(1, 1, 3)),
            Version::new(1, 2, 0)
        );
        assert_eq!(
            s.next_patch_version(Version::new(1, 1, 3)),
            Version::new(1, 1, 4)
        );
    }

    #[test]
    fn test_base_version() {
        assert_eq!(
            SemVerStrategy::new("1.1").unwrap().base_version(),
            Version::new(1, 1, 0)
        );
        assert_eq!(
            SemVerStrategy::new("2").unwrap().base_version(),
            Version::new(2, 0, 0)
        );
    }

    #[test]
    fn test_invalid_base_number() {
        for base in ["", "x", "1.2.3", "01"] {
            let err = SemVerStrategy::new(base).unwrap_err();
            assert!(matches!(err, ReleaseFlowError::Config(_)), "{}", base);
        }
    }

    #[test]
    fn test_compare_version_tags_rejects_milestone_tags() {
        let s = strategy();
        let semver = s
            .try_parse_version_source_from_tag("v1.0.0", &commit())
            .unwrap();
        let milestone = VersionSource::Tag {
            commit: commit(),
            tag: ReleaseTag::Milestone {
                milestone: 1,
                patch: 0,
            },
        };
        assert_eq!(
            s.compare_version_tags(&semver, &semver).unwrap(),
            Ordering::Equal
        );
        assert!(s.compare_version_tags(&milestone, &semver).is_err());
    }
}
