use crate::domain::{BuildType, Version};
use crate::error::{ReleaseFlowError, Result};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Serialize, Serializer};
use std::sync::LazyLock;

static COMMIT_SHA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9a-f]{40}$").expect("commit sha pattern is valid")
});

/// The computed version of the build, and how it was derived
#[derive(Debug, Clone, PartialEq)]
pub struct BuildVersionInfo {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    /// `None` only for release (tag) builds
    pub pre_release_label: Option<String>,
    pub sha: String,
    pub build_type: BuildType,
    pub branch_name: String,
    pub commit_date: DateTime<Utc>,
    pub commits_since_version_source: usize,
    pub version_source_sha: String,
}

impl BuildVersionInfo {
    /// Create build version info, validating both commit ids.
    ///
    /// # Returns
    /// * `Ok(BuildVersionInfo)` - The record
    /// * `Err` - If `sha` or `version_source_sha` is not 40 lowercase hex digits
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        version: Version,
        pre_release_label: Option<String>,
        sha: impl Into<String>,
        build_type: BuildType,
        branch_name: impl Into<String>,
        commit_date: DateTime<Utc>,
        commits_since_version_source: usize,
        version_source_sha: impl Into<String>,
    ) -> Result<Self> {
        let sha = sha.into();
        let version_source_sha = version_source_sha.into();

        if !COMMIT_SHA.is_match(&sha) {
            return Err(ReleaseFlowError::invariant(format!(
                "Invalid Git hash '{}'",
                sha
            )));
        }
        if !COMMIT_SHA.is_match(&version_source_sha) {
            return Err(ReleaseFlowError::invariant(format!(
                "Invalid Git hash '{}' for version source",
                version_source_sha
            )));
        }

        Ok(BuildVersionInfo {
            major: version.major,
            minor: version.minor,
            patch: version.patch,
            pre_release_label,
            sha,
            build_type,
            branch_name: branch_name.into(),
            commit_date,
            commits_since_version_source,
            version_source_sha,
        })
    }

    pub fn version(&self) -> Version {
        Version::new(self.major, self.minor, self.patch)
    }

    pub fn major_minor(&self) -> String {
        format!("{}.{}", self.major, self.minor)
    }

    pub fn major_minor_patch(&self) -> String {
        format!("{}.{}.{}", self.major, self.minor, self.patch)
    }

    pub fn short_sha(&self) -> &str {
        &self.sha[..7]
    }

    /// Full version string: `M.m.p` for releases, `M.m.p-<label>.<commits>` otherwise
    pub fn sem_ver(&self) -> String {
        if self.build_type == BuildType::Release {
            return self.major_minor_patch();
        }
        format!(
            "{}-{}.{}",
            self.major_minor_patch(),
            self.pre_release_label.as_deref().unwrap_or_default(),
            self.commits_since_version_source
        )
    }

    /// Parse [`Self::sem_ver`] into a `semver::Version`.
    ///
    /// Fails when the pre-release label cannot form a valid identifier
    /// (for example a working branch whose label sanitized to nothing).
    pub fn to_semver(&self) -> Result<semver::Version> {
        let mut version: semver::Version = self.version().into();
        if self.build_type == BuildType::Release {
            return Ok(version);
        }

        let pre = format!(
            "{}.{}",
            self.pre_release_label.as_deref().unwrap_or_default(),
            self.commits_since_version_source
        );
        version.pre = semver::Prerelease::new(&pre).map_err(|e| {
            ReleaseFlowError::input(format!(
                "'{}' is not a valid semantic version: {}",
                self.sem_ver(),
                e
            ))
        })?;
        Ok(version)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BuildVersionInfoJson<'a> {
    major: u32,
    minor: u32,
    patch: u32,
    pre_release_label: Option<&'a str>,
    sha: &'a str,
    build_type: BuildType,
    branch_name: &'a str,
    commit_date: DateTime<Utc>,
    commits_since_version_source: usize,
    version_source_sha: &'a str,
    major_minor: String,
    major_minor_patch: String,
    short_sha: &'a str,
    sem_ver: String,
}

impl Serialize for BuildVersionInfo {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        BuildVersionInfoJson {
            major: self.major,
            minor: self.minor,
            patch: self.patch,
            pre_release_label: self.pre_release_label.as_deref(),
            sha: &self.sha,
            build_type: self.build_type,
            branch_name: &self.branch_name,
            commit_date: self.commit_date,
            commits_since_version_source: self.commits_since_version_source,
            version_source_sha: &self.version_source_sha,
            major_minor: self.major_minor(),
            major_minor_patch: self.major_minor_patch(),
            short_sha: self.short_sha(),
            sem_ver: self.sem_ver(),
        }
        .serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const SHA: &str = "01c3b44c08b3793dea4bedbdd802c9b2c24bd19f";
    const SOURCE_SHA: &str = "8d7a9d4d1c3e37ab3f4b2f1b8c6f0b1e2a3d4c5b";

    fn info(build_type: BuildType, label: Option<&str>) -> BuildVersionInfo {
        BuildVersionInfo::new(
            Version::new(1, 2, 3),
            label.map(str::to_string),
            SHA,
            build_type,
            "feature/x",
            Utc.timestamp_opt(1581068232, 0).unwrap(),
            4,
            SOURCE_SHA,
        )
        .unwrap()
    }

    #[test]
    fn test_derived_fields() {
        let i = info(BuildType::WorkingBranch, Some("x"));
        assert_eq!(i.major_minor(), "1.2");
        assert_eq!(i.major_minor_patch(), "1.2.3");
        assert_eq!(i.short_sha(), "01c3b44");
        assert_eq!(i.sem_ver(), "1.2.3-x.4");
    }

    #[test]
    fn test_release_semver_has_no_suffix() {
        let i = info(BuildType::Release, None);
        assert_eq!(i.sem_ver(), "1.2.3");
        assert_eq!(i.to_semver().unwrap(), semver::Version::new(1, 2, 3));
    }

    #[test]
    fn test_to_semver_with_prerelease() {
        let i = info(BuildType::PullRequest, Some("pr.43"));
        let v = i.to_semver().unwrap();
        assert_eq!(v.pre.as_str(), "pr.43.4");
        assert_eq!(v.major, 1);
        assert_eq!(v.patch, 3);
    }

    #[test]
    fn test_to_semver_rejects_empty_label() {
        let i = info(BuildType::WorkingBranch, Some(""));
        let err = i.to_semver().unwrap_err();
        assert!(err.is_input_error());
        assert!(err.message().starts_with("'1.2.3-.4' is not a valid semantic version"));
    }

    #[test]
    fn test_rejects_invalid_sha() {
        for bad in ["abc", "01C3B44C08B3793DEA4BEDBDD802C9B2C24BD19F", &"g".repeat(40)] {
            let res = BuildVersionInfo::new(
                Version::new(0, 0, 0),
                None,
                bad,
                BuildType::Release,
                "tags/v1",
                Utc::now(),
                0,
                SOURCE_SHA,
            );
            assert!(matches!(res, Err(ReleaseFlowError::Invariant(_))), "{}", bad);
        }
    }

    #[test]
    fn test_rejects_invalid_version_source_sha() {
        let res = BuildVersionInfo::new(
            Version::new(0, 0, 0),
            None,
            SHA,
            BuildType::Release,
            "tags/v1",
            Utc::now(),
            0,
            "",
        );
        assert!(res.is_err());
    }

    #[test]
    fn test_json_shape() {
        let i = info(BuildType::WorkingBranch, Some("x"));
        let json = serde_json::to_value(&i).unwrap();
        assert_eq!(json["major"], 1);
        assert_eq!(json["preReleaseLabel"], "x");
        assert_eq!(json["buildType"], "working-branch");
        assert_eq!(json["branchName"], "feature/x");
        assert_eq!(json["commitsSinceVersionSource"], 4);
        assert_eq!(json["versionSourceSha"], SOURCE_SHA);
        assert_eq!(json["majorMinorPatch"], "1.2.3");
        assert_eq!(json["shortSha"], "01c3b44");
        assert_eq!(json["semVer"], "1.2.3-x.4");
        assert_eq!(json["commitDate"], "2020-02-07T09:37:12Z");
    }

    #[test]
    fn test_json_null_label_for_release() {
        let i = info(BuildType::Release, None);
        let json = serde_json::to_value(&i).unwrap();
        assert!(json["preReleaseLabel"].is_null());
    }
}
