use crate::domain::Version;
use crate::git::CommitInfo;
use std::cmp::Ordering;
use std::fmt;

/// A parsed release tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseTag {
    /// `vM.P` (or legacy `vM.P.x`): milestone M, patch P
    Milestone { milestone: u32, patch: u32 },
    /// `vX.Y.Z`
    SemVer { major: u32, minor: u32, patch: u32 },
}

impl ReleaseTag {
    pub fn version(&self) -> Version {
        match *self {
            ReleaseTag::Milestone { milestone, patch } => Version::new(milestone, patch, 0),
            ReleaseTag::SemVer {
                major,
                minor,
                patch,
            } => Version::new(major, minor, patch),
        }
    }
}

impl fmt::Display for ReleaseTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReleaseTag::Milestone { milestone, patch } => write!(f, "v{}.{}", milestone, patch),
            ReleaseTag::SemVer {
                major,
                minor,
                patch,
            } => write!(f, "v{}.{}.{}", major, minor, patch),
        }
    }
}

/// The commit, and the rule, from which a build's version is derived.
///
/// Every variant carries exactly one anchor commit. Ordering between
/// version sources is the ordering of their versions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSource {
    /// Root commit of the repository, version 0.0.0
    InitialCommit { commit: CommitInfo },
    /// Fork point of a release branch that has no release tag yet
    ReleaseBranch {
        commit: CommitInfo,
        branch_name: String,
        version: Version,
    },
    /// A commit carrying a release tag
    Tag { commit: CommitInfo, tag: ReleaseTag },
}

impl VersionSource {
    /// The anchor commit
    pub fn commit(&self) -> &CommitInfo {
        match self {
            VersionSource::InitialCommit { commit }
            | VersionSource::ReleaseBranch { commit, .. }
            | VersionSource::Tag { commit, .. } => commit,
        }
    }

    pub fn version(&self) -> Version {
        match self {
            VersionSource::InitialCommit { .. } => Version::new(0, 0, 0),
            VersionSource::ReleaseBranch { version, .. } => *version,
            VersionSource::Tag { tag, .. } => tag.version(),
        }
    }

    pub fn is_tag(&self) -> bool {
        matches!(self, VersionSource::Tag { .. })
    }

    pub fn is_release_branch(&self) -> bool {
        matches!(self, VersionSource::ReleaseBranch { .. })
    }

    pub fn compare(&self, other: &VersionSource) -> Ordering {
        self.version().cmp(&other.version())
    }
}

impl fmt::Display for VersionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionSource::InitialCommit { .. } => write!(
                f,
                "initial repository commit, version = {}",
                self.version()
            ),
            VersionSource::ReleaseBranch { branch_name, .. } => {
                write!(f, "branch '{}', version = {}", branch_name, self.version())
            }
            VersionSource::Tag { tag, .. } => {
                write!(f, "release tag '{}', version = {}", tag, self.version())
            }
        }
    }
}
