use crate::domain::Version;
use crate::error::{ReleaseFlowError, Result};
use crate::git::CommitInfo;
use std::cmp::Ordering;
use std::fmt;

/// The parsed number part of a release branch name.
///
/// Which variant is produced depends on the active versioning strategy;
/// numbers from different strategies never compare.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseBranchNumber {
    /// e.g. `R2` (prefix `R`, milestone 2)
    Milestone { prefix: String, milestone: u32 },
    /// e.g. `1.4`
    SemVer { major: u32, minor: u32 },
}

impl ReleaseBranchNumber {
    /// Compare two branch numbers of the same strategy.
    ///
    /// # Returns
    /// * `Ok(Ordering)` - The ordering of the two numbers
    /// * `Err` - Invariant error if the numbers belong to different strategies
    pub fn compare(&self, other: &ReleaseBranchNumber) -> Result<Ordering> {
        match (self, other) {
            (
                ReleaseBranchNumber::Milestone { milestone: a, .. },
                ReleaseBranchNumber::Milestone { milestone: b, .. },
            ) => Ok(a.cmp(b)),
            (
                ReleaseBranchNumber::SemVer {
                    major: a_major,
                    minor: a_minor,
                },
                ReleaseBranchNumber::SemVer {
                    major: b_major,
                    minor: b_minor,
                },
            ) => Ok((a_major, a_minor).cmp(&(b_major, b_minor))),
            _ => Err(ReleaseFlowError::invariant(format!(
                "Cannot compare release branch numbers '{}' and '{}' from different strategies",
                self, other
            ))),
        }
    }

    /// The version a release branch opens before anything is tagged on it
    pub fn version(&self) -> Version {
        match self {
            ReleaseBranchNumber::Milestone { milestone, .. } => Version::new(*milestone, 0, 0),
            ReleaseBranchNumber::SemVer { major, minor } => Version::new(*major, *minor, 0),
        }
    }
}

impl fmt::Display for ReleaseBranchNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReleaseBranchNumber::Milestone { prefix, milestone } => {
                write!(f, "{}{}", prefix, milestone)
            }
            ReleaseBranchNumber::SemVer { major, minor } => write!(f, "{}.{}", major, minor),
        }
    }
}

/// A named branch together with the commit it started from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    pub name: String,
    /// Fork point from the parent branch (shared by both histories)
    pub initial_commit: CommitInfo,
}

/// A release branch discovered in the repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseBranch {
    pub name: String,
    /// Fork point from trunk
    pub initial_commit: CommitInfo,
    pub number: ReleaseBranchNumber,
}

impl ReleaseBranch {
    /// Create a new release branch
    pub fn new(
        name: impl Into<String>,
        initial_commit: CommitInfo,
        number: ReleaseBranchNumber,
    ) -> Self {
        ReleaseBranch {
            name: name.into(),
            initial_commit,
            number,
        }
    }

    /// Order release branches by their number
    pub fn compare_with(&self, other: &ReleaseBranch) -> Result<Ordering> {
        self.number.compare(&other.number)
    }

    /// View this release branch as a plain branch
    pub fn as_branch(&self) -> Branch {
        Branch {
            name: self.name.clone(),
            initial_commit: self.initial_commit.clone(),
        }
    }
}
