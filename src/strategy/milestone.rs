use super::{parse_component, VersioningStrategy};
use crate::domain::{ReleaseBranch, ReleaseBranchNumber, ReleaseTag, Version, VersionSource};
use crate::error::{ReleaseFlowError, Result};
use crate::git::CommitInfo;
use regex::Regex;
use std::cmp::Ordering;
use std::sync::LazyLock;
use tracing::debug;

/// `vM.P`, with an optional third component kept for older three part tags
static MILESTONE_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^v(0|[1-9][0-9]*)\.(0|[1-9][0-9]*)(?:\.(0|[1-9][0-9]*))?$")
        .expect("milestone tag pattern is valid")
});

/// Single incrementing milestone counter
///
/// Release branches are named `<prefix><n>` (`R1`, `R2`, ...) and open
/// version `n.0.0`. Release tags are `vN.P`, where `P` counts the releases
/// made from milestone `N` and lands in the minor component.
#[derive(Debug, Clone)]
pub struct MilestoneStrategy {
    prefix: String,
    base_number: u32,
    branch_number: Regex,
}

impl MilestoneStrategy {
    /// Create the strategy for release branches named `<prefix><n>`
    ///
    /// An empty prefix makes release branch numbers bare positive integers.
    pub fn new(prefix: &str, base_number: u32) -> Result<Self> {
        let pattern = format!("^{}([1-9][0-9]*)$", regex::escape(prefix));
        let branch_number = Regex::new(&pattern).map_err(|e| {
            ReleaseFlowError::config(format!("Invalid milestone prefix '{}': {}", prefix, e))
        })?;
        debug!("Milestone release branch pattern: '{}'", pattern);

        Ok(MilestoneStrategy {
            prefix: prefix.to_string(),
            base_number,
            branch_number,
        })
    }
}

fn milestone_tag(source: &VersionSource, side: &str) -> Result<ReleaseTag> {
    match source {
        VersionSource::Tag {
            tag: tag @ ReleaseTag::Milestone { .. },
            ..
        } => Ok(*tag),
        _ => Err(ReleaseFlowError::invariant(format!(
            "Incorrect release tag type ({}): {}",
            side, source
        ))),
    }
}

impl VersioningStrategy for MilestoneStrategy {
    fn kind(&self) -> &'static str {
        "Milestone"
    }

    fn try_parse_release_branch_number(&self, segment: &str) -> Option<ReleaseBranchNumber> {
        let caps = self.branch_number.captures(segment)?;
        let milestone = parse_component(&caps[1])?;

        Some(ReleaseBranchNumber::Milestone {
            prefix: self.prefix.clone(),
            milestone,
        })
    }

    fn try_parse_version_source_from_tag(
        &self,
        tag: &str,
        commit: &CommitInfo,
    ) -> Option<VersionSource> {
        let caps = MILESTONE_TAG.captures(tag)?;
        let milestone = parse_component(&caps[1])?;
        let patch = parse_component(&caps[2])?;

        Some(VersionSource::Tag {
            commit: commit.clone(),
            tag: ReleaseTag::Milestone { milestone, patch },
        })
    }

    fn base_version(&self) -> Version {
        Version::new(self.base_number, 0, 0)
    }

    fn next_primary_version(&self, version: Version) -> Version {
        Version::new(version.major.saturating_add(1), 0, 0)
    }

    fn next_patch_version(&self, version: Version) -> Version {
        Version::new(version.major, version.minor.saturating_add(1), 0)
    }

    fn compare_version_tags(
        &self,
        left: &VersionSource,
        right: &VersionSource,
    ) -> Result<Ordering> {
        let left = milestone_tag(left, "left")?;
        let right = milestone_tag(right, "right")?;
        Ok(left.version().cmp(&right.version()))
    }

    fn create_release_branch(
        &self,
        name: &str,
        fork_point: CommitInfo,
        number: ReleaseBranchNumber,
    ) -> Result<ReleaseBranch> {
        if !matches!(number, ReleaseBranchNumber::Milestone { .. }) {
            return Err(ReleaseFlowError::invariant(format!(
                "Release branch number '{}' is not a milestone",
                number
            )));
        }
        Ok(ReleaseBranch::new(name, fork_point, number))
    }
}
