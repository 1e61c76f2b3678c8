use crate::config::Options;
use crate::domain::{Branch, ReleaseBranch, VersionSource};
use crate::error::Result;
use crate::git::{CommitInfo, Repository};
use crate::strategy::VersioningStrategy;
use std::cell::OnceCell;
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{debug, warn};

/// Release branch discovery and tag lookups on top of a [Repository]
///
/// Release branches are listed once and cached for the lifetime of the
/// analyzer; one analyzer serves a single version calculation.
pub struct ReleaseBranchAnalyzer<'a, R: Repository> {
    repo: &'a R,
    strategy: Arc<dyn VersioningStrategy>,
    options: Options,
    release_branches: OnceCell<Vec<ReleaseBranch>>,
}

impl<'a, R: Repository> ReleaseBranchAnalyzer<'a, R> {
    pub fn new(repo: &'a R, strategy: Arc<dyn VersioningStrategy>, options: Options) -> Self {
        ReleaseBranchAnalyzer {
            repo,
            strategy,
            options,
            release_branches: OnceCell::new(),
        }
    }

    /// All release branches forked from trunk, highest number first
    ///
    /// Branches whose name does not parse as a release branch number are
    /// skipped with a warning. Branches sharing no history with trunk are
    /// skipped silently.
    pub fn release_branches(&self) -> Result<&[ReleaseBranch]> {
        if let Some(branches) = self.release_branches.get() {
            return Ok(branches);
        }
        let branches = self.discover_release_branches()?;
        Ok(self.release_branches.get_or_init(|| branches))
    }

    fn discover_release_branches(&self) -> Result<Vec<ReleaseBranch>> {
        let prefix = self.options.full_release_branch_prefix();
        let trunk = self.options.full_trunk_branch_name();
        debug!("Looking for branches with prefix {}", prefix);

        let mut release_branches = Vec::new();
        for branch in self.repo.list_branches()? {
            let Some(segment) = branch.strip_prefix(prefix.as_str()) else {
                continue;
            };
            debug!("Attempting to parse branch '{}' as release branch", segment);

            let Some(number) = self.strategy.try_parse_release_branch_number(segment) else {
                warn!("Branch '{}' has an invalid release number", branch);
                continue;
            };

            let Some(fork_point) = self.repo.get_fork_point(&branch, &trunk)? else {
                debug!("Branch '{}' does not fork from {}, ignoring", branch, trunk);
                continue;
            };

            release_branches.push(
                self.strategy
                    .create_release_branch(&branch, fork_point, number)?,
            );
        }

        let mut mismatch = None;
        release_branches.sort_by(|left, right| {
            right.compare_with(left).unwrap_or_else(|e| {
                mismatch.get_or_insert(e);
                Ordering::Equal
            })
        });
        if let Some(e) = mismatch {
            return Err(e);
        }

        debug!(
            "Release branches: [{}]",
            release_branches
                .iter()
                .map(|b| b.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(release_branches)
    }

    /// Exact name lookup among the discovered release branches
    pub fn release_branch(&self, name: &str) -> Result<Option<&ReleaseBranch>> {
        Ok(self.release_branches()?.iter().find(|b| b.name == name))
    }

    /// The highest release branch whose fork point is an ancestor of `reference`
    pub fn try_get_highest_reachable_release_branch(
        &self,
        reference: &str,
    ) -> Result<Option<&ReleaseBranch>> {
        for branch in self.release_branches()? {
            if self.repo.is_ancestor(&branch.initial_commit.sha, reference)? {
                return Ok(Some(branch));
            }
        }

        debug!("No reachable release branches found from {}", reference);
        Ok(None)
    }

    /// The highest release tag on `branch`, as a version source
    ///
    /// Tags that are not release tags of the active strategy are ignored.
    pub fn highest_tagged_version(&self, branch: &Branch) -> Result<Option<VersionSource>> {
        let mut highest: Option<VersionSource> = None;

        for commit in self.repo.get_tagged_commits_on_branch(branch)? {
            for tag in &commit.tags {
                let Some(source) = self.strategy.try_parse_version_source_from_tag(tag, &commit)
                else {
                    continue;
                };
                let is_higher = match &highest {
                    Some(current) => {
                        self.strategy.compare_version_tags(&source, current)? == Ordering::Greater
                    }
                    None => true,
                };
                if is_higher {
                    highest = Some(source);
                }
            }
        }

        Ok(highest)
    }

    /// The `parent`-th parent of `commit`
    pub fn merge_parent(&self, commit: &CommitInfo, parent: usize) -> Result<CommitInfo> {
        self.repo.get_commit(&commit.sha, parent)
    }
}
