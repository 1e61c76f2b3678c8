//! Versioning strategies
//!
//! A strategy owns every rule that depends on how release branches are
//! numbered: branch number parsing, release tag parsing, the base version
//! floor and the increment rules. Exactly one strategy is selected per run,
//! from the `[strategy]` section of the configuration.

pub mod milestone;
pub mod sem_ver;

pub use milestone::MilestoneStrategy;
pub use sem_ver::SemVerStrategy;

use crate::config::StrategyOptions;
use crate::domain::{ReleaseBranch, ReleaseBranchNumber, Version, VersionSource};
use crate::error::Result;
use crate::git::CommitInfo;
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::info;

/// Release numbering rules
///
/// ## Increments
///
/// "Primary" is the component a new release branch advances: the major
/// number for milestones (`R2` opens 2.0.0, `R3` opens 3.0.0) but the minor
/// number for dotted branches (`1.1` opens 1.1.0, `1.2` opens 1.2.0).
/// "Patch" is the component a release tag advances on its own branch.
pub trait VersioningStrategy: Send + Sync {
    /// Strategy name as written in the configuration
    fn kind(&self) -> &'static str;

    /// Parse the part of a release branch name after the release prefix
    ///
    /// # Returns
    /// * `Some(ReleaseBranchNumber)` - If `segment` is a valid number for this strategy
    /// * `None` - Otherwise
    fn try_parse_release_branch_number(&self, segment: &str) -> Option<ReleaseBranchNumber>;

    /// Parse a tag name into a version source anchored at `commit`
    ///
    /// Tags that are not release tags of this strategy yield `None`.
    fn try_parse_version_source_from_tag(
        &self,
        tag: &str,
        commit: &CommitInfo,
    ) -> Option<VersionSource>;

    /// Lowest version a non-release build may carry
    fn base_version(&self) -> Version;

    /// Version opened by the next release branch after `version`
    fn next_primary_version(&self, version: Version) -> Version;

    /// Version of the next release on the branch that released `version`
    fn next_patch_version(&self, version: Version) -> Version;

    /// Order two release tags of this strategy
    ///
    /// # Returns
    /// * `Ok(Ordering)` - The ordering of the two tag versions
    /// * `Err` - Invariant error if either source is not a tag of this strategy
    fn compare_version_tags(&self, left: &VersionSource, right: &VersionSource)
        -> Result<Ordering>;

    /// Create a release branch record
    ///
    /// # Returns
    /// * `Ok(ReleaseBranch)` - The branch
    /// * `Err` - Invariant error if `number` was not produced by this strategy
    fn create_release_branch(
        &self,
        name: &str,
        fork_point: CommitInfo,
        number: ReleaseBranchNumber,
    ) -> Result<ReleaseBranch>;
}

/// Build the strategy selected by the configuration
///
/// # Errors
/// Configuration error if the options are invalid for the selected kind
/// (for example a SemVer `base_number` that is not `major[.minor]`).
pub fn from_options(options: &StrategyOptions) -> Result<Arc<dyn VersioningStrategy>> {
    let strategy: Arc<dyn VersioningStrategy> = match options {
        StrategyOptions::Milestone {
            prefix,
            base_number,
        } => Arc::new(MilestoneStrategy::new(prefix, *base_number)?),
        StrategyOptions::SemVer { base_number } => Arc::new(SemVerStrategy::new(base_number)?),
    };

    info!("Using {} strategy", strategy.kind());
    Ok(strategy)
}

/// Parse a decimal component without leading zeros that fits in `u32`
fn parse_component(text: &str) -> Option<u32> {
    text.parse().ok()
}
