//! Git query abstraction layer
//!
//! The version calculation only ever reads the repository. Everything it
//! needs to know about commits, branches and tags goes through the
//! [Repository] trait, which has two implementations:
//!
//! - [repository::Git2Repository]: a real repository, read through `git2`
//! - [mock::MockRepository]: an in-memory commit graph for tests
//!
//! # Usage
//!
//! ```rust
//! # use release_flow::git::Repository;
//! # fn example<R: Repository>(repo: &R) -> release_flow::error::Result<()> {
//! let head = repo.get_commit("HEAD", 0)?;
//! let root = repo.get_initial_commit()?;
//! let distance = repo.count_commits(&head.sha, &root.sha)?;
//! # Ok(())
//! # }
//! ```

pub mod mock;
pub mod repository;

pub use mock::MockRepository;
pub use repository::Git2Repository;

use crate::domain::Branch;
use crate::error::Result;
use chrono::{DateTime, Utc};

/// A commit together with the refs that decorate it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    /// Full 40 character commit id
    pub sha: String,
    /// Committer date
    pub date: DateTime<Utc>,
    /// Tag names pointing (after peeling) at this commit
    pub tags: Vec<String>,
    /// Branch names pointing at this commit (`origin/...` for remote-tracking branches)
    pub branches: Vec<String>,
    /// HEAD points at this commit
    pub is_head: bool,
    /// HEAD points at this commit without a branch
    pub is_detached_head: bool,
}

impl CommitInfo {
    /// Undecorated commit info carrying only an id
    pub fn for_sha(sha: impl Into<String>) -> Self {
        CommitInfo {
            sha: sha.into(),
            date: DateTime::<Utc>::UNIX_EPOCH,
            tags: Vec::new(),
            branches: Vec::new(),
            is_head: false,
            is_detached_head: false,
        }
    }
}

/// Read-only git queries used by the version calculation
///
/// All refs are accepted in any form git itself accepts for the backend:
/// commit ids, branch names (`master`, `origin/master`), full ref names
/// (`refs/heads/master`) and `HEAD`.
///
/// ## Thread Safety
///
/// All implementors must be `Send + Sync` to allow safe sharing across threads.
///
/// ## Error Handling
///
/// Failures of the underlying repository surface as
/// [crate::error::ReleaseFlowError::Git] or
/// [crate::error::ReleaseFlowError::Vcs].
pub trait Repository: Send + Sync {
    /// List branch names
    ///
    /// Local branch names, or `origin/<name>` remote-tracking names when the
    /// repository was opened for origin branches. Symbolic `HEAD` refs are
    /// never included.
    fn list_branches(&self) -> Result<Vec<String>>;

    /// Get a commit, or one of its parents
    ///
    /// # Arguments
    /// * `reference` - The ref to resolve
    /// * `parent` - `0` for the commit itself, `n > 0` for its n-th parent
    ///
    /// # Returns
    /// * `Ok(CommitInfo)` - The commit with its decorations
    /// * `Err` - If the ref or the requested parent does not exist
    fn get_commit(&self, reference: &str, parent: usize) -> Result<CommitInfo>;

    /// Returns whether `ancestor` is an ancestor of (or equal to) `descendant`
    fn is_ancestor(&self, ancestor: &str, descendant: &str) -> Result<bool>;

    /// Count commits reachable from `from` but not from `to_exclusive`
    fn count_commits(&self, from: &str, to_exclusive: &str) -> Result<usize>;

    /// Get the merge base of two refs
    ///
    /// # Returns
    /// * `Ok(Some(CommitInfo))` - The best common ancestor
    /// * `Ok(None)` - If the two histories share no commit
    /// * `Err` - If either ref does not exist
    fn get_fork_point(&self, reference: &str, other: &str) -> Result<Option<CommitInfo>>;

    /// Get the root commit of the history leading to HEAD
    fn get_initial_commit(&self) -> Result<CommitInfo>;

    /// Get the tagged commits on a branch
    ///
    /// Covers the commits reachable from the branch head but not from the
    /// branch's initial commit, plus the initial commit itself. Only commits
    /// carrying at least one tag are returned.
    fn get_tagged_commits_on_branch(&self, branch: &Branch) -> Result<Vec<CommitInfo>>;

    /// Full ref of the checked out branch (`refs/heads/...`), or `None` on a detached HEAD
    fn current_branch_name(&self) -> Result<Option<String>>;
}
