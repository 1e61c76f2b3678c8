use crate::domain::Branch;
use crate::error::{ReleaseFlowError, Result};
use crate::git::{CommitInfo, Repository};
use chrono::{DateTime, Duration, Utc};
use std::collections::{BTreeMap, HashSet};

const ORIGIN_PREFIX: &str = "origin/";

struct MockCommit {
    parents: Vec<usize>,
}

enum Head {
    Branch(String),
    Detached(usize),
}

/// In-memory commit graph for testing without a real repository
///
/// Commits are identified by their creation order; commit `n` gets the id
/// `format!("{:040x}", n + 1)` and a committer date one minute after the
/// previous commit. Branches named `origin/...` behave as remote-tracking
/// branches.
///
/// ```rust
/// # use release_flow::git::{MockRepository, Repository};
/// let mut repo = MockRepository::init("master");
/// repo.create_branch("release/1.0", "master").unwrap();
/// repo.commit("release/1.0").unwrap();
/// repo.tag("v1.0.0", "release/1.0").unwrap();
/// repo.commit("master").unwrap();
///
/// let fork = repo.get_fork_point("release/1.0", "master").unwrap().unwrap();
/// assert_eq!(fork.sha, repo.get_initial_commit().unwrap().sha);
/// ```
pub struct MockRepository {
    commits: Vec<MockCommit>,
    branches: BTreeMap<String, usize>,
    tags: BTreeMap<String, usize>,
    head: Head,
    use_origin_branches: bool,
}

impl MockRepository {
    /// Create a repository with a single root commit on `trunk`, checked out
    pub fn init(trunk: &str) -> Self {
        let mut branches = BTreeMap::new();
        branches.insert(trunk.to_string(), 0);

        MockRepository {
            commits: vec![MockCommit {
                parents: Vec::new(),
            }],
            branches,
            tags: BTreeMap::new(),
            head: Head::Branch(trunk.to_string()),
            use_origin_branches: false,
        }
    }

    /// Report `origin/...` branches from [`Repository::list_branches`]
    pub fn with_origin_branches(mut self) -> Self {
        self.use_origin_branches = true;
        self
    }

    /// Commit id of the n-th created commit
    pub fn sha_of(index: usize) -> String {
        format!("{:040x}", index + 1)
    }

    /// Add a commit on top of `branch` and advance the branch
    pub fn commit(&mut self, branch: &str) -> Result<String> {
        let tip = self.branch_tip(branch)?;
        let index = self.push_commit(vec![tip]);
        self.branches.insert(branch.to_string(), index);
        Ok(Self::sha_of(index))
    }

    /// Add `count` commits on top of `branch`, returning the last id
    pub fn commits(&mut self, branch: &str, count: usize) -> Result<String> {
        let mut sha = Self::sha_of(self.branch_tip(branch)?);
        for _ in 0..count {
            sha = self.commit(branch)?;
        }
        Ok(sha)
    }

    /// Create `name` pointing at `from`
    pub fn create_branch(&mut self, name: &str, from: &str) -> Result<()> {
        if self.branches.contains_key(name) {
            return Err(ReleaseFlowError::vcs(format!(
                "Branch '{}' already exists",
                name
            )));
        }
        let index = self.resolve(from)?;
        self.branches.insert(name.to_string(), index);
        Ok(())
    }

    /// Create `name` on a new root commit sharing no history with other branches
    pub fn create_orphan_branch(&mut self, name: &str) -> Result<String> {
        if self.branches.contains_key(name) {
            return Err(ReleaseFlowError::vcs(format!(
                "Branch '{}' already exists",
                name
            )));
        }
        let index = self.push_commit(Vec::new());
        self.branches.insert(name.to_string(), index);
        Ok(Self::sha_of(index))
    }

    /// Merge `from` into `into` with a merge commit whose first parent is `into`
    pub fn merge(&mut self, into: &str, from: &str) -> Result<String> {
        let first = self.branch_tip(into)?;
        let second = self.resolve(from)?;
        let index = self.push_commit(vec![first, second]);
        self.branches.insert(into.to_string(), index);
        Ok(Self::sha_of(index))
    }

    /// Create a pull request merge commit of `source` into `target` and check it out detached
    ///
    /// No branch points at the merge commit, like the merge ref a CI server builds.
    pub fn merge_pull_request(&mut self, target: &str, source: &str) -> Result<String> {
        let first = self.branch_tip(target)?;
        let second = self.resolve(source)?;
        let index = self.push_commit(vec![first, second]);
        self.head = Head::Detached(index);
        Ok(Self::sha_of(index))
    }

    /// Create a lightweight tag
    pub fn tag(&mut self, name: &str, reference: &str) -> Result<()> {
        let index = self.resolve(reference)?;
        self.tags.insert(name.to_string(), index);
        Ok(())
    }

    pub fn checkout(&mut self, branch: &str) -> Result<()> {
        self.branch_tip(branch)?;
        self.head = Head::Branch(branch.to_string());
        Ok(())
    }

    pub fn checkout_detached(&mut self, reference: &str) -> Result<()> {
        let index = self.resolve(reference)?;
        self.head = Head::Detached(index);
        Ok(())
    }

    fn push_commit(&mut self, parents: Vec<usize>) -> usize {
        self.commits.push(MockCommit { parents });
        self.commits.len() - 1
    }

    fn branch_tip(&self, branch: &str) -> Result<usize> {
        self.branches
            .get(branch)
            .copied()
            .ok_or_else(|| ReleaseFlowError::vcs(format!("Branch '{}' not found", branch)))
    }

    fn head_index(&self) -> Result<usize> {
        match &self.head {
            Head::Branch(name) => self.branch_tip(name),
            Head::Detached(index) => Ok(*index),
        }
    }

    fn resolve(&self, reference: &str) -> Result<usize> {
        if reference == "HEAD" {
            return self.head_index();
        }

        let lookup = |name: &str| {
            self.branches
                .get(name)
                .or_else(|| self.tags.get(name))
                .copied()
        };
        let found = if let Some(name) = reference.strip_prefix("refs/heads/") {
            self.branches.get(name).copied()
        } else if let Some(name) = reference.strip_prefix("refs/remotes/") {
            self.branches.get(name).copied()
        } else if let Some(name) = reference.strip_prefix("refs/tags/") {
            self.tags.get(name).copied()
        } else {
            lookup(reference).or_else(|| {
                (0..self.commits.len()).find(|&i| Self::sha_of(i) == reference)
            })
        };

        found.ok_or_else(|| ReleaseFlowError::vcs(format!("Unable to resolve ref '{}'", reference)))
    }

    /// Every commit reachable from `start`, including itself
    fn reachable(&self, start: usize) -> HashSet<usize> {
        let mut seen = HashSet::new();
        let mut pending = vec![start];
        while let Some(index) = pending.pop() {
            if seen.insert(index) {
                pending.extend(self.commits[index].parents.iter().copied());
            }
        }
        seen
    }

    fn info(&self, index: usize) -> Result<CommitInfo> {
        let head = self.head_index()?;
        let is_head = head == index;
        let named = |refs: &BTreeMap<String, usize>| -> Vec<String> {
            refs.iter()
                .filter(|(_, &i)| i == index)
                .map(|(name, _)| name.clone())
                .collect()
        };

        Ok(CommitInfo {
            sha: Self::sha_of(index),
            date: commit_date(index),
            tags: named(&self.tags),
            branches: named(&self.branches),
            is_head,
            is_detached_head: is_head && matches!(self.head, Head::Detached(_)),
        })
    }
}

fn commit_date(index: usize) -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH + Duration::days(18_262) + Duration::minutes(index as i64)
}

impl Repository for MockRepository {
    fn list_branches(&self) -> Result<Vec<String>> {
        Ok(self
            .branches
            .keys()
            .filter(|name| name.starts_with(ORIGIN_PREFIX) == self.use_origin_branches)
            .filter(|name| name.as_str() != "origin/HEAD")
            .cloned()
            .collect())
    }

    fn get_commit(&self, reference: &str, parent: usize) -> Result<CommitInfo> {
        let mut index = self.resolve(reference)?;
        if parent > 0 {
            index = *self.commits[index].parents.get(parent - 1).ok_or_else(|| {
                ReleaseFlowError::invariant(format!(
                    "Commit '{}' has no parent {}",
                    reference, parent
                ))
            })?;
        }
        self.info(index)
    }

    fn is_ancestor(&self, ancestor: &str, descendant: &str) -> Result<bool> {
        let ancestor = self.resolve(ancestor)?;
        let descendant = self.resolve(descendant)?;
        Ok(self.reachable(descendant).contains(&ancestor))
    }

    fn count_commits(&self, from: &str, to_exclusive: &str) -> Result<usize> {
        let from = self.reachable(self.resolve(from)?);
        let excluded = self.reachable(self.resolve(to_exclusive)?);
        Ok(from.difference(&excluded).count())
    }

    fn get_fork_point(&self, reference: &str, other: &str) -> Result<Option<CommitInfo>> {
        let left = self.reachable(self.resolve(reference)?);
        let right = self.reachable(self.resolve(other)?);

        // A commit is always created after its parents, so the newest common
        // ancestor is never an ancestor of another common ancestor.
        left.intersection(&right)
            .max()
            .map(|&index| self.info(index))
            .transpose()
    }

    fn get_initial_commit(&self) -> Result<CommitInfo> {
        let root = self
            .reachable(self.head_index()?)
            .into_iter()
            .filter(|&i| self.commits[i].parents.is_empty())
            .min()
            .ok_or_else(|| ReleaseFlowError::vcs("Unable to find the initial commit"))?;
        self.info(root)
    }

    fn get_tagged_commits_on_branch(&self, branch: &Branch) -> Result<Vec<CommitInfo>> {
        let initial = self.resolve(&branch.initial_commit.sha)?;
        let excluded = self.reachable(initial);

        let mut range: Vec<usize> = self
            .reachable(self.resolve(&branch.name)?)
            .difference(&excluded)
            .copied()
            .collect();
        range.push(initial);
        range.sort_unstable_by(|a, b| b.cmp(a));

        range
            .into_iter()
            .filter(|&i| self.tags.values().any(|&t| t == i))
            .map(|i| self.info(i))
            .collect()
    }

    fn current_branch_name(&self) -> Result<Option<String>> {
        Ok(match &self.head {
            Head::Branch(name) => Some(format!("refs/heads/{}", name)),
            Head::Detached(_) => None,
        })
    }
}
