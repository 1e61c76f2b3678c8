use crate::domain::Branch;
use crate::error::{ReleaseFlowError, Result};
use crate::git::CommitInfo;
use chrono::{TimeZone, Utc};
use git2::{BranchType, ErrorCode, Oid, Repository as Git2Repo, Sort};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

const ORIGIN_PREFIX: &str = "origin/";
const ORIGIN_HEAD: &str = "origin/HEAD";

/// Wrapper around git2::Repository with our trait interface
pub struct Git2Repository {
    repo: Mutex<Git2Repo>,
    use_origin_branches: bool,
}

impl Git2Repository {
    /// Open or discover a git repository
    ///
    /// With `use_origin_branches`, [`list_branches`](super::Repository::list_branches)
    /// reports `origin/...` remote-tracking branches instead of local ones.
    pub fn open<P: AsRef<Path>>(path: P, use_origin_branches: bool) -> Result<Self> {
        let repo = Git2Repo::discover(path)?;

        Ok(Self::from_git2(repo, use_origin_branches))
    }

    /// Create from existing git2::Repository
    pub fn from_git2(repo: Git2Repo, use_origin_branches: bool) -> Self {
        Git2Repository {
            repo: Mutex::new(repo),
            use_origin_branches,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Git2Repo>> {
        self.repo
            .lock()
            .map_err(|_| ReleaseFlowError::vcs("Repository handle is poisoned"))
    }
}

fn resolve<'r>(repo: &'r Git2Repo, reference: &str) -> Result<git2::Commit<'r>> {
    let object = repo.revparse_single(reference).map_err(|e| {
        ReleaseFlowError::vcs(format!("Unable to resolve ref '{}': {}", reference, e))
    })?;
    object.peel_to_commit().map_err(|e| {
        ReleaseFlowError::vcs(format!("Ref '{}' does not point at a commit: {}", reference, e))
    })
}

/// Tag and branch names per commit, read once per query
struct Decorations {
    tags: HashMap<Oid, Vec<String>>,
    branches: HashMap<Oid, Vec<String>>,
    head: Option<Oid>,
    detached: bool,
}

impl Decorations {
    fn read(repo: &Git2Repo) -> Result<Self> {
        let mut tags: HashMap<Oid, Vec<String>> = HashMap::new();
        for reference in repo.references_glob("refs/tags/*")? {
            let reference = reference?;
            let (Some(name), Ok(commit)) = (reference.shorthand(), reference.peel_to_commit())
            else {
                continue;
            };
            tags.entry(commit.id()).or_default().push(name.to_string());
        }

        let mut branches: HashMap<Oid, Vec<String>> = HashMap::new();
        for entry in repo.branches(None)? {
            let (branch, kind) = entry?;
            let Some(name) = branch.name()? else {
                continue;
            };
            let foreign_remote = !name.starts_with(ORIGIN_PREFIX) || name == ORIGIN_HEAD;
            if kind == BranchType::Remote && foreign_remote {
                continue;
            }
            if let Ok(commit) = branch.get().peel_to_commit() {
                branches
                    .entry(commit.id())
                    .or_default()
                    .push(name.to_string());
            }
        }

        let head = repo
            .head()
            .ok()
            .and_then(|h| h.peel_to_commit().ok())
            .map(|c| c.id());
        let detached = repo.head_detached().unwrap_or(false);

        Ok(Decorations {
            tags,
            branches,
            head,
            detached,
        })
    }

    fn describe(&self, commit: &git2::Commit<'_>) -> Result<CommitInfo> {
        let oid = commit.id();
        let seconds = commit.time().seconds();
        let date = Utc.timestamp_opt(seconds, 0).single().ok_or_else(|| {
            ReleaseFlowError::vcs(format!("Commit {} has an invalid date {}", oid, seconds))
        })?;
        let is_head = self.head == Some(oid);

        let mut tags = self.tags.get(&oid).cloned().unwrap_or_default();
        tags.sort();

        Ok(CommitInfo {
            sha: oid.to_string(),
            date,
            tags,
            branches: self.branches.get(&oid).cloned().unwrap_or_default(),
            is_head,
            is_detached_head: is_head && self.detached,
        })
    }
}

impl super::Repository for Git2Repository {
    fn list_branches(&self) -> Result<Vec<String>> {
        let repo = self.lock()?;
        let kind = if self.use_origin_branches {
            BranchType::Remote
        } else {
            BranchType::Local
        };

        let mut names = Vec::new();
        for entry in repo.branches(Some(kind))? {
            let (branch, _) = entry?;
            let Some(name) = branch.name()? else {
                continue;
            };
            if self.use_origin_branches && (!name.starts_with(ORIGIN_PREFIX) || name == ORIGIN_HEAD)
            {
                continue;
            }
            names.push(name.to_string());
        }

        Ok(names)
    }

    fn get_commit(&self, reference: &str, parent: usize) -> Result<CommitInfo> {
        debug!("Getting commit for ref '{}'", reference);
        let repo = self.lock()?;
        let mut commit = resolve(&repo, reference)?;

        if parent > 0 {
            commit = commit.parent(parent - 1).map_err(|_| {
                ReleaseFlowError::invariant(format!(
                    "Commit '{}' has no parent {}",
                    reference, parent
                ))
            })?;
        }

        Decorations::read(&repo)?.describe(&commit)
    }

    fn is_ancestor(&self, ancestor: &str, descendant: &str) -> Result<bool> {
        let repo = self.lock()?;
        let ancestor = resolve(&repo, ancestor)?.id();
        let descendant = resolve(&repo, descendant)?.id();

        if ancestor == descendant {
            return Ok(true);
        }
        Ok(repo.graph_descendant_of(descendant, ancestor)?)
    }

    fn count_commits(&self, from: &str, to_exclusive: &str) -> Result<usize> {
        let repo = self.lock()?;
        let from = resolve(&repo, from)?.id();
        let to = resolve(&repo, to_exclusive)?.id();

        let mut revwalk = repo.revwalk()?;
        revwalk.push(from)?;
        revwalk.hide(to)?;

        let mut count = 0;
        for oid in revwalk {
            oid?;
            count += 1;
        }
        Ok(count)
    }

    fn get_fork_point(&self, reference: &str, other: &str) -> Result<Option<CommitInfo>> {
        let repo = self.lock()?;
        let a = resolve(&repo, reference)?.id();
        let b = resolve(&repo, other)?.id();

        let base = match repo.merge_base(a, b) {
            Ok(oid) => oid,
            Err(e) if e.code() == ErrorCode::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let commit = repo.find_commit(base)?;
        Decorations::read(&repo)?.describe(&commit).map(Some)
    }

    fn get_initial_commit(&self) -> Result<CommitInfo> {
        let repo = self.lock()?;

        let mut revwalk = repo.revwalk()?;
        revwalk.push_head()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::REVERSE)?;

        for oid in revwalk {
            let commit = repo.find_commit(oid?)?;
            if commit.parent_count() == 0 {
                return Decorations::read(&repo)?.describe(&commit);
            }
        }

        Err(ReleaseFlowError::vcs("Unable to find the initial commit"))
    }

    fn get_tagged_commits_on_branch(&self, branch: &Branch) -> Result<Vec<CommitInfo>> {
        let repo = self.lock()?;
        let head = resolve(&repo, &branch.name)?.id();
        let initial = resolve(&repo, &branch.initial_commit.sha)?.id();
        let decorations = Decorations::read(&repo)?;

        let mut revwalk = repo.revwalk()?;
        revwalk.push(head)?;
        revwalk.hide(initial)?;

        let mut oids = Vec::new();
        for oid in revwalk {
            oids.push(oid?);
        }
        oids.push(initial);

        let mut tagged = Vec::new();
        for oid in oids {
            if !decorations.tags.contains_key(&oid) {
                continue;
            }
            let commit = repo.find_commit(oid)?;
            tagged.push(decorations.describe(&commit)?);
        }

        debug!(
            "Found {} tagged commit(s) on branch '{}'",
            tagged.len(),
            branch.name
        );
        Ok(tagged)
    }

    fn current_branch_name(&self) -> Result<Option<String>> {
        let repo = self.lock()?;
        let head = repo.find_reference("HEAD")?;

        Ok(head.symbolic_target().map(str::to_string))
    }
}
