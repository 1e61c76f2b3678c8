use crate::analyzer::ReleaseBranchAnalyzer;
use crate::config::Options;
use crate::domain::{
    Branch, BuildType, BuildVersionInfo, PreReleaseLabel, Version, VersionSource,
};
use crate::error::{ReleaseFlowError, Result};
use crate::git::{CommitInfo, Repository};
use crate::strategy::{self, VersioningStrategy};
use regex::Regex;
use std::sync::{Arc, LazyLock};
use tracing::{debug, info, warn};

static PULL_REQUEST_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^refs/pull/(\d+)/merge$").expect("pull request ref pattern is valid")
});

static RELEASE_TAG_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^refs/(?:heads/)?tags/(v.*)$").expect("release tag ref pattern is valid")
});

static REF_KIND_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^refs/[^/]+/").expect("ref kind pattern is valid"));

/// Why the current ref is being built, and what anchors its version
struct BuildContext {
    build_type: BuildType,
    version_source: VersionSource,
    pre_release_label: Option<PreReleaseLabel>,
    short_source_branch_name: String,
    is_release_branch_target: bool,
}

type MatchResult = Result<Option<BuildContext>>;

fn short_branch_name(source_ref: &str) -> &str {
    source_ref.strip_prefix("refs/heads/").unwrap_or(source_ref)
}

/// Computes the version of the build for a source ref
///
/// The ref is classified by trying, in order: release branch, trunk, pull
/// request, release tag, working branch. The first classification that
/// matches decides the build type, the pre-release label and the version
/// source; the version is then derived from the version source by the
/// active [VersioningStrategy].
pub struct BuildVersionCalculator<'a, R: Repository> {
    repo: &'a R,
    options: Options,
    strategy: Arc<dyn VersioningStrategy>,
    analyzer: ReleaseBranchAnalyzer<'a, R>,
}

impl<'a, R: Repository> BuildVersionCalculator<'a, R> {
    /// Create a calculator, selecting the strategy from the options
    ///
    /// # Errors
    /// Configuration error if the strategy options are invalid.
    pub fn new(repo: &'a R, options: Options) -> Result<Self> {
        let strategy = strategy::from_options(&options.repo.strategy)?;
        Ok(Self::with_strategy(repo, options, strategy))
    }

    /// Create a calculator with a strategy already built from `options`
    pub fn with_strategy(
        repo: &'a R,
        options: Options,
        strategy: Arc<dyn VersioningStrategy>,
    ) -> Self {
        debug!("Options: {:?}", options);

        let analyzer = ReleaseBranchAnalyzer::new(repo, Arc::clone(&strategy), options.clone());
        BuildVersionCalculator {
            repo,
            options,
            strategy,
            analyzer,
        }
    }

    /// Compute the version for the build of `source_ref`
    ///
    /// # Arguments
    /// * `source_ref` - Full ref being built: `refs/heads/...`, `refs/tags/...`
    ///   or `refs/pull/<n>/merge`
    /// * `target_branch` - For pull requests, the full ref of the merge target
    ///
    /// # Returns
    /// * `Ok(BuildVersionInfo)` - The computed version
    /// * `Err` - Input error for unsupported or malformed refs, repository
    ///   errors from the git queries
    pub fn compute_build_version(
        &self,
        source_ref: &str,
        target_branch: Option<&str>,
    ) -> Result<BuildVersionInfo> {
        let current = self.repo.get_commit("HEAD", 0)?;
        debug!("Current commit: {}", current.sha);

        let matchers: [fn(&Self, &str, &CommitInfo, Option<&str>) -> MatchResult; 5] = [
            Self::try_match_release_branch,
            Self::try_match_trunk_branch,
            Self::try_match_pull_request,
            Self::try_match_release_tag,
            Self::try_match_working_branch,
        ];

        let mut context = None;
        for matcher in matchers {
            context = matcher(self, source_ref, &current, target_branch)?;
            if context.is_some() {
                break;
            }
        }
        let context = context.ok_or_else(|| {
            ReleaseFlowError::input(format!("Unsupported source ref '{}'", source_ref))
        })?;

        let version = self.next_version(&context);
        let source_commit = context.version_source.commit();
        let commits_since_version_source =
            self.repo.count_commits(&current.sha, &source_commit.sha)?;

        BuildVersionInfo::new(
            version,
            context.pre_release_label.map(|label| label.to_string()),
            current.sha.as_str(),
            context.build_type,
            context.short_source_branch_name,
            current.date,
            commits_since_version_source,
            source_commit.sha.as_str(),
        )
    }

    fn try_match_release_branch(
        &self,
        source_ref: &str,
        _current: &CommitInfo,
        _target_branch: Option<&str>,
    ) -> MatchResult {
        let short_name = short_branch_name(source_ref);
        let prefix = self.options.repo.release_branch_prefix.as_str();
        let Some(segment) = short_name.strip_prefix(prefix) else {
            return Ok(None);
        };

        let number = self
            .strategy
            .try_parse_release_branch_number(segment)
            .ok_or_else(|| {
                ReleaseFlowError::input(format!(
                    "Release branch '{}' is in incorrect format",
                    source_ref
                ))
            })?;
        debug!("Trigger is commit to release branch '{}'", number);

        Ok(Some(BuildContext {
            build_type: BuildType::Beta,
            version_source: self.version_source_from_release_branch(segment)?,
            pre_release_label: Some(PreReleaseLabel::Beta),
            short_source_branch_name: short_name.to_string(),
            is_release_branch_target: true,
        }))
    }

    fn try_match_trunk_branch(
        &self,
        source_ref: &str,
        current: &CommitInfo,
        _target_branch: Option<&str>,
    ) -> MatchResult {
        let short_name = short_branch_name(source_ref);
        if short_name != self.options.repo.trunk_branch_name {
            return Ok(None);
        }
        debug!("Trigger is commit to {}", self.options.repo.trunk_branch_name);

        Ok(Some(BuildContext {
            build_type: BuildType::Alpha,
            version_source: self.version_source_from_non_release_branch(&current.sha)?,
            pre_release_label: Some(PreReleaseLabel::Alpha),
            short_source_branch_name: short_name.to_string(),
            is_release_branch_target: false,
        }))
    }

    fn try_match_pull_request(
        &self,
        source_ref: &str,
        current: &CommitInfo,
        target_branch: Option<&str>,
    ) -> MatchResult {
        let Some(caps) = PULL_REQUEST_REF.captures(source_ref) else {
            return Ok(None);
        };
        let number = caps[1].to_string();
        debug!("Trigger is pull request, PR# = '{}'", number);

        let merge_parent = self.analyzer.merge_parent(current, 1)?;
        debug!("Merge parent is '{}'", merge_parent.sha);

        let release_segment = match target_branch {
            Some(target) => self.release_segment_from_target(target)?,
            None => self.release_segment_from_decorations(&merge_parent),
        };

        let (is_release_branch_target, version_source) = match release_segment {
            Some(segment) => (true, self.version_source_from_release_branch(&segment)?),
            None => (
                false,
                self.version_source_from_non_release_branch(&merge_parent.sha)?,
            ),
        };
        debug!(
            "isReleaseBranchTarget: {}, version source = {}",
            is_release_branch_target,
            version_source.commit().sha
        );

        Ok(Some(BuildContext {
            build_type: BuildType::PullRequest,
            version_source,
            short_source_branch_name: format!("pull/{}/merge", number),
            pre_release_label: Some(PreReleaseLabel::PullRequest(number)),
            is_release_branch_target,
        }))
    }

    /// Release branch segment of an explicit PR target, if it is a release branch
    fn release_segment_from_target(&self, target: &str) -> Result<Option<String>> {
        let short_target = REF_KIND_PREFIX.replace(target, "");
        let prefix = self.options.repo.release_branch_prefix.as_str();
        let Some(segment) = short_target.strip_prefix(prefix) else {
            return Ok(None);
        };

        if self.strategy.try_parse_release_branch_number(segment).is_none() {
            return Err(ReleaseFlowError::input(format!(
                "Release branch '{}' is in incorrect format",
                target
            )));
        }
        Ok(Some(segment.to_string()))
    }

    /// Release branch segment of the first release branch decorating `commit`
    fn release_segment_from_decorations(&self, commit: &CommitInfo) -> Option<String> {
        let prefix = self.options.full_release_branch_prefix();
        commit
            .branches
            .iter()
            .filter_map(|branch| branch.strip_prefix(prefix.as_str()))
            .find(|segment| self.strategy.try_parse_release_branch_number(segment).is_some())
            .map(str::to_string)
    }

    fn try_match_release_tag(
        &self,
        source_ref: &str,
        current: &CommitInfo,
        _target_branch: Option<&str>,
    ) -> MatchResult {
        let Some(caps) = RELEASE_TAG_REF.captures(source_ref) else {
            return Ok(None);
        };
        let version_text = &caps[1];
        debug!("Trigger is release tag, version = '{}'", version_text);

        let version_source = self
            .strategy
            .try_parse_version_source_from_tag(version_text, current)
            .ok_or_else(|| {
                ReleaseFlowError::input(format!(
                    "Release tag '{}' is not correctly formatted",
                    version_text
                ))
            })?;

        Ok(Some(BuildContext {
            build_type: BuildType::Release,
            version_source,
            pre_release_label: None,
            short_source_branch_name: format!("tags/{}", version_text),
            is_release_branch_target: true,
        }))
    }

    fn try_match_working_branch(
        &self,
        source_ref: &str,
        current: &CommitInfo,
        _target_branch: Option<&str>,
    ) -> MatchResult {
        let short_name = short_branch_name(source_ref);
        debug!("Trigger is other branch '{}'", source_ref);

        let repo_options = &self.options.repo;
        let matched_prefix = repo_options
            .working_branch_prefixes
            .iter()
            .find(|prefix| short_name.starts_with(prefix.as_str()));

        let label = match matched_prefix {
            Some(prefix) if repo_options.strip_branch_prefix_from_label => {
                &short_name[prefix.len()..]
            }
            Some(_) => short_name,
            None if repo_options.fail_on_unknown_prefix => {
                debug!("Branch '{}' has no known working branch prefix", short_name);
                return Ok(None);
            }
            None => short_name,
        };

        Ok(Some(BuildContext {
            build_type: BuildType::WorkingBranch,
            version_source: self.version_source_from_non_release_branch(&current.sha)?,
            pre_release_label: Some(PreReleaseLabel::for_branch(label)),
            short_source_branch_name: short_name.to_string(),
            is_release_branch_target: false,
        }))
    }

    /// Highest tag on the release branch, or the branch's fork point when untagged
    fn version_source_from_release_branch(&self, segment: &str) -> Result<VersionSource> {
        let name = format!("{}{}", self.options.full_release_branch_prefix(), segment);
        let release_branch = self.analyzer.release_branch(&name)?.ok_or_else(|| {
            ReleaseFlowError::invariant(format!("Unable to find release branch '{}'", name))
        })?;

        if let Some(source) = self
            .analyzer
            .highest_tagged_version(&release_branch.as_branch())?
        {
            return Ok(source);
        }

        debug!("No release version tags found on branch {}", release_branch.name);
        Ok(VersionSource::ReleaseBranch {
            commit: release_branch.initial_commit.clone(),
            branch_name: release_branch.name.clone(),
            version: release_branch.number.version(),
        })
    }

    /// Highest reachable release branch, else highest tag on trunk, else the root commit
    fn version_source_from_non_release_branch(&self, sha: &str) -> Result<VersionSource> {
        if let Some(branch) = self.analyzer.try_get_highest_reachable_release_branch(sha)? {
            debug!("Highest reachable release branch is '{}'", branch.name);
            return Ok(VersionSource::ReleaseBranch {
                commit: branch.initial_commit.clone(),
                branch_name: branch.name.clone(),
                version: branch.number.version(),
            });
        }

        let trunk = Branch {
            name: self.options.full_trunk_branch_name(),
            initial_commit: self.repo.get_initial_commit()?,
        };
        debug!(
            "No reachable release branch found from {}, using {}",
            sha, trunk.name
        );

        if let Some(source) = self.analyzer.highest_tagged_version(&trunk)? {
            return Ok(source);
        }

        debug!("No release version tags found on branch {}", trunk.name);
        Ok(VersionSource::InitialCommit {
            commit: trunk.initial_commit,
        })
    }

    fn next_version(&self, context: &BuildContext) -> Version {
        let base_version = self.strategy.base_version();
        debug!("Base release number: '{}'", base_version);

        let source = &context.version_source;
        match context.build_type {
            BuildType::Alpha | BuildType::WorkingBranch => {
                self.increment_non_release_branch(source, base_version)
            }
            BuildType::Beta => self.increment_release_branch(source, base_version),
            BuildType::PullRequest if context.is_release_branch_target => {
                self.increment_release_branch(source, base_version)
            }
            BuildType::PullRequest => self.increment_non_release_branch(source, base_version),
            BuildType::Release => source.version(),
        }
    }

    /// A tag on a release branch means that version has shipped: move to the next patch.
    /// The base version never overrides a release branch.
    fn increment_release_branch(&self, source: &VersionSource, base_version: Version) -> Version {
        info!("Using version source from {}", source);

        let version = if source.is_tag() {
            self.strategy.next_patch_version(source.version())
        } else {
            source.version()
        };

        if source.version() < base_version {
            warn!(
                "Release version {} overrides higher base version {}",
                version, base_version
            );
        }
        version
    }

    /// A reachable release branch opens the next primary version; tags and
    /// the root commit are used as they are. The base version is a floor.
    fn increment_non_release_branch(
        &self,
        source: &VersionSource,
        base_version: Version,
    ) -> Version {
        if source.version() < base_version {
            warn!(
                "Version source from {} is behind base version {}",
                source, base_version
            );
            return base_version;
        }

        info!("Using version source from {}", source);
        if source.is_release_branch() {
            self.strategy.next_primary_version(source.version())
        } else {
            source.version()
        }
    }
}
