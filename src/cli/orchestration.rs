//! Main workflow orchestration logic
//!
//! Provides a clean separation between CLI argument parsing and the version
//! calculation, so the workflow can be called programmatically without
//! depending on clap.

use std::path::PathBuf;

use tracing::{debug, info};

use crate::analyzer::BuildVersionCalculator;
use crate::config::{self, Options};
use crate::domain::BuildVersionInfo;
use crate::error::{ReleaseFlowError, Result};
use crate::git::{Git2Repository, Repository};
use crate::strategy;

/// Arguments for the version workflow
///
/// Mirrors the CLI Args but in a format suitable for orchestration logic.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionWorkflowArgs {
    /// Path to custom config file
    pub config_path: Option<String>,

    /// Path inside the repository to read
    pub repo_path: PathBuf,

    /// Full ref being built; the checked out branch when absent
    pub source_ref: Option<String>,

    /// Full ref of the pull request merge target
    pub target_branch: Option<String>,

    /// Read `origin/...` branches instead of local ones
    pub use_origin_branches: bool,
}

impl Default for VersionWorkflowArgs {
    fn default() -> Self {
        VersionWorkflowArgs {
            config_path: None,
            repo_path: PathBuf::from("."),
            source_ref: None,
            target_branch: None,
            use_origin_branches: false,
        }
    }
}

/// Main version workflow
///
/// 1. Load and validate configuration, selecting the versioning strategy
/// 2. Open the repository
/// 3. Determine the source ref
/// 4. Compute the build version
///
/// Configuration problems are reported before the repository is touched.
pub fn run_version_workflow(args: VersionWorkflowArgs) -> Result<BuildVersionInfo> {
    let repo_options = config::load_config(args.config_path.as_deref())?;
    let options = Options::new(repo_options, args.use_origin_branches);
    let strategy = strategy::from_options(&options.repo.strategy)?;

    let repo = Git2Repository::open(&args.repo_path, args.use_origin_branches)?;
    let source_ref = resolve_source_ref(&repo, args.source_ref)?;
    info!("Computing version for {}", source_ref);

    let calculator = BuildVersionCalculator::with_strategy(&repo, options, strategy);
    let version = calculator.compute_build_version(&source_ref, args.target_branch.as_deref())?;
    debug!("Computed version {}", version.sem_ver());
    Ok(version)
}

/// The explicit source ref, or the full ref of the checked out branch
///
/// # Errors
/// Input error when no ref is given and HEAD is detached.
pub fn resolve_source_ref<R: Repository>(repo: &R, explicit: Option<String>) -> Result<String> {
    if let Some(source_ref) = explicit {
        return Ok(source_ref);
    }

    repo.current_branch_name()?.ok_or_else(|| {
        ReleaseFlowError::input("No source ref specified, and unable to determine (detached head)")
    })
}
