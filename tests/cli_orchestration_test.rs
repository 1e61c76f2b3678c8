use git2::{Oid, Repository};
use release_flow::cli::orchestration::{run_version_workflow, VersionWorkflowArgs};
use release_flow::domain::{BuildType, Version};
use release_flow::ReleaseFlowError;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn empty_commit(repo: &Repository, parents: &[Oid]) -> Oid {
    let sig = repo
        .signature()
        .or_else(|_| git2::Signature::now("Test User", "test@example.com"))
        .expect("Could not get sig");
    let tree_id = repo.treebuilder(None).unwrap().write().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();
    let parents: Vec<_> = parents.iter().map(|p| repo.find_commit(*p).unwrap()).collect();
    let parent_refs: Vec<_> = parents.iter().collect();
    repo.commit(Some("HEAD"), &sig, &sig, "commit", &tree, &parent_refs)
        .expect("Could not create commit")
}

/// Milestone repository: master with release/R1 tagged v1.0, then two more trunk commits
fn setup_milestone_repo() -> (TempDir, Repository) {
    let dir = TempDir::new().expect("Could not create temp dir");
    let repo = Repository::init(dir.path()).expect("Could not init git repo");
    repo.set_head("refs/heads/master").unwrap();

    let c0 = empty_commit(&repo, &[]);
    let fork = repo.find_commit(c0).unwrap();
    repo.branch("release/R1", &fork, false).unwrap();
    repo.tag_lightweight("v1.0", fork.as_object(), false).unwrap();
    drop(fork);

    let c1 = empty_commit(&repo, &[c0]);
    empty_commit(&repo, &[c1]);

    fs::write(
        dir.path().join("rfconfig.toml"),
        "[strategy]\nkind = \"Milestone\"\n",
    )
    .unwrap();
    (dir, repo)
}

fn args_for(dir: &Path) -> VersionWorkflowArgs {
    VersionWorkflowArgs {
        config_path: Some(dir.join("rfconfig.toml").to_str().unwrap().to_string()),
        repo_path: dir.to_path_buf(),
        ..VersionWorkflowArgs::default()
    }
}

#[test]
fn test_workflow_uses_current_branch() {
    let (dir, _repo) = setup_milestone_repo();

    let info = run_version_workflow(args_for(dir.path())).unwrap();
    assert_eq!(info.version(), Version::new(2, 0, 0));
    assert_eq!(info.build_type, BuildType::Alpha);
    assert_eq!(info.branch_name, "master");
    assert_eq!(info.commits_since_version_source, 2);
}

#[test]
fn test_workflow_with_explicit_source_ref() {
    let (dir, _repo) = setup_milestone_repo();

    let args = VersionWorkflowArgs {
        source_ref: Some("refs/heads/release/R1".to_string()),
        ..args_for(dir.path())
    };
    let info = run_version_workflow(args).unwrap();

    // HEAD stays on master; only the classification follows the source ref
    assert_eq!(info.build_type, BuildType::Beta);
    assert_eq!(info.version(), Version::new(1, 1, 0));
}

#[test]
fn test_workflow_detached_head_needs_source_ref() {
    let (dir, repo) = setup_milestone_repo();
    let head = repo.head().unwrap().target().unwrap();
    repo.set_head_detached(head).unwrap();

    let err = run_version_workflow(args_for(dir.path())).unwrap_err();
    assert!(matches!(err, ReleaseFlowError::Input(_)));
    assert_eq!(
        err.message(),
        "No source ref specified, and unable to determine (detached head)"
    );
}

#[test]
fn test_workflow_reports_configuration_errors_before_reading_repository() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("rfconfig.toml"), "[strategy]\nkind = \"CalVer\"\n").unwrap();

    let err = run_version_workflow(args_for(dir.path())).unwrap_err();
    assert!(matches!(err, ReleaseFlowError::Config(_)));
}

#[test]
fn test_workflow_rejects_bad_base_number_before_opening_repository() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("rfconfig.toml"),
        "[strategy]\nkind = \"SemVer\"\nbase_number = \"01.x\"\n",
    )
    .unwrap();

    let err = run_version_workflow(args_for(dir.path())).unwrap_err();
    assert!(matches!(err, ReleaseFlowError::Config(_)));
    assert!(err.is_input_error());
    assert_eq!(err.message(), "Invalid base_number '01.x' in options");
}

#[test]
fn test_workflow_outside_repository_is_not_an_input_error() {
    let (config_dir, _repo) = setup_milestone_repo();
    let not_a_repo = TempDir::new().unwrap();

    let args = VersionWorkflowArgs {
        repo_path: not_a_repo.path().to_path_buf(),
        ..args_for(config_dir.path())
    };
    let err = run_version_workflow(args).unwrap_err();
    assert!(!err.is_input_error());
}
