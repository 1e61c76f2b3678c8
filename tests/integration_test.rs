// tests/integration_test.rs
use git2::{Oid, Repository};
use release_flow::config::{Options, RepoOptions, StrategyOptions};
use release_flow::domain::{BuildType, Version};
use release_flow::git::{Git2Repository, Repository as _};
use release_flow::BuildVersionCalculator;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

/// Real repository in a temporary directory, built from empty commits
struct TestRepo {
    dir: TempDir,
    repo: Repository,
    clock: i64,
}

impl TestRepo {
    fn new() -> Self {
        let dir = TempDir::new().expect("Could not create temp dir");
        let repo = Repository::init(dir.path()).expect("Could not init git repo");
        repo.set_head("refs/heads/master")
            .expect("Could not point HEAD at master");

        let mut test_repo = TestRepo {
            dir,
            repo,
            clock: 1_600_000_000,
        };
        test_repo.commit("master");
        test_repo
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn tip(&self, branch: &str) -> Option<Oid> {
        self.repo
            .find_reference(&format!("refs/heads/{}", branch))
            .ok()
            .and_then(|r| r.target())
    }

    /// Add an empty commit on top of `branch`
    fn commit(&mut self, branch: &str) -> Oid {
        self.clock += 60;
        let sig = git2::Signature::new(
            "Test User",
            "test@example.com",
            &git2::Time::new(self.clock, 0),
        )
        .expect("Could not create signature");
        let tree_id = self
            .repo
            .treebuilder(None)
            .and_then(|tb| tb.write())
            .expect("Could not write tree");
        let tree = self.repo.find_tree(tree_id).expect("Could not find tree");

        let parent = self
            .tip(branch)
            .map(|oid| self.repo.find_commit(oid).expect("Could not find parent"));
        let parents: Vec<_> = parent.iter().collect();

        self.repo
            .commit(
                Some(&format!("refs/heads/{}", branch)),
                &sig,
                &sig,
                "commit",
                &tree,
                &parents,
            )
            .expect("Could not create commit")
    }

    fn branch(&self, name: &str, from: &str) {
        let oid = self.tip(from).expect("Source branch exists");
        let commit = self.repo.find_commit(oid).unwrap();
        self.repo
            .branch(name, &commit, false)
            .expect("Could not create branch");
    }

    fn remote_branch(&self, name: &str, from: &str) {
        let oid = self.tip(from).expect("Source branch exists");
        self.repo
            .reference(&format!("refs/remotes/origin/{}", name), oid, false, "test")
            .expect("Could not create remote branch");
    }

    fn tag(&self, name: &str, branch: &str) {
        let oid = self.tip(branch).expect("Branch exists");
        let object = self.repo.find_object(oid, None).unwrap();
        self.repo
            .tag_lightweight(name, &object, false)
            .expect("Could not create tag");
    }

    fn checkout(&self, branch: &str) {
        self.repo
            .set_head(&format!("refs/heads/{}", branch))
            .expect("Could not checkout branch");
    }

    fn checkout_detached(&self, oid: Oid) {
        self.repo
            .set_head_detached(oid)
            .expect("Could not detach HEAD");
    }
}

/// master:      c0 - c1 - c2 - c3
/// release/1.0:       \ r1 (v1.0.0)
/// feature/login:             \ f1 - f2
fn semver_repo() -> (TestRepo, Oid, Oid) {
    let mut test_repo = TestRepo::new();
    let c1 = test_repo.commit("master");
    test_repo.branch("release/1.0", "master");
    let r1 = test_repo.commit("release/1.0");
    test_repo.tag("v1.0.0", "release/1.0");
    test_repo.commit("master");
    test_repo.commit("master");
    test_repo.branch("feature/login", "master");
    test_repo.commit("feature/login");
    test_repo.commit("feature/login");
    (test_repo, c1, r1)
}

fn semver_options(use_origin_branches: bool) -> Options {
    Options::new(
        RepoOptions::with_strategy(StrategyOptions::SemVer {
            base_number: "0.0".to_string(),
        }),
        use_origin_branches,
    )
}

#[test]
fn test_trunk_build_on_real_repository() {
    let (test_repo, c1, _) = semver_repo();
    let repo = Git2Repository::open(test_repo.path(), false).unwrap();

    let calculator = BuildVersionCalculator::new(&repo, semver_options(false)).unwrap();
    let info = calculator
        .compute_build_version("refs/heads/master", None)
        .unwrap();

    assert_eq!(info.version(), Version::new(1, 1, 0));
    assert_eq!(info.build_type, BuildType::Alpha);
    assert_eq!(info.commits_since_version_source, 2);
    assert_eq!(info.version_source_sha, c1.to_string());
    assert_eq!(info.sem_ver(), "1.1.0-alpha.2");
    assert_eq!(info.commit_date.timestamp(), 1_600_000_300);
}

#[test]
fn test_release_branch_build_on_real_repository() {
    let (test_repo, _, r1) = semver_repo();
    test_repo.checkout("release/1.0");
    let repo = Git2Repository::open(test_repo.path(), false).unwrap();

    let calculator = BuildVersionCalculator::new(&repo, semver_options(false)).unwrap();
    let info = calculator
        .compute_build_version("refs/heads/release/1.0", None)
        .unwrap();

    assert_eq!(info.version(), Version::new(1, 0, 1));
    assert_eq!(info.build_type, BuildType::Beta);
    assert_eq!(info.commits_since_version_source, 0);
    assert_eq!(info.version_source_sha, r1.to_string());
}

#[test]
fn test_working_branch_build_on_real_repository() {
    let (test_repo, _, _) = semver_repo();
    test_repo.checkout("feature/login");
    let repo = Git2Repository::open(test_repo.path(), false).unwrap();

    let calculator = BuildVersionCalculator::new(&repo, semver_options(false)).unwrap();
    let info = calculator
        .compute_build_version("refs/heads/feature/login", None)
        .unwrap();

    assert_eq!(info.version(), Version::new(1, 1, 0));
    assert_eq!(info.pre_release_label.as_deref(), Some("login"));
    assert_eq!(info.commits_since_version_source, 4);
}

#[test]
fn test_release_tag_build_on_real_repository() {
    let (test_repo, _, r1) = semver_repo();
    test_repo.checkout_detached(r1);
    let repo = Git2Repository::open(test_repo.path(), false).unwrap();

    let head = repo.get_commit("HEAD", 0).unwrap();
    assert!(head.is_detached_head);
    assert_eq!(head.tags, vec!["v1.0.0".to_string()]);

    let calculator = BuildVersionCalculator::new(&repo, semver_options(false)).unwrap();
    let info = calculator
        .compute_build_version("refs/tags/v1.0.0", None)
        .unwrap();

    assert_eq!(info.version(), Version::new(1, 0, 0));
    assert_eq!(info.build_type, BuildType::Release);
    assert_eq!(info.sem_ver(), "1.0.0");
    assert_eq!(info.commits_since_version_source, 0);
}

#[test]
fn test_origin_branches_on_real_repository() {
    let (test_repo, c1, _) = semver_repo();
    test_repo.remote_branch("master", "master");
    test_repo.remote_branch("release/1.0", "release/1.0");
    let repo = Git2Repository::open(test_repo.path(), true).unwrap();

    let mut branches = repo.list_branches().unwrap();
    branches.sort();
    assert_eq!(branches, vec!["origin/master", "origin/release/1.0"]);

    let calculator = BuildVersionCalculator::new(&repo, semver_options(true)).unwrap();
    let info = calculator
        .compute_build_version("refs/heads/master", None)
        .unwrap();
    assert_eq!(info.version(), Version::new(1, 1, 0));
    assert_eq!(info.version_source_sha, c1.to_string());
}

#[test]
fn test_binary_help() {
    let output = Command::new(env!("CARGO_BIN_EXE_release-flow"))
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("--source-ref"));
    assert!(stdout.contains("azure-pipelines"));
}

#[test]
fn test_binary_outputs_json() {
    let (test_repo, _, _) = semver_repo();
    let config_path = test_repo.path().join("rfconfig.toml");
    std::fs::write(&config_path, "[strategy]\nkind = \"SemVer\"\n").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_release-flow"))
        .arg("--repo")
        .arg(test_repo.path())
        .arg("--config")
        .arg(&config_path)
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success(), "{:?}", output);
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["semVer"], "1.1.0-alpha.2");
    assert_eq!(json["buildType"], "alpha");
    assert_eq!(json["branchName"], "master");
}

#[test]
fn test_binary_outputs_azure_pipelines() {
    let (test_repo, _, _) = semver_repo();
    test_repo.checkout("feature/login");
    let config_path = test_repo.path().join("rfconfig.toml");
    std::fs::write(&config_path, "[strategy]\nkind = \"SemVer\"\n").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_release-flow"))
        .arg("--repo")
        .arg(test_repo.path())
        .arg("--config")
        .arg(&config_path)
        .args(["--output", "azure-pipelines", "-s", "refs/heads/feature/login"])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success(), "{:?}", output);
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout
        .contains("##vso[task.setvariable variable=ReleaseFlowVersion.PreReleaseLabel;]login"));
    assert!(stdout.trim_end().ends_with("##vso[build.updatebuildnumber]1.1.0-login.4"));
}

#[test]
fn test_binary_exit_codes() {
    let (test_repo, _, _) = semver_repo();
    let config_path = test_repo.path().join("rfconfig.toml");
    std::fs::write(&config_path, "[strategy]\nkind = \"SemVer\"\n").unwrap();

    let unsupported = Command::new(env!("CARGO_BIN_EXE_release-flow"))
        .arg("--repo")
        .arg(test_repo.path())
        .arg("--config")
        .arg(&config_path)
        .args(["-s", "refs/heads/wip/thing"])
        .output()
        .expect("Failed to execute command");
    assert_eq!(unsupported.status.code(), Some(1));
    let stderr = String::from_utf8(unsupported.stderr).unwrap();
    assert!(stderr.contains("Unsupported source ref 'refs/heads/wip/thing'"));

    let not_a_repo = TempDir::new().unwrap();
    let missing_repo = Command::new(env!("CARGO_BIN_EXE_release-flow"))
        .arg("--repo")
        .arg(not_a_repo.path())
        .arg("--config")
        .arg(&config_path)
        .output()
        .expect("Failed to execute command");
    assert_eq!(missing_repo.status.code(), Some(2));
}
