use serde::Serialize;
use std::fmt;

/// Why a build is happening
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BuildType {
    /// Commit on the trunk branch
    Alpha,
    /// Commit on a release branch
    Beta,
    /// Commit on a feature/bugfix/hotfix/merge branch
    WorkingBranch,
    PullRequest,
    /// Release tag
    Release,
}

impl BuildType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildType::Alpha => "alpha",
            BuildType::Beta => "beta",
            BuildType::WorkingBranch => "working-branch",
            BuildType::PullRequest => "pull-request",
            BuildType::Release => "release",
        }
    }
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_serde() {
        for bt in [
            BuildType::Alpha,
            BuildType::Beta,
            BuildType::WorkingBranch,
            BuildType::PullRequest,
            BuildType::Release,
        ] {
            let json = serde_json::to_string(&bt).unwrap();
            assert_eq!(json, format!("\"{}\"", bt));
        }
    }
}
