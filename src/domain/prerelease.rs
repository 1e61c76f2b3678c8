//! Pre-release labels for non-release builds
//!
//! Labels follow the dot-separated identifier rules of semantic versioning:
//! https://semver.org/#spec-item-9

use std::fmt;

/// Pre-release label attached to a build
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreReleaseLabel {
    /// Trunk build
    Alpha,
    /// Release branch build
    Beta,
    /// Pull request build, carrying the PR number
    PullRequest(String),
    /// Working branch build, carrying the sanitized branch label
    Branch(String),
}

impl PreReleaseLabel {
    /// Create a working-branch label, sanitizing the raw branch text
    ///
    /// # Examples
    /// ```
    /// # use release_flow::domain::PreReleaseLabel;
    /// let label = PreReleaseLabel::for_branch("feature.012..my-feature.001");
    /// assert_eq!(label.to_string(), "feature.12.my-feature.1");
    /// ```
    pub fn for_branch(raw: &str) -> Self {
        PreReleaseLabel::Branch(sanitize_label(raw))
    }
}

impl fmt::Display for PreReleaseLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreReleaseLabel::Alpha => write!(f, "alpha"),
            PreReleaseLabel::Beta => write!(f, "beta"),
            PreReleaseLabel::PullRequest(number) => write!(f, "pr.{}", number),
            PreReleaseLabel::Branch(label) => write!(f, "{}", label),
        }
    }
}

/// Turn arbitrary branch text into a valid pre-release identifier series.
///
/// - characters outside `[0-9A-Za-z-.]` become `-`
/// - empty identifiers are dropped
/// - numeric identifiers lose their leading zeros
pub fn sanitize_label(raw: &str) -> String {
    let replaced: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '.' {
                c
            } else {
                '-'
            }
        })
        .collect();

    replaced
        .split('.')
        .filter(|id| !id.is_empty())
        .map(normalize_identifier)
        .collect::<Vec<_>>()
        .join(".")
}

fn normalize_identifier(id: &str) -> &str {
    if !id.bytes().all(|b| b.is_ascii_digit()) {
        return id;
    }
    let trimmed = id.trim_start_matches('0');
    if trimmed.is_empty() {
        "0"
    } else {
        trimmed
    }
}
