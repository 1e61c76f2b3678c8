//! Pure formatting functions for UI output.
//!
//! Functions returning `String` build the version output; the `display_*`
//! functions print console messages to stderr.

use chrono::SecondsFormat;
use console::style;

use crate::domain::BuildVersionInfo;
use crate::error::{ReleaseFlowError, Result};

/// Variable namespace used for pipeline variables
pub const VARIABLE_PREFIX: &str = "ReleaseFlowVersion";

/// Serialize the build version as JSON, indented when `pretty` is set.
pub fn format_json(info: &BuildVersionInfo, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(info)
    } else {
        serde_json::to_string(info)
    };
    json.map_err(|e| ReleaseFlowError::invariant(format!("Unable to serialize version: {}", e)))
}

/// Azure Pipelines logging commands setting one variable per field, then
/// updating the build number to the full version.
///
/// ```text
/// ##vso[task.setvariable variable=ReleaseFlowVersion.Major;]1
/// ...
/// ##vso[build.updatebuildnumber]1.2.0-alpha.3
/// ```
pub fn format_azure_pipelines(info: &BuildVersionInfo) -> String {
    let variables = [
        ("Major", info.major.to_string()),
        ("Minor", info.minor.to_string()),
        ("Patch", info.patch.to_string()),
        ("MajorMinorPatch", info.major_minor_patch()),
        ("BranchName", info.branch_name.clone()),
        ("BuildType", info.build_type.to_string()),
        (
            "PreReleaseLabel",
            info.pre_release_label.clone().unwrap_or_default(),
        ),
        ("Sha", info.sha.clone()),
        ("ShortSha", info.short_sha().to_string()),
        (
            "CommitDate",
            info.commit_date.to_rfc3339_opts(SecondsFormat::Secs, true),
        ),
        (
            "CommitsSinceVersionSource",
            info.commits_since_version_source.to_string(),
        ),
    ];

    let mut output: Vec<String> = variables
        .iter()
        .map(|(name, value)| {
            format!(
                "##vso[task.setvariable variable={}.{};]{}",
                VARIABLE_PREFIX, name, value
            )
        })
        .collect();
    output.push(format!("##vso[build.updatebuildnumber]{}", info.sem_ver()));
    output.join("\n")
}

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red(), message);
}
