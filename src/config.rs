use crate::error::{ReleaseFlowError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the repository configuration file
pub const CONFIG_FILE_NAME: &str = "rfconfig.toml";

const ORIGIN_PREFIX: &str = "origin/";

/// Versioning strategy selection, discriminated by `kind`.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(tag = "kind")]
pub enum StrategyOptions {
    /// Release branches `<prefix><n>`, tags `vN.P`
    Milestone {
        #[serde(default = "default_milestone_prefix")]
        prefix: String,
        #[serde(default)]
        base_number: u32,
    },
    /// Release branches `major.minor`, tags `vX.Y.Z`
    SemVer {
        #[serde(default = "default_semver_base_number")]
        base_number: String,
    },
}

fn default_milestone_prefix() -> String {
    "R".to_string()
}

fn default_semver_base_number() -> String {
    "0.0".to_string()
}

fn default_trunk_branch_name() -> String {
    "master".to_string()
}

fn default_release_branch_prefix() -> String {
    "release/".to_string()
}

/// Returns the default list of working branch prefixes, in match order.
fn default_working_branch_prefixes() -> Vec<String> {
    vec![
        "feature/".to_string(),
        "bugfix/".to_string(),
        "hotfix/".to_string(),
        "merge/".to_string(),
    ]
}

fn default_true() -> bool {
    true
}

/// Repository level options, as stored in `rfconfig.toml`.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RepoOptions {
    #[serde(default = "default_trunk_branch_name")]
    pub trunk_branch_name: String,

    #[serde(default = "default_release_branch_prefix")]
    pub release_branch_prefix: String,

    /// Checked in order, first match wins
    #[serde(default = "default_working_branch_prefixes")]
    pub working_branch_prefixes: Vec<String>,

    #[serde(default = "default_true")]
    pub strip_branch_prefix_from_label: bool,

    #[serde(default = "default_true")]
    pub fail_on_unknown_prefix: bool,

    pub strategy: StrategyOptions,
}

impl RepoOptions {
    /// Default repository options for the given strategy
    pub fn with_strategy(strategy: StrategyOptions) -> Self {
        RepoOptions {
            trunk_branch_name: default_trunk_branch_name(),
            release_branch_prefix: default_release_branch_prefix(),
            working_branch_prefixes: default_working_branch_prefixes(),
            strip_branch_prefix_from_label: true,
            fail_on_unknown_prefix: true,
            strategy,
        }
    }
}

/// Options for one version calculation: repository options plus invocation flags.
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    pub repo: RepoOptions,

    /// Read `origin/...` remote-tracking branches instead of local branches.
    /// Useful on CI servers whose clones only create the built branch locally.
    pub use_origin_branches: bool,
}

impl Options {
    pub fn new(repo: RepoOptions, use_origin_branches: bool) -> Self {
        Options {
            repo,
            use_origin_branches,
        }
    }

    fn origin_prefix(&self) -> &'static str {
        if self.use_origin_branches {
            ORIGIN_PREFIX
        } else {
            ""
        }
    }

    /// Trunk branch name as listed by the repository (`origin/master` or `master`)
    pub fn full_trunk_branch_name(&self) -> String {
        format!("{}{}", self.origin_prefix(), self.repo.trunk_branch_name)
    }

    /// Release branch prefix as listed by the repository (`origin/release/` or `release/`)
    pub fn full_release_branch_prefix(&self) -> String {
        format!("{}{}", self.origin_prefix(), self.repo.release_branch_prefix)
    }
}

/// Parse and validate configuration text.
///
/// The strategy section is checked before deserializing so that every
/// structural problem is reported as a configuration error with a precise
/// message.
pub fn parse_config(text: &str) -> Result<RepoOptions> {
    let table: toml::Table = text
        .parse()
        .map_err(|_| ReleaseFlowError::config("Invalid configuration file"))?;

    let strategy = table.get("strategy").and_then(|s| s.as_table());
    let kind = strategy
        .and_then(|s| s.get("kind"))
        .and_then(|k| k.as_str())
        .ok_or_else(|| {
            ReleaseFlowError::config("Versioning strategy not specified in configuration")
        })?;
    let base_number = strategy.and_then(|s| s.get("base_number"));

    match kind {
        "Milestone" => {
            if let Some(value) = base_number {
                let number = value.as_integer().ok_or_else(invalid_base_number_type)?;
                if u32::try_from(number).is_err() {
                    return Err(ReleaseFlowError::config(format!(
                        "Invalid base_number '{}' in options",
                        number
                    )));
                }
            }
        }
        "SemVer" => {
            if base_number.is_some_and(|value| !value.is_str()) {
                return Err(invalid_base_number_type());
            }
        }
        other => {
            return Err(ReleaseFlowError::config(format!(
                "Unsupported strategy kind '{}'",
                other
            )))
        }
    }

    toml::Value::Table(table)
        .try_into()
        .map_err(|e| ReleaseFlowError::config(format!("Invalid configuration file: {}", e)))
}

fn invalid_base_number_type() -> ReleaseFlowError {
    ReleaseFlowError::config("Invalid data type for base_number in configuration")
}

/// Location of the per-user configuration file
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("release-flow").join(CONFIG_FILE_NAME))
}

/// Loads repository options from a configuration file.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `rfconfig.toml` in current directory
/// 3. `release-flow/rfconfig.toml` in user config directory
///
/// # Arguments
/// * `config_path` - Optional path to custom configuration file
///
/// # Returns
/// * `Ok(RepoOptions)` - Loaded and validated options
/// * `Err` - Input error if the custom path does not exist, configuration
///   error if no file is found or the file is invalid
pub fn load_config(config_path: Option<&str>) -> Result<RepoOptions> {
    let path = if let Some(path) = config_path {
        if !Path::new(path).exists() {
            return Err(ReleaseFlowError::input(format!(
                "Config file '{}' not found",
                path
            )));
        }
        PathBuf::from(path)
    } else if Path::new(CONFIG_FILE_NAME).exists() {
        PathBuf::from(CONFIG_FILE_NAME)
    } else if let Some(path) = user_config_path().filter(|p| p.exists()) {
        path
    } else {
        return Err(ReleaseFlowError::config(format!(
            "No configuration file found; create {} in the current directory",
            CONFIG_FILE_NAME
        )));
    };

    tracing::debug!("Reading configuration from {}", path.display());
    let text = fs::read_to_string(&path)?;
    parse_config(&text)
}
