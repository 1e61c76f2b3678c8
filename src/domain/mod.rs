//! Domain types - pure values independent of git access

pub mod branch;
pub mod build_info;
pub mod build_type;
pub mod prerelease;
pub mod version;
pub mod version_source;

pub use branch::{Branch, ReleaseBranch, ReleaseBranchNumber};
pub use build_info::BuildVersionInfo;
pub use build_type::BuildType;
pub use prerelease::{sanitize_label, PreReleaseLabel};
pub use version::Version;
pub use version_source::{ReleaseTag, VersionSource};
