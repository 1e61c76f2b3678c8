//! Version calculation on top of the repository queries

pub mod build_version;
pub mod release_branches;

pub use build_version::BuildVersionCalculator;
pub use release_branches::ReleaseBranchAnalyzer;
