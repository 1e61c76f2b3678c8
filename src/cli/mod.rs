//! Command line workflow, separated from argument parsing in `main.rs`

pub mod orchestration;

pub use orchestration::{resolve_source_ref, run_version_workflow, VersionWorkflowArgs};
