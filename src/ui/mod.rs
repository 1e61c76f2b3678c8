//! User interface module - output selection and console messages.
//!
//! Separates concerns:
//! - `formatter` - Pure formatting functions
//! - This module - Output format selection and printing

pub mod formatter;

pub use formatter::{display_error, format_azure_pipelines, format_json};

use crate::domain::BuildVersionInfo;
use crate::error::Result;

/// Where the computed version is written for the build system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON object on stdout
    #[default]
    Json,
    /// Azure Pipelines logging commands
    AzurePipelines,
}

/// Render the build version in the requested format.
///
/// `pretty` only affects JSON output.
pub fn render(info: &BuildVersionInfo, format: OutputFormat, pretty: bool) -> Result<String> {
    match format {
        OutputFormat::Json => format_json(info, pretty),
        OutputFormat::AzurePipelines => Ok(format_azure_pipelines(info)),
    }
}

/// Print the rendered build version to stdout.
pub fn print_build_version(
    info: &BuildVersionInfo,
    format: OutputFormat,
    pretty: bool,
) -> Result<()> {
    println!("{}", render(info, format, pretty)?);
    Ok(())
}
