pub mod analyzer;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod git;
pub mod logging;
pub mod strategy;
pub mod ui;

pub use analyzer::BuildVersionCalculator;
pub use error::{ReleaseFlowError, Result};
