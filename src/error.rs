use thiserror::Error;

/// Unified error type for release-flow operations
#[derive(Error, Debug)]
pub enum ReleaseFlowError {
    /// The supplied ref or target is unsupported or malformed
    #[error("Input error: {0}")]
    Input(String),

    /// The repository options are structurally invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// An internal contract was violated
    #[error("Internal error: {0}")]
    Invariant(String),

    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("VCS query failed: {0}")]
    Vcs(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in release-flow
pub type Result<T> = std::result::Result<T, ReleaseFlowError>;

impl ReleaseFlowError {
    /// Create an input error with context
    pub fn input(msg: impl Into<String>) -> Self {
        ReleaseFlowError::Input(msg.into())
    }

    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        ReleaseFlowError::Config(msg.into())
    }

    /// Create an invariant (programmer) error with context
    pub fn invariant(msg: impl Into<String>) -> Self {
        ReleaseFlowError::Invariant(msg.into())
    }

    /// Create an external VCS error with context
    pub fn vcs(msg: impl Into<String>) -> Self {
        ReleaseFlowError::Vcs(msg.into())
    }

    /// True for errors caused by user input, configuration included.
    pub fn is_input_error(&self) -> bool {
        matches!(self, ReleaseFlowError::Input(_) | ReleaseFlowError::Config(_))
    }

    /// The message without the kind prefix, for user-facing output.
    pub fn message(&self) -> String {
        match self {
            ReleaseFlowError::Input(msg)
            | ReleaseFlowError::Config(msg)
            | ReleaseFlowError::Invariant(msg)
            | ReleaseFlowError::Vcs(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}
