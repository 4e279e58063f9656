//! CrewHub error type shared across the workspace.

/// Errors produced by CrewHub subsystems.
#[derive(Debug, thiserror::Error)]
pub enum CrewHubError {
    #[error("config error: {0}")]
    Config(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Workspace-wide result alias.
pub type Result<T> = std::result::Result<T, CrewHubError>;
