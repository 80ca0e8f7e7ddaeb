use thiserror::Error;

/// Application-wide result type alias.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// I/O errors from terminal or filesystem operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Terminal initialization or rendering errors.
    #[error("Terminal error: {0}")]
    Terminal(String),

    /// Invalid path provided by the user.
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// A directory listing could not be produced by the provider.
    #[error("Cannot list {path}: {source}")]
    Listing {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The requested path exists but is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(String),

    /// An in-flight provider call was cancelled before it completed.
    #[error("Request cancelled")]
    Cancelled,

    /// Log sink could not be set up.
    #[error("Logging error: {0}")]
    Logging(String),
}
