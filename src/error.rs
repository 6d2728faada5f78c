use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for release-forge operations
#[derive(Error, Debug)]
pub enum ForgeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("No line in {} matches {pattern}", path.display())]
    NoMatch { path: PathBuf, pattern: String },

    #[error("Format error: {0}")]
    Format(String),

    /// A local tag with this name already exists. Recoverable for the tag processor.
    #[error("Tag '{0}' already exists")]
    TagExists(String),

    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("Remote operation failed: {0}")]
    Remote(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in release-forge
pub type Result<T> = std::result::Result<T, ForgeError>;

impl ForgeError {
    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        ForgeError::Config(msg.into())
    }

    /// Create a parse error with context
    pub fn parse(msg: impl Into<String>) -> Self {
        ForgeError::Parse(msg.into())
    }

    /// Create a format error with context
    pub fn format(msg: impl Into<String>) -> Self {
        ForgeError::Format(msg.into())
    }

    /// Create a remote error with context
    pub fn remote(msg: impl Into<String>) -> Self {
        ForgeError::Remote(msg.into())
    }

    pub fn no_match(path: impl Into<PathBuf>, pattern: impl Into<String>) -> Self {
        ForgeError::NoMatch {
            path: path.into(),
            pattern: pattern.into(),
        }
    }

    /// True for the one tag-creation failure the tag processor may skip.
    pub fn is_tag_exists(&self) -> bool {
        matches!(self, ForgeError::TagExists(_))
    }
}
