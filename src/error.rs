use std::io;

/// Errors that can occur during archive extraction.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in minor versions without breaking existing code. Always include a
/// catch-all `_ =>` arm when matching.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Entry name would land outside the output root.
    #[error("path '{entry}' escapes destination: {detail}")]
    PathTraversal { entry: String, detail: String },

    /// Symlink target is missing, blank, or rejected by the symlink policy.
    #[error("invalid symlink '{entry}': {reason}")]
    InvalidSymlink { entry: String, reason: String },

    /// A codec needs a cargo feature that was not compiled in.
    #[error("{codec} support is not available (enable the `{feature}` feature)")]
    MissingDependency {
        codec: &'static str,
        feature: &'static str,
    },

    /// Destination directory does not exist or is invalid.
    #[error("destination directory '{path}' does not exist")]
    DestinationNotFound { path: String },

    /// File extension does not map to a known archive or compression format.
    #[error("unsupported archive format: '{path}'")]
    UnsupportedFormat { path: String },

    /// Zip format error.
    #[error("zip format error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Path jail error.
    #[error("path validation error: {0}")]
    Jail(#[from] path_jail::JailError),

    /// IO error (includes TAR format errors since tar crate uses io::Error).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    pub(crate) fn traversal(entry: &str, detail: impl Into<String>) -> Self {
        Self::PathTraversal {
            entry: entry.to_string(),
            detail: detail.into(),
        }
    }

    pub(crate) fn symlink(entry: &str, reason: impl Into<String>) -> Self {
        Self::InvalidSymlink {
            entry: entry.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
