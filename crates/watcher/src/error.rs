//! Error types for the hot reload watcher.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for watcher operations.
pub type Result<T> = std::result::Result<T, WatchError>;

/// Errors that can occur while registering or polling watches.
///
/// Build failures never appear here: the build trigger logs and
/// swallows them so the loop keeps running.
#[derive(Error, Debug)]
pub enum WatchError {
    /// The watch root is missing or not a directory.
    #[error("cannot watch {}: {reason}", .path.display())]
    InvalidRoot { path: PathBuf, reason: String },

    /// Walking the directory tree failed.
    #[error("failed to walk {}: {source}", .path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// The notification facility refused a subscription.
    #[error("failed to watch {}: {source}", .path.display())]
    Subscribe {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    /// The notification facility itself failed.
    #[error("watch backend error: {0}")]
    Backend(#[from] notify::Error),

    /// The event channel from the notification thread closed.
    #[error("watch backend stopped delivering events")]
    ChannelClosed,

    /// A .gitignore file could not be parsed.
    #[error("invalid ignore file: {0}")]
    Ignore(#[from] ignore::Error),
}

impl WatchError {
    /// True when the error concerns a single subtree rather than the backend.
    ///
    /// The event loop keeps running after recoverable errors raised while
    /// registering a freshly created directory.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            WatchError::InvalidRoot { .. } | WatchError::Walk { .. } | WatchError::Subscribe { .. }
        )
    }
}
