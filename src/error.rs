//! Error types for catalog indexing, watching, and logging setup.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while applying a single filesystem observation to the
/// catalog.
///
/// None of these are fatal to the indexing worker: the watch runtime logs
/// the error, drops the event, and moves on.
#[derive(Debug, Error)]
pub enum IndexError {
    /// The watch root named by the event no longer exists.
    #[error("watch root not found: {0}")]
    RootGone(PathBuf),

    /// A path that cannot be addressed (empty, or missing a parent
    /// directory where one is required).
    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("node is not a container: {0}")]
    NotAContainer(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the watch runtime itself.
#[derive(Debug, Error)]
pub enum WatchError {
    /// The notify backend could not be created or a root could not be
    /// registered with it.
    #[error("watch backend error: {0}")]
    Backend(#[from] notify::Error),

    /// The event channel closed while the runtime was still running.
    #[error("watch event channel disconnected")]
    ChannelClosed,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while initialising the logging subsystem.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid logging configuration: {0}")]
    Invalid(String),

    #[error("failed to open log file: {0}")]
    Io(#[from] std::io::Error),
}
