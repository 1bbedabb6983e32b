//! Filesystem observation events and the listener seam they feed.

use std::path::Path;

use crate::error::IndexError;

/// How a file observation was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileEventKind {
    /// Seen during the startup walk of a watch root.
    Initial,
    /// Reported live by the filesystem notification backend.
    Live,
}

/// Consumer of filesystem observations.
///
/// The watch runtime owns the worker thread and calls these serially; a
/// listener never sees two events at once. Errors are per-event: the
/// runtime logs them and carries on.
pub trait FileListener: Send + Sync {
    /// A file exists under `root`. Repeated observations of the same file
    /// must be harmless.
    fn file_found(&self, root: &Path, file: &Path, kind: FileEventKind) -> Result<(), IndexError>;

    /// A path stopped existing. The exact path may no longer be resolvable;
    /// listeners reconcile however they see fit.
    fn file_gone(&self, file: &Path) -> Result<(), IndexError>;
}
