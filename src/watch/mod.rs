//! Filesystem watching: event interface and the runtime that feeds it.

pub mod events;
pub mod runtime;

pub use events::{FileEventKind, FileListener};
pub use runtime::Watcher;
