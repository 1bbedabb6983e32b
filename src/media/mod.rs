//! Media domain: classification, identification, and the indexer.

pub mod art;
pub mod category;
pub mod format;
pub mod id;
pub mod index;
pub mod metadata;

pub use category::ContentCategory;
pub use format::MediaFormat;
pub use index::{HierarchyMode, MediaIndex};
