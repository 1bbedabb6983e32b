//! Core types for the media catalog.

/// ContentId: stable identifier of a catalog node.
///
/// Category prefix + hex digest of the absolute path + sanitized base name.
/// Built by [`crate::media::id::content_id`]; treated as opaque everywhere
/// else.
pub type ContentId = String;

/// Identifier of the fixed catalog root container.
pub const ROOT_ID: &str = "0";

/// Parent identifier carried by the root container itself.
pub const ROOT_PARENT_ID: &str = "-1";

/// Display title of the root container.
pub const ROOT_TITLE: &str = "Root";
