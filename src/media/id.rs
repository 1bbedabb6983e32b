//! Content identifier generation: stable ids from category and path.

use std::path::Path;

use crate::error::IndexError;
use crate::media::category::ContentCategory;
use crate::types::ContentId;

/// Derive the stable content identifier for a path in a category.
///
/// The id is the category prefix, a hex BLAKE3 digest of the absolute path
/// string, "-", and a sanitized base name. Pure function of its inputs: no
/// filesystem access, same inputs always yield the same id. An empty path
/// is a caller contract violation and is rejected here rather than hashed.
pub fn content_id(category: ContentCategory, path: &Path) -> Result<ContentId, IndexError> {
    if path.as_os_str().is_empty() {
        return Err(IndexError::InvalidPath("empty path".to_string()));
    }
    let digest = blake3::hash(path.to_string_lossy().as_bytes());
    Ok(format!(
        "{}{}-{}",
        category.id_prefix(),
        hex::encode(digest.as_bytes()),
        safe_name(path)
    ))
}

/// Base name with every non-ASCII-alphanumeric character replaced by `_`.
///
/// Falls back to sanitizing the whole path when the path has no final
/// component.
pub fn safe_name(path: &Path) -> String {
    let name = match path.file_name() {
        Some(name) => name.to_string_lossy(),
        None => path.to_string_lossy(),
    };
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}
