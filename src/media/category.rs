//! Content categories: the three top-level media classes of the catalog.

use serde::{Deserialize, Serialize};

/// Closed set of media classes the catalog serves.
///
/// Each category owns a fixed top-level container directly under the
/// catalog root and an identifier prefix applied to every hashed id in
/// that category. The container ids carry a numeric prefix so the root's
/// children sort into a stable display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentCategory {
    Video,
    Image,
    Audio,
}

impl ContentCategory {
    /// All categories, in root display order.
    pub const ALL: [ContentCategory; 3] = [
        ContentCategory::Video,
        ContentCategory::Image,
        ContentCategory::Audio,
    ];

    /// Human-readable title of the category container.
    pub fn human_name(&self) -> &'static str {
        match self {
            ContentCategory::Video => "Videos",
            ContentCategory::Image => "Images",
            ContentCategory::Audio => "Audio",
        }
    }

    /// Fixed identifier of the category's top-level container.
    pub fn container_id(&self) -> &'static str {
        match self {
            ContentCategory::Video => "1-videos",
            ContentCategory::Image => "2-images",
            ContentCategory::Audio => "3-audio",
        }
    }

    /// Prefix prepended to every hashed content identifier in this
    /// category.
    pub fn id_prefix(&self) -> &'static str {
        match self {
            ContentCategory::Video => "video-",
            ContentCategory::Image => "image-",
            ContentCategory::Audio => "audio-",
        }
    }
}
