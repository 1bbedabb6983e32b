//! Catalog node data model: containers, items, and addressable resources.

use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde::Serialize;

use crate::types::ContentId;

/// A servable byte stream attached to an item or container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaResource {
    pub mime: String,
    pub size: u64,
    pub url: String,
}

/// Optional tag metadata attached to an item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ItemMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
}

/// Child reference to a container, with the key its siblings sort by.
///
/// Directory containers sort by their originating directory's absolute
/// path; category containers under the root sort by their fixed ids.
#[derive(Debug, Clone, Serialize)]
pub struct ContainerEntry {
    pub id: ContentId,
    pub sort_key: String,
}

/// Child reference to an item, sorted by display title.
#[derive(Debug, Clone, Serialize)]
pub struct ItemEntry {
    pub id: ContentId,
    pub title: String,
}

/// Mutable child state of a container, guarded as one unit.
#[derive(Debug, Default)]
struct ContainerState {
    containers: Vec<ContainerEntry>,
    items: Vec<ItemEntry>,
    child_count: usize,
    art: Option<MediaResource>,
}

/// Atomic point-in-time view of a container's children.
///
/// `child_count` always equals `containers.len() + items.len()` because the
/// snapshot is taken under the container's lock.
#[derive(Debug, Clone, Serialize)]
pub struct ContainerSnapshot {
    pub containers: Vec<ContainerEntry>,
    pub items: Vec<ItemEntry>,
    pub child_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub art: Option<MediaResource>,
}

/// A container node: root, category, or directory.
///
/// Identity fields are immutable; child state is guarded by a per-container
/// lock so mutation never blocks readers of unrelated containers. List
/// edits and the denormalized child count move together inside one critical
/// section.
#[derive(Debug)]
pub struct ContainerNode {
    id: ContentId,
    parent_id: ContentId,
    title: String,
    dir_path: Option<PathBuf>,
    state: RwLock<ContainerState>,
}

impl ContainerNode {
    /// Container with no filesystem origin (the root and the category
    /// containers).
    pub fn new(id: &str, parent_id: &str, title: &str) -> Self {
        ContainerNode {
            id: id.to_string(),
            parent_id: parent_id.to_string(),
            title: title.to_string(),
            dir_path: None,
            state: RwLock::new(ContainerState::default()),
        }
    }

    /// Container mirroring a directory; titled by the directory's name.
    pub fn for_directory(id: &str, parent_id: &str, dir: &Path) -> Self {
        let title = match dir.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => dir.to_string_lossy().into_owned(),
        };
        ContainerNode {
            id: id.to_string(),
            parent_id: parent_id.to_string(),
            title,
            dir_path: Some(dir.to_path_buf()),
            state: RwLock::new(ContainerState::default()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn parent_id(&self) -> &str {
        &self.parent_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Originating directory, when this container mirrors one.
    pub fn dir_path(&self) -> Option<&Path> {
        self.dir_path.as_deref()
    }

    /// Atomic view of children, count, and art.
    pub fn snapshot(&self) -> ContainerSnapshot {
        let state = self.state.read();
        ContainerSnapshot {
            containers: state.containers.clone(),
            items: state.items.clone(),
            child_count: state.child_count,
            art: state.art.clone(),
        }
    }

    pub fn child_count(&self) -> usize {
        self.state.read().child_count
    }

    pub fn has_item(&self, id: &str) -> bool {
        self.state.read().items.iter().any(|e| e.id == id)
    }

    pub fn has_container(&self, id: &str) -> bool {
        self.state.read().containers.iter().any(|e| e.id == id)
    }

    /// Add a child container and re-sort siblings by sort key,
    /// case-insensitively. Count bump and list edit are one atomic unit.
    pub fn insert_container(&self, entry: ContainerEntry) {
        let mut state = self.state.write();
        state.containers.push(entry);
        state
            .containers
            .sort_by(|a, b| a.sort_key.to_lowercase().cmp(&b.sort_key.to_lowercase()));
        state.child_count += 1;
    }

    /// Add a child item and re-sort siblings by title, case-insensitively.
    /// Count bump and list edit are one atomic unit.
    pub fn insert_item(&self, entry: ItemEntry) {
        let mut state = self.state.write();
        state.items.push(entry);
        state
            .items
            .sort_by(|a, b| a.title.to_lowercase().cmp(&b.title.to_lowercase()));
        state.child_count += 1;
    }

    /// Unlink a child item. Returns false when the id was not a child.
    pub fn remove_item(&self, id: &str) -> bool {
        let mut state = self.state.write();
        let before = state.items.len();
        state.items.retain(|e| e.id != id);
        if state.items.len() < before {
            state.child_count -= 1;
            true
        } else {
            false
        }
    }

    pub fn set_art(&self, art: MediaResource) {
        self.state.write().art = Some(art);
    }

    pub fn art(&self) -> Option<MediaResource> {
        self.state.read().art.clone()
    }
}

/// A playable media item. Immutable once constructed: every resource is
/// resolved before the node reaches the registry.
#[derive(Debug, Clone, Serialize)]
pub struct ItemNode {
    pub id: ContentId,
    pub parent_id: ContentId,
    pub title: String,
    pub file: PathBuf,
    pub resource: MediaResource,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub subtitles: Vec<MediaResource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub art: Option<MediaResource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ItemMetadata>,
}

/// A bare addressable file: cover art or subtitles referenced by items and
/// containers. Carries no parent link; it is reached only through the
/// resources that point at it.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceNode {
    pub id: ContentId,
    pub file: PathBuf,
}

/// The unit stored in the node registry.
#[derive(Debug)]
pub enum ContentNode {
    Container(ContainerNode),
    Item(ItemNode),
    Resource(ResourceNode),
}

impl ContentNode {
    pub fn id(&self) -> &str {
        match self {
            ContentNode::Container(c) => c.id(),
            ContentNode::Item(i) => &i.id,
            ContentNode::Resource(r) => &r.id,
        }
    }

    /// Parent link, absent for bare resources.
    pub fn parent_id(&self) -> Option<&str> {
        match self {
            ContentNode::Container(c) => Some(c.parent_id()),
            ContentNode::Item(i) => Some(&i.parent_id),
            ContentNode::Resource(_) => None,
        }
    }

    /// Display title, absent for bare resources.
    pub fn title(&self) -> Option<&str> {
        match self {
            ContentNode::Container(c) => Some(c.title()),
            ContentNode::Item(i) => Some(&i.title),
            ContentNode::Resource(_) => None,
        }
    }

    /// The file this node serves bytes from. Containers have none; a
    /// directory container's path is its origin, not a servable file.
    pub fn backing_file(&self) -> Option<&Path> {
        match self {
            ContentNode::Container(_) => None,
            ContentNode::Item(i) => Some(&i.file),
            ContentNode::Resource(r) => Some(&r.file),
        }
    }

    pub fn as_container(&self) -> Option<&ContainerNode> {
        match self {
            ContentNode::Container(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_item(&self) -> Option<&ItemNode> {
        match self {
            ContentNode::Item(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_resource(&self) -> Option<&ResourceNode> {
        match self {
            ContentNode::Resource(r) => Some(r),
            _ => None,
        }
    }

    /// Short kind label for summaries and browse output.
    pub fn kind(&self) -> &'static str {
        match self {
            ContentNode::Container(_) => "container",
            ContentNode::Item(_) => "item",
            ContentNode::Resource(_) => "resource",
        }
    }
}
