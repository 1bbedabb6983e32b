//! The indexer: applies filesystem observations to the catalog tree.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::catalog::node::{
    ContainerEntry, ContainerNode, ContentNode, ItemEntry, ItemNode, MediaResource, ResourceNode,
};
use crate::catalog::tree::ContentTree;
use crate::error::IndexError;
use crate::media::art::find_cover_art;
use crate::media::category::ContentCategory;
use crate::media::format::MediaFormat;
use crate::media::id::content_id;
use crate::media::metadata::{Id3v1Reader, MetadataReader};
use crate::watch::events::{FileEventKind, FileListener};

/// How directory structure maps onto catalog containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HierarchyMode {
    /// Each file's directory becomes a single container directly under the
    /// category container; nesting is not represented.
    Flatten,
    /// The directory chain from the watch root down to the file is
    /// mirrored as nested containers.
    Preserve,
}

impl Default for HierarchyMode {
    fn default() -> Self {
        HierarchyMode::Flatten
    }
}

impl FromStr for HierarchyMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "flatten" => Ok(HierarchyMode::Flatten),
            "preserve" => Ok(HierarchyMode::Preserve),
            other => Err(format!("unknown hierarchy mode: {other}")),
        }
    }
}

/// Consumes found/gone file events and keeps the catalog tree correct.
///
/// One indexer is the single writer for its tree: the watch runtime calls
/// it from one thread, while readers browse the tree concurrently. The
/// three category containers are created once, up front, and looked up by
/// category from then on.
pub struct MediaIndex {
    tree: Arc<ContentTree>,
    external_http_context: String,
    hierarchy: HierarchyMode,
    metadata_reader: Arc<dyn MetadataReader>,
    category_containers: HashMap<ContentCategory, Arc<ContentNode>>,
}

impl MediaIndex {
    pub fn new(
        tree: Arc<ContentTree>,
        external_http_context: impl Into<String>,
        hierarchy: HierarchyMode,
    ) -> Self {
        let root = tree.root_node();
        let mut category_containers = HashMap::new();
        for category in ContentCategory::ALL {
            let container = ContainerNode::new(
                category.container_id(),
                root.id(),
                category.human_name(),
            );
            let (node, _) = Self::get_or_create_container(
                &tree,
                &root,
                container,
                category.container_id().to_string(),
            );
            category_containers.insert(category, node);
        }
        MediaIndex {
            tree,
            external_http_context: external_http_context.into(),
            hierarchy,
            metadata_reader: Arc::new(Id3v1Reader),
            category_containers,
        }
    }

    /// Swap in a different metadata backend.
    pub fn with_metadata_reader(mut self, reader: Arc<dyn MetadataReader>) -> Self {
        self.metadata_reader = reader;
        self
    }

    pub fn hierarchy(&self) -> HierarchyMode {
        self.hierarchy
    }

    fn category_container(&self, category: ContentCategory) -> &Arc<ContentNode> {
        // populated for every category at construction
        &self.category_containers[&category]
    }

    fn resource_url(&self, id: &str) -> String {
        format!("{}/{}", self.external_http_context, id)
    }

    fn put_file(&self, root_dir: &Path, file: &Path, format: MediaFormat) -> Result<(), IndexError> {
        let dir = file.parent().ok_or_else(|| {
            IndexError::InvalidPath(format!("no parent directory: {}", file.display()))
        })?;
        let category = format.category();
        let category_container = Arc::clone(self.category_container(category));

        let dir_container = match self.hierarchy {
            HierarchyMode::Flatten => self.make_dir_container(category, &category_container, dir)?,
            HierarchyMode::Preserve => {
                self.make_dir_chain(category, &category_container, root_dir, dir)?
            }
        };
        self.make_item(format, &dir_container, file)
    }

    /// Register a container if its id is unknown, linking it under
    /// `parent` with the given sort key. Returns the node and whether it
    /// was created by this call.
    fn get_or_create_container(
        tree: &ContentTree,
        parent: &Arc<ContentNode>,
        container: ContainerNode,
        sort_key: String,
    ) -> (Arc<ContentNode>, bool) {
        if let Some(existing) = tree.get_node(container.id()) {
            return (existing, false);
        }
        let id = container.id().to_string();
        let node = tree.add_node(ContentNode::Container(container));
        // parent is a container at every call site
        if let Some(parent_container) = parent.as_container() {
            parent_container.insert_container(ContainerEntry { id, sort_key });
        }
        (node, true)
    }

    /// Resolve or create the container mirroring `dir` under `parent`.
    /// Cover art for the directory is looked up once, on creation.
    fn make_dir_container(
        &self,
        category: ContentCategory,
        parent: &Arc<ContentNode>,
        dir: &Path,
    ) -> Result<Arc<ContentNode>, IndexError> {
        let id = content_id(category, dir)?;
        let container = ContainerNode::for_directory(&id, parent.id(), dir);
        let sort_key = dir.to_string_lossy().into_owned();
        let (node, created) = Self::get_or_create_container(&self.tree, parent, container, sort_key);
        if created {
            if let Some(art) = self.find_art_resource(dir, category) {
                if let Some(container) = node.as_container() {
                    container.set_art(art);
                }
            }
        }
        Ok(node)
    }

    /// Materialize the container chain from the watch root down to `dir`.
    ///
    /// Walks upward collecting directories with no container yet, stopping
    /// at the first known one or at the watch root, then creates the
    /// missing containers root-most first. The watch root's container
    /// parents to the category container; every other container parents to
    /// its parent directory's container.
    fn make_dir_chain(
        &self,
        category: ContentCategory,
        category_container: &Arc<ContentNode>,
        root_dir: &Path,
        dir: &Path,
    ) -> Result<Arc<ContentNode>, IndexError> {
        let mut missing: Vec<PathBuf> = Vec::new();
        let mut current = Some(dir.to_path_buf());
        while let Some(d) = current {
            if self.tree.get_node(&content_id(category, &d)?).is_some() {
                break;
            }
            let at_root = d == root_dir;
            current = d.parent().map(Path::to_path_buf);
            missing.push(d);
            if at_root {
                break;
            }
        }
        missing.reverse();

        for d in &missing {
            let parent = if d == root_dir {
                Arc::clone(category_container)
            } else {
                let parent_dir = d.parent().ok_or_else(|| {
                    IndexError::InvalidPath(format!("no parent directory: {}", d.display()))
                })?;
                let parent_id = content_id(category, parent_dir)?;
                self.tree.get_node(&parent_id).ok_or_else(|| {
                    IndexError::InvalidPath(format!(
                        "ancestor container missing for: {}",
                        d.display()
                    ))
                })?
            };
            self.make_dir_container(category, &parent, d)?;
        }

        self.tree
            .get_node(&content_id(category, dir)?)
            .ok_or_else(|| {
                IndexError::InvalidPath(format!("container not materialized for: {}", dir.display()))
            })
    }

    /// Create the item node for `file` under `parent`, unless the parent
    /// already lists it. All resources are resolved before the node is
    /// registered; the sorted parent link comes last.
    fn make_item(
        &self,
        format: MediaFormat,
        parent: &Arc<ContentNode>,
        file: &Path,
    ) -> Result<(), IndexError> {
        let category = format.category();
        let id = content_id(category, file)?;
        let parent_container = parent
            .as_container()
            .ok_or_else(|| IndexError::NotAContainer(parent.id().to_string()))?;
        if parent_container.has_item(&id) {
            return Ok(());
        }

        let title = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| IndexError::InvalidPath(format!("no file name: {}", file.display())))?;
        let resource = MediaResource {
            mime: format.mime().to_string(),
            size: file_size(file),
            url: self.resource_url(&id),
        };
        let subtitles = if category == ContentCategory::Video {
            self.find_subtitles(category, file)?
        } else {
            Vec::new()
        };
        let art = self.find_art_resource(file, category);
        let metadata = self.metadata_reader.read(file);

        self.tree.add_node(ContentNode::Item(ItemNode {
            id: id.clone(),
            parent_id: parent.id().to_string(),
            title: title.clone(),
            file: file.to_path_buf(),
            resource,
            subtitles,
            art,
            metadata,
        }));
        parent_container.insert_item(ItemEntry { id, title });
        Ok(())
    }

    /// Sibling subtitle files: same base-name prefix, `.srt` suffix
    /// case-insensitively, and not themselves media. Each is registered as
    /// an addressable resource node. Candidates are sorted by name so
    /// resource order does not depend on directory listing order.
    fn find_subtitles(
        &self,
        category: ContentCategory,
        file: &Path,
    ) -> Result<Vec<MediaResource>, IndexError> {
        let dir = file.parent().ok_or_else(|| {
            IndexError::InvalidPath(format!("no parent directory: {}", file.display()))
        })?;
        let base = file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut names: Vec<String> = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let Ok(entry) = entry else { continue };
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.starts_with(&base) || MediaFormat::identify_name(&name).is_some() {
                continue;
            }
            if name.to_lowercase().ends_with(".srt") {
                names.push(name);
            }
        }
        names.sort();

        let mut subtitles = Vec::new();
        for name in names {
            let srt = dir.join(&name);
            let srt_id = content_id(category, &srt)?;
            self.tree.add_node(ContentNode::Resource(ResourceNode {
                id: srt_id.clone(),
                file: srt.clone(),
            }));
            subtitles.push(MediaResource {
                mime: "text/srt".to_string(),
                size: file_size(&srt),
                url: self.resource_url(&srt_id),
            });
        }
        Ok(subtitles)
    }

    /// Resolve cover art for a file or directory into a servable resource,
    /// registering the art file as an addressable node. Art of a type the
    /// classifier rejects is reported and skipped.
    fn find_art_resource(
        &self,
        media_path: &Path,
        category: ContentCategory,
    ) -> Option<MediaResource> {
        let art_file = find_cover_art(media_path)?;
        let Some(art_format) = MediaFormat::identify(&art_file) else {
            warn!(file = %art_file.display(), "ignoring art file of unsupported type");
            return None;
        };
        let art_id = content_id(category, &art_file).ok()?;
        self.tree.add_node(ContentNode::Resource(ResourceNode {
            id: art_id.clone(),
            file: art_file.clone(),
        }));
        Some(MediaResource {
            mime: art_format.mime().to_string(),
            size: file_size(&art_file),
            url: self.resource_url(&art_id),
        })
    }
}

impl FileListener for MediaIndex {
    fn file_found(&self, root_dir: &Path, file: &Path, kind: FileEventKind) -> Result<(), IndexError> {
        if !root_dir.exists() {
            return Err(IndexError::RootGone(root_dir.to_path_buf()));
        }
        if !file.is_file() {
            return Ok(());
        }
        let Some(format) = MediaFormat::identify(file) else {
            return Ok(());
        };
        self.put_file(root_dir, file, format)?;
        if kind == FileEventKind::Live {
            info!(file = %file.display(), "shared");
        }
        Ok(())
    }

    fn file_gone(&self, _file: &Path) -> Result<(), IndexError> {
        self.tree.prune();
        Ok(())
    }
}

/// Byte length, zero when the file vanished between discovery and stat.
fn file_size(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}
