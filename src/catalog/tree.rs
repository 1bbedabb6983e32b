//! Node registry: the id-keyed catalog tree and its prune sweep.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::catalog::node::{ContainerNode, ContentNode};
use crate::types::{ContentId, ROOT_ID, ROOT_PARENT_ID, ROOT_TITLE};

/// The catalog's node registry.
///
/// Owns every node behind an id-keyed map and the fixed root container.
/// One background worker mutates it; any number of threads may read
/// concurrently. The map lock is held only for map access, never across
/// filesystem calls.
///
/// `add_node` inserts unconditionally, overwriting any node already
/// registered under the same id. Callers keep ids unique by looking up
/// before creating; under the single-writer discipline that check cannot
/// race.
pub struct ContentTree {
    nodes: RwLock<HashMap<ContentId, Arc<ContentNode>>>,
    root: Arc<ContentNode>,
}

impl ContentTree {
    /// Create a registry holding only the root container.
    pub fn new() -> Self {
        let root = Arc::new(ContentNode::Container(ContainerNode::new(
            ROOT_ID,
            ROOT_PARENT_ID,
            ROOT_TITLE,
        )));
        let mut nodes = HashMap::new();
        nodes.insert(ROOT_ID.to_string(), Arc::clone(&root));
        ContentTree {
            nodes: RwLock::new(nodes),
            root,
        }
    }

    /// Register a node, replacing any previous node with the same id.
    pub fn add_node(&self, node: ContentNode) -> Arc<ContentNode> {
        let node = Arc::new(node);
        self.nodes
            .write()
            .insert(node.id().to_string(), Arc::clone(&node));
        node
    }

    /// O(1) lookup by id.
    pub fn get_node(&self, id: &str) -> Option<Arc<ContentNode>> {
        self.nodes.read().get(id).cloned()
    }

    /// The fixed root container.
    pub fn root_node(&self) -> Arc<ContentNode> {
        Arc::clone(&self.root)
    }

    /// Snapshot of every registered node.
    pub fn nodes(&self) -> Vec<Arc<ContentNode>> {
        self.nodes.read().values().cloned().collect()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.read().len()
    }

    /// Remove every file-backed node whose backing file is gone.
    ///
    /// Full sweep: items and bare resources alike. A removed item is also
    /// unlinked from its parent container, list and count together under
    /// the parent's lock. Containers are never cascade-deleted. Existence
    /// checks run without holding the map lock.
    pub fn prune(&self) {
        let candidates: Vec<(ContentId, PathBuf, Option<ContentId>)> = {
            self.nodes
                .read()
                .values()
                .filter_map(|node| {
                    node.backing_file().map(|file| {
                        let parent = node
                            .as_item()
                            .map(|item| item.parent_id.clone());
                        (node.id().to_string(), file.to_path_buf(), parent)
                    })
                })
                .collect()
        };

        for (id, file, parent_id) in candidates {
            if file.exists() {
                continue;
            }
            if let Some(parent_id) = parent_id {
                if let Some(parent) = self.get_node(&parent_id) {
                    if let Some(container) = parent.as_container() {
                        container.remove_item(&id);
                    }
                }
            }
            self.nodes.write().remove(&id);
            debug!(id = %id, file = %file.display(), "pruned node for missing file");
        }
    }
}

impl Default for ContentTree {
    fn default() -> Self {
        ContentTree::new()
    }
}
