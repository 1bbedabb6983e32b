//! Catalog data model and node registry.

pub mod node;
pub mod tree;

pub use node::{
    ContainerEntry, ContainerNode, ContainerSnapshot, ContentNode, ItemEntry, ItemMetadata,
    ItemNode, MediaResource, ResourceNode,
};
pub use tree::ContentTree;
