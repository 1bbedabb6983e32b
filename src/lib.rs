//! Mediatree: Media Catalog Indexing
//!
//! Watches media directories and maintains an in-memory catalog tree of
//! containers, items, and resources, addressable by stable content ids.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod media;
pub mod types;
pub mod watch;
