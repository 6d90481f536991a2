//! Index module: the global backlink index.
//!
//! # Module Organization
//!
//! - [`collector`]: Edge Collector, per-file metadata to [crate::properties::Edge]s
//! - [`backlinks`]: [BacklinkIndex] snapshots and the [HeadingCatalog]
//! - [`ordered`]: [OrderedSet], the first-occurrence-wins set used for deduplication
//!
//! ```rust
//! use noet_refs::{index::BacklinkIndex, provider::{FileMetadata, MemoryVault}};
//! use std::time::SystemTime;
//!
//! let vault = MemoryVault::new();
//! vault.set_metadata(FileMetadata::new("A.md").with_block("blk1", None));
//! vault.set_metadata(FileMetadata::new("B.md").with_link("A#^blk1", None));
//!
//! let index = BacklinkIndex::build(&vault, 1, SystemTime::now());
//! assert_eq!(index.lookup("A#^blk1").len(), 1);
//! assert!(index.lookup("A#^missing").is_empty());
//! ```

pub mod backlinks;
pub mod collector;
pub mod ordered;

#[cfg(test)]
mod tests;

pub use backlinks::{BacklinkIndex, HeadingCatalog, HeadingSpelling};
pub use collector::collect_edges;
pub use ordered::OrderedSet;
