//! # noet-refs
//!
//! A backlink index and inline reference-count engine for networks of interlinked markdown
//! documents.
//!
//! ## Overview
//!
//! noet-refs builds a global index of every reference between documents (wikilinks and embeds
//! pointing at pages, headings and `^block` ids) and answers two questions for a host editor:
//!
//! - *Who references this anchor?* [`index::BacklinkIndex::lookup`] returns the edges filed
//!   under a normalized reference key.
//! - *Where in the visible text should a reference count be drawn?*
//!   [`service::ReferenceService::compute_decorations`] scans a byte window of a file and
//!   returns ordered [`properties::DecorationDescriptor`]s.
//!
//! The core never parses document syntax and does no I/O of its own. Per-file anchor metadata
//! comes from a [`provider::MetadataProvider`] and raw text from a
//! [`provider::ContentProvider`]. The [`codec`] module supplies a markdown-on-disk
//! implementation of both for tools and tests.
//!
//! ## Architecture
//!
//! Data flows leaves first:
//!
//! - **[`index`]**: the Edge Collector turns metadata into edges; [`index::BacklinkIndex`] is an
//!   immutable snapshot of `key -> edges`, rebuilt wholesale
//! - **[`page`]**: [`page::PageCache`] pairs every anchor of a file with its backlinks and
//!   tracks staleness by index generation, build time and TTL
//! - **[`inline`]**: [`inline::MatchEngine`] recognizes blocks, headings, embeds and links in a
//!   window and resolves them against the page view
//! - **[`scheduler`]**: leading-edge [`scheduler::Debouncer`] over an injectable clock
//! - **[`service`]**: [`service::ReferenceService`] ties the pieces to the host's providers and
//!   drains [`event::IndexEvent`]s
//! - **[`nodekey`]** and **[`paths`]**: the key normalization every component shares
//!
//! ## Quick Start
//!
//! ```rust
//! use noet_refs::{
//!     config::RefConfig,
//!     properties::ReferenceKind,
//!     provider::{FileMetadata, MemoryVault},
//!     service::ReferenceService,
//! };
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), noet_refs::RefIndexError> {
//! let vault = Arc::new(MemoryVault::new());
//! vault.insert(
//!     FileMetadata::new("A.md").with_block("blk1", None),
//!     Some("Some text ^blk1\n".to_string()),
//! );
//! vault.set_metadata(FileMetadata::new("B.md").with_link("A#^blk1", None));
//!
//! let mut service = ReferenceService::new(RefConfig::default(), vault.clone(), vault)?;
//! service.rebuild();
//!
//! assert_eq!(service.lookup("A#^blk1").len(), 1);
//!
//! let decorations = service.compute_decorations("A.md", None)?;
//! assert_eq!(decorations.len(), 1);
//! assert_eq!(decorations[0].kind, ReferenceKind::Block);
//! assert_eq!(decorations[0].count, 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Reference keys
//!
//! Keys always carry the full vault path of the page without its `.md` extension:
//! `Notes/Plan`, `Notes/Plan#Goals`, `Notes/Plan#^blk1`. Link aliases are dropped, fragment-only
//! links resolve against the file they appear in, and bare page names are resolved through the
//! set of known pages. See [`paths::LinkResolver`] for the exact policy.

pub mod codec;
pub mod config;
pub mod error;
pub mod event;
pub mod index;
pub mod inline;
pub mod nodekey;
pub mod page;
pub mod paths;
pub mod properties;
pub mod provider;
pub mod scheduler;
pub mod service;

pub use error::*;
