//! Tests for BacklinkIndex construction and lookup

use super::*;
use crate::{
    error::RefIndexError,
    properties::{Loc, Position, ReferenceKind},
    provider::{FileMetadata, MemoryVault, MetadataProvider},
};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use test_log::test;

fn at(offset: usize) -> Option<Position> {
    let loc = Loc {
        line: 0,
        col: offset,
        offset,
    };
    Some(Position::new(loc, loc))
}

fn test_vault() -> MemoryVault {
    let vault = MemoryVault::new();
    vault.set_metadata(
        FileMetadata::new("A.md")
            .with_heading("Intro", 2, at(0))
            .with_block("blk1", at(20)),
    );
    vault.set_metadata(
        FileMetadata::new("B.md")
            .with_link("A#^blk1", at(0))
            .with_link("A#Intro|the intro", at(15))
            .with_embed("A", at(40)),
    );
    vault.set_metadata(
        FileMetadata::new("C.md")
            .with_link("A#Intro", at(3))
            .with_link("#Local", at(9))
            .with_heading("Local", 1, at(0)),
    );
    vault
}

/// A provider whose metadata cannot be read for one file.
struct FlakyProvider {
    inner: MemoryVault,
    broken: &'static str,
}

impl MetadataProvider for FlakyProvider {
    fn files(&self) -> Vec<String> {
        self.inner.files()
    }

    fn metadata(&self, path: &str) -> Result<FileMetadata, RefIndexError> {
        if path == self.broken {
            return Err(RefIndexError::Serialization(format!(
                "corrupt metadata for {path}"
            )));
        }
        self.inner.metadata(path)
    }
}

#[test]
fn test_lookup_returns_edges_in_discovery_order() {
    let index = BacklinkIndex::build(&test_vault(), 1, SystemTime::now());

    let intro = index.lookup("A#Intro");
    assert_eq!(intro.len(), 2);
    assert_eq!(intro[0].source, "B.md");
    assert_eq!(intro[0].display_text.as_deref(), Some("the intro"));
    assert_eq!(intro[1].source, "C.md");

    let block = index.lookup("A#^blk1");
    assert_eq!(block.len(), 1);
    assert_eq!(block[0].kind, ReferenceKind::Link);

    let page = index.lookup("A");
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].kind, ReferenceKind::Embed);

    assert_eq!(index.lookup("C#Local").len(), 1);
    assert!(index.lookup("#Local").is_empty());
    assert!(index.lookup("Nope#^missing").is_empty());

    assert_eq!(index.edge_count(), 5);
    assert_eq!(index.file_count(), 3);
    assert_eq!(index.generation(), 1);
}

#[test]
fn test_every_edge_is_filed_under_its_own_target() {
    let index = BacklinkIndex::build(&test_vault(), 1, SystemTime::now());
    let mut total = 0;
    for key in index.keys() {
        for edge in index.lookup(key.as_str()) {
            assert_eq!(&edge.target, key);
            total += 1;
        }
    }
    assert_eq!(total, index.edge_count());
}

#[test]
fn test_unreadable_and_unresolved_files_are_skipped() {
    let inner = test_vault();
    inner.insert_unresolved("D.md");
    let provider = FlakyProvider {
        inner,
        broken: "C.md",
    };
    let index = BacklinkIndex::build(&provider, 2, SystemTime::now());

    assert_eq!(index.lookup("A#Intro").len(), 1);
    assert_eq!(index.skipped_files(), &["C.md".to_string(), "D.md".to_string()]);
    // Skipped files are still known pages for link resolution
    assert!(index.resolver().contains("C"));
    assert!(index.resolver().contains("D"));
}

#[test]
fn test_malformed_links_contribute_nothing() {
    let vault = MemoryVault::new();
    vault.set_metadata(
        FileMetadata::new("B.md")
            .with_link("", at(0))
            .with_link("|alias", at(5))
            .with_link("#^", at(10)),
    );
    let index = BacklinkIndex::build(&vault, 1, SystemTime::now());
    assert!(index.is_empty());
    assert_eq!(index.edge_count(), 0);
}

#[test]
fn test_sources_for_deduplicates() {
    let vault = MemoryVault::new();
    vault.set_metadata(FileMetadata::new("A.md"));
    vault.set_metadata(
        FileMetadata::new("B.md")
            .with_link("A", at(0))
            .with_link("A|again", at(10)),
    );
    vault.set_metadata(FileMetadata::new("C.md").with_link("A", at(0)));
    let index = BacklinkIndex::build(&vault, 1, SystemTime::now());
    assert_eq!(index.lookup("A").len(), 3);
    assert_eq!(index.sources_for("A"), vec!["B.md", "C.md"]);
}

#[test]
fn test_same_named_pages_in_different_folders() {
    let vault = MemoryVault::new();
    vault.set_metadata(FileMetadata::new("Notes/Plan.md").with_heading("Goals", 1, at(0)));
    vault.set_metadata(FileMetadata::new("Work/Plan.md").with_heading("Goals", 1, at(0)));
    vault.set_metadata(FileMetadata::new("Work/Todo.md").with_link("Plan#Goals", at(0)));
    vault.set_metadata(FileMetadata::new("Index.md").with_link("Notes/Plan#Goals", at(0)));
    let index = BacklinkIndex::build(&vault, 1, SystemTime::now());

    assert_eq!(index.sources_for("Work/Plan#Goals"), vec!["Work/Todo.md"]);
    assert_eq!(index.sources_for("Notes/Plan#Goals"), vec!["Index.md"]);
}

#[test]
fn test_heading_catalog_display_override() {
    let vault = MemoryVault::new();
    vault.set_metadata(FileMetadata::new("A.md").with_heading("**Intro**", 2, at(0)));
    vault.set_metadata(FileMetadata::new("B.md").with_heading("Intro", 2, at(0)));
    vault.set_metadata(FileMetadata::new("C.md").with_heading("Intro", 1, at(0)));
    let index = BacklinkIndex::build(&vault, 1, SystemTime::now());
    let catalog = index.headings();

    assert_eq!(catalog.spellings("Intro").len(), 3);
    assert_eq!(
        catalog.display_override("B.md", "Intro"),
        Some("**Intro**".to_string())
    );
    assert_eq!(
        catalog.display_override("A.md", "**Intro**"),
        Some("Intro".to_string())
    );
    assert_eq!(catalog.display_override("A.md", "Unrelated"), None);
}

#[test]
fn test_newest_snapshot_supersedes() {
    let vault = test_vault();
    let t0 = UNIX_EPOCH + Duration::from_secs(100);
    let first = BacklinkIndex::build(&vault, 1, t0);
    let second = BacklinkIndex::build(&vault, 2, t0 + Duration::from_millis(5));

    assert!(first.supersedes(&BacklinkIndex::empty()));
    assert!(second.supersedes(&first));
    assert!(!first.supersedes(&second));
    assert!(!first.supersedes(&first));
}
