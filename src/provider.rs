//! Host-facing provider traits and the per-file metadata they hand to the core.
//!
//! The core never parses document syntax. A [MetadataProvider] supplies already-parsed anchor
//! lists per file and a [ContentProvider] supplies raw text plus the visible window of open
//! editors. [MemoryVault] implements both over in-memory maps.
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, ops::Range};

use crate::{error::RefIndexError, properties::Position};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockMeta {
    pub id: String,
    pub position: Option<Position>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingMeta {
    pub heading: String,
    pub level: u8,
    pub position: Option<Position>,
}

/// A link or embed as written in the file. `link` is the raw target, alias included or not.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkMeta {
    pub link: String,
    pub display_text: Option<String>,
    pub position: Option<Position>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub path: String,
    #[serde(default)]
    pub blocks: Vec<BlockMeta>,
    #[serde(default)]
    pub headings: Vec<HeadingMeta>,
    #[serde(default)]
    pub links: Vec<LinkMeta>,
    #[serde(default)]
    pub embeds: Vec<LinkMeta>,
}

impl FileMetadata {
    pub fn new(path: &str) -> FileMetadata {
        FileMetadata {
            path: path.to_string(),
            ..Default::default()
        }
    }

    pub fn with_block(mut self, id: &str, position: Option<Position>) -> Self {
        self.blocks.push(BlockMeta {
            id: id.to_string(),
            position,
        });
        self
    }

    pub fn with_heading(mut self, heading: &str, level: u8, position: Option<Position>) -> Self {
        self.headings.push(HeadingMeta {
            heading: heading.to_string(),
            level,
            position,
        });
        self
    }

    pub fn with_link(mut self, link: &str, position: Option<Position>) -> Self {
        self.links.push(LinkMeta {
            link: link.to_string(),
            display_text: None,
            position,
        });
        self
    }

    pub fn with_embed(mut self, link: &str, position: Option<Position>) -> Self {
        self.embeds.push(LinkMeta {
            link: link.to_string(),
            display_text: None,
            position,
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
            && self.headings.is_empty()
            && self.links.is_empty()
            && self.embeds.is_empty()
    }
}

pub trait MetadataProvider: Send + Sync {
    /// All known files, in the order the index should discover them.
    fn files(&self) -> Vec<String>;
    /// Parsed metadata for one file. [RefIndexError::NotFound] means the host has not
    /// resolved this file yet.
    fn metadata(&self, path: &str) -> Result<FileMetadata, RefIndexError>;
}

pub trait ContentProvider: Send + Sync {
    fn content(&self, path: &str) -> Result<String, RefIndexError>;
    /// Visible byte range of the file when it is open in an editor.
    fn viewport(&self, path: &str) -> Option<Range<usize>>;
}

#[derive(Debug, Default)]
struct VaultFile {
    metadata: Option<FileMetadata>,
    content: Option<String>,
    viewport: Option<Range<usize>>,
}

/// In-memory [MetadataProvider] and [ContentProvider]. Files are discovered in path order.
#[derive(Debug, Default)]
pub struct MemoryVault {
    files: RwLock<BTreeMap<String, VaultFile>>,
}

impl MemoryVault {
    pub fn new() -> MemoryVault {
        MemoryVault::default()
    }

    pub fn insert(&self, metadata: FileMetadata, content: Option<String>) {
        let mut files = self.files.write();
        let entry = files.entry(metadata.path.clone()).or_default();
        entry.metadata = Some(metadata);
        if content.is_some() {
            entry.content = content;
        }
    }

    pub fn set_metadata(&self, metadata: FileMetadata) {
        self.insert(metadata, None);
    }

    pub fn set_content(&self, path: &str, content: String) {
        self.files.write().entry(path.to_string()).or_default().content = Some(content);
    }

    pub fn set_viewport(&self, path: &str, viewport: Option<Range<usize>>) {
        self.files.write().entry(path.to_string()).or_default().viewport = viewport;
    }

    /// Register a file the host knows about but has not resolved metadata for yet.
    pub fn insert_unresolved(&self, path: &str) {
        self.files.write().entry(path.to_string()).or_default();
    }

    pub fn remove(&self, path: &str) -> bool {
        self.files.write().remove(path).is_some()
    }

    pub fn rename(&self, from: &str, to: &str) -> bool {
        let mut files = self.files.write();
        match files.remove(from) {
            Some(mut file) => {
                if let Some(metadata) = file.metadata.as_mut() {
                    metadata.path = to.to_string();
                }
                files.insert(to.to_string(), file);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.files.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.read().is_empty()
    }
}

impl MetadataProvider for MemoryVault {
    fn files(&self) -> Vec<String> {
        self.files.read().keys().cloned().collect()
    }

    fn metadata(&self, path: &str) -> Result<FileMetadata, RefIndexError> {
        self.files
            .read()
            .get(path)
            .and_then(|file| file.metadata.clone())
            .ok_or_else(|| RefIndexError::NotFound(format!("no metadata resolved for {path}")))
    }
}

impl ContentProvider for MemoryVault {
    fn content(&self, path: &str) -> Result<String, RefIndexError> {
        self.files
            .read()
            .get(path)
            .and_then(|file| file.content.clone())
            .ok_or_else(|| RefIndexError::NotFound(format!("no content for {path}")))
    }

    fn viewport(&self, path: &str) -> Option<Range<usize>> {
        self.files
            .read()
            .get(path)
            .and_then(|file| file.viewport.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_memory_vault_round_trips_metadata_and_content() {
        let vault = MemoryVault::new();
        vault.insert(
            FileMetadata::new("B.md").with_link("A#^blk1", None),
            Some("[[A#^blk1]]".to_string()),
        );
        vault.insert_unresolved("C.md");

        assert_eq!(vault.files(), vec!["B.md".to_string(), "C.md".to_string()]);
        assert_eq!(vault.metadata("B.md").unwrap().links.len(), 1);
        assert!(vault.metadata("C.md").unwrap_err().is_missing_data());
        assert_eq!(vault.content("B.md").unwrap(), "[[A#^blk1]]");
        assert_eq!(vault.viewport("B.md"), None);

        vault.set_viewport("B.md", Some(0..5));
        assert_eq!(vault.viewport("B.md"), Some(0..5));
    }

    #[test]
    fn test_rename_moves_metadata_path() {
        let vault = MemoryVault::new();
        vault.set_metadata(FileMetadata::new("old.md"));
        assert!(vault.rename("old.md", "new.md"));
        assert!(!vault.rename("old.md", "other.md"));
        assert_eq!(vault.metadata("new.md").unwrap().path, "new.md");
        assert!(vault.metadata("old.md").is_err());
    }
}
