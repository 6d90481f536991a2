//! # Codec: host adapters that turn files on disk into provider metadata
//!
//! The reference core never parses document syntax. The codecs here play the part of the host
//! application: they read files, derive [FileMetadata] for them and load the result into a
//! [MemoryVault] that the core consumes through its provider traits.
//!
//! Codecs are registered per file extension in the global [CODECS] map. Markdown ships built in:
//!
//! ```rust
//! use noet_refs::codec::{MetadataCodec, CODECS};
//!
//! let codec = CODECS.get("md").unwrap();
//! let meta = codec.parse("B.md", "See [[A#^blk1]]\n").unwrap();
//! assert_eq!(meta.links[0].link, "A#^blk1");
//! ```
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::{fs::read_to_string, path::Path, sync::Arc};
use walkdir::WalkDir;

use crate::{
    error::RefIndexError,
    paths::os_path_to_string,
    provider::{FileMetadata, MemoryVault},
};

pub mod md;

pub use md::MdMetadataCodec;

/// Global codec map with the builtin markdown codec.
pub static CODECS: Lazy<CodecMap> = Lazy::new(CodecMap::create);

pub trait MetadataCodec: Send + Sync {
    fn parse(&self, path: &str, content: &str) -> Result<FileMetadata, RefIndexError>;
}

#[derive(Clone)]
pub struct CodecMap(Arc<RwLock<Vec<(String, Arc<dyn MetadataCodec>)>>>);

impl CodecMap {
    pub fn create() -> Self {
        CodecMap(Arc::new(RwLock::new(vec![(
            "md".to_string(),
            Arc::new(MdMetadataCodec::new()) as Arc<dyn MetadataCodec>,
        )])))
    }

    pub fn insert(&self, extension: &str, codec: Arc<dyn MetadataCodec>) {
        let mut writer = self.0.write();
        if let Some(entry) = writer.iter_mut().find(|(ext, _)| ext == extension) {
            entry.1 = codec;
        } else {
            writer.push((extension.to_string(), codec));
        }
    }

    pub fn get(&self, ext: &str) -> Option<Arc<dyn MetadataCodec>> {
        self.0
            .read()
            .iter()
            .find(|(codec_ext, _)| codec_ext.eq_ignore_ascii_case(ext))
            .map(|(_, codec)| codec.clone())
    }

    pub fn extensions(&self) -> Vec<String> {
        self.0.read().iter().map(|(ext, _)| ext.clone()).collect()
    }
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .map(|name| name.starts_with('.'))
            .unwrap_or(false)
}

/// Walk `root` and load every file with a registered codec into a [MemoryVault], keyed by its
/// root-relative path. Dot files and dot directories are skipped. Files that fail to parse are
/// registered without metadata so the index reports them as skipped.
#[tracing::instrument]
pub fn load_vault<P: AsRef<Path> + std::fmt::Debug>(root: P) -> Result<MemoryVault, RefIndexError> {
    let root = root.as_ref();
    if !root.is_dir() {
        return Err(RefIndexError::NotFound(format!(
            "vault root {root:?} is not a directory"
        )));
    }
    let vault = MemoryVault::new();
    for entry in WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_hidden(entry))
    {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let ext = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        let Some(codec) = CODECS.get(ext) else {
            continue;
        };
        let rel_path = os_path_to_string(entry.path().strip_prefix(root)?);
        let content = read_to_string(entry.path())?;
        match codec.parse(&rel_path, &content) {
            Ok(meta) => vault.insert(meta, Some(content)),
            Err(err) => {
                tracing::warn!("[load_vault] could not parse {}: {}", rel_path, err);
                vault.insert_unresolved(&rel_path);
                vault.set_content(&rel_path, content);
            }
        }
    }
    tracing::info!("[load_vault] loaded {} files from {:?}", vault.len(), root);
    Ok(vault)
}
