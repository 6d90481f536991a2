//! BacklinkIndex: the inverted `key -> edges` map plus the lookup tables built alongside it.
use std::{
    collections::HashMap,
    fmt,
    time::{SystemTime, UNIX_EPOCH},
};

use super::{collector::collect_edges, ordered::OrderedSet};
use crate::{
    nodekey::{normalize_heading, RefKey},
    paths::LinkResolver,
    properties::Edge,
    provider::MetadataProvider,
};

/// One literal spelling of a heading and the file it was declared in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HeadingSpelling {
    pub file: String,
    pub literal: String,
}

/// Every heading declared anywhere in the vault, grouped by normalized text, in discovery
/// order.
#[derive(Debug, Clone, Default)]
pub struct HeadingCatalog {
    spellings: HashMap<String, OrderedSet<HeadingSpelling>>,
}

impl HeadingCatalog {
    pub fn insert(&mut self, file: &str, literal: &str) {
        let normalized = normalize_heading(literal);
        if normalized.is_empty() {
            return;
        }
        self.spellings
            .entry(normalized)
            .or_default()
            .insert(HeadingSpelling {
                file: file.to_string(),
                literal: literal.trim().to_string(),
            });
    }

    pub fn spellings(&self, heading: &str) -> &[HeadingSpelling] {
        self.spellings
            .get(&normalize_heading(heading))
            .map(|set| set.as_slice())
            .unwrap_or(&[])
    }

    /// The first spelling from another file that normalizes like `literal` but reads
    /// differently, used as an alias-style display text.
    pub fn display_override(&self, owner: &str, literal: &str) -> Option<String> {
        let literal = literal.trim();
        self.spellings(literal)
            .iter()
            .find(|spelling| spelling.file != owner && spelling.literal != literal)
            .map(|spelling| spelling.literal.clone())
    }

    pub fn len(&self) -> usize {
        self.spellings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spellings.is_empty()
    }
}

/// Immutable snapshot of every reference edge in the vault, keyed by normalized target.
///
/// Snapshots are built wholesale by [BacklinkIndex::build] and shared behind an `Arc`; a
/// rebuild produces a new snapshot rather than mutating the current one, so readers only ever
/// see a complete index.
#[derive(Clone)]
pub struct BacklinkIndex {
    map: HashMap<RefKey, Vec<Edge>>,
    resolver: LinkResolver,
    headings: HeadingCatalog,
    generation: u64,
    built_at: SystemTime,
    file_count: usize,
    edge_count: usize,
    skipped_files: Vec<String>,
}

impl Default for BacklinkIndex {
    fn default() -> Self {
        BacklinkIndex::empty()
    }
}

impl fmt::Debug for BacklinkIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BacklinkIndex")
            .field("generation", &self.generation)
            .field("built_at", &self.built_at)
            .field("keys", &self.map.len())
            .field("edges", &self.edge_count)
            .field("files", &self.file_count)
            .field("skipped_files", &self.skipped_files)
            .finish()
    }
}

impl fmt::Display for BacklinkIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BacklinkIndex(gen {}, {} keys, {} edges, {} files)",
            self.generation,
            self.map.len(),
            self.edge_count,
            self.file_count
        )
    }
}

impl BacklinkIndex {
    /// The snapshot in place before the first rebuild: no edges, generation 0.
    pub fn empty() -> BacklinkIndex {
        BacklinkIndex {
            map: HashMap::new(),
            resolver: LinkResolver::default(),
            headings: HeadingCatalog::default(),
            generation: 0,
            built_at: UNIX_EPOCH,
            file_count: 0,
            edge_count: 0,
            skipped_files: Vec::new(),
        }
    }

    /// Build a complete snapshot from every file the provider knows about.
    ///
    /// Files whose metadata is missing or unreadable contribute nothing and are recorded in
    /// [BacklinkIndex::skipped_files]; they never abort the build.
    #[tracing::instrument(skip(provider))]
    pub fn build(
        provider: &dyn MetadataProvider,
        generation: u64,
        built_at: SystemTime,
    ) -> BacklinkIndex {
        let files = provider.files();
        let resolver = LinkResolver::new(&files);
        let mut map: HashMap<RefKey, Vec<Edge>> = HashMap::new();
        let mut headings = HeadingCatalog::default();
        let mut skipped_files = Vec::new();
        let mut edge_count = 0;

        for file in files.iter() {
            let mut meta = match provider.metadata(file) {
                Ok(meta) => meta,
                Err(err) => {
                    tracing::debug!("[BacklinkIndex::build] skipping {}: {}", file, err);
                    skipped_files.push(file.clone());
                    continue;
                }
            };
            meta.path = file.clone();
            for heading in meta.headings.iter() {
                headings.insert(file, &heading.heading);
            }
            for edge in collect_edges(&meta, &resolver) {
                edge_count += 1;
                map.entry(edge.target.clone()).or_default().push(edge);
            }
        }

        tracing::info!(
            "[BacklinkIndex::build] generation {}: {} edges under {} keys from {} files ({} skipped)",
            generation,
            edge_count,
            map.len(),
            files.len(),
            skipped_files.len()
        );

        BacklinkIndex {
            map,
            resolver,
            headings,
            generation,
            built_at,
            file_count: files.len(),
            edge_count,
            skipped_files,
        }
    }

    /// All edges whose normalized target equals `key`, in discovery order. Unknown keys
    /// yield an empty slice.
    pub fn lookup(&self, key: &str) -> &[Edge] {
        self.map.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Distinct source files referencing `key`, first-seen order.
    pub fn sources_for(&self, key: &str) -> Vec<&str> {
        self.lookup(key)
            .iter()
            .map(|edge| edge.source.as_str())
            .collect::<OrderedSet<&str>>()
            .into_vec()
    }

    pub fn keys(&self) -> impl Iterator<Item = &RefKey> {
        self.map.keys()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn file_count(&self) -> usize {
        self.file_count
    }

    pub fn skipped_files(&self) -> &[String] {
        &self.skipped_files
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn built_at(&self) -> SystemTime {
        self.built_at
    }

    pub fn resolver(&self) -> &LinkResolver {
        &self.resolver
    }

    pub fn headings(&self) -> &HeadingCatalog {
        &self.headings
    }

    /// Whether this snapshot may replace `current`: newest completed build wins.
    pub fn supersedes(&self, current: &BacklinkIndex) -> bool {
        self.built_at >= current.built_at && self.generation > current.generation
    }
}
