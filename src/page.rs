//! Page Transform Cache: the per-file view pairing every anchor with its resolved backlinks.
//!
//! Entries are computed lazily by [PageCache::get_page] and replaced wholesale once stale. An
//! entry is stale when the [BacklinkIndex] it was computed from has been superseded (different
//! generation or newer build time) or when it outlived the cache TTL.
use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, SystemTime},
};

use crate::{
    index::BacklinkIndex,
    nodekey::{normalize_heading, split_alias, RefKey},
    properties::{Position, ReferenceItem, ReferenceKind, SharedPage, TransformedCache},
    provider::{FileMetadata, MetadataProvider},
};

/// Collects the items of one category, collapsing identical keys into the first occurrence.
/// The surviving item carries the union of the duplicates' edges.
#[derive(Default)]
struct ItemAccumulator {
    items: Vec<ReferenceItem>,
    slots: HashMap<RefKey, usize>,
}

impl ItemAccumulator {
    fn push(&mut self, item: ReferenceItem) {
        match self.slots.get(&item.key) {
            Some(&slot) => {
                let existing = &mut self.items[slot];
                for edge in item.edges {
                    if !existing.edges.contains(&edge) {
                        existing.edges.push(edge);
                    }
                }
            }
            None => {
                self.slots.insert(item.key.clone(), self.items.len());
                self.items.push(item);
            }
        }
    }

    fn finish(self) -> Vec<ReferenceItem> {
        self.items
    }
}

fn item(
    key: RefKey,
    label: &str,
    position: Option<Position>,
    owner: &str,
    kind: ReferenceKind,
    index: &BacklinkIndex,
) -> ReferenceItem {
    let edges = index.lookup(key.as_str()).to_vec();
    ReferenceItem {
        key,
        label: label.to_string(),
        position: Position::or_unknown(position),
        owner: owner.to_string(),
        kind,
        edges,
        display_override: None,
    }
}

/// Compute the transformed view of one file against `index`.
#[tracing::instrument(skip(meta, index), fields(path = %meta.path))]
pub fn transform(meta: &FileMetadata, index: &BacklinkIndex, now: SystemTime) -> TransformedCache {
    let owner = meta.path.as_str();
    let mut page = TransformedCache::empty(owner, now, index.generation());

    let mut blocks = ItemAccumulator::default();
    for block in meta.blocks.iter() {
        let id = block.id.trim();
        if id.is_empty() {
            continue;
        }
        let key = RefKey::block(owner, id);
        blocks.push(item(key, id, block.position, owner, ReferenceKind::Block, index));
    }
    page.blocks = blocks.finish();

    let mut headings = ItemAccumulator::default();
    for heading in meta.headings.iter() {
        if normalize_heading(&heading.heading).is_empty() {
            continue;
        }
        let key = RefKey::heading(owner, &heading.heading);
        let mut heading_item = item(
            key,
            heading.heading.trim(),
            heading.position,
            owner,
            ReferenceKind::Heading,
            index,
        );
        heading_item.display_override = index.headings().display_override(owner, &heading.heading);
        headings.push(heading_item);
    }
    page.headings = headings.finish();

    for (kind, links) in [
        (ReferenceKind::Embed, &meta.embeds),
        (ReferenceKind::Link, &meta.links),
    ] {
        let mut acc = ItemAccumulator::default();
        for link in links.iter() {
            let Some(key) = RefKey::from_link(&link.link, owner, index.resolver()) else {
                continue;
            };
            let label = split_alias(link.link.trim()).0.trim();
            acc.push(item(key, label, link.position, owner, kind, index));
        }
        match kind {
            ReferenceKind::Embed => page.embeds = acc.finish(),
            _ => page.links = acc.finish(),
        }
    }

    page
}

#[derive(Debug, Clone)]
pub struct PageCache {
    entries: HashMap<String, SharedPage>,
    ttl: Duration,
}

impl PageCache {
    pub fn new(ttl: Duration) -> PageCache {
        PageCache {
            entries: HashMap::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn set_ttl(&mut self, ttl: Duration) {
        self.ttl = ttl;
    }

    /// Whether `page` may still be served for `index` at time `now`.
    pub fn is_fresh(&self, page: &TransformedCache, index: &BacklinkIndex, now: SystemTime) -> bool {
        if page.generation != index.generation() || page.created_at < index.built_at() {
            return false;
        }
        // A clock that went backwards yields an error here; treat the entry as brand new.
        match now.duration_since(page.created_at) {
            Ok(age) => age < self.ttl,
            Err(_) => true,
        }
    }

    /// Return the cached view of `path`, recomputing it when missing or stale.
    ///
    /// Missing or unreadable metadata yields an empty view rather than an error.
    pub fn get_page(
        &mut self,
        path: &str,
        index: &BacklinkIndex,
        provider: &dyn MetadataProvider,
        now: SystemTime,
    ) -> SharedPage {
        if let Some(page) = self.entries.get(path) {
            if self.is_fresh(page, index, now) {
                tracing::debug!("[PageCache::get_page] hit for {}", path);
                return page.clone();
            }
            tracing::debug!(
                "[PageCache::get_page] stale entry for {} (generation {} vs index {})",
                path,
                page.generation,
                index.generation()
            );
        } else {
            tracing::debug!("[PageCache::get_page] miss for {}", path);
        }

        let page = match provider.metadata(path) {
            Ok(mut meta) => {
                meta.path = path.to_string();
                transform(&meta, index, now)
            }
            Err(err) => {
                tracing::debug!(
                    "[PageCache::get_page] no metadata for {}, serving empty view: {}",
                    path,
                    err
                );
                TransformedCache::empty(path, now, index.generation())
            }
        };
        let page = Arc::new(page);
        self.entries.insert(path.to_string(), page.clone());
        page
    }

    /// The cached entry for `path` without any freshness check.
    pub fn peek(&self, path: &str) -> Option<&SharedPage> {
        self.entries.get(path)
    }

    pub fn invalidate(&mut self, path: &str) -> bool {
        self.entries.remove(path).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
