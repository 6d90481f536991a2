//! Edge Collector: turns one file's link and embed metadata into [Edge]s.
use crate::{
    nodekey::{split_alias, RefKey},
    paths::LinkResolver,
    properties::{Edge, Position, ReferenceKind},
    provider::{FileMetadata, LinkMeta},
};

/// Collect the outgoing edges of one file in position order (links and embeds interleaved).
/// Entries without position data sort after positioned ones, keeping their metadata order.
/// Entries whose target normalizes to nothing are skipped.
pub fn collect_edges(meta: &FileMetadata, resolver: &LinkResolver) -> Vec<Edge> {
    let mut raw: Vec<(&LinkMeta, ReferenceKind)> = meta
        .links
        .iter()
        .map(|link| (link, ReferenceKind::Link))
        .chain(meta.embeds.iter().map(|embed| (embed, ReferenceKind::Embed)))
        .collect();
    raw.sort_by_key(|(link, _)| Position::or_unknown(link.position).start.offset);

    let mut edges = Vec::with_capacity(raw.len());
    for (link, kind) in raw {
        let Some(target) = RefKey::from_link(&link.link, &meta.path, resolver) else {
            tracing::trace!(
                "[collect_edges] skipping {} with empty target '{}' in {}",
                kind,
                link.link,
                meta.path
            );
            continue;
        };
        let display_text = link
            .display_text
            .clone()
            .or_else(|| split_alias(&link.link).1.map(|alias| alias.trim().to_string()));
        edges.push(Edge {
            source: meta.path.clone(),
            target,
            display_text,
            position: Position::or_unknown(link.position),
            kind,
        });
    }
    edges
}
