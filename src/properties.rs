//! Shared data model: positions, reference kinds, edges, page items and decoration descriptors.
pub use enumset::EnumSet;

use enumset::EnumSetType;
use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Formatter},
    sync::Arc,
    time::SystemTime,
};

use crate::nodekey::RefKey;

/// A point in a file. `offset` is a UTF-8 byte offset into the file text.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Loc {
    pub line: usize,
    pub col: usize,
    pub offset: usize,
}

impl Loc {
    pub const UNKNOWN: Loc = Loc {
        line: usize::MAX,
        col: usize::MAX,
        offset: usize::MAX,
    };
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Position {
    pub start: Loc,
    pub end: Loc,
}

impl Position {
    /// Sentinel for items whose metadata carried no position.
    pub const UNKNOWN: Position = Position {
        start: Loc::UNKNOWN,
        end: Loc::UNKNOWN,
    };

    pub fn new(start: Loc, end: Loc) -> Position {
        Position { start, end }
    }

    pub fn is_known(&self) -> bool {
        *self != Position::UNKNOWN
    }

    pub fn or_unknown(position: Option<Position>) -> Position {
        position.unwrap_or(Position::UNKNOWN)
    }
}

/// The four addressable construct types. Sets of kinds select which recognizers the
/// [crate::inline::MatchEngine] compiles in.
#[derive(Debug, Default, Serialize, Deserialize, PartialOrd, Ord, Hash, EnumSetType)]
#[enumset(serialize_repr = "list")]
#[serde(rename_all = "lowercase")]
pub enum ReferenceKind {
    #[default]
    Block,
    Heading,
    Embed,
    Link,
}

impl ReferenceKind {
    pub fn all() -> EnumSet<ReferenceKind> {
        EnumSet::all()
    }
}

impl Display for ReferenceKind {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            ReferenceKind::Block => write!(f, "block"),
            ReferenceKind::Heading => write!(f, "heading"),
            ReferenceKind::Embed => write!(f, "embed"),
            ReferenceKind::Link => write!(f, "link"),
        }
    }
}

/// One reference from `source` to `target`. Edges are produced wholesale by each index
/// rebuild and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub target: RefKey,
    pub display_text: Option<String>,
    pub position: Position,
    /// [ReferenceKind::Link] or [ReferenceKind::Embed]: the syntax that produced the edge.
    pub kind: ReferenceKind,
}

/// An anchor inside one file paired with the backlinks that resolve to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceItem {
    pub key: RefKey,
    /// The literal text the anchor was declared with (block id, heading text, link target).
    pub label: String,
    pub position: Position,
    pub owner: String,
    pub kind: ReferenceKind,
    pub edges: Vec<Edge>,
    pub display_override: Option<String>,
}

impl ReferenceItem {
    pub fn count(&self) -> usize {
        self.edges.len()
    }
}

/// The per-file derived view cached by [crate::page::PageCache].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformedCache {
    pub path: String,
    pub blocks: Vec<ReferenceItem>,
    pub headings: Vec<ReferenceItem>,
    pub embeds: Vec<ReferenceItem>,
    pub links: Vec<ReferenceItem>,
    pub created_at: SystemTime,
    /// Generation of the [crate::index::BacklinkIndex] snapshot this view was computed from.
    pub generation: u64,
}

impl TransformedCache {
    pub fn empty(path: &str, created_at: SystemTime, generation: u64) -> TransformedCache {
        TransformedCache {
            path: path.to_string(),
            blocks: Vec::new(),
            headings: Vec::new(),
            embeds: Vec::new(),
            links: Vec::new(),
            created_at,
            generation,
        }
    }

    pub fn items(&self, kind: ReferenceKind) -> &[ReferenceItem] {
        match kind {
            ReferenceKind::Block => &self.blocks,
            ReferenceKind::Heading => &self.headings,
            ReferenceKind::Embed => &self.embeds,
            ReferenceKind::Link => &self.links,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
            && self.headings.is_empty()
            && self.embeds.is_empty()
            && self.links.is_empty()
    }

    pub fn find(&self, kind: ReferenceKind, key: &RefKey) -> Option<&ReferenceItem> {
        self.items(kind).iter().find(|item| &item.key == key)
    }
}

pub type SharedPage = Arc<TransformedCache>;

/// Where and what count indicator to render. Produced per match pass, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecorationDescriptor {
    pub kind: ReferenceKind,
    pub offset: usize,
    pub count: usize,
    pub key: RefKey,
    /// Link text a renderer can open to reach the anchor.
    pub link: String,
    pub aria_label: String,
}

impl DecorationDescriptor {
    pub fn new(kind: ReferenceKind, offset: usize, item: &ReferenceItem) -> DecorationDescriptor {
        let count = item.count();
        let noun = if count == 1 { "reference" } else { "references" };
        DecorationDescriptor {
            kind,
            offset,
            count,
            key: item.key.clone(),
            link: item.key.to_string(),
            aria_label: format!("{count} {noun} to {}", item.key),
        }
    }
}
