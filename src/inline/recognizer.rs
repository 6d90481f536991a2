//! The recognizer dispatch table. Each recognizer owns the regex for one construct, the
//! leading token it is keyed by and the function that turns its capture into a [RefKey].
use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    nodekey::{normalize_heading, RefKey},
    paths::LinkResolver,
    properties::{EnumSet, ReferenceKind},
};

/// `text ^blockId` at the end of a line.
pub static BLOCK_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)(?:^|[ \t])\^([A-Za-z0-9-]+)[ \t\r]*$").unwrap());

/// ATX heading line; the optional closing `#` sequence is not part of the text.
pub static HEADING_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^#{1,6}[ \t]+(.+?)(?:[ \t]+#+)?[ \t\r]*$").unwrap()
});

pub static EMBED: Lazy<Regex> = Lazy::new(|| Regex::new(r"!\[\[([^\[\]\n]+?)\]\]").unwrap());

/// Matches embeds too; [Recognizer::scan] drops the ones preceded by `!`.
pub static WIKILINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\[([^\[\]\n]+?)\]\]").unwrap());

pub type KeyResolver = fn(capture: &str, owner: &str, resolver: &LinkResolver) -> Option<RefKey>;

/// One construct found in the scanned text, before it is looked up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMatch<'t> {
    pub kind: ReferenceKind,
    pub capture: &'t str,
    /// End of the construct, as an offset into the full file text.
    pub end: usize,
}

#[derive(Clone)]
pub struct Recognizer {
    pub kind: ReferenceKind,
    pub token: char,
    regex: &'static Regex,
    resolve: KeyResolver,
}

impl std::fmt::Debug for Recognizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recognizer")
            .field("kind", &self.kind)
            .field("token", &self.token)
            .field("regex", &self.regex.as_str())
            .finish()
    }
}

fn resolve_block(capture: &str, owner: &str, _resolver: &LinkResolver) -> Option<RefKey> {
    Some(RefKey::block(owner, capture))
}

fn resolve_heading(capture: &str, owner: &str, _resolver: &LinkResolver) -> Option<RefKey> {
    if normalize_heading(capture).is_empty() {
        return None;
    }
    Some(RefKey::heading(owner, capture))
}

fn resolve_link(capture: &str, owner: &str, resolver: &LinkResolver) -> Option<RefKey> {
    RefKey::from_link(capture, owner, resolver)
}

impl Recognizer {
    pub fn for_kind(kind: ReferenceKind) -> Recognizer {
        match kind {
            ReferenceKind::Block => Recognizer {
                kind,
                token: '^',
                regex: &BLOCK_ID,
                resolve: resolve_block,
            },
            ReferenceKind::Heading => Recognizer {
                kind,
                token: '#',
                regex: &HEADING_LINE,
                resolve: resolve_heading,
            },
            ReferenceKind::Embed => Recognizer {
                kind,
                token: '!',
                regex: &EMBED,
                resolve: resolve_link,
            },
            ReferenceKind::Link => Recognizer {
                kind,
                token: '[',
                regex: &WIKILINK,
                resolve: resolve_link,
            },
        }
    }

    /// Find every construct of this kind in `text`, which starts at `base` in the file.
    pub fn scan<'t>(&self, text: &'t str, base: usize) -> Vec<RawMatch<'t>> {
        let mut matches = Vec::new();
        for caps in self.regex.captures_iter(text) {
            let (Some(whole), Some(capture)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let end = match self.kind {
                ReferenceKind::Link => {
                    if text[..whole.start()].ends_with('!') {
                        continue;
                    }
                    whole.end()
                }
                ReferenceKind::Embed => whole.end(),
                ReferenceKind::Block | ReferenceKind::Heading => capture.end(),
            };
            matches.push(RawMatch {
                kind: self.kind,
                capture: capture.as_str(),
                end: base + end,
            });
        }
        matches
    }

    pub fn resolve(&self, capture: &str, owner: &str, resolver: &LinkResolver) -> Option<RefKey> {
        (self.resolve)(capture, owner, resolver)
    }
}

/// Recognizers for the enabled kinds, in [ReferenceKind] order.
pub fn dispatch_table(kinds: EnumSet<ReferenceKind>) -> Vec<Recognizer> {
    kinds.iter().map(Recognizer::for_kind).collect()
}

/// Classify a construct by its leading token.
pub fn kind_for_token(token: char) -> Option<ReferenceKind> {
    ReferenceKind::all()
        .iter()
        .find(|kind| Recognizer::for_kind(*kind).token == token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_link_recognizer_skips_embeds() {
        let text = "see [[A]] and ![[B]]";
        let links = Recognizer::for_kind(ReferenceKind::Link).scan(text, 0);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].capture, "A");
        assert_eq!(links[0].end, 9);

        let embeds = Recognizer::for_kind(ReferenceKind::Embed).scan(text, 100);
        assert_eq!(embeds.len(), 1);
        assert_eq!(embeds[0].capture, "B");
        assert_eq!(embeds[0].end, 100 + text.len());
    }

    #[test]
    fn test_block_and_heading_captures() {
        let text = "Some text ^blk1\n## Intro ##\n#tag not a heading\ncaret^inside\n";
        let blocks = Recognizer::for_kind(ReferenceKind::Block).scan(text, 0);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].capture, "blk1");
        assert_eq!(blocks[0].end, 15);

        let headings = Recognizer::for_kind(ReferenceKind::Heading).scan(text, 0);
        assert_eq!(headings.len(), 1);
        assert_eq!(headings[0].capture, "Intro");
        assert_eq!(headings[0].end, 16 + "## Intro".len());
    }

    #[test]
    fn test_dispatch_by_token() {
        assert_eq!(kind_for_token('^'), Some(ReferenceKind::Block));
        assert_eq!(kind_for_token('#'), Some(ReferenceKind::Heading));
        assert_eq!(kind_for_token('!'), Some(ReferenceKind::Embed));
        assert_eq!(kind_for_token('['), Some(ReferenceKind::Link));
        assert_eq!(kind_for_token('x'), None);

        let table = dispatch_table(ReferenceKind::Heading | ReferenceKind::Link);
        let tokens: Vec<char> = table.iter().map(|r| r.token).collect();
        assert_eq!(tokens, vec!['#', '[']);
    }
}
