use pulldown_cmark::{
    Event as MdEvent, LinkType, Options, Parser as MdParser, Tag as MdTag, TagEnd as MdTagEnd,
};
use std::ops::Range;

use crate::{
    codec::MetadataCodec,
    error::RefIndexError,
    inline::recognizer::BLOCK_ID,
    properties::{Loc, Position},
    provider::{BlockMeta, FileMetadata, HeadingMeta, LinkMeta},
};

pub use pulldown_cmark;

pub fn refs_md_options() -> Options {
    let mut md_options = Options::empty();
    md_options.insert(Options::ENABLE_FOOTNOTES);
    md_options.insert(Options::ENABLE_GFM);
    md_options.insert(Options::ENABLE_MATH);
    md_options.insert(Options::ENABLE_STRIKETHROUGH);
    md_options.insert(Options::ENABLE_TABLES);
    md_options.insert(Options::ENABLE_TASKLISTS);
    md_options.insert(Options::ENABLE_WIKILINKS);
    md_options.insert(Options::ENABLE_YAML_STYLE_METADATA_BLOCKS);
    md_options
}

/// Byte offset to line/column lookup. Lines and columns are 0-based; columns count chars.
#[derive(Debug, Clone)]
pub struct LineIndex<'a> {
    text: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    pub fn new(text: &'a str) -> LineIndex<'a> {
        let line_starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(idx, _)| idx + 1))
            .collect();
        LineIndex { text, line_starts }
    }

    pub fn loc(&self, offset: usize) -> Loc {
        let offset = offset.min(self.text.len());
        let line = self.line_starts.partition_point(|start| *start <= offset) - 1;
        let line_start = self.line_starts[line];
        let col = self
            .text
            .get(line_start..offset)
            .map(|prefix| prefix.chars().count())
            .unwrap_or(offset - line_start);
        Loc { line, col, offset }
    }

    pub fn position(&self, range: &Range<usize>) -> Position {
        Position::new(self.loc(range.start), self.loc(range.end))
    }
}

/// The literal heading text of an ATX or setext heading as written in the source.
fn heading_literal(source: &str) -> String {
    let first_line = source.lines().next().unwrap_or_default().trim();
    let Some(atx) = first_line.strip_prefix('#') else {
        return first_line.to_string();
    };
    let text = atx.trim_start_matches('#').trim();
    // Optional closing sequence, only when separated by whitespace
    let without_closing = text.trim_end_matches('#');
    if without_closing.len() < text.len()
        && (without_closing.is_empty() || without_closing.ends_with([' ', '\t']))
    {
        without_closing.trim().to_string()
    } else {
        text.to_string()
    }
}

/// The raw inside of `[[...]]` / `![[...]]`, alias included.
fn wikilink_inner(source: &str) -> Option<&str> {
    source
        .trim_start_matches('!')
        .strip_prefix("[[")?
        .strip_suffix("]]")
}

struct LinkAccumulator {
    embed: bool,
    dest_url: String,
    has_pothole: bool,
    range: Range<usize>,
    title: String,
}

/// Derives [FileMetadata] from markdown: wikilinks, wikilink embeds, headings and `^block` ids.
#[derive(Debug, Clone, Copy, Default)]
pub struct MdMetadataCodec;

impl MdMetadataCodec {
    pub fn new() -> Self {
        MdMetadataCodec
    }

    pub fn extract(&self, path: &str, content: &str) -> FileMetadata {
        let lines = LineIndex::new(content);
        let mut meta = FileMetadata::new(path);
        let mut code_ranges: Vec<Range<usize>> = Vec::new();
        let mut link: Option<LinkAccumulator> = None;

        for (event, range) in MdParser::new_ext(content, refs_md_options()).into_offset_iter() {
            match event {
                MdEvent::Start(MdTag::Link {
                    link_type: LinkType::WikiLink { has_pothole },
                    dest_url,
                    ..
                })
                | MdEvent::Start(MdTag::Image {
                    link_type: LinkType::WikiLink { has_pothole },
                    dest_url,
                    ..
                }) => {
                    let embed = content[range.clone()].starts_with('!');
                    link = Some(LinkAccumulator {
                        embed,
                        dest_url: dest_url.to_string(),
                        has_pothole,
                        range,
                        title: String::new(),
                    });
                }
                MdEvent::Text(text) | MdEvent::Code(text) => {
                    if let Some(acc) = link.as_mut() {
                        acc.title.push_str(&text);
                    }
                }
                MdEvent::End(MdTagEnd::Link) | MdEvent::End(MdTagEnd::Image) => {
                    let Some(acc) = link.take() else {
                        continue;
                    };
                    let raw = wikilink_inner(&content[acc.range.clone()])
                        .map(str::to_string)
                        .unwrap_or(acc.dest_url);
                    let display_text = (acc.has_pothole && !acc.title.trim().is_empty())
                        .then(|| acc.title.trim().to_string());
                    let entry = LinkMeta {
                        link: raw,
                        display_text,
                        position: Some(lines.position(&acc.range)),
                    };
                    if acc.embed {
                        meta.embeds.push(entry);
                    } else {
                        meta.links.push(entry);
                    }
                }
                MdEvent::Start(MdTag::Heading { level, .. }) => {
                    let heading = heading_literal(&content[range.clone()]);
                    if !heading.is_empty() {
                        meta.headings.push(HeadingMeta {
                            heading,
                            level: level as u8,
                            position: Some(lines.position(&range)),
                        });
                    }
                }
                MdEvent::Start(MdTag::CodeBlock(_)) | MdEvent::Start(MdTag::MetadataBlock(_)) => {
                    code_ranges.push(range);
                }
                _ => {}
            }
        }

        for caps in BLOCK_ID.captures_iter(content) {
            let Some(id) = caps.get(1) else {
                continue;
            };
            let caret = id.start() - 1;
            if code_ranges.iter().any(|code| code.contains(&caret)) {
                tracing::trace!("[MdMetadataCodec::parse] ignoring ^{} inside code", id.as_str());
                continue;
            }
            meta.blocks.push(BlockMeta {
                id: id.as_str().to_string(),
                position: Some(lines.position(&(caret..id.end()))),
            });
        }

        tracing::debug!(
            "[MdMetadataCodec::parse] {}: {} blocks, {} headings, {} links, {} embeds",
            path,
            meta.blocks.len(),
            meta.headings.len(),
            meta.links.len(),
            meta.embeds.len()
        );
        meta
    }
}

impl MetadataCodec for MdMetadataCodec {
    fn parse(&self, path: &str, content: &str) -> Result<FileMetadata, RefIndexError> {
        Ok(self.extract(path, content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    const DOC: &str = "# Title\n\nSome text ^blk1\n\n## Intro ##\n\nSee [[B|bee]] and [[A#^blk1]].\n\n![[C]]\n\n```\nnot a block ^code1\n```\n";

    #[test]
    fn test_parse_collects_anchors() {
        let meta = MdMetadataCodec::new().extract("A.md", DOC);
        assert_eq!(meta.path, "A.md");

        let headings: Vec<&str> = meta.headings.iter().map(|h| h.heading.as_str()).collect();
        assert_eq!(headings, vec!["Title", "Intro"]);
        assert_eq!(meta.headings[1].level, 2);

        assert_eq!(meta.blocks.len(), 1);
        assert_eq!(meta.blocks[0].id, "blk1");
        let block_pos = meta.blocks[0].position.unwrap();
        assert_eq!(block_pos.start.line, 2);
        assert_eq!(block_pos.end.offset, DOC.find("blk1").unwrap() + 4);

        let links: Vec<&str> = meta.links.iter().map(|l| l.link.as_str()).collect();
        assert_eq!(links, vec!["B|bee", "A#^blk1"]);
        assert_eq!(meta.links[0].display_text.as_deref(), Some("bee"));
        assert_eq!(meta.links[1].display_text, None);

        assert_eq!(meta.embeds.len(), 1);
        assert_eq!(meta.embeds[0].link, "C");
    }

    #[test]
    fn test_heading_literal() {
        assert_eq!(heading_literal("## Intro ##\n"), "Intro");
        assert_eq!(heading_literal("# C#"), "C#");
        assert_eq!(heading_literal("### See [[B#^x]]"), "See [[B#^x]]");
        assert_eq!(heading_literal("Setext\n======"), "Setext");
    }

    #[test]
    fn test_line_index() {
        let lines = LineIndex::new("ab\ncdé\nf");
        assert_eq!(
            lines.loc(4),
            Loc {
                line: 1,
                col: 1,
                offset: 4
            }
        );
        // "é" is two bytes; col counts chars
        assert_eq!(lines.loc(7).col, 3);
        assert_eq!(lines.loc(8).line, 2);
        assert_eq!(lines.loc(8).col, 0);
        assert_eq!(lines.loc(100).offset, 9);
    }
}
