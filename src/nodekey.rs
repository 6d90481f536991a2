//! [crate::nodekey] contains [RefKey] and the normalization rules that turn link markup, block
//! ids and headings into index keys. Index construction, page transformation and inline
//! matching all go through these functions, so a key produced on one side always compares
//! equal to the key produced on the other.
use serde::{Deserialize, Serialize};
use std::{
    borrow::Borrow,
    fmt::{Display, Formatter},
};
use unicode_normalization::UnicodeNormalization;

use crate::paths::{page_key, AnchorPath, LinkResolver};

/// Characters removed from headings before they are used in keys.
pub const FORMATTING_CHARS: &[char] = &['*', '_', '`', '~', '=', '[', ']', '#', '|', '^'];

/// A normalized reference key: `page`, `page#heading` or `page#^blockId`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RefKey(String);

impl RefKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key addressing a whole page.
    pub fn page(path: &str) -> RefKey {
        RefKey(page_key(path))
    }

    /// `page#^blockId`. `path` may be a file path or an already normalized page key.
    pub fn block(path: &str, block_id: &str) -> RefKey {
        RefKey(format!("{}#^{}", page_key(path), block_id.trim()))
    }

    /// `page#normalized heading`.
    pub fn heading(path: &str, heading: &str) -> RefKey {
        RefKey(format!("{}#{}", page_key(path), normalize_heading(heading)))
    }

    /// Normalize the raw target of a link or embed written inside `owner`.
    ///
    /// Strips the display alias, resolves fragment-only targets against the owner page and
    /// resolves the file part through `resolver`. Returns `None` for empty targets.
    pub fn from_link(raw: &str, owner: &str, resolver: &LinkResolver) -> Option<RefKey> {
        let (target, _alias) = split_alias(raw.trim());
        let target = target.trim();
        if target.is_empty() {
            return None;
        }
        let ap = AnchorPath::new(target);
        let page = resolver.resolve(ap.filepath(), owner);
        if page.is_empty() {
            return None;
        }
        match normalize_fragment(ap.anchor()) {
            Some(fragment) => Some(RefKey(format!("{page}#{fragment}"))),
            None if ap.is_anchor() => None,
            None => Some(RefKey(page)),
        }
    }

    /// Everything before the first `#`.
    pub fn page_part(&self) -> &str {
        self.0.split_once('#').map(|(page, _)| page).unwrap_or(&self.0)
    }

    /// Everything after the first `#`, if present.
    pub fn fragment(&self) -> Option<&str> {
        self.0.split_once('#').map(|(_, fragment)| fragment)
    }

    pub fn block_id(&self) -> Option<&str> {
        self.fragment().and_then(|fragment| fragment.strip_prefix('^'))
    }

    pub fn is_block(&self) -> bool {
        self.block_id().is_some()
    }
}

impl Display for RefKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RefKey {
    fn from(key: &str) -> RefKey {
        RefKey(key.to_string())
    }
}

impl From<String> for RefKey {
    fn from(key: String) -> RefKey {
        RefKey(key)
    }
}

impl AsRef<str> for RefKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for RefKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Split `target|alias` on the first pipe. A pipe escaped for table cells (`\|`) is
/// accepted too.
pub fn split_alias(raw: &str) -> (&str, Option<&str>) {
    match raw.find('|') {
        Some(idx) => {
            let target = &raw[..idx];
            let target = target.strip_suffix('\\').unwrap_or(target);
            (target, Some(&raw[idx + 1..]))
        }
        None => (raw, None),
    }
}

/// Normalize heading text for use in keys: NFC, formatting characters removed,
/// whitespace collapsed.
pub fn normalize_heading(text: &str) -> String {
    let stripped: String = text
        .nfc()
        .filter(|c| !FORMATTING_CHARS.contains(c))
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalize a link fragment (the text after the first `#`, without it).
///
/// `^id` stays a block fragment. Otherwise the last non-empty `#`-separated segment is the
/// addressed heading (`H1#H2` addresses `H2`).
pub fn normalize_fragment(fragment: &str) -> Option<String> {
    if let Some(block_id) = fragment.strip_prefix('^') {
        let block_id = block_id.trim();
        return (!block_id.is_empty()).then(|| format!("^{block_id}"));
    }
    let heading = fragment
        .split('#')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .last()?;
    let heading = normalize_heading(heading);
    (!heading.is_empty()).then_some(heading)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn resolver() -> LinkResolver {
        LinkResolver::new(["PageA.md", "A.md", "Notes/X.md", "Work/X.md"])
    }

    #[test]
    fn test_split_alias() {
        assert_eq!(split_alias("PageA|Alias Text"), ("PageA", Some("Alias Text")));
        assert_eq!(split_alias("PageA"), ("PageA", None));
        assert_eq!(split_alias("PageA\\|In a table"), ("PageA", Some("In a table")));
        assert_eq!(split_alias("A|b|c"), ("A", Some("b|c")));
    }

    #[test]
    fn test_alias_normalization_shares_key() {
        let r = resolver();
        let aliased = RefKey::from_link("PageA|Alias Text", "B.md", &r).unwrap();
        let plain = RefKey::from_link("PageA", "B.md", &r).unwrap();
        assert_eq!(aliased, plain);
        assert_eq!(plain.as_str(), "PageA");
    }

    #[test]
    fn test_fragment_resolution_is_owner_relative() {
        let r = resolver();
        let key = RefKey::from_link("#Section", "Notes/X.md", &r).unwrap();
        assert_eq!(key.as_str(), "Notes/X#Section");
        let key = RefKey::from_link("#^abc|see here", "Notes/X.md", &r).unwrap();
        assert_eq!(key.as_str(), "Notes/X#^abc");
        assert!(key.is_block());
        assert_eq!(key.block_id(), Some("abc"));
        assert_eq!(key.page_part(), "Notes/X");
    }

    #[test]
    fn test_block_and_heading_keys() {
        assert_eq!(RefKey::block("A.md", "blk1").as_str(), "A#^blk1");
        assert_eq!(RefKey::block("Notes/X", " b2 ").as_str(), "Notes/X#^b2");
        assert_eq!(RefKey::heading("A.md", "Intro").as_str(), "A#Intro");
        assert_eq!(
            RefKey::heading("A.md", "  **Bold**   `code` heading ").as_str(),
            "A#Bold code heading"
        );
        let r = resolver();
        assert_eq!(
            RefKey::from_link("A#Bold code heading", "B.md", &r),
            Some(RefKey::heading("A.md", "**Bold** `code` heading"))
        );
    }

    #[test]
    fn test_nested_heading_and_empty_targets() {
        let r = resolver();
        assert_eq!(
            RefKey::from_link("A#Top#Nested", "B.md", &r).unwrap().as_str(),
            "A#Nested"
        );
        assert_eq!(RefKey::from_link("A#", "B.md", &r).unwrap().as_str(), "A");
        assert_eq!(RefKey::from_link("", "B.md", &r), None);
        assert_eq!(RefKey::from_link("|alias only", "B.md", &r), None);
        assert_eq!(RefKey::from_link("#", "B.md", &r), None);
        assert_eq!(RefKey::from_link("#^", "B.md", &r), None);
    }

    #[test]
    fn test_same_name_in_different_folders_does_not_collide() {
        let r = resolver();
        let notes = RefKey::from_link("Notes/X#Plan", "A.md", &r).unwrap();
        let work = RefKey::from_link("Work/X#Plan", "A.md", &r).unwrap();
        assert_ne!(notes, work);
        // A bare name from inside Work/ resolves to the sibling page
        let bare = RefKey::from_link("X#Plan", "Work/Todo.md", &r).unwrap();
        assert_eq!(bare, work);
    }

    #[test]
    fn test_unicode_heading_normalization() {
        // Decomposed "é" normalizes to the composed form
        assert_eq!(normalize_heading("Caf\u{0065}\u{0301}"), "Caf\u{00e9}");
        assert_eq!(normalize_fragment("Top # Deep "), Some("Deep".to_string()));
        assert_eq!(normalize_fragment("^ "), None);
    }
}
