//! [LinkResolver] maps the file part of a link target onto the full page path used in keys.
//!
//! Resolution policy:
//!
//! - Fragment-only targets resolve to the owner page.
//! - Targets whose file part contains a `/` are matched by full path. Relative targets
//!   (`./`, `../`) are joined against the owner's directory first. Otherwise an exact page
//!   wins, then the unique page whose path ends with `/<target>`.
//! - Bare names go through the basename table. A unique basename wins; on ambiguity the
//!   page in the owner's folder wins, then the shortest path, then lexical order.
//! - Unknown targets resolve to their own normalized text.
//!
//! Keys always carry the full page path, so same-named pages in different folders (and their
//! headings and blocks) never collide.
use std::collections::{BTreeSet, HashMap};

use super::path::{page_key, AnchorPath};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkResolver {
    pages: BTreeSet<String>,
    by_stem: HashMap<String, Vec<String>>,
}

impl LinkResolver {
    pub fn new<I, S>(paths: I) -> LinkResolver
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut resolver = LinkResolver::default();
        for path in paths {
            resolver.insert(path.as_ref());
        }
        resolver
    }

    pub fn insert(&mut self, path: &str) {
        let key = page_key(path);
        if key.is_empty() || !self.pages.insert(key.clone()) {
            return;
        }
        let stem = AnchorPath::new(&key).filename().to_string();
        let candidates = self.by_stem.entry(stem).or_default();
        candidates.push(key);
        candidates.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
    }

    pub fn contains(&self, page: &str) -> bool {
        self.pages.contains(page)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn pages(&self) -> impl Iterator<Item = &String> {
        self.pages.iter()
    }

    /// Resolve the file part of a link (no fragment) written inside `owner` to a page key.
    pub fn resolve(&self, link_path: &str, owner: &str) -> String {
        let owner_page = page_key(owner);
        let link_path = link_path.trim();
        if link_path.is_empty() {
            return owner_page;
        }
        let link_ap = AnchorPath::new(link_path);
        if link_ap.is_relative() {
            let joined = AnchorPath::new(&owner_page).join(link_path);
            if joined.starts_with("../") {
                tracing::warn!(
                    "[LinkResolver::resolve] link '{}' in '{}' escapes the vault root",
                    link_path,
                    owner
                );
            }
            return page_key(&joined);
        }

        let wanted = page_key(link_path);
        if self.pages.contains(&wanted) {
            return wanted;
        }
        if AnchorPath::new(&wanted).has_dir() {
            let suffix = format!("/{wanted}");
            let mut matches = self.pages.iter().filter(|page| page.ends_with(&suffix));
            return match (matches.next(), matches.next()) {
                (Some(only), None) => only.clone(),
                _ => wanted,
            };
        }

        match self.by_stem.get(&wanted) {
            Some(candidates) if candidates.len() == 1 => candidates[0].clone(),
            Some(candidates) => {
                let owner_dir = AnchorPath::new(&owner_page).dir().to_string();
                candidates
                    .iter()
                    .find(|candidate| AnchorPath::new(candidate.as_str()).dir() == owner_dir)
                    .unwrap_or(&candidates[0])
                    .clone()
            }
            None => wanted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn resolver() -> LinkResolver {
        LinkResolver::new([
            "A.md",
            "Notes/X.md",
            "Notes/Sub/Deep.md",
            "Projects/Plan.md",
            "Archive/Plan.md",
            "Projects/2024/Plan.md",
            "assets/pic.png",
        ])
    }

    #[test]
    fn test_unique_basename() {
        let r = resolver();
        assert_eq!(r.resolve("X", "A.md"), "Notes/X");
        assert_eq!(r.resolve("X.md", "A.md"), "Notes/X");
        assert_eq!(r.resolve("A", "Notes/X.md"), "A");
        assert_eq!(r.resolve("pic.png", "A.md"), "assets/pic.png");
    }

    #[test]
    fn test_ambiguous_basename_prefers_owner_folder_then_shortest() {
        let r = resolver();
        assert_eq!(r.resolve("Plan", "Projects/2024/Notes.md"), "Projects/2024/Plan");
        assert_eq!(r.resolve("Plan", "Archive/Index.md"), "Archive/Plan");
        // No folder match: shortest path wins
        assert_eq!(r.resolve("Plan", "A.md"), "Archive/Plan");
    }

    #[test]
    fn test_paths_with_separators_match_full_path() {
        let r = resolver();
        assert_eq!(r.resolve("Projects/Plan", "A.md"), "Projects/Plan");
        assert_eq!(r.resolve("Archive/Plan.md", "A.md"), "Archive/Plan");
        // Unique suffix
        assert_eq!(r.resolve("Sub/Deep", "A.md"), "Notes/Sub/Deep");
        // Unknown full paths stay as written, never collapsed to a basename match
        assert_eq!(r.resolve("Other/Plan", "A.md"), "Other/Plan");
    }

    #[test]
    fn test_relative_and_empty_targets() {
        let r = resolver();
        assert_eq!(r.resolve("./Sub/Deep", "Notes/X.md"), "Notes/Sub/Deep");
        assert_eq!(r.resolve("../A", "Notes/X.md"), "A");
        assert_eq!(r.resolve("", "Notes/X.md"), "Notes/X");
        assert_eq!(r.resolve("Missing", "Notes/X.md"), "Missing");
    }
}
