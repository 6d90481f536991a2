use std::{
    borrow::Cow,
    fmt::{Display, Formatter},
    path::{Component, Path},
};

/// Markdown pages are addressed without their extension inside link targets and keys.
pub const PAGE_EXTENSION: &str = "md";

/// Utility function to replace separators and convert to unicode (via to_string_lossy) on os path.
///
/// Root and prefix components are dropped, so the result is always vault-relative.
pub fn os_path_to_string<P: AsRef<Path>>(os_path_ref: P) -> String {
    let res = os_path_ref
        .as_ref()
        .components()
        .filter_map(|c| match c {
            Component::RootDir | Component::Prefix(_) => None,
            _ => Some(c.as_os_str().to_string_lossy()),
        })
        .collect::<Vec<Cow<str>>>()
        .join("/");
    tracing::trace!(
        "os_path_to_string: turned {:?} into {}",
        os_path_ref.as_ref(),
        res
    );
    res
}

/// Byte-index view over a vault link path such as `Notes/X.md#^blk1`.
///
/// Unlike filesystem paths, a final component without an extension is a page, not a
/// directory: `Notes/X` names the page `Notes/X.md`.
#[derive(Debug, Clone, Copy)]
pub struct AnchorPath<'a> {
    pub path: &'a str,
    /// Index of the last '/' before the anchor
    dir_sep: Option<usize>,
    /// Index of '.' separating filestem from extension
    ext_sep: Option<usize>,
    /// Index of the first '#'
    anc_sep: Option<usize>,
}

impl<'a> AnchorPath<'a> {
    pub fn new(path: &'a str) -> AnchorPath<'a> {
        let anc_sep = path.find('#');
        let filepath = &path[..anc_sep.unwrap_or(path.len())];
        let dir_sep = filepath.rfind('/');
        let name_start = dir_sep.map(|sep| sep + 1).unwrap_or(0);
        let ext_sep = filepath[name_start..]
            .rfind('.')
            // Don't count hidden files as extension markers
            .filter(|dot_idx| *dot_idx > 0)
            .map(|dot_idx| dot_idx + name_start);
        AnchorPath {
            path,
            dir_sep,
            ext_sep,
            anc_sep,
        }
    }

    /// True for fragment-only references (`#heading`, `#^block`).
    pub fn is_anchor(&self) -> bool {
        self.anc_sep == Some(0)
    }

    pub fn is_relative(&self) -> bool {
        self.path.starts_with("./") || self.path.starts_with("../")
    }

    pub fn has_dir(&self) -> bool {
        self.dir_sep.is_some()
    }

    /// Everything after the first `#`, without the `#`.
    pub fn anchor(&self) -> &'a str {
        let start_idx = self.anc_sep.map(|idx| idx + 1).unwrap_or(self.path.len());
        &self.path[start_idx..]
    }

    pub fn filepath(&self) -> &'a str {
        &self.path[..self.anc_sep.unwrap_or(self.path.len())]
    }

    pub fn dir(&self) -> &'a str {
        &self.path[..self.dir_sep.unwrap_or(0)]
    }

    pub fn filename(&self) -> &'a str {
        let start_idx = self.dir_sep.map(|idx| idx + 1).unwrap_or(0);
        &self.path[start_idx..self.anc_sep.unwrap_or(self.path.len())]
    }

    pub fn filestem(&self) -> &'a str {
        let start_idx = self.dir_sep.map(|idx| idx + 1).unwrap_or(0);
        let stop_idx = self
            .ext_sep
            .unwrap_or(self.anc_sep.unwrap_or(self.path.len()));
        &self.path[start_idx..stop_idx]
    }

    pub fn ext(&self) -> &'a str {
        let stop_idx = self.anc_sep.unwrap_or(self.path.len());
        let start_idx = self.ext_sep.map(|idx| idx + 1).unwrap_or(stop_idx);
        &self.path[start_idx..stop_idx]
    }

    /// Resolve `.` and `..` components and drop empty and leading separators.
    ///
    /// Leading `..` components that climb above the vault root are preserved, so callers can
    /// detect them. The anchor is carried over untouched.
    pub fn normalize(&self) -> String {
        let mut components: Vec<&str> = Vec::new();
        for part in self.filepath().split('/') {
            match part {
                "" | "." => {}
                ".." => match components.last() {
                    Some(last) if *last != ".." => {
                        components.pop();
                    }
                    _ => components.push(".."),
                },
                _ => components.push(part),
            }
        }
        let filepath = components.join("/");
        if self.anc_sep.is_some() {
            format!("{}#{}", filepath, self.anchor())
        } else {
            filepath
        }
    }

    /// Join a relative link path onto the directory holding this (owner) path.
    pub fn join<E: AsRef<str>>(&self, end_ref: E) -> String {
        let end = end_ref.as_ref();
        if end.starts_with('/') {
            return AnchorPath::new(end).normalize();
        }
        let joined = if self.dir().is_empty() {
            end.to_string()
        } else {
            format!("{}/{}", self.dir(), end)
        };
        AnchorPath::new(&joined).normalize()
    }

    /// The page identity used in reference keys: normalized file path with the markdown
    /// extension removed. Other extensions are kept (`assets/pic.png`).
    pub fn page_key(&self) -> String {
        let normalized = AnchorPath::new(self.filepath()).normalize();
        let ap = AnchorPath::new(&normalized);
        if ap.ext().eq_ignore_ascii_case(PAGE_EXTENSION) {
            let cut = normalized.len() - PAGE_EXTENSION.len() - 1;
            normalized[..cut].to_string()
        } else {
            normalized
        }
    }
}

impl<'a, T: AsRef<str> + ?Sized> From<&'a T> for AnchorPath<'a> {
    fn from(s: &'a T) -> AnchorPath<'a> {
        AnchorPath::new(s.as_ref())
    }
}

impl<'a> AsRef<str> for AnchorPath<'a> {
    fn as_ref(&self) -> &str {
        self.path
    }
}

impl<'a> Display for AnchorPath<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path)
    }
}

/// Shorthand for `AnchorPath::new(path).page_key()`.
pub fn page_key(path: &str) -> String {
    AnchorPath::new(path).page_key()
}
