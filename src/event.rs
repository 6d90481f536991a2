use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Host notifications consumed by [crate::service::ReferenceService::process_events].
///
/// Index events (deletes, renames, metadata resolution) request a debounced rebuild of the
/// [crate::index::BacklinkIndex]. View events (content and viewport changes) only request a
/// fresh match pass for the affected file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndexEvent {
    /// A file was removed from the vault.
    FileDeleted(String),
    /// A file moved. Links pointing at the old path are stale until the next rebuild.
    FileRenamed { from: String, to: String },
    /// The host finished (re)parsing a single file's metadata.
    MetadataResolved(String),
    /// The host finished resolving metadata for the whole vault.
    VaultResolved,
    /// The text of an open file changed.
    ContentChanged(String),
    /// The visible window of an open file scrolled or resized.
    ViewportChanged(String),
}

impl IndexEvent {
    /// True when the event should feed the rebuild debouncer.
    pub fn triggers_rebuild(&self) -> bool {
        matches!(
            self,
            IndexEvent::FileDeleted(_)
                | IndexEvent::FileRenamed { .. }
                | IndexEvent::MetadataResolved(_)
                | IndexEvent::VaultResolved
        )
    }

    /// Files whose cached page views must be dropped, regardless of debouncing.
    pub fn evicted_paths(&self) -> Vec<&str> {
        match self {
            IndexEvent::FileDeleted(path) => vec![path],
            IndexEvent::FileRenamed { from, to } => vec![from, to],
            IndexEvent::MetadataResolved(path) => vec![path],
            IndexEvent::VaultResolved
            | IndexEvent::ContentChanged(_)
            | IndexEvent::ViewportChanged(_) => vec![],
        }
    }

    /// The file that needs a new match pass, if any.
    pub fn rematch_path(&self) -> Option<&str> {
        match self {
            IndexEvent::ContentChanged(path) | IndexEvent::ViewportChanged(path) => Some(path),
            IndexEvent::MetadataResolved(path) => Some(path),
            IndexEvent::FileRenamed { to, .. } => Some(to),
            _ => None,
        }
    }
}

impl Display for IndexEvent {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            IndexEvent::FileDeleted(path) => write!(f, "FileDeleted({path})"),
            IndexEvent::FileRenamed { from, to } => write!(f, "FileRenamed({from} -> {to})"),
            IndexEvent::MetadataResolved(path) => write!(f, "MetadataResolved({path})"),
            IndexEvent::VaultResolved => write!(f, "VaultResolved"),
            IndexEvent::ContentChanged(path) => write!(f, "ContentChanged({path})"),
            IndexEvent::ViewportChanged(path) => write!(f, "ViewportChanged({path})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_event_classification() {
        assert!(IndexEvent::FileDeleted("a.md".into()).triggers_rebuild());
        assert!(IndexEvent::VaultResolved.triggers_rebuild());
        assert!(!IndexEvent::ViewportChanged("a.md".into()).triggers_rebuild());
        assert!(!IndexEvent::ContentChanged("a.md".into()).triggers_rebuild());

        let rename = IndexEvent::FileRenamed {
            from: "old.md".into(),
            to: "new.md".into(),
        };
        assert_eq!(rename.evicted_paths(), vec!["old.md", "new.md"]);
        assert_eq!(rename.rematch_path(), Some("new.md"));
        assert_eq!(IndexEvent::VaultResolved.rematch_path(), None);
    }
}
