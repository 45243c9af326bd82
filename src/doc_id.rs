use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
};

/// A stable document identifier derived from the document's path relative
/// to the data folder.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentId {
    /// The numeric ID; chunk keys are derived from it with
    /// [`crate::chunking::chunk_id`].
    pub numeric: u64,
    /// The short hex string for human display (e.g. "a1b2c3").
    pub short: String,
}

impl DocumentId {
    pub fn new(relative_path: &str) -> Self {
        let mut hasher = DefaultHasher::new();
        relative_path.hash(&mut hasher);
        let numeric = hasher.finish();
        let short = format!("{numeric:016x}")[..6].to_string();
        Self { numeric, short }
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.short)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        assert_eq!(DocumentId::new("a/hello.md"), DocumentId::new("a/hello.md"));
    }

    #[test]
    fn different_paths_differ() {
        let a = DocumentId::new("a/hello.md");
        let b = DocumentId::new("b/hello.md");
        assert_ne!(a.numeric, b.numeric);
    }

    #[test]
    fn display_has_hash_prefix() {
        let s = DocumentId::new("hello.md").to_string();
        assert!(s.starts_with('#'));
        assert_eq!(s.len(), 7);
    }
}
