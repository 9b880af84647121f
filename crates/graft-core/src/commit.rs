//! Commit records supplied by a repository reader.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A single commit as seen by the layout engine.
///
/// Records are immutable input: the engine reads them for one layout pass
/// and never mutates or validates them. Parent shas that are not part of the
/// laid-out list (truncated or paginated history) are simply left
/// unconnected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommitRecord {
    /// Full commit id.
    pub sha: String,

    /// Parent ids, first parent first.
    #[serde(default)]
    pub parent_shas: Vec<String>,

    /// Branch tips pointing at this commit.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub branch_names: BTreeSet<String>,

    /// Tags pointing at this commit.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tag_names: BTreeSet<String>,

    /// Whether HEAD points at this commit.
    #[serde(default)]
    pub is_head: bool,
}

impl CommitRecord {
    /// Create a commit with the given parents and no decorations.
    #[must_use]
    pub fn new<P, S>(sha: impl Into<String>, parents: P) -> Self
    where
        P: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            sha: sha.into(),
            parent_shas: parents.into_iter().map(Into::into).collect(),
            branch_names: BTreeSet::new(),
            tag_names: BTreeSet::new(),
            is_head: false,
        }
    }

    /// Add a branch tip decoration.
    #[must_use]
    pub fn with_branch(mut self, name: impl Into<String>) -> Self {
        self.branch_names.insert(name.into());
        self
    }

    /// Add a tag decoration.
    #[must_use]
    pub fn with_tag(mut self, name: impl Into<String>) -> Self {
        self.tag_names.insert(name.into());
        self
    }

    /// Mark this commit as the one HEAD points at.
    #[must_use]
    pub const fn with_head(mut self) -> Self {
        self.is_head = true;
        self
    }

    /// The first parent, if any.
    #[must_use]
    pub fn first_parent(&self) -> Option<&str> {
        self.parent_shas.first().map(String::as_str)
    }

}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_decorations() {
        let commit = CommitRecord::new("abc1234def", ["p1", "p2"])
            .with_branch("main")
            .with_branch("origin/main")
            .with_tag("v1.0")
            .with_head();

        assert_eq!(commit.first_parent(), Some("p1"));
        assert_eq!(commit.parent_shas, vec!["p1", "p2"]);
        assert!(commit.is_head);
        assert_eq!(commit.branch_names.len(), 2);
        assert!(commit.tag_names.contains("v1.0"));
    }

    #[test]
    fn test_deserialize_defaults() {
        let commit: CommitRecord = toml::from_str(r#"sha = "c1""#).unwrap();
        assert!(commit.parent_shas.is_empty());
        assert_eq!(commit.first_parent(), None);
        assert!(commit.branch_names.is_empty());
        assert!(!commit.is_head);
    }
}
