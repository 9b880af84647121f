//! Trait abstractions for commit sources.
//!
//! This module defines the `CommitSource` trait which abstracts where commit
//! lists come from, enabling dependency injection and testability.

use crate::commit::CommitRecord;

/// Trait for anything that can supply a newest-first commit stream.
///
/// This trait abstracts the repository reader, allowing for:
/// - Dependency injection in commands/services
/// - Mock implementations for testing
/// - Alternative implementations (e.g., a pre-recorded commit list)
#[allow(clippy::missing_errors_doc)]
pub trait CommitSource {
    /// Error produced by the underlying reader.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Iterator over the history, newest first.
    type Walk<'a>: Iterator<Item = Result<CommitRecord, Self::Error>>
    where
        Self: 'a;

    /// Name of the checked-out branch, `None` when HEAD is detached.
    fn current_branch(&self) -> Result<Option<String>, Self::Error>;

    /// Names of the configured remotes.
    fn remote_names(&self) -> Result<Vec<String>, Self::Error>;

    /// Start walking the history.
    ///
    /// Children come before their parents. Pages are taken from one walk, so
    /// each page continues where the previous one stopped.
    fn walk(&self) -> Result<Self::Walk<'_>, Self::Error>;
}
