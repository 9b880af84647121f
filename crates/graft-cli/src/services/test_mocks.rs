//! Mock implementations for testing services.
//!
//! `MockSource` implements the `CommitSource` trait from graft-core over an
//! in-memory commit list, so service logic can be tested without real git
//! repos.

use std::cell::Cell;
use std::io;

use graft_core::{CommitRecord, CommitSource};

/// In-memory commit source that counts walks and yielded commits.
pub struct MockSource {
    pub current_branch: Option<String>,
    pub remotes: Vec<String>,
    pub commits: Vec<CommitRecord>,
    pub walks: Cell<usize>,
    pub yielded: Cell<usize>,
    pub fail_reads: bool,
}

impl Default for MockSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSource {
    pub fn new() -> Self {
        Self {
            current_branch: Some("main".to_string()),
            remotes: Vec::new(),
            commits: Vec::new(),
            walks: Cell::new(0),
            yielded: Cell::new(0),
            fail_reads: false,
        }
    }

    pub fn with_current_branch(mut self, name: Option<&str>) -> Self {
        self.current_branch = name.map(str::to_string);
        self
    }

    pub fn with_remote(mut self, name: &str) -> Self {
        self.remotes.push(name.to_string());
        self
    }

    pub fn with_commit(mut self, commit: CommitRecord) -> Self {
        self.commits.push(commit);
        self
    }

    /// Linear history `c{n-1} -> ... -> c0`, newest first, tip on `branch`.
    pub fn with_linear_history(mut self, branch: &str, len: usize) -> Self {
        for i in (0..len).rev() {
            let parents: Vec<String> = if i == 0 {
                Vec::new()
            } else {
                vec![format!("c{}", i - 1)]
            };
            let mut commit = CommitRecord::new(format!("c{i}"), parents);
            if i + 1 == len {
                commit = commit.with_branch(branch);
            }
            self.commits.push(commit);
        }
        self
    }

    pub const fn with_failing_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }
}

/// Walk over a [`MockSource`], failing on the first commit when asked to.
pub struct MockWalk<'a> {
    source: &'a MockSource,
    next: usize,
}

impl Iterator for MockWalk<'_> {
    type Item = Result<CommitRecord, io::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.source.fail_reads {
            if self.next > 0 {
                return None;
            }
            self.next = 1;
            return Some(Err(io::Error::other("object database unavailable")));
        }

        let commit = self.source.commits.get(self.next)?.clone();
        self.next += 1;
        self.source.yielded.set(self.source.yielded.get() + 1);
        Some(Ok(commit))
    }
}

impl CommitSource for MockSource {
    type Error = io::Error;
    type Walk<'a> = MockWalk<'a>;

    fn current_branch(&self) -> Result<Option<String>, io::Error> {
        Ok(self.current_branch.clone())
    }

    fn remote_names(&self) -> Result<Vec<String>, io::Error> {
        Ok(self.remotes.clone())
    }

    fn walk(&self) -> Result<MockWalk<'_>, io::Error> {
        self.walks.set(self.walks.get() + 1);
        Ok(MockWalk {
            source: self,
            next: 0,
        })
    }
}
