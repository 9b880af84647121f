//! Repository wrapper that reads decorated commit history.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use git2::{BranchType, ErrorCode, Oid, Sort};
use graft_core::{CommitRecord, CommitSource};
use tracing::{debug, trace};

use crate::error::{Error, Result};

/// High-level wrapper around a git repository.
pub struct Repository {
    inner: git2::Repository,
}

/// Branch and tag names attached to commits, plus the tips to walk from.
#[derive(Debug, Default)]
struct Decorations {
    branches: HashMap<Oid, BTreeSet<String>>,
    tags: HashMap<Oid, BTreeSet<String>>,
    tips: Vec<Oid>,
}

impl Repository {
    /// Open a repository at the given path.
    ///
    /// # Errors
    /// Returns error if no repository found at path or any parent.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let inner = git2::Repository::discover(path).map_err(|e| {
            if e.code() == ErrorCode::NotFound {
                Error::NotARepository(path.to_path_buf())
            } else {
                Error::Git2(e)
            }
        })?;
        debug!(git_dir = %inner.path().display(), "opened repository");
        Ok(Self { inner })
    }

    /// Open the repository containing the current directory.
    ///
    /// # Errors
    /// Returns error if not inside a git repository.
    pub fn open_current() -> Result<Self> {
        Self::open(".")
    }

    /// Get the path to the .git directory.
    #[must_use]
    pub fn git_dir(&self) -> &Path {
        self.inner.path()
    }

    /// Default location of the Graft config file.
    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.git_dir().join("graft.toml")
    }

    /// Get the name of the current branch.
    ///
    /// Returns `None` when HEAD is detached. On a branch with no commits yet
    /// the branch HEAD points at is returned.
    ///
    /// # Errors
    /// Returns error if HEAD can't be read.
    pub fn current_branch(&self) -> Result<Option<String>> {
        match self.inner.head() {
            Ok(head) if head.is_branch() => Ok(head.shorthand().map(String::from)),
            Ok(_) => Ok(None),
            Err(e) if e.code() == ErrorCode::UnbornBranch => {
                let head = self.inner.find_reference("HEAD")?;
                Ok(head
                    .symbolic_target()
                    .and_then(|target| target.strip_prefix("refs/heads/"))
                    .map(String::from))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// List configured remote names.
    ///
    /// # Errors
    /// Returns error if the remote list can't be read.
    pub fn remote_names(&self) -> Result<Vec<String>> {
        let remotes = self.inner.remotes()?;
        Ok(remotes.iter().flatten().map(String::from).collect())
    }

    /// Start a newest-first walk over the history.
    ///
    /// History is walked from every local and remote-tracking branch and from
    /// HEAD, in topological order with ties broken by commit time. Branch and
    /// tag decorations are collected once, when the walk starts.
    ///
    /// # Errors
    /// Returns error if refs can't be read or the walk can't be set up.
    pub fn walk(&self) -> Result<CommitWalk<'_>> {
        let decorations = self.decorations()?;
        let head = self.head_oid();

        let mut revwalk = self.inner.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
        for tip in decorations.tips.iter().copied().chain(head) {
            revwalk.push(tip)?;
        }

        debug!(tips = decorations.tips.len(), "walking history");
        Ok(CommitWalk {
            repo: &self.inner,
            revwalk,
            decorations,
            head,
            read: 0,
            finished: false,
        })
    }

    fn head_oid(&self) -> Option<Oid> {
        self.inner.head().ok().and_then(|head| head.target())
    }

    /// Collect branch tips and tags.
    ///
    /// Local branches keep their short name, remote-tracking branches read
    /// `remote/branch`. Symbolic remote HEADs are skipped. Tags are peeled to
    /// the commit they point at; tags of non-commits are ignored.
    fn decorations(&self) -> Result<Decorations> {
        let mut decorations = Decorations::default();

        for entry in self.inner.branches(None)? {
            let (branch, kind) = entry?;
            let Some(name) = branch.name()? else {
                continue;
            };
            if kind == BranchType::Remote && name.ends_with("/HEAD") {
                continue;
            }
            let Some(target) = branch.get().target() else {
                continue;
            };

            trace!(name, %target, "branch tip");
            decorations
                .branches
                .entry(target)
                .or_default()
                .insert(name.to_string());
            decorations.tips.push(target);
        }

        for reference in self.inner.references_glob("refs/tags/*")? {
            let reference = reference?;
            let Some(name) = reference.shorthand().map(String::from) else {
                continue;
            };
            let Ok(commit) = reference.peel_to_commit() else {
                trace!(name = name.as_str(), "tag does not point at a commit");
                continue;
            };
            decorations.tags.entry(commit.id()).or_default().insert(name);
        }

        Ok(decorations)
    }
}

/// Newest-first walk over the decorated history of a repository.
///
/// Yields one [`CommitRecord`] per commit. The underlying revwalk stays open
/// between pages, so reading history page by page walks it once.
pub struct CommitWalk<'repo> {
    repo: &'repo git2::Repository,
    revwalk: git2::Revwalk<'repo>,
    decorations: Decorations,
    head: Option<Oid>,
    read: usize,
    finished: bool,
}

impl CommitWalk<'_> {
    fn record(&self, oid: Oid) -> Result<CommitRecord> {
        let commit = self.repo.find_commit(oid)?;

        let mut record = CommitRecord::new(
            oid.to_string(),
            commit.parent_ids().map(|parent| parent.to_string()),
        );
        if let Some(names) = self.decorations.branches.get(&oid) {
            record.branch_names.clone_from(names);
        }
        if let Some(names) = self.decorations.tags.get(&oid) {
            record.tag_names.clone_from(names);
        }
        record.is_head = self.head == Some(oid);

        Ok(record)
    }
}

impl Iterator for CommitWalk<'_> {
    type Item = Result<CommitRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let Some(next) = self.revwalk.next() else {
            if !self.finished {
                self.finished = true;
                debug!(count = self.read, "read commits");
            }
            return None;
        };

        let record = next.map_err(Error::from).and_then(|oid| self.record(oid));
        if record.is_ok() {
            self.read += 1;
        }
        Some(record)
    }
}

impl std::fmt::Debug for CommitWalk<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommitWalk")
            .field("read", &self.read)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

impl CommitSource for Repository {
    type Error = Error;
    type Walk<'a> = CommitWalk<'a>;

    fn current_branch(&self) -> Result<Option<String>> {
        Self::current_branch(self)
    }

    fn remote_names(&self) -> Result<Vec<String>> {
        Self::remote_names(self)
    }

    fn walk(&self) -> Result<CommitWalk<'_>> {
        Self::walk(self)
    }
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("path", &self.git_dir())
            .finish()
    }
}
