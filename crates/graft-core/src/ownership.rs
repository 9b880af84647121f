//! Branch ownership resolution.
//!
//! Every commit is attributed to at most one branch so the graph can color
//! and group it consistently, even when it sits several merges deep below
//! the tip that reaches it. Resolution runs three phases, first match wins,
//! and within each phase branches are tried in priority order
//! (see [`crate::branch`]):
//!
//! 1. **Direct lineage** - the commit is on a branch's first-parent chain.
//! 2. **First-parent trace-back** - following the commit's own first parents
//!    eventually lands on a branch's first-parent chain. This attributes
//!    short-lived topic commits to the branch they diverged from.
//! 3. **Ancestry fallback** - the commit is reachable from a branch tip at
//!    all (typically only through a merge).
//!
//! Resolution is incremental. [`BranchOwnership::extend`] takes the next
//! commits of a newest-first stream and continues every walk where it
//! stopped: a walk that reaches a parent not seen yet parks on it and resumes
//! once that parent arrives. A commit whose trace-back is parked keeps its
//! ancestry owner until the trace-back settles. As long as children arrive
//! before their parents, extending page by page ends in the same ownership
//! as resolving the whole list at once.

use std::cmp::Ordering;
use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, HashSet, VecDeque};
use std::hash::{Hash, Hasher};

use tracing::{debug, trace};

use crate::branch::compare_branches;
use crate::commit::CommitRecord;

/// Reachability data for one branch tip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchData {
    /// Branch name.
    pub name: String,

    /// Commit the branch points at.
    pub tip: String,

    /// Commits on the first-parent chain from the tip down to the root.
    pub first_parent_set: HashSet<String>,

    /// Every commit reachable from the tip.
    pub all_ancestors: HashSet<String>,
}

impl BranchData {
    fn new(name: &str, tip: &str) -> Self {
        Self {
            name: name.to_string(),
            tip: tip.to_string(),
            first_parent_set: HashSet::new(),
            all_ancestors: HashSet::new(),
        }
    }
}

/// Where a first-parent trace-back ended.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Trace {
    /// Landed on the lineage of a branch.
    Found(usize),
    /// Ran out of history or went in a circle.
    Exhausted,
    /// Stopped at a parent that has not been seen yet.
    Parked(String),
}

/// Branch ownership of the commits seen so far.
#[derive(Debug, Clone)]
pub struct BranchOwnership {
    /// Parents of every commit seen so far.
    parents: HashMap<String, Vec<String>>,

    /// Branch data in the order the tips were found.
    branches: Vec<BranchData>,

    /// Branch name to index into `branches`.
    by_name: HashMap<String, usize>,

    /// Indices into `branches`, highest priority first.
    priority: Vec<usize>,

    /// Take tips from commit decorations.
    decorated_tips: bool,

    /// Unseen sha to the branches whose first-parent walk stopped there.
    lineage_frontier: HashMap<String, Vec<usize>>,

    /// Unseen sha to the branches whose ancestor walk reached it.
    ancestor_frontier: HashMap<String, Vec<usize>>,

    /// Unseen sha to the commits whose trace-back stopped there.
    pending_traces: HashMap<String, Vec<String>>,

    /// Commit sha to owning branch index.
    owners: HashMap<String, usize>,
}

impl Default for BranchOwnership {
    fn default() -> Self {
        Self::new()
    }
}

impl BranchOwnership {
    /// Empty ownership that takes branch tips from commit decorations.
    #[must_use]
    pub fn new() -> Self {
        Self {
            parents: HashMap::new(),
            branches: Vec::new(),
            by_name: HashMap::new(),
            priority: Vec::new(),
            decorated_tips: true,
            lineage_frontier: HashMap::new(),
            ancestor_frontier: HashMap::new(),
            pending_traces: HashMap::new(),
            owners: HashMap::new(),
        }
    }

    /// Resolve ownership using the branch tips decorating the commits.
    ///
    /// A branch name that decorates more than one commit is taken from the
    /// first (newest) one.
    #[must_use]
    pub fn resolve(commits: &[CommitRecord]) -> Self {
        let mut ownership = Self::new();
        ownership.extend(commits);
        ownership
    }

    /// Resolve ownership for an explicit set of `(branch, tip sha)` pairs.
    ///
    /// Decorations are ignored. Tips that are not part of `commits` never
    /// claim anything.
    #[must_use]
    pub fn resolve_with_tips<I, N, S>(commits: &[CommitRecord], tips: I) -> Self
    where
        I: IntoIterator<Item = (N, S)>,
        N: AsRef<str>,
        S: AsRef<str>,
    {
        let mut ownership = Self {
            decorated_tips: false,
            ..Self::new()
        };
        for (name, tip) in tips {
            ownership.add_branch(name.as_ref(), tip.as_ref());
        }
        ownership.extend(commits);
        ownership
    }

    /// Take the next commits of the stream.
    ///
    /// Commits seen before are ignored. Returns the shas of previously seen
    /// commits whose owner changed because their trace-back could finally
    /// settle.
    pub fn extend<'c, I>(&mut self, commits: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'c CommitRecord>,
    {
        let mut fresh = Vec::new();
        for commit in commits {
            if !self.parents.contains_key(&commit.sha) {
                self.parents
                    .insert(commit.sha.clone(), commit.parent_shas.clone());
                fresh.push(commit);
            }
        }

        for commit in &fresh {
            if self.decorated_tips {
                for name in &commit.branch_names {
                    self.add_branch(name, &commit.sha);
                }
            }
            for branch in self.lineage_frontier.remove(&commit.sha).unwrap_or_default() {
                self.walk_lineage(branch, commit.sha.clone());
            }
            for branch in self.ancestor_frontier.remove(&commit.sha).unwrap_or_default() {
                self.walk_ancestors(branch, commit.sha.clone());
            }
        }

        let mut changed = Vec::new();
        for commit in &fresh {
            if let Some(waiting) = self.pending_traces.remove(&commit.sha) {
                let outcome = self.trace(HashSet::new(), commit.sha.clone());
                self.settle(waiting, outcome, &mut changed);
            }
        }
        for commit in &fresh {
            self.resolve_commit(commit);
        }

        debug!(
            commits = fresh.len(),
            branches = self.branches.len(),
            owned = self.owners.len(),
            changed = changed.len(),
            pending = self.pending_traces.len(),
            "resolved branch ownership"
        );

        changed
    }

    /// Check if a commit has been seen.
    #[must_use]
    pub fn contains(&self, sha: &str) -> bool {
        self.parents.contains_key(sha)
    }

    /// The branch owning a commit, if any claims it.
    #[must_use]
    pub fn owner(&self, sha: &str) -> Option<&str> {
        self.owners
            .get(sha)
            .map(|&index| self.branches[index].name.as_str())
    }

    /// Branch data, highest priority first.
    pub fn branches(&self) -> impl Iterator<Item = &BranchData> {
        self.priority.iter().map(|&index| &self.branches[index])
    }

    /// Find the data for a branch by name.
    #[must_use]
    pub fn branch(&self, name: &str) -> Option<&BranchData> {
        self.by_name.get(name).map(|&index| &self.branches[index])
    }

    /// The branch whose first-parent chain forms the main lineage.
    ///
    /// This is the current branch when it is one of the known tips, and the
    /// highest-priority branch otherwise.
    #[must_use]
    pub fn main_branch(&self, current_branch: Option<&str>) -> Option<&BranchData> {
        current_branch
            .and_then(|name| self.branch(name))
            .or_else(|| self.branches().next())
    }

    /// Commits on the main lineage, `None` when there are no branch tips.
    #[must_use]
    pub fn main_lineage(&self, current_branch: Option<&str>) -> Option<&HashSet<String>> {
        self.main_branch(current_branch)
            .map(|branch| &branch.first_parent_set)
    }

    fn add_branch(&mut self, name: &str, tip: &str) {
        if self.by_name.contains_key(name) {
            return;
        }

        let index = self.branches.len();
        self.branches.push(BranchData::new(name, tip));
        self.by_name.insert(name.to_string(), index);

        let position = self.priority.partition_point(|&other| {
            compare_branches(&self.branches[other].name, name) == Ordering::Less
        });
        self.priority.insert(position, index);

        trace!(name, tip, "branch tip");
        self.walk_lineage(index, tip.to_string());
        self.walk_ancestors(index, tip.to_string());
    }

    /// Follow first parents from `start`, parking at the first unseen one.
    fn walk_lineage(&mut self, branch: usize, start: String) {
        let mut current = start;
        loop {
            let Some(parents) = self.parents.get(&current) else {
                park(&mut self.lineage_frontier, current, branch);
                return;
            };
            let next = parents.first().cloned();
            if !self.branches[branch].first_parent_set.insert(current) {
                return;
            }
            match next {
                Some(parent) => current = parent,
                None => return,
            }
        }
    }

    /// Breadth-first walk over all parents from `start`, parking at every
    /// unseen one.
    fn walk_ancestors(&mut self, branch: usize, start: String) {
        let mut queue = VecDeque::from([start]);
        while let Some(sha) = queue.pop_front() {
            let Some(parents) = self.parents.get(&sha) else {
                park(&mut self.ancestor_frontier, sha, branch);
                continue;
            };
            let ancestors = &mut self.branches[branch].all_ancestors;
            if !ancestors.contains(&sha) {
                queue.extend(parents.iter().filter(|p| !ancestors.contains(*p)).cloned());
                ancestors.insert(sha);
            }
        }
    }

    fn lineage_owner(&self, sha: &str) -> Option<usize> {
        self.priority
            .iter()
            .copied()
            .find(|&index| self.branches[index].first_parent_set.contains(sha))
    }

    fn ancestor_owner(&self, sha: &str) -> Option<usize> {
        self.priority
            .iter()
            .copied()
            .find(|&index| self.branches[index].all_ancestors.contains(sha))
    }

    /// Trace first parents starting at `sha`, the next parent to check.
    fn trace(&self, mut visited: HashSet<String>, mut sha: String) -> Trace {
        loop {
            if !visited.insert(sha.clone()) {
                trace!(sha = sha.as_str(), "first-parent cycle, giving up trace-back");
                return Trace::Exhausted;
            }
            let Some(parents) = self.parents.get(&sha) else {
                return Trace::Parked(sha);
            };
            if let Some(branch) = self.lineage_owner(&sha) {
                return Trace::Found(branch);
            }
            match parents.first() {
                Some(parent) => sha.clone_from(parent),
                None => return Trace::Exhausted,
            }
        }
    }

    fn resolve_commit(&mut self, commit: &CommitRecord) {
        let sha = &commit.sha;
        if let Some(branch) = self.lineage_owner(sha) {
            self.owners.insert(sha.clone(), branch);
            return;
        }

        if let Some(branch) = self.ancestor_owner(sha) {
            self.owners.insert(sha.clone(), branch);
        }
        let Some(first) = commit.first_parent() else {
            return;
        };
        match self.trace(HashSet::from([sha.clone()]), first.to_string()) {
            Trace::Found(branch) => {
                self.owners.insert(sha.clone(), branch);
            }
            Trace::Exhausted => {}
            Trace::Parked(at) => {
                trace!(sha = sha.as_str(), at = at.as_str(), "trace-back waits for parent");
                self.pending_traces.entry(at).or_default().push(sha.clone());
            }
        }
    }

    /// Apply the outcome of a resumed trace-back to the commits waiting on it.
    fn settle(&mut self, waiting: Vec<String>, outcome: Trace, changed: &mut Vec<String>) {
        match outcome {
            Trace::Found(branch) => {
                for sha in waiting {
                    if self.owners.get(&sha) != Some(&branch) {
                        self.owners.insert(sha.clone(), branch);
                        changed.push(sha);
                    }
                }
            }
            Trace::Exhausted => {}
            Trace::Parked(at) => self.pending_traces.entry(at).or_default().extend(waiting),
        }
    }
}

fn park(frontier: &mut HashMap<String, Vec<usize>>, sha: String, branch: usize) {
    let waiting = frontier.entry(sha).or_default();
    if !waiting.contains(&branch) {
        waiting.push(branch);
    }
}

/// Content fingerprint of a commit list, used to memoize ownership.
///
/// Covers everything ownership depends on: order, shas, parents and branch
/// decorations. Only meaningful within one process.
#[must_use]
pub fn fingerprint(commits: &[CommitRecord]) -> u64 {
    let mut hasher = DefaultHasher::new();
    commits.len().hash(&mut hasher);
    for commit in commits {
        commit.sha.hash(&mut hasher);
        commit.parent_shas.hash(&mut hasher);
        commit.branch_names.hash(&mut hasher);
    }
    hasher.finish()
}
