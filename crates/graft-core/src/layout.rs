//! Commit graph layout.
//!
//! [`GraphLayoutEngine`] walks an ordered, newest-first commit list and
//! places every commit on a row and a lane, colors it after the branch that
//! owns it, and finally resolves the coordinates of each parent in a second
//! pass. Layout never fails: missing parents are left unconnected and
//! unowned commits fall back to a neutral lane color.
//!
//! For paginated history a [`LayoutSession`] carries the lane state from one
//! page to the next.

use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::branch::highest_priority;
use crate::color::{ColorAssigner, ColorToken, HEAD_PSEUDO_BRANCH};
use crate::commit::CommitRecord;
use crate::config::Config;
use crate::error::Result;
use crate::lanes::LaneAllocator;
use crate::ownership::{BranchOwnership, fingerprint};

const SHORT_SHA_LEN: usize = 7;

/// A commit placed on the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionedNode {
    pub sha: String,

    /// Display row, newest first.
    pub row: usize,

    /// Lane.
    pub column: usize,

    pub color: ColorToken,

    /// Branch owning the commit, if any.
    pub primary_branch: Option<String>,

    /// Parents present in the layout, in the commit's parent order.
    pub parent_shas: Vec<String>,

    /// Lane of each entry of `parent_shas`.
    pub parent_columns: Vec<usize>,

    /// Row of each entry of `parent_shas`.
    pub parent_rows: Vec<usize>,

    /// Whether `parent_shas[0]` is the commit's first parent.
    pub first_parent_visible: bool,

    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub branch_names: BTreeSet<String>,

    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tag_names: BTreeSet<String>,

    #[serde(default)]
    pub is_head: bool,
}

impl PositionedNode {
    /// Abbreviated sha for display.
    #[must_use]
    pub fn short_sha(&self) -> &str {
        self.sha.get(..SHORT_SHA_LEN).unwrap_or(&self.sha)
    }

    /// Resolved parent connections.
    pub fn connections(&self) -> impl Iterator<Item = Connection<'_>> + '_ {
        self.parent_shas
            .iter()
            .zip(&self.parent_columns)
            .zip(&self.parent_rows)
            .enumerate()
            .map(|(index, ((sha, &column), &row))| Connection {
                parent_sha: sha,
                column,
                row,
                kind: if index == 0 && self.first_parent_visible {
                    ConnectionKind::FirstParent
                } else {
                    ConnectionKind::Merge
                },
            })
    }
}

/// How a parent connection continues from its child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionKind {
    /// Lineage continuation: drawn down first, then across.
    FirstParent,
    /// Merged-in parent: drawn across first, then down.
    Merge,
}

/// A child-to-parent edge with the parent's coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connection<'a> {
    pub parent_sha: &'a str,
    pub column: usize,
    pub row: usize,
    pub kind: ConnectionKind,
}

/// A complete layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphLayout {
    pub nodes: Vec<PositionedNode>,

    /// Number of lanes opened during the walk.
    pub lane_count: usize,
}

impl GraphLayout {
    /// Check if the layout has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Find a node by sha.
    #[must_use]
    pub fn node(&self, sha: &str) -> Option<&PositionedNode> {
        self.nodes.iter().find(|n| n.sha == sha)
    }
}

/// Turns commit lists into graph layouts.
///
/// The engine owns the color cache and a memo of the last branch ownership
/// it computed; both survive between calls and are dropped by
/// [`GraphLayoutEngine::clear_caches`].
#[derive(Debug, Clone, Default)]
pub struct GraphLayoutEngine {
    colors: ColorAssigner,
    ownership_memo: Option<(u64, Rc<BranchOwnership>)>,
}

impl GraphLayoutEngine {
    /// Engine with hash-only coloring.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine with the given color assigner.
    #[must_use]
    pub const fn with_colors(colors: ColorAssigner) -> Self {
        Self {
            colors,
            ownership_memo: None,
        }
    }

    /// Engine configured from a [`Config`].
    ///
    /// # Errors
    /// Returns error if the GitFlow section is invalid.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::with_colors(config.color_assigner()?))
    }

    /// The color assigner.
    #[must_use]
    pub const fn colors(&self) -> &ColorAssigner {
        &self.colors
    }

    /// The color assigner, for changing remotes or rules.
    pub const fn colors_mut(&mut self) -> &mut ColorAssigner {
        &mut self.colors
    }

    /// Drop the color cache and the ownership memo, e.g. when switching
    /// repositories.
    pub fn clear_caches(&mut self) {
        self.colors.clear_cache();
        self.ownership_memo = None;
    }

    /// Lay out a complete newest-first commit list.
    ///
    /// `current_branch` selects the main lineage; without it the
    /// highest-priority branch is used and a HEAD commit without its own
    /// branch is treated as a detached HEAD.
    pub fn layout(&mut self, commits: &[CommitRecord], current_branch: Option<&str>) -> GraphLayout {
        let mut session = LayoutSession::new(current_branch.map(str::to_string));
        session.ownership = self.ownership_for(commits);
        session.append(self, commits);
        session.into_layout()
    }

    fn ownership_for(&mut self, commits: &[CommitRecord]) -> Rc<BranchOwnership> {
        let key = fingerprint(commits);
        if let Some((cached_key, ownership)) = &self.ownership_memo {
            if *cached_key == key {
                trace!("reusing memoized branch ownership");
                return Rc::clone(ownership);
            }
        }

        let ownership = Rc::new(BranchOwnership::resolve(commits));
        self.ownership_memo = Some((key, Rc::clone(&ownership)));
        ownership
    }
}

/// Layout state carried across pages of one commit stream.
///
/// Pages must arrive in order, newest first, with children before their
/// parents. Rows continue from the previous page and branch ownership is
/// extended with every page. When a later page settles the owner of an
/// earlier commit, that node's `primary_branch` and color are updated, so the
/// final attribution does not depend on where the pages were split. Columns
/// are never revisited. Parent connections of earlier pages are filled in
/// once their parents arrive.
#[derive(Debug, Clone, Default)]
pub struct LayoutSession {
    current_branch: Option<String>,
    lanes: LaneAllocator,
    ownership: Rc<BranchOwnership>,
    commits: Vec<CommitRecord>,
    nodes: Vec<PositionedNode>,

    /// Row of every laid-out sha.
    rows: HashMap<String, usize>,

    /// Parent sha not laid out yet to the rows of its children.
    unconnected: HashMap<String, Vec<usize>>,
}

impl LayoutSession {
    /// Start an empty session.
    #[must_use]
    pub fn new(current_branch: Option<String>) -> Self {
        Self {
            current_branch,
            ..Self::default()
        }
    }

    /// Discard all state, keeping the current branch.
    pub fn reset(&mut self) {
        self.lanes.reset();
        self.ownership = Rc::default();
        self.commits.clear();
        self.nodes.clear();
        self.rows.clear();
        self.unconnected.clear();
    }

    /// Nodes laid out so far.
    #[must_use]
    pub fn nodes(&self) -> &[PositionedNode] {
        &self.nodes
    }

    /// Number of commits laid out so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if nothing has been laid out yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Snapshot of the layout so far.
    #[must_use]
    pub fn layout(&self) -> GraphLayout {
        GraphLayout {
            nodes: self.nodes.clone(),
            lane_count: self.lanes.width(),
        }
    }

    /// Finish the session.
    #[must_use]
    pub fn into_layout(self) -> GraphLayout {
        GraphLayout {
            nodes: self.nodes,
            lane_count: self.lanes.width(),
        }
    }

    /// Lay out the next page and return its nodes.
    pub fn append(
        &mut self,
        engine: &mut GraphLayoutEngine,
        page: &[CommitRecord],
    ) -> &[PositionedNode] {
        let start = self.nodes.len();

        for commit in page {
            if self.rows.contains_key(&commit.sha) {
                warn!(sha = commit.sha.as_str(), "skipping duplicate commit");
                continue;
            }
            self.rows.insert(commit.sha.clone(), self.commits.len());
            self.commits.push(commit.clone());
        }

        let fresh = &self.commits[start..];
        let changed = if fresh.iter().all(|c| self.ownership.contains(&c.sha)) {
            Vec::new()
        } else {
            Rc::make_mut(&mut self.ownership).extend(fresh)
        };

        let ownership = Rc::clone(&self.ownership);
        let detached = self.current_branch.is_none();
        self.refresh(&changed, &ownership, &mut engine.colors, detached);

        let main_lineage = ownership.main_lineage(self.current_branch.as_deref());
        self.lanes
            .set_reserve_main(main_lineage.is_some_and(|lineage| !lineage.is_empty()));
        let on_main = |sha: &str| main_lineage.is_some_and(|lineage| lineage.contains(sha));

        for (row, commit) in self.commits.iter().enumerate().skip(start) {
            let node = place(
                commit,
                row,
                &mut self.lanes,
                &ownership,
                &on_main,
                &mut engine.colors,
                detached,
            );
            self.nodes.push(node);
        }

        for row in start..self.nodes.len() {
            self.connect(row);
            for parent in &self.commits[row].parent_shas {
                if !self.rows.contains_key(parent) {
                    self.unconnected.entry(parent.clone()).or_default().push(row);
                }
            }
        }
        for row in start..self.nodes.len() {
            let Some(children) = self.unconnected.remove(&self.commits[row].sha) else {
                continue;
            };
            for child in children {
                self.connect(child);
            }
        }

        debug!(
            page = page.len(),
            total = self.nodes.len(),
            lanes = self.lanes.width(),
            refreshed = changed.len(),
            "laid out page"
        );

        &self.nodes[start..]
    }

    /// Update attribution of earlier nodes whose owner has changed.
    fn refresh(
        &mut self,
        changed: &[String],
        ownership: &BranchOwnership,
        colors: &mut ColorAssigner,
        detached: bool,
    ) {
        for sha in changed {
            let Some(&row) = self.rows.get(sha) else {
                continue;
            };
            let (Some(node), Some(commit)) = (self.nodes.get_mut(row), self.commits.get(row))
            else {
                continue;
            };

            node.primary_branch = ownership.owner(sha).map(str::to_string);
            node.color = node_color(
                commit,
                node.primary_branch.as_deref(),
                node.column,
                detached,
                colors,
            );
            trace!(
                sha = sha.as_str(),
                row,
                branch = node.primary_branch.as_deref(),
                "refreshed attribution"
            );
        }
    }

    /// Fill in the coordinates of every laid-out parent of a row.
    fn connect(&mut self, row: usize) {
        let commit = &self.commits[row];
        let mut parent_shas = Vec::new();
        let mut parent_columns = Vec::new();
        let mut parent_rows = Vec::new();

        for parent in &commit.parent_shas {
            if let Some(&parent_row) = self.rows.get(parent) {
                parent_shas.push(parent.clone());
                parent_columns.push(self.nodes[parent_row].column);
                parent_rows.push(parent_row);
            }
        }
        let first_parent_visible = commit
            .first_parent()
            .is_some_and(|first| self.rows.contains_key(first));

        let node = &mut self.nodes[row];
        node.parent_shas = parent_shas;
        node.parent_columns = parent_columns;
        node.parent_rows = parent_rows;
        node.first_parent_visible = first_parent_visible;
    }
}

/// Place one commit: claim its lane, color it, and point the lane at its
/// parents for the rows below.
fn place<M>(
    commit: &CommitRecord,
    row: usize,
    lanes: &mut LaneAllocator,
    ownership: &BranchOwnership,
    on_main: &M,
    colors: &mut ColorAssigner,
    detached: bool,
) -> PositionedNode
where
    M: Fn(&str) -> bool,
{
    let column = lanes.claim(&commit.sha, on_main(&commit.sha));

    let primary_branch = ownership.owner(&commit.sha).map(str::to_string);
    let color_branch = primary_branch
        .clone()
        .or_else(|| lanes.lane_branch(column).map(str::to_string))
        .or_else(|| highest_priority(&commit.branch_names).map(str::to_string));
    let color = node_color(commit, color_branch.as_deref(), column, detached, colors);

    trace!(
        sha = commit.sha.as_str(),
        row,
        column,
        branch = color_branch.as_deref(),
        "placed commit"
    );

    lanes.set_lane_branch(column, color_branch);
    lanes.advance(column, &commit.parent_shas, on_main, |sha| {
        ownership.owner(sha).map(str::to_string)
    });

    PositionedNode {
        sha: commit.sha.clone(),
        row,
        column,
        color,
        primary_branch,
        parent_shas: Vec::new(),
        parent_columns: Vec::new(),
        parent_rows: Vec::new(),
        first_parent_visible: false,
        branch_names: commit.branch_names.clone(),
        tag_names: commit.tag_names.clone(),
        is_head: commit.is_head,
    }
}

/// Color of a node drawn for `branch` in `column`.
///
/// A detached HEAD without a branch of its own gets the HEAD accent; a node
/// without any branch falls back to the lane palette.
fn node_color(
    commit: &CommitRecord,
    branch: Option<&str>,
    column: usize,
    detached: bool,
    colors: &mut ColorAssigner,
) -> ColorToken {
    if detached && commit.is_head && commit.branch_names.is_empty() {
        ColorToken::Branch {
            hsl: colors.color_for(HEAD_PSEUDO_BRANCH),
        }
    } else if let Some(name) = branch {
        ColorToken::Branch {
            hsl: colors.color_for(name),
        }
    } else {
        ColorToken::for_lane(column)
    }
}
