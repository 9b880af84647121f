//! Lane bookkeeping for the layout walk.
//!
//! A lane is a column of the graph. While commits are walked newest to
//! oldest, every lane either waits for the sha it will draw down to next or
//! is free for reuse. Lane 0 is kept for the main lineage: other lineages
//! only take it when no lane exists yet.

use tracing::trace;

/// Growable, reusable pool of lanes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaneAllocator {
    /// Sha each lane is waiting for, indexed by lane.
    active: Vec<Option<String>>,

    /// Branch last drawn in each lane, for color continuity.
    branch_names: Vec<Option<String>>,

    /// Keep lane 0 for the main lineage when scanning for a free lane.
    reserve_main: bool,
}

impl LaneAllocator {
    /// Create an empty allocator that keeps lane 0 for the main lineage.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            active: Vec::new(),
            branch_names: Vec::new(),
            reserve_main: true,
        }
    }

    /// Set whether lane 0 is held back for the main lineage.
    ///
    /// With no main lineage nothing could ever reclaim lane 0, so the layout
    /// engine turns the reservation off in that case.
    pub fn set_reserve_main(&mut self, reserve: bool) {
        self.reserve_main = reserve;
    }

    /// Drop all lanes.
    pub fn reset(&mut self) {
        self.active.clear();
        self.branch_names.clear();
    }

    /// Sha each lane is waiting for.
    #[must_use]
    pub fn lanes(&self) -> &[Option<String>] {
        &self.active
    }

    /// Number of lanes ever opened (the graph's width).
    #[must_use]
    pub fn width(&self) -> usize {
        self.active.len()
    }

    /// Branch last drawn in a lane.
    #[must_use]
    pub fn lane_branch(&self, lane: usize) -> Option<&str> {
        self.branch_names.get(lane).and_then(Option::as_deref)
    }

    /// Remember the branch drawn in a lane.
    pub fn set_lane_branch(&mut self, lane: usize, name: Option<String>) {
        assert!(lane < self.branch_names.len(), "lane {lane} out of range");
        self.branch_names[lane] = name;
    }

    /// Lane index waiting for `sha`, lowest first.
    #[must_use]
    pub fn lane_waiting_for(&self, sha: &str) -> Option<usize> {
        self.active.iter().position(|lane| lane.as_deref() == Some(sha))
    }

    /// Find or allocate the lane for a commit about to be drawn.
    ///
    /// When several lanes wait for the commit (a convergence point), the
    /// lowest one is kept and the rest are freed. A main-lineage commit moves
    /// to lane 0 whenever lane 0 is free at that point.
    pub fn claim(&mut self, sha: &str, on_main: bool) -> usize {
        let waiting: Vec<usize> = self
            .active
            .iter()
            .enumerate()
            .filter(|(_, lane)| lane.as_deref() == Some(sha))
            .map(|(index, _)| index)
            .collect();

        let Some((&kept, converging)) = waiting.split_first() else {
            let lane = self.allocate(on_main);
            trace!(sha, lane, on_main, "opened lane");
            self.active[lane] = Some(sha.to_string());
            return lane;
        };

        for &lane in converging {
            trace!(sha, lane, kept, "freeing converging lane");
            self.release(lane);
        }

        if on_main && kept != 0 && self.active[0].is_none() {
            trace!(sha, from = kept, "moving main lineage to lane 0");
            let name = self.branch_names[kept].take();
            self.active[kept] = None;
            self.active[0] = Some(sha.to_string());
            self.branch_names[0] = name;
            return 0;
        }

        kept
    }

    /// Point a drawn commit's lane at its parents.
    ///
    /// The lane continues to the first parent. Every further parent gets a
    /// lane of its own unless one already waits for it. A root commit
    /// releases its lane.
    pub fn advance<M, B>(&mut self, lane: usize, parents: &[String], on_main: M, branch_of: B)
    where
        M: Fn(&str) -> bool,
        B: Fn(&str) -> Option<String>,
    {
        assert!(lane < self.active.len(), "lane {lane} out of range");

        let Some((first, merged)) = parents.split_first() else {
            trace!(lane, "root commit, releasing lane");
            self.release(lane);
            return;
        };

        self.active[lane] = Some(first.clone());

        for parent in merged {
            if self.lane_waiting_for(parent).is_some() {
                continue;
            }
            let merge_lane = self.allocate(on_main(parent));
            trace!(parent = parent.as_str(), lane = merge_lane, "reserved merge lane");
            self.active[merge_lane] = Some(parent.clone());
            self.branch_names[merge_lane] = branch_of(parent);
        }
    }

    /// Free a lane and forget its branch.
    fn release(&mut self, lane: usize) {
        self.active[lane] = None;
        self.branch_names[lane] = None;
    }

    /// Pick a free lane, opening a new one when none is free.
    fn allocate(&mut self, prefer_main: bool) -> usize {
        let lane = if self.active.is_empty() {
            self.push_lane()
        } else if prefer_main && self.active[0].is_none() {
            0
        } else {
            let start = usize::from(self.reserve_main);
            let free = self.active.iter().skip(start).position(Option::is_none);
            free.map_or_else(|| self.push_lane(), |offset| start + offset)
        };

        assert!(
            self.active[lane].is_none(),
            "allocated lane {lane} is still reserved"
        );
        lane
    }

    fn push_lane(&mut self) -> usize {
        self.active.push(None);
        self.branch_names.push(None);
        self.active.len() - 1
    }
}

impl Default for LaneAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parents(shas: &[&str]) -> Vec<String> {
        shas.iter().map(|s| (*s).to_string()).collect()
    }

    fn never(_: &str) -> bool {
        false
    }

    fn no_branch(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_first_lane_is_zero() {
        let mut lanes = LaneAllocator::new();
        assert_eq!(lanes.claim("c1", false), 0);
        assert_eq!(lanes.width(), 1);
    }

    #[test]
    fn test_chain_stays_in_lane() {
        let mut lanes = LaneAllocator::new();
        let lane = lanes.claim("c2", true);
        lanes.advance(lane, &parents(&["c1"]), never, no_branch);
        assert_eq!(lanes.lane_waiting_for("c1"), Some(lane));
        assert_eq!(lanes.claim("c1", true), lane);
    }

    #[test]
    fn test_lane_zero_reserved_for_main() {
        let mut lanes = LaneAllocator::new();
        let lane = lanes.claim("root", false);
        lanes.advance(lane, &[], never, no_branch);
        assert_eq!(lanes.lanes(), &[None::<String>]);

        // lane 0 is free but held back for the main lineage
        assert_eq!(lanes.claim("topic", false), 1);
        assert_eq!(lanes.claim("mainline", true), 0);
    }

    #[test]
    fn test_without_reservation_lane_zero_is_reused() {
        let mut lanes = LaneAllocator::new();
        lanes.set_reserve_main(false);
        let lane = lanes.claim("root", false);
        lanes.advance(lane, &[], never, no_branch);
        assert_eq!(lanes.claim("next", false), 0);
    }

    #[test]
    fn test_convergence_keeps_lowest_lane() {
        let mut lanes = LaneAllocator::new();
        let a = lanes.claim("a", false);
        lanes.advance(a, &parents(&["base"]), never, no_branch);
        let b = lanes.claim("b", false);
        lanes.advance(b, &parents(&["base"]), never, no_branch);
        assert_eq!((a, b), (0, 1));

        assert_eq!(lanes.claim("base", false), 0);
        assert_eq!(lanes.lanes()[1], None);
    }

    #[test]
    fn test_main_lineage_moves_to_free_lane_zero() {
        let mut lanes = LaneAllocator::new();
        let root = lanes.claim("other-root", false);
        lanes.advance(root, &[], never, no_branch);
        let topic = lanes.claim("topic", false);
        assert_eq!(topic, 1);
        lanes.set_lane_branch(topic, Some("main".into()));
        lanes.advance(topic, &parents(&["m1"]), never, no_branch);

        assert_eq!(lanes.claim("m1", true), 0);
        assert_eq!(lanes.lanes()[1], None);
        assert_eq!(lanes.lane_branch(0), Some("main"));
    }

    #[test]
    fn test_merge_parent_gets_own_lane() {
        let mut lanes = LaneAllocator::new();
        let lane = lanes.claim("merge", true);
        lanes.advance(lane, &parents(&["c2", "b1"]), |sha| sha == "c2", |sha| {
            (sha == "b1").then(|| "feature/b".to_string())
        });
        assert_eq!(lanes.lane_waiting_for("c2"), Some(0));
        assert_eq!(lanes.lane_waiting_for("b1"), Some(1));
        assert_eq!(lanes.lane_branch(1), Some("feature/b"));
    }

    #[test]
    fn test_merge_parent_on_main_takes_free_lane_zero() {
        let mut lanes = LaneAllocator::new();
        let root = lanes.claim("r", false);
        lanes.advance(root, &[], never, no_branch);

        // lane 0 is free but reserved, so the feature merge opens lane 1
        let merge = lanes.claim("f", false);
        assert_eq!(merge, 1);
        lanes.advance(merge, &parents(&["f0", "c2"]), |sha| sha == "c2", |sha| {
            (sha == "c2").then(|| "main".to_string())
        });

        assert_eq!(lanes.lane_waiting_for("f0"), Some(1));
        assert_eq!(lanes.lane_waiting_for("c2"), Some(0));
        assert_eq!(lanes.lane_branch(0), Some("main"));
        assert_eq!(lanes.width(), 2);
        assert_eq!(lanes.claim("c2", true), 0);
    }

    #[test]
    fn test_merge_parent_already_waiting_is_left_alone() {
        let mut lanes = LaneAllocator::new();
        let a = lanes.claim("a", true);
        lanes.advance(a, &parents(&["c1"]), never, no_branch);
        let b = lanes.claim("b", false);
        lanes.advance(b, &parents(&["b0"]), never, no_branch);
        let m = lanes.claim("m", false);
        lanes.advance(m, &parents(&["x", "b0"]), never, no_branch);

        assert_eq!(lanes.width(), 3);
        assert_eq!(lanes.lane_waiting_for("b0"), Some(b));
    }

    #[test]
    fn test_reset() {
        let mut lanes = LaneAllocator::new();
        lanes.claim("c1", false);
        lanes.reset();
        assert_eq!(lanes.width(), 0);
        assert!(lanes.lanes().is_empty());
    }
}
