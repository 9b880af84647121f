//! Layout service for turning repository history into a commit graph.
//!
//! Reads commits page by page from one walk over a [`CommitSource`] and feeds
//! them through a [`LayoutSession`], separated from CLI presentation concerns.

use anyhow::{Context, Result};
use graft_core::{CommitSource, Config, GraphLayoutEngine, LayoutSession, PositionedNode};
use serde::Serialize;
use tracing::debug;

/// Complete layout output for a repository.
#[derive(Debug, Clone, Serialize)]
pub struct LayoutReport {
    pub current_branch: Option<String>,
    pub lane_count: usize,
    pub nodes: Vec<PositionedNode>,
}

impl LayoutReport {
    /// Check if there is nothing to show.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Service for laying out history with trait-based dependencies.
pub struct LayoutService<'a, S: CommitSource> {
    source: &'a S,
    engine: GraphLayoutEngine,
    page_size: usize,
}

impl<'a, S: CommitSource> LayoutService<'a, S> {
    /// Create a layout service.
    ///
    /// The source's remotes are added to the configured ones so that
    /// remote-tracking branches share their local branch's color.
    pub fn new(source: &'a S, config: &Config, page_size: usize) -> Result<Self> {
        let mut config = config.clone();
        config.colors.remotes.extend(source.remote_names()?);

        let engine =
            GraphLayoutEngine::from_config(&config).context("Invalid gitflow configuration")?;

        Ok(Self {
            source,
            engine,
            page_size: page_size.max(1),
        })
    }

    /// Get the current branch name, `None` when HEAD is detached.
    pub fn current_branch(&self) -> Result<Option<String>> {
        Ok(self.source.current_branch()?)
    }

    /// Lay out up to `limit` commits, newest first.
    pub fn layout(&mut self, limit: Option<usize>) -> Result<LayoutReport> {
        let current_branch = self.current_branch()?;
        let mut session = LayoutSession::new(current_branch.clone());
        let mut walk = self.source.walk().context("Failed to read commits")?;
        let mut read = 0;

        loop {
            let want = limit.map_or(self.page_size, |limit| {
                limit.saturating_sub(read).min(self.page_size)
            });
            if want == 0 {
                break;
            }

            let page = walk
                .by_ref()
                .take(want)
                .collect::<Result<Vec<_>, _>>()
                .context("Failed to read commits")?;
            read += page.len();
            session.append(&mut self.engine, &page);

            if page.len() < want {
                break;
            }
        }

        debug!(commits = read, "layout complete");
        let layout = session.into_layout();

        Ok(LayoutReport {
            current_branch,
            lane_count: layout.lane_count,
            nodes: layout.nodes,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::test_mocks::MockSource;
    use graft_core::CommitRecord;

    fn columns(report: &LayoutReport) -> Vec<usize> {
        report.nodes.iter().map(|n| n.column).collect()
    }

    #[test]
    fn test_layout_service_current_branch() {
        let source = MockSource::new().with_current_branch(Some("feature/test"));
        let service = LayoutService::new(&source, &Config::default(), 10).unwrap();
        assert_eq!(
            service.current_branch().unwrap().as_deref(),
            Some("feature/test")
        );
    }

    #[test]
    fn test_layout_empty_source() {
        let source = MockSource::new();
        let mut service = LayoutService::new(&source, &Config::default(), 10).unwrap();

        let report = service.layout(None).unwrap();
        assert!(report.is_empty());
        assert_eq!(report.lane_count, 0);
        assert_eq!(source.walks.get(), 1);
        assert_eq!(source.yielded.get(), 0);
    }

    #[test]
    fn test_layout_reads_in_pages() {
        let source = MockSource::new().with_linear_history("main", 5);
        let mut service = LayoutService::new(&source, &Config::default(), 2).unwrap();

        let report = service.layout(None).unwrap();
        assert_eq!(report.nodes.len(), 5);
        assert_eq!(columns(&report), vec![0; 5]);
        assert_eq!(source.walks.get(), 1);
        assert_eq!(source.yielded.get(), 5);

        // the first page's last commit connects to a parent from the second page
        let tip = &report.nodes[1];
        assert_eq!(tip.parent_rows, vec![2]);
    }

    #[test]
    fn test_layout_respects_limit() {
        let source = MockSource::new().with_linear_history("main", 10);
        let mut service = LayoutService::new(&source, &Config::default(), 3).unwrap();

        let report = service.layout(Some(4)).unwrap();
        assert_eq!(report.nodes.len(), 4);
        assert_eq!(source.walks.get(), 1);
        assert_eq!(source.yielded.get(), 4);
    }

    #[test]
    fn test_zero_limit_reads_nothing() {
        let source = MockSource::new().with_linear_history("main", 3);
        let mut service = LayoutService::new(&source, &Config::default(), 3).unwrap();

        let report = service.layout(Some(0)).unwrap();
        assert!(report.is_empty());
        assert_eq!(source.yielded.get(), 0);
    }

    #[test]
    fn test_paged_matches_single_page() {
        let source = MockSource::new()
            .with_commit(CommitRecord::new("c3", ["c2", "b1"]).with_branch("main"))
            .with_commit(CommitRecord::new("b1", ["c1"]).with_branch("feature/b"))
            .with_commit(CommitRecord::new("c2", ["c1"]))
            .with_commit(CommitRecord::new("c1", Vec::<String>::new()));

        let paged = LayoutService::new(&source, &Config::default(), 1)
            .unwrap()
            .layout(None)
            .unwrap();
        let whole = LayoutService::new(&source, &Config::default(), 100)
            .unwrap()
            .layout(None)
            .unwrap();

        assert_eq!(columns(&paged), columns(&whole));
        assert_eq!(columns(&whole), vec![0, 1, 0, 0]);
        assert_eq!(paged.lane_count, 2);
    }

    #[test]
    fn test_attribution_independent_of_page_size() {
        let source = MockSource::new()
            .with_commit(CommitRecord::new("m", ["c2", "f1"]).with_branch("main"))
            .with_commit(CommitRecord::new("f1", ["d1"]))
            .with_commit(CommitRecord::new("d2", ["d1"]).with_branch("develop"))
            .with_commit(CommitRecord::new("c2", ["c1"]))
            .with_commit(CommitRecord::new("d1", ["c1"]))
            .with_commit(CommitRecord::new("c1", Vec::<String>::new()));

        let whole = LayoutService::new(&source, &Config::default(), 100)
            .unwrap()
            .layout(None)
            .unwrap();
        assert_eq!(whole.nodes[1].primary_branch.as_deref(), Some("develop"));

        for page_size in 1..6 {
            let paged = LayoutService::new(&source, &Config::default(), page_size)
                .unwrap()
                .layout(None)
                .unwrap();
            assert_eq!(paged.nodes, whole.nodes, "page size {page_size}");
        }
    }

    #[test]
    fn test_remote_branches_share_local_color() {
        let source = MockSource::new()
            .with_remote("origin")
            .with_commit(CommitRecord::new("c2", ["c1"]).with_branch("origin/topic"))
            .with_commit(CommitRecord::new("c1", Vec::<String>::new()).with_branch("topic"));
        let mut service = LayoutService::new(&source, &Config::default(), 10).unwrap();

        let report = service.layout(None).unwrap();
        assert_eq!(report.nodes[0].color, report.nodes[1].color);
    }

    #[test]
    fn test_detached_head_reported() {
        let source = MockSource::new()
            .with_current_branch(None)
            .with_commit(CommitRecord::new("c1", Vec::<String>::new()).with_head());
        let mut service = LayoutService::new(&source, &Config::default(), 10).unwrap();

        let report = service.layout(None).unwrap();
        assert_eq!(report.current_branch, None);
        assert!(report.nodes[0].is_head);
    }

    #[test]
    fn test_read_failure_propagates() {
        let source = MockSource::new().with_failing_reads();
        let mut service = LayoutService::new(&source, &Config::default(), 10).unwrap();

        let err = service.layout(None).unwrap_err();
        assert!(format!("{err:#}").contains("object database unavailable"));
    }

    #[test]
    fn test_report_serializes() {
        let source = MockSource::new().with_linear_history("main", 2);
        let mut service = LayoutService::new(&source, &Config::default(), 10).unwrap();

        let json = serde_json::to_string(&service.layout(None).unwrap()).unwrap();
        assert!(json.contains("\"current_branch\":\"main\""));
        assert!(json.contains("\"lane_count\":1"));
        assert!(json.contains("\"primary_branch\":\"main\""));
    }
}
