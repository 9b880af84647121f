//! `graft layout` command - lay out the commit graph of the repository.

use anyhow::Result;
use graft_core::PositionedNode;

use super::LayoutArgs;
use super::utils::{load_config, open_repo};
use crate::output;
use crate::services::{LayoutReport, LayoutService};

/// Run the layout command.
pub fn run(args: &LayoutArgs) -> Result<()> {
    let repo = open_repo()?;
    let config = load_config(Some(&repo), args.config.as_deref())?;

    let page_size = args.page_size.map_or(config.layout.page_size, |size| {
        usize::try_from(size).unwrap_or(usize::MAX)
    });

    let mut service = LayoutService::new(&repo, &config, page_size)?;
    let report = service.layout(args.limit)?;

    if args.json {
        return print_json(&report);
    }

    if report.is_empty() {
        output::warn("No commits to lay out");
        return Ok(());
    }

    print_graph(&report);
    Ok(())
}

/// Print the graph in human-readable format.
fn print_graph(report: &LayoutReport) {
    let width = report.lane_count.max(1) * 2;
    let current_branch = report.current_branch.as_deref();

    for node in &report.nodes {
        output::essential(&format_row(node, width, current_branch));
    }

    output::hr();
    let branch = report.current_branch.as_deref().unwrap_or("detached HEAD");
    output::info(&format!(
        "{} commits in {} lanes on {branch}",
        report.nodes.len(),
        report.lane_count
    ));
}

/// One graph row: lane marker, short sha, owning branch and decorations.
fn format_row(node: &PositionedNode, width: usize, current_branch: Option<&str>) -> String {
    let hsl = node.color.hsl();
    let marker = output::lane_marker(node.column, node.is_head, hsl);
    let padding = " ".repeat(width.saturating_sub(node.column * 2 + 1));
    let sha = node.short_sha();
    let branch = node
        .primary_branch
        .as_deref()
        .map(|name| output::paint(name, hsl))
        .unwrap_or_default();
    let decorations = output::decorations(
        &node.branch_names,
        &node.tag_names,
        node.is_head,
        current_branch,
    );

    format!("{marker}{padding} {sha} {branch} {decorations}")
        .trim_end()
        .to_string()
}

/// Print the layout as JSON.
fn print_json(report: &LayoutReport) -> Result<()> {
    let json_output = serde_json::to_string_pretty(report)?;
    println!("{json_output}");
    Ok(())
}
