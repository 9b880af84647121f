//! Terminal output formatting utilities.

use std::sync::atomic::{AtomicBool, Ordering};

use colored::Colorize;
use graft_core::Hsl;

static QUIET_MODE: AtomicBool = AtomicBool::new(false);

/// Set quiet mode globally. Call once at startup.
pub fn set_quiet(quiet: bool) {
    QUIET_MODE.store(quiet, Ordering::Relaxed);
}

fn is_quiet() -> bool {
    QUIET_MODE.load(Ordering::Relaxed)
}

/// Print an error message (always prints to stderr).
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a warning message (always prints to stderr).
pub fn warn(msg: &str) {
    eprintln!("{} {}", "!".yellow(), msg);
}

/// Print an info message (suppressed in quiet mode).
pub fn info(msg: &str) {
    if !is_quiet() {
        println!("{} {}", "→".blue(), msg);
    }
}

/// Print essential machine-readable output (always prints).
///
/// Use for results that should be available for piping, like graph rows.
pub fn essential(msg: &str) {
    println!("{msg}");
}

/// Paint text in a layout color.
#[must_use]
pub fn paint(text: &str, hsl: Hsl) -> String {
    let (r, g, b) = hsl.to_rgb();
    text.truecolor(r, g, b).to_string()
}

/// Draw a node marker in its lane.
#[must_use]
pub fn lane_marker(column: usize, is_head: bool, hsl: Hsl) -> String {
    let glyph = if is_head { "◉" } else { "●" };
    format!("{}{}", "  ".repeat(column), paint(glyph, hsl))
}

/// Format ref decorations like `(HEAD -> main, origin/main, tag: v1)`.
///
/// On the HEAD commit the checked-out branch comes first, after `HEAD ->`.
/// A detached HEAD is listed on its own, before any branches.
#[must_use]
pub fn decorations<'a>(
    branches: impl IntoIterator<Item = &'a String>,
    tags: impl IntoIterator<Item = &'a String>,
    head: bool,
    current_branch: Option<&str>,
) -> String {
    let mut branches: Vec<&String> = branches.into_iter().collect();
    let mut refs = Vec::new();
    if head {
        let checked_out =
            current_branch.and_then(|current| branches.iter().position(|name| *name == current));
        match checked_out {
            Some(index) => refs.push(format!("HEAD -> {}", branches.remove(index))),
            None => refs.push("HEAD".to_string()),
        }
    }
    refs.extend(branches.into_iter().cloned());
    refs.extend(tags.into_iter().map(|tag| format!("tag: {tag}")));

    if refs.is_empty() {
        String::new()
    } else {
        format!("({})", refs.join(", ")).yellow().to_string()
    }
}

/// Print a horizontal line (suppressed in quiet mode).
pub fn hr() {
    if !is_quiet() {
        println!("{}", "─".repeat(50).dimmed());
    }
}
