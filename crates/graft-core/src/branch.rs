//! Branch priority ordering.
//!
//! Several parts of the engine need a deterministic "most important branch
//! first" ordering: ownership resolution tries branches in this order, the
//! main lineage is taken from the first branch, and a commit decorated with
//! several tips is colored after the first one.

use std::cmp::Ordering;

/// Priority class of a branch name. Lower sorts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BranchPriority {
    /// `main` or `master`.
    Main = 0,
    /// `develop` or `development`.
    Develop = 1,
    /// Everything else.
    Other = 2,
}

impl BranchPriority {
    /// Classify a branch name.
    #[must_use]
    pub fn of(name: &str) -> Self {
        match name {
            "main" | "master" => Self::Main,
            "develop" | "development" => Self::Develop,
            _ => Self::Other,
        }
    }
}

/// Compare two branch names by priority, then case-insensitively, then
/// exactly (so the order is total even for names differing only in case).
#[must_use]
pub fn compare_branches(a: &str, b: &str) -> Ordering {
    BranchPriority::of(a)
        .cmp(&BranchPriority::of(b))
        .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
        .then_with(|| a.cmp(b))
}

/// Pick the highest-priority name out of a collection.
pub fn highest_priority<'a, I>(names: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a String>,
{
    names
        .into_iter()
        .map(String::as_str)
        .min_by(|a, b| compare_branches(a, b))
}
