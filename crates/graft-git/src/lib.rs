//! # graft-git
//!
//! Reads commit history for Graft, built on git2-rs. Walks every local and
//! remote-tracking branch plus HEAD and hands newest-first
//! [`graft_core::CommitRecord`]s to the layout engine.

mod error;
mod repository;

pub use error::{Error, Result};
pub use repository::{CommitWalk, Repository};
