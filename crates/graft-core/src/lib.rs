//! # graft-core
//!
//! Commit graph layout for Graft. Takes a newest-first list of commits and
//! computes, for every commit, its row, its lane, the branch that owns it,
//! its color, and the coordinates of its parents.
//!
//! The engine is pure and synchronous: no IO happens here. Commit lists come
//! from a [`CommitSource`] such as the git2-backed reader in `graft-git`.
//!
//! ```
//! use graft_core::{CommitRecord, GraphLayoutEngine};
//!
//! let commits = vec![
//!     CommitRecord::new("c3", ["c2"]).with_branch("main"),
//!     CommitRecord::new("c2", ["c1"]),
//!     CommitRecord::new("c1", Vec::<String>::new()),
//! ];
//!
//! let layout = GraphLayoutEngine::new().layout(&commits, Some("main"));
//! assert!(layout.nodes.iter().all(|node| node.column == 0));
//! ```

pub mod branch;
pub mod color;
pub mod commit;
pub mod config;
pub mod error;
pub mod lanes;
pub mod layout;
pub mod ownership;
pub mod traits;

pub use branch::BranchPriority;
pub use color::{BranchRole, ColorAssigner, ColorToken, Hsl, RoleRule};
pub use commit::CommitRecord;
pub use config::Config;
pub use error::{Error, Result};
pub use lanes::LaneAllocator;
pub use layout::{
    Connection, ConnectionKind, GraphLayout, GraphLayoutEngine, LayoutSession, PositionedNode,
};
pub use ownership::{BranchData, BranchOwnership};
pub use traits::CommitSource;
