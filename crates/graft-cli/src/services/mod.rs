//! Service layer for business logic with dependency injection.
//!
//! This module contains services that encapsulate business logic and accept
//! trait-based dependencies, enabling testing with mock implementations.

pub mod color;
pub mod layout;

#[cfg(test)]
pub mod test_mocks;

pub use color::{ColorInfo, ColorService};
pub use layout::{LayoutReport, LayoutService};
