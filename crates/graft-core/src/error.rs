//! Error types for graft-core.
//!
//! The layout engine itself never fails; these errors only cover the
//! fallible edges of the crate (loading and saving configuration).

use std::path::PathBuf;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in graft-core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Config file parsing error with the offending path.
    #[error("failed to parse {file}: {message}")]
    ConfigParse { file: PathBuf, message: String },

    /// A GitFlow prefix was configured empty.
    #[error("invalid gitflow rule '{role}': prefix cannot be empty")]
    EmptyRolePrefix { role: String },

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML serialization error.
    #[error("toml error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}
