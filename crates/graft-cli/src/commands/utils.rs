use std::path::Path;

use anyhow::{Context, Result, bail};
use graft_core::Config;
use graft_git::Repository;
use tracing::debug;

/// Helper to open the repository containing the current directory.
pub fn open_repo() -> Result<Repository> {
    Repository::open_current().context("Not inside a git repository")
}

/// Load config from an explicit path, or from the repository's default
/// location when there is one.
///
/// An explicit path must exist; the default location may be missing.
pub fn load_config(repo: Option<&Repository>, path: Option<&Path>) -> Result<Config> {
    let path = match (path, repo) {
        (Some(path), _) => {
            if !path.exists() {
                bail!("Config file not found: {}", path.display());
            }
            path.to_path_buf()
        }
        (None, Some(repo)) => repo.config_path(),
        (None, None) => return Ok(Config::default()),
    };

    debug!(path = %path.display(), "loading config");
    Config::load(&path).context("Failed to load config")
}
