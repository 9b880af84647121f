//! Configuration management for Graft.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::color::{BranchRole, ColorAssigner, RoleRule};
use crate::error::{Error, Result};

/// Graft configuration, usually loaded from `<git dir>/graft.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Branch color settings.
    #[serde(default)]
    pub colors: ColorConfig,

    /// GitFlow role table.
    #[serde(default)]
    pub gitflow: GitFlowConfig,

    /// Layout settings.
    #[serde(default)]
    pub layout: LayoutConfig,
}

impl Config {
    /// Load config from a TOML file.
    ///
    /// A missing file yields the defaults.
    ///
    /// # Errors
    /// Returns error if file can't be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content).map_err(|e| Error::ConfigParse {
            file: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(config)
    }

    /// Save config to a TOML file.
    ///
    /// # Errors
    /// Returns error if serialization or write fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Build a color assigner from the color and GitFlow sections.
    ///
    /// # Errors
    /// Returns error if a GitFlow prefix is empty.
    pub fn color_assigner(&self) -> Result<ColorAssigner> {
        Ok(ColorAssigner::new()
            .with_remotes(self.colors.remotes.iter().cloned())
            .with_rules(self.gitflow.rules()?))
    }
}

/// Branch color settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColorConfig {
    /// Remote names whose prefix (`origin/`) is stripped before coloring.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remotes: Vec<String>,
}

/// GitFlow branch naming.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitFlowConfig {
    /// Whether role colors apply at all.
    #[serde(default)]
    pub enabled: bool,

    /// Names of the production branch.
    #[serde(default = "default_main")]
    pub main: Vec<String>,

    /// Names of the integration branch.
    #[serde(default = "default_develop")]
    pub develop: Vec<String>,

    #[serde(default = "default_feature")]
    pub feature: String,

    #[serde(default = "default_release")]
    pub release: String,

    #[serde(default = "default_hotfix")]
    pub hotfix: String,

    #[serde(default = "default_support")]
    pub support: String,
}

impl GitFlowConfig {
    /// The ordered role table, empty when GitFlow is disabled.
    ///
    /// Exact names come before prefixes so `main` never falls through to a
    /// prefix rule.
    ///
    /// # Errors
    /// Returns error if a prefix is empty, since it would match everything.
    pub fn rules(&self) -> Result<Vec<RoleRule>> {
        if !self.enabled {
            return Ok(Vec::new());
        }

        let mut rules: Vec<RoleRule> = self
            .main
            .iter()
            .map(|name| RoleRule::exact(name.clone(), BranchRole::Main))
            .chain(
                self.develop
                    .iter()
                    .map(|name| RoleRule::exact(name.clone(), BranchRole::Develop)),
            )
            .collect();

        for (role, prefix) in [
            (BranchRole::Feature, &self.feature),
            (BranchRole::Release, &self.release),
            (BranchRole::Hotfix, &self.hotfix),
            (BranchRole::Support, &self.support),
        ] {
            if prefix.is_empty() {
                return Err(Error::EmptyRolePrefix {
                    role: format!("{role:?}").to_lowercase(),
                });
            }
            rules.push(RoleRule::prefix(prefix.clone(), role));
        }

        Ok(rules)
    }
}

impl Default for GitFlowConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            main: default_main(),
            develop: default_develop(),
            feature: default_feature(),
            release: default_release(),
            hotfix: default_hotfix(),
            support: default_support(),
        }
    }
}

fn default_main() -> Vec<String> {
    vec!["main".into(), "master".into()]
}

fn default_develop() -> Vec<String> {
    vec!["develop".into(), "development".into()]
}

fn default_feature() -> String {
    "feature/".into()
}

fn default_release() -> String {
    "release/".into()
}

fn default_hotfix() -> String {
    "hotfix/".into()
}

fn default_support() -> String {
    "support/".into()
}

/// Layout settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Commits read per page when laying out incrementally.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

const fn default_page_size() -> usize {
    500
}
