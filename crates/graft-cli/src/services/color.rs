//! Color service for explaining how a branch name is colored.

use anyhow::{Context, Result};
use graft_core::{BranchRole, ColorAssigner, Config, Hsl};
use serde::Serialize;

/// How one branch name is colored.
#[derive(Debug, Clone, Serialize)]
pub struct ColorInfo {
    pub name: String,
    /// Name after ref and remote prefixes are stripped.
    pub normalized: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<BranchRole>,
    pub hsl: Hsl,
    pub hex: String,
}

/// Service for looking up branch colors.
pub struct ColorService {
    colors: ColorAssigner,
}

impl ColorService {
    /// Create a color service from config plus extra remote names.
    pub fn new(config: &Config, remotes: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut config = config.clone();
        config.colors.remotes.extend(remotes);
        let colors = config
            .color_assigner()
            .context("Invalid gitflow configuration")?;
        Ok(Self { colors })
    }

    /// Describe the color of a branch name.
    pub fn describe(&mut self, name: &str) -> ColorInfo {
        let normalized = self.colors.normalize(name).to_string();
        let role = self.colors.role_of(name);
        let hsl = self.colors.color_for(name);

        ColorInfo {
            name: name.to_string(),
            normalized,
            role,
            hsl,
            hex: hex(hsl),
        }
    }
}

/// `#rrggbb` form of a color.
pub fn hex(hsl: Hsl) -> String {
    let (r, g, b) = hsl.to_rgb();
    format!("#{r:02x}{g:02x}{b:02x}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use graft_core::color::HEAD_ACCENT;

    fn gitflow_config() -> Config {
        let mut config = Config::default();
        config.gitflow.enabled = true;
        config
    }

    #[test]
    fn test_hashed_color() {
        let mut service = ColorService::new(&Config::default(), []).unwrap();
        let info = service.describe("main");

        assert_eq!(info.normalized, "main");
        assert_eq!(info.role, None);
        assert!((info.hsl.hue - 174.0).abs() < f64::EPSILON);
        assert_eq!(info.hex, hex(info.hsl));
    }

    #[test]
    fn test_remote_prefix_normalized() {
        let mut service = ColorService::new(&Config::default(), ["origin".to_string()]).unwrap();
        let local = service.describe("main");
        let remote = service.describe("origin/main");

        assert_eq!(remote.normalized, "main");
        assert_eq!(remote.hsl, local.hsl);
    }

    #[test]
    fn test_unknown_remote_not_stripped() {
        let mut service = ColorService::new(&Config::default(), []).unwrap();
        let info = service.describe("upstream/main");
        assert_eq!(info.normalized, "upstream/main");
    }

    #[test]
    fn test_gitflow_roles() {
        let mut service = ColorService::new(&gitflow_config(), []).unwrap();

        let develop = service.describe("develop");
        assert_eq!(develop.role, Some(BranchRole::Develop));
        assert_eq!(Some(develop.hsl), BranchRole::Develop.fixed_color());

        let feature = service.describe("feature/x");
        assert_eq!(feature.role, Some(BranchRole::Feature));
        assert!((200.0..=280.0).contains(&feature.hsl.hue));
    }

    #[test]
    fn test_head_accent() {
        let mut service = ColorService::new(&Config::default(), []).unwrap();
        assert_eq!(service.describe("HEAD").hsl, HEAD_ACCENT);
    }

    #[test]
    fn test_hex_format() {
        assert_eq!(hex(Hsl::new(0.0, 1.0, 0.5)), "#ff0000");
        assert_eq!(hex(Hsl::new(0.0, 0.0, 1.0)), "#ffffff");
        assert_eq!(hex(Hsl::new(0.0, 0.0, 0.0)), "#000000");
    }

    #[test]
    fn test_color_info_serializes() {
        let mut service = ColorService::new(&gitflow_config(), []).unwrap();
        let json = serde_json::to_string(&service.describe("hotfix/urgent")).unwrap();
        assert!(json.contains("\"role\":\"hotfix\""));
        assert!(json.contains("\"hex\":\"#"));

        let json = serde_json::to_string(&service.describe("topic")).unwrap();
        assert!(!json.contains("role"));
    }
}
