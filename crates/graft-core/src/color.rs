//! Stable branch colors.
//!
//! Colors are derived from an explicit djb2-style hash over the UTF-16 code
//! units of the branch name, so a name maps to the same color in every
//! process and on every build. Role rules (GitFlow prefixes) and remote
//! prefix normalization are applied first, as an ordered rule table.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::trace;

/// Pseudo branch name for a detached HEAD.
pub const HEAD_PSEUDO_BRANCH: &str = "HEAD";

/// Accent color used for a detached HEAD.
pub const HEAD_ACCENT: Hsl = Hsl::new(45.0, 0.95, 0.55);

/// Number of neutral fallback colors.
pub const PALETTE_SIZE: usize = 8;

/// Neutral colors for commits no branch claims, picked by lane.
pub const NEUTRAL_PALETTE: [Hsl; PALETTE_SIZE] = [
    Hsl::new(210.0, 0.10, 0.55),
    Hsl::new(30.0, 0.10, 0.50),
    Hsl::new(150.0, 0.10, 0.50),
    Hsl::new(270.0, 0.10, 0.55),
    Hsl::new(0.0, 0.10, 0.50),
    Hsl::new(90.0, 0.10, 0.50),
    Hsl::new(330.0, 0.10, 0.55),
    Hsl::new(180.0, 0.10, 0.50),
];

/// Hue band for feature branches, inclusive.
const FEATURE_HUE_MIN: u32 = 200;
const FEATURE_HUE_MAX: u32 = 280;

/// A color as hue (degrees), saturation and lightness (0..=1).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hsl {
    pub hue: f64,
    pub saturation: f64,
    pub lightness: f64,
}

impl Hsl {
    /// Create a color from its components.
    #[must_use]
    pub const fn new(hue: f64, saturation: f64, lightness: f64) -> Self {
        Self {
            hue,
            saturation,
            lightness,
        }
    }

    /// Convert to 8-bit RGB.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::many_single_char_names
    )]
    pub fn to_rgb(self) -> (u8, u8, u8) {
        let h = self.hue.rem_euclid(360.0) / 60.0;
        let s = self.saturation.clamp(0.0, 1.0);
        let l = self.lightness.clamp(0.0, 1.0);

        let c = (1.0 - 2.0_f64.mul_add(l, -1.0).abs()) * s;
        let x = c * (1.0 - (h.rem_euclid(2.0) - 1.0).abs());
        let m = l - c / 2.0;

        let (r, g, b) = match h {
            h if h < 1.0 => (c, x, 0.0),
            h if h < 2.0 => (x, c, 0.0),
            h if h < 3.0 => (0.0, c, x),
            h if h < 4.0 => (0.0, x, c),
            h if h < 5.0 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };

        let channel = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
        (channel(r), channel(g), channel(b))
    }
}

/// The color a node is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColorToken {
    /// A branch (hashed or role) color.
    Branch { hsl: Hsl },

    /// Neutral fallback slot for commits no branch claims.
    Palette { slot: usize },
}

impl ColorToken {
    /// Neutral fallback color for a lane.
    #[must_use]
    pub const fn for_lane(lane: usize) -> Self {
        Self::Palette {
            slot: lane % PALETTE_SIZE,
        }
    }

    /// Resolve to a concrete color.
    #[must_use]
    pub const fn hsl(self) -> Hsl {
        match self {
            Self::Branch { hsl } => hsl,
            Self::Palette { slot } => NEUTRAL_PALETTE[slot % PALETTE_SIZE],
        }
    }
}

/// Well-known branch roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BranchRole {
    Main,
    Develop,
    Feature,
    Release,
    Hotfix,
    Support,
}

impl BranchRole {
    /// Fixed color for the role, `None` for roles colored by hash.
    #[must_use]
    pub const fn fixed_color(self) -> Option<Hsl> {
        match self {
            Self::Main => Some(Hsl::new(140.0, 0.60, 0.42)),
            Self::Develop => Some(Hsl::new(28.0, 0.85, 0.52)),
            Self::Release => Some(Hsl::new(330.0, 0.65, 0.50)),
            Self::Hotfix => Some(Hsl::new(0.0, 0.75, 0.50)),
            Self::Support => Some(Hsl::new(180.0, 0.50, 0.45)),
            Self::Feature => None,
        }
    }
}

/// How a role rule matches a branch name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleMatcher {
    /// The whole name.
    Exact(String),
    /// A leading prefix, e.g. `feature/`.
    Prefix(String),
}

/// One entry of the ordered role table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleRule {
    pub matcher: RoleMatcher,
    pub role: BranchRole,
}

impl RoleRule {
    /// Rule matching a name exactly.
    #[must_use]
    pub fn exact(name: impl Into<String>, role: BranchRole) -> Self {
        Self {
            matcher: RoleMatcher::Exact(name.into()),
            role,
        }
    }

    /// Rule matching a name prefix.
    #[must_use]
    pub fn prefix(prefix: impl Into<String>, role: BranchRole) -> Self {
        Self {
            matcher: RoleMatcher::Prefix(prefix.into()),
            role,
        }
    }

    /// If the rule matches, the part of the name left after the match.
    #[must_use]
    pub fn matches<'a>(&self, name: &'a str) -> Option<&'a str> {
        match &self.matcher {
            RoleMatcher::Exact(exact) => (name == exact).then_some(""),
            RoleMatcher::Prefix(prefix) => name.strip_prefix(prefix.as_str()),
        }
    }
}

/// Stable 32-bit hash of a name: `hash = (hash * 33) ^ unit` over UTF-16
/// code units, seeded with 5381.
#[must_use]
pub fn stable_hash(name: &str) -> u32 {
    name.encode_utf16().fold(5381_u32, |hash, unit| {
        (hash << 5).wrapping_add(hash) ^ u32::from(unit)
    })
}

/// Color for a hash over the full hue circle.
#[must_use]
pub fn hashed_color(hash: u32) -> Hsl {
    Hsl::new(
        f64::from(hash % 360),
        saturation_for(hash),
        lightness_for(hash),
    )
}

/// Color for a hash constrained to the feature hue band.
#[must_use]
pub fn feature_color(hash: u32) -> Hsl {
    let band = FEATURE_HUE_MAX - FEATURE_HUE_MIN + 1;
    Hsl::new(
        f64::from(FEATURE_HUE_MIN + hash % band),
        saturation_for(hash),
        lightness_for(hash),
    )
}

fn saturation_for(hash: u32) -> f64 {
    0.55 + f64::from((hash >> 8) % 20) / 100.0
}

fn lightness_for(hash: u32) -> f64 {
    0.45 + f64::from((hash >> 16) % 10) / 100.0
}

/// Maps branch names to colors, caching per normalized name.
#[derive(Debug, Clone, Default)]
pub struct ColorAssigner {
    remotes: Vec<String>,
    rules: Vec<RoleRule>,
    cache: HashMap<String, Hsl>,
}

impl ColorAssigner {
    /// Hash-only assigner: no remote normalization, no roles.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: strip these remote prefixes before coloring.
    #[must_use]
    pub fn with_remotes<I, S>(mut self, remotes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_remotes(remotes);
        self
    }

    /// Builder: apply this role table.
    #[must_use]
    pub fn with_rules(mut self, rules: Vec<RoleRule>) -> Self {
        self.set_rules(rules);
        self
    }

    /// Replace the known remotes. Clears the cache.
    pub fn set_remotes<I, S>(&mut self, remotes: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.remotes = remotes.into_iter().map(Into::into).collect();
        self.remotes.sort();
        self.remotes.dedup();
        self.clear_cache();
    }

    /// Replace the role table. Clears the cache.
    pub fn set_rules(&mut self, rules: Vec<RoleRule>) {
        self.rules = rules;
        self.clear_cache();
    }

    /// Known remotes.
    #[must_use]
    pub fn remotes(&self) -> &[String] {
        &self.remotes
    }

    /// Forget every cached color.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Number of cached names.
    #[must_use]
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// Strip ref namespaces and a known remote prefix from a branch name.
    #[must_use]
    pub fn normalize<'a>(&self, name: &'a str) -> &'a str {
        let name = name
            .strip_prefix("refs/heads/")
            .or_else(|| name.strip_prefix("refs/remotes/"))
            .unwrap_or(name);

        self.remotes
            .iter()
            .find_map(|remote| {
                name.strip_prefix(remote.as_str())
                    .and_then(|rest| rest.strip_prefix('/'))
                    .filter(|rest| !rest.is_empty())
            })
            .unwrap_or(name)
    }

    /// Role of a (normalized) name under the configured rules.
    #[must_use]
    pub fn role_of(&self, name: &str) -> Option<BranchRole> {
        let name = self.normalize(name);
        self.rules
            .iter()
            .find(|rule| rule.matches(name).is_some())
            .map(|rule| rule.role)
    }

    /// Color for a branch name.
    pub fn color_for(&mut self, name: &str) -> Hsl {
        let normalized = self.normalize(name);
        if let Some(color) = self.cache.get(normalized) {
            return *color;
        }

        let color = self.compute(normalized);
        trace!(name, normalized, hue = color.hue, "assigned branch color");
        self.cache.insert(normalized.to_string(), color);
        color
    }

    fn compute(&self, name: &str) -> Hsl {
        if name == HEAD_PSEUDO_BRANCH {
            return HEAD_ACCENT;
        }

        for rule in &self.rules {
            let Some(rest) = rule.matches(name) else {
                continue;
            };
            return match rule.role.fixed_color() {
                Some(color) => color,
                None if rest.is_empty() => feature_color(stable_hash(name)),
                None => feature_color(stable_hash(rest)),
            };
        }

        hashed_color(stable_hash(name))
    }
}
