//! Symlink policy.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::EnumString;

/// How the canonicalizer treats symlinks below a root.
///
/// `Allow` and `InternalOnly` both follow links and then enforce
/// containment, so a link that stays inside the root resolves and one that
/// points out is rejected. `Deny` rejects any link below the root, even one
/// that stays inside.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", try_from = "String")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum SymlinkMode {
    #[default]
    Allow,
    Deny,
    InternalOnly,
}

impl SymlinkMode {
    /// Parse from string (case-insensitive).
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        <Self as FromStr>::from_str(s).ok()
    }

    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            SymlinkMode::Allow => "ALLOW",
            SymlinkMode::Deny => "DENY",
            SymlinkMode::InternalOnly => "INTERNAL_ONLY",
        }
    }

    /// True when any symlink on the resolution path is an error.
    pub fn denies_links(&self) -> bool {
        matches!(self, SymlinkMode::Deny)
    }
}

impl TryFrom<String> for SymlinkMode {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        <Self as FromStr>::from_str(&s).map_err(|_| {
            format!("unknown symlink mode {s:?} (expected ALLOW, DENY or INTERNAL_ONLY)")
        })
    }
}

impl std::fmt::Display for SymlinkMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
