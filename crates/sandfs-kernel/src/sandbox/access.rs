//! Allow/deny filtering of canonical paths.

use globset::{GlobBuilder, GlobMatcher};
use std::path::Path;

use crate::vfs::{VfsError, VfsResult};

/// One allow or deny entry.
///
/// A path matches if the glob matches the whole path or if the path starts
/// with the pattern text. `*` does not cross `/`.
#[derive(Debug, Clone)]
struct PathPattern {
    raw: String,
    glob: Option<GlobMatcher>,
}

impl PathPattern {
    fn new(raw: &str) -> Self {
        let glob = match GlobBuilder::new(raw).literal_separator(true).build() {
            Ok(glob) => Some(glob.compile_matcher()),
            Err(e) => {
                tracing::warn!(pattern = raw, error = %e, "unusable glob, matching by prefix only");
                None
            }
        };
        Self {
            raw: raw.to_string(),
            glob,
        }
    }

    fn matches(&self, path: &Path) -> bool {
        self.glob.as_ref().is_some_and(|g| g.is_match(path))
            || path.to_string_lossy().starts_with(self.raw.as_str())
    }
}

/// Allow and deny lists applied to a canonical path.
#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
    allowed: Vec<PathPattern>,
    denied: Vec<PathPattern>,
}

impl AccessPolicy {
    pub fn new<A, D>(allowed: A, denied: D) -> Self
    where
        A: IntoIterator,
        A::Item: AsRef<str>,
        D: IntoIterator,
        D::Item: AsRef<str>,
    {
        Self {
            allowed: allowed.into_iter().map(|p| PathPattern::new(p.as_ref())).collect(),
            denied: denied.into_iter().map(|p| PathPattern::new(p.as_ref())).collect(),
        }
    }

    /// A policy that permits everything.
    pub fn permissive() -> Self {
        Self::default()
    }

    /// Check `canonical` against both lists. Deny is always evaluated and
    /// wins over allow.
    pub fn check(&self, canonical: &Path) -> VfsResult<()> {
        if !self.allowed.is_empty() && !self.allowed.iter().any(|p| p.matches(canonical)) {
            tracing::debug!(path = %canonical.display(), "not in allowed list");
            return Err(VfsError::access_denied("path not in allowed list"));
        }
        if let Some(p) = self.denied.iter().find(|p| p.matches(canonical)) {
            tracing::debug!(path = %canonical.display(), pattern = %p.raw, "in denied list");
            return Err(VfsError::access_denied("path is in denied list"));
        }
        Ok(())
    }
}
