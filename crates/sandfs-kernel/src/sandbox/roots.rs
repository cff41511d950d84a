//! Virtual root map with longest-prefix matching.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::vfs::{VfsError, VfsResult};

/// Result of matching a request path against the root map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootMatch<'a> {
    /// The normalized virtual root that matched (e.g. `/data`).
    pub virtual_root: &'a str,
    /// The configured real directory, as written in the config.
    pub real_root: &'a Path,
    /// Remainder of the request below the virtual root, without a leading `/`.
    pub relative: String,
}

/// Mapping of virtual roots to real directories.
///
/// Roots are matched by longest prefix. With `/data` and `/data/logs` both
/// configured, `/data/logs/app.log` routes to `/data/logs`. A root keyed `/`
/// catches everything no other root claims.
#[derive(Debug, Clone, Default)]
pub struct RootMap {
    roots: BTreeMap<String, PathBuf>,
}

impl RootMap {
    /// Create an empty root map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a root. Re-adding the same virtual root replaces its target.
    pub fn insert(&mut self, virtual_root: &str, real_root: impl Into<PathBuf>) {
        self.roots
            .insert(normalize_root(virtual_root), real_root.into());
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    /// Normalized virtual roots, sorted.
    pub fn virtual_roots(&self) -> Vec<String> {
        self.roots.keys().cloned().collect()
    }

    /// Find the most specific root for `path`.
    pub fn find_root(&self, path: &str) -> VfsResult<RootMatch<'_>> {
        if self.roots.is_empty() {
            return Err(VfsError::NoRootsDefined);
        }

        let normalized = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };

        let best = self
            .roots
            .iter()
            .filter(|(root, _)| root_matches(root, &normalized))
            .max_by_key(|(root, _)| root.len())
            .or_else(|| self.roots.get_key_value("/"));

        let Some((root, real)) = best else {
            return Err(VfsError::not_allowed(path));
        };

        let relative = normalized
            .strip_prefix(root.as_str())
            .unwrap_or(&normalized)
            .trim_start_matches('/')
            .to_string();

        tracing::debug!(path, root = %root, relative = %relative, "matched virtual root");
        Ok(RootMatch {
            virtual_root: root,
            real_root: real,
            relative,
        })
    }
}

impl<K: AsRef<str>, V: Into<PathBuf>> FromIterator<(K, V)> for RootMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = RootMap::new();
        for (k, v) in iter {
            map.insert(k.as_ref(), v);
        }
        map
    }
}

/// Ensure a leading `/` and no trailing `/` (except for `/` itself).
pub(crate) fn normalize_root(root: &str) -> String {
    let trimmed = root.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

fn root_matches(root: &str, path: &str) -> bool {
    root == "/"
        || path == root
        || path
            .strip_prefix(root)
            .is_some_and(|rest| rest.starts_with('/'))
}
