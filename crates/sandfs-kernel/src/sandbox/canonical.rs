//! Symlink-safe canonicalization.
//!
//! Turns `(real_root, relative)` into a canonical absolute path that is
//! guaranteed to sit inside the canonical root. The target does not have to
//! exist: for a missing leaf the nearest existing ancestor is canonicalized
//! and the missing tail is re-appended.

use std::io;
use std::path::{Component, Path, PathBuf};

use super::SymlinkMode;
use crate::vfs::{VfsError, VfsResult};

/// Lexically normalize a path: drop `.`, apply `..`, collapse separators.
///
/// `..` at the filesystem root stays at the root. No filesystem access.
pub fn clean_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(p) => out.push(p.as_os_str()),
            Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            Component::Normal(s) => out.push(s),
        }
    }
    out
}

/// Canonical form of a configured real root.
pub fn canonical_root(real_root: &Path) -> VfsResult<PathBuf> {
    let fail = |source: io::Error| VfsError::RootResolutionFailed {
        path: real_root.display().to_string(),
        source,
    };
    let absolute = std::path::absolute(real_root).map_err(fail)?;
    dunce::canonicalize(&absolute).map_err(fail)
}

/// Resolve `relative` below `real_root` under `mode`.
pub fn canonicalize_within(
    real_root: &Path,
    relative: &str,
    mode: SymlinkMode,
) -> VfsResult<PathBuf> {
    let root = canonical_root(real_root)?;
    let target = clean_path(&root.join(relative.trim_start_matches('/')));

    if mode.denies_links() {
        reject_symlinks(&root, &target)?;
    }

    let resolved = match dunce::canonicalize(&target) {
        Ok(path) => path,
        Err(e) if e.kind() == io::ErrorKind::NotFound => resolve_missing(&target, mode)?,
        Err(e) => return Err(VfsError::Io(e)),
    };

    ensure_contained(&root, &resolved)?;
    tracing::debug!(
        relative,
        resolved = %resolved.display(),
        mode = %mode,
        "canonicalized path"
    );
    Ok(resolved)
}

/// `resolved` must equal `root` or lie beneath it.
pub fn ensure_contained(root: &Path, resolved: &Path) -> VfsResult<()> {
    // Path::starts_with compares whole components, so /ab is not under /a.
    if resolved.starts_with(root) {
        Ok(())
    } else {
        tracing::debug!(
            root = %root.display(),
            resolved = %resolved.display(),
            "path escapes root"
        );
        Err(VfsError::PathTraversal)
    }
}

/// Under DENY, fail if any existing component below `root` is a symlink.
fn reject_symlinks(root: &Path, target: &Path) -> VfsResult<()> {
    let Ok(below) = target.strip_prefix(root) else {
        // Lexically outside the root; containment reports it.
        return Ok(());
    };

    let mut current = root.to_path_buf();
    for component in below.components() {
        current.push(component);
        match std::fs::symlink_metadata(&current) {
            Ok(meta) if meta.file_type().is_symlink() => {
                return Err(VfsError::symlinks_disabled(current.display().to_string()));
            }
            Ok(_) => {}
            Err(e) if is_missing(&e) => break,
            Err(e) => return Err(VfsError::Io(e)),
        }
    }
    Ok(())
}

/// Canonicalize a path whose leaf (or some ancestors) do not exist yet.
fn resolve_missing(target: &Path, mode: SymlinkMode) -> VfsResult<PathBuf> {
    // Walk up to the nearest ancestor that exists, following symlinks.
    let mut ancestor = target.to_path_buf();
    let mut missing: Vec<std::ffi::OsString> = Vec::new();
    loop {
        match std::fs::metadata(&ancestor) {
            Ok(_) => break,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(VfsError::Io(e)),
        }
        let Some(name) = ancestor.file_name() else {
            return Err(VfsError::not_found(target.display().to_string()));
        };
        missing.push(name.to_os_string());
        if !ancestor.pop() {
            return Err(VfsError::not_found(target.display().to_string()));
        }
    }
    missing.reverse();

    let mut current = dunce::canonicalize(&ancestor)?;
    let mut rest = missing.into_iter();
    while let Some(name) = rest.next() {
        let next = current.join(&name);
        match std::fs::symlink_metadata(&next) {
            Ok(meta) if meta.file_type().is_symlink() => {
                if mode.denies_links() {
                    return Err(VfsError::symlinks_disabled(next.display().to_string()));
                }
                match dunce::canonicalize(&next) {
                    Ok(resolved) => current = resolved,
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {
                        return Err(VfsError::broken_symlink(next.display().to_string()));
                    }
                    Err(e) => return Err(VfsError::Io(e)),
                }
            }
            Ok(_) => current = next,
            Err(e) if is_missing(&e) => {
                current = next;
                current.extend(rest.by_ref());
                break;
            }
            Err(e) => return Err(VfsError::Io(e)),
        }
    }
    Ok(current)
}

fn is_missing(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
    )
}
