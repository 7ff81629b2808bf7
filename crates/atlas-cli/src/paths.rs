//! Project-relative path resolution with a directory-traversal guard.
//!
//! Every user-supplied file path (`--data`, `--additions`, `--output`)
//! resolves through here, so a stray `../../` can never read or write
//! outside the project root.

use anyhow::{Context, Result};
use std::path::{Component, Path, PathBuf};

/// Resolve a user-supplied path against the project root, rejecting any
/// path that escapes it. The check is lexical: the target does not have
/// to exist yet (`--output` files usually do not).
pub fn resolve_inside(project_root: &Path, supplied: &Path) -> Result<PathBuf> {
    if supplied.is_absolute() {
        let root = project_root.canonicalize().with_context(|| {
            format!("failed to resolve project root {}", project_root.display())
        })?;
        let normalized = normalize(supplied);
        if !normalized.starts_with(&root) {
            anyhow::bail!("path {} escapes the project root", supplied.display());
        }
        return Ok(normalized);
    }

    let mut depth: i64 = 0;
    for component in supplied.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::ParentDir => {
                depth -= 1;
                if depth < 0 {
                    anyhow::bail!("path {} escapes the project root", supplied.display());
                }
            }
            _ => {}
        }
    }
    Ok(project_root.join(supplied))
}

/// Lexical normalization: fold `.` and `..` without touching the
/// filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                out.pop();
            }
            Component::CurDir => {}
            other => out.push(other),
        }
    }
    out
}
