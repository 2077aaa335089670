//! Working-directory boundary enforcement.
//!
//! Every path a patch names must resolve to a location inside the configured
//! working directory. Targets are checked lexically (join + component
//! normalization + prefix check) because they frequently do not exist yet:
//! an `Add File` hunk names a file the executor is about to create, so
//! filesystem canonicalization is not an option. Only the root itself, which
//! must exist, is canonicalized.

use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SafetyError {
    #[error("path escapes the working directory: {path} (working directory: {root})")]
    OutsideRoot { path: PathBuf, root: PathBuf },

    #[error("hunk path is empty")]
    EmptyPath,

    #[error("failed to resolve working directory {root}: {source}")]
    Root {
        root: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Resolves hunk-relative paths against a working directory and rejects any
/// resolution that leaves its subtree.
#[derive(Debug, Clone)]
pub struct WorkspaceGuard {
    /// Canonical absolute path to the working directory.
    root: PathBuf,
}

impl WorkspaceGuard {
    /// Create a guard for the given working directory.
    ///
    /// The root is canonicalized once so symlinked working directories
    /// compare consistently in later prefix checks.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, SafetyError> {
        let root = root.as_ref();
        let root = root.canonicalize().map_err(|source| SafetyError::Root {
            root: root.to_path_buf(),
            source,
        })?;
        Ok(Self { root })
    }

    /// Resolve a hunk path to an absolute path inside the working directory.
    ///
    /// Relative paths join the root; absolute paths are taken as-is. Either
    /// way the result is normalized lexically and must stay under the root.
    pub fn resolve(&self, raw: &str) -> Result<PathBuf, SafetyError> {
        if raw.is_empty() {
            return Err(SafetyError::EmptyPath);
        }

        let candidate = Path::new(raw);
        let joined = if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.root.join(candidate)
        };

        let normalized = normalize(&joined);
        if !normalized.starts_with(&self.root) {
            return Err(SafetyError::OutsideRoot {
                path: normalized,
                root: self.root.clone(),
            });
        }

        Ok(normalized)
    }

    /// Make a previously resolved path relative to the root again, for
    /// reporting. Paths that are not under the root are returned unchanged.
    pub fn relative<'a>(&self, path: &'a Path) -> &'a Path {
        path.strip_prefix(&self.root).unwrap_or(path)
    }

    /// The canonical working directory.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Fold `.` and `..` components without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // Popping past the filesystem root leaves the prefix check
                // to reject the result.
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}
