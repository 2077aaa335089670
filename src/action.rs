//! Compilation of parsed hunks into an addressed action map.
//!
//! The compiler is the one place hunk-relative paths meet the filesystem
//! namespace: every path is resolved against the working directory and
//! checked by the [`WorkspaceGuard`] before anything can mutate.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::parser::{render_unified_diff, Hunk, ParseError};
use crate::safety::WorkspaceGuard;

/// The resolved form of one hunk, keyed by absolute target path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FileChange {
    Add {
        content: String,
    },
    Delete,
    Update {
        /// Marker-prefixed diff text; the executor re-derives diff lines
        /// from it through the unified-diff adapter.
        unified_diff: String,
        /// Resolved absolute destination when the update also moves the file.
        move_path: Option<PathBuf>,
    },
}

/// An addressed patch: resolved absolute paths mapped to the change each
/// receives, plus the working directory the paths were resolved against.
///
/// Exists only for the duration of one apply call; there is no cross-call
/// state to invalidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatchAction {
    root: PathBuf,
    changes: BTreeMap<PathBuf, FileChange>,
}

impl PatchAction {
    /// The working directory every change is confined to.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The resolved changes in deterministic (path) order.
    pub fn changes(&self) -> &BTreeMap<PathBuf, FileChange> {
        &self.changes
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }
}

/// Resolve every hunk path against the working directory and build the
/// action map. Fails on the first path that escapes the boundary, naming it;
/// nothing is mutated here, so a failed compile has no filesystem effect.
pub fn compile_patch(hunks: &[Hunk], cwd: &Path) -> Result<PatchAction, ParseError> {
    let guard = WorkspaceGuard::new(cwd)?;
    let mut changes = BTreeMap::new();

    for hunk in hunks {
        match hunk {
            Hunk::AddFile { path, contents } => {
                changes.insert(
                    guard.resolve(path)?,
                    FileChange::Add {
                        content: contents.clone(),
                    },
                );
            }
            Hunk::DeleteFile { path } => {
                changes.insert(guard.resolve(path)?, FileChange::Delete);
            }
            Hunk::UpdateFile {
                path,
                move_path,
                diff,
            } => {
                let resolved = guard.resolve(path)?;
                // The move target is checked under the same rule as the
                // source, independently.
                let move_path = match move_path {
                    Some(target) => Some(guard.resolve(target)?),
                    None => None,
                };
                changes.insert(
                    resolved,
                    FileChange::Update {
                        unified_diff: render_unified_diff(diff),
                        move_path,
                    },
                );
            }
        }
    }

    Ok(PatchAction {
        root: guard.root().to_path_buf(),
        changes,
    })
}
