//! The executor: filesystem mutation for parsed patches and compiled actions.
//!
//! Two entry forms exist. The text form parses raw patch text and mutates
//! hunk by hunk, resolving each path as it goes; the action form executes a
//! precompiled [`PatchAction`]. Both are fully synchronous and share one
//! mutation core. There is no cross-hunk transaction: a mid-call failure
//! leaves earlier hunks' effects in place.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::action::{FileChange, PatchAction};
use crate::parser::{parse_patch, DiffLine, Hunk, ParseError};
use crate::reconcile::reconcile;
use crate::report::{print_summary, AffectedPaths};
use crate::safety::{SafetyError, WorkspaceGuard};

#[derive(Error, Debug)]
pub enum ApplyError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write summary: {0}")]
    Summary(#[source] io::Error),
}

impl From<SafetyError> for ApplyError {
    fn from(error: SafetyError) -> Self {
        ApplyError::Parse(ParseError::Boundary(error))
    }
}

/// Parse raw patch text and apply it inside `cwd`, writing the rendered
/// summary to `writer` on success.
///
/// Grammar failures abort before any mutation. A boundary violation aborts
/// the offending hunk before it mutates, but earlier hunks in the same call
/// stay applied; I/O errors likewise halt the remaining hunks.
pub fn apply_patch(
    patch: &str,
    cwd: &Path,
    writer: &mut impl Write,
) -> Result<AffectedPaths, ApplyError> {
    let hunks = parse_patch(patch)?;
    let guard = WorkspaceGuard::new(cwd)?;

    let mut affected = AffectedPaths::default();
    for hunk in &hunks {
        match hunk {
            Hunk::AddFile { path, contents } => {
                let abs = guard.resolve(path)?;
                write_file(&abs, contents)?;
                affected.added.push(guard.relative(&abs).to_path_buf());
            }
            Hunk::DeleteFile { path } => {
                let abs = guard.resolve(path)?;
                if delete_file(&abs)? {
                    affected.deleted.push(guard.relative(&abs).to_path_buf());
                }
            }
            Hunk::UpdateFile {
                path,
                move_path,
                diff,
            } => {
                let abs = guard.resolve(path)?;
                let move_abs = match move_path {
                    Some(target) => Some(guard.resolve(target)?),
                    None => None,
                };
                let final_path = update_file(&abs, move_abs.as_deref(), diff)?;
                if move_abs.is_some() {
                    affected.deleted.push(guard.relative(&abs).to_path_buf());
                }
                affected
                    .modified
                    .push(guard.relative(&final_path).to_path_buf());
            }
        }
    }

    print_summary(&affected, writer).map_err(ApplyError::Summary)?;
    Ok(affected)
}

/// Execute a precompiled action. Paths were already resolved and
/// boundary-checked at compile time; changes run in the map's deterministic
/// path order.
pub fn apply_action(action: &PatchAction) -> Result<AffectedPaths, ApplyError> {
    let root = action.root();
    let rel = |path: &Path| path.strip_prefix(root).unwrap_or(path).to_path_buf();

    let mut affected = AffectedPaths::default();
    for (abs, change) in action.changes() {
        match change {
            FileChange::Add { content } => {
                write_file(abs, content)?;
                affected.added.push(rel(abs));
            }
            FileChange::Delete => {
                if delete_file(abs)? {
                    affected.deleted.push(rel(abs));
                }
            }
            FileChange::Update {
                unified_diff,
                move_path,
            } => {
                let diff = DiffLine::from_unified_diff(unified_diff);
                let final_path = update_file(abs, move_path.as_deref(), &diff)?;
                if move_path.is_some() {
                    affected.deleted.push(rel(abs));
                }
                affected.modified.push(rel(&final_path));
            }
        }
    }

    Ok(affected)
}

/// Execute an action and report to the given sinks instead of propagating:
/// the summary goes to `out` on success, the failure's message to `err`
/// otherwise. This is the single boundary that catches everything, so
/// interactive callers see a readable failure rather than a crash.
pub fn apply_action_and_report(
    action: &PatchAction,
    out: &mut impl Write,
    err: &mut impl Write,
) -> Option<AffectedPaths> {
    match apply_action(action) {
        Ok(affected) => {
            let _ = print_summary(&affected, out);
            Some(affected)
        }
        Err(error) => {
            let _ = writeln!(err, "{}", error);
            None
        }
    }
}

/// Write full file content, creating parent directories and overwriting any
/// existing file.
fn write_file(abs: &Path, content: &str) -> Result<(), ApplyError> {
    if let Some(parent) = abs.parent() {
        fs::create_dir_all(parent).map_err(|source| ApplyError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    atomic_write(abs, content.as_bytes()).map_err(|source| ApplyError::Io {
        path: abs.to_path_buf(),
        source,
    })
}

/// Remove a file if present. A nonexistent target is a silent no-op; returns
/// whether anything was removed.
fn delete_file(abs: &Path) -> Result<bool, ApplyError> {
    if !abs.exists() {
        return Ok(false);
    }
    fs::remove_file(abs).map_err(|source| ApplyError::Io {
        path: abs.to_path_buf(),
        source,
    })?;
    Ok(true)
}

/// Reconcile the diff against the target's current lines and write the result
/// to the final path, moving the file first when a move target is set.
/// Returns the path the content ended up at.
fn update_file(
    abs: &Path,
    move_abs: Option<&Path>,
    diff: &[DiffLine],
) -> Result<PathBuf, ApplyError> {
    let (current, had_trailing_newline) = read_lines(abs)?;
    let reconciled = reconcile(&current, diff);

    let dest = move_abs.unwrap_or(abs);
    if let Some(target) = move_abs {
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|source| ApplyError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        if abs.exists() {
            fs::rename(abs, target).map_err(|source| ApplyError::Io {
                path: abs.to_path_buf(),
                source,
            })?;
        }
    }

    let mut content = reconciled.join("\n");
    if had_trailing_newline && !content.is_empty() {
        content.push('\n');
    }
    atomic_write(dest, content.as_bytes()).map_err(|source| ApplyError::Io {
        path: dest.to_path_buf(),
        source,
    })?;

    Ok(dest.to_path_buf())
}

/// Read a file's lines, with an absent file treated as empty. Also reports
/// whether the content ended with a newline so the rewrite can preserve it.
fn read_lines(abs: &Path) -> Result<(Vec<String>, bool), ApplyError> {
    if !abs.exists() {
        return Ok((Vec::new(), false));
    }
    let content = fs::read_to_string(abs).map_err(|source| ApplyError::Io {
        path: abs.to_path_buf(),
        source,
    })?;
    let had_trailing_newline = content.ends_with('\n');
    Ok((
        content.lines().map(str::to_string).collect(),
        had_trailing_newline,
    ))
}

/// Atomic file write: tempfile in the same directory + fsync + rename, then
/// an mtime bump so incremental build tools notice the rewrite.
fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let parent = path.parent().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "path has no parent directory")
    })?;

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;

    filetime::set_file_mtime(path, filetime::FileTime::now())?;
    Ok(())
}
