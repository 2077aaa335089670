use super::errors::ParseError;
use super::hunk::{DiffLine, Hunk};

/// Literal first line of every patch.
pub const BEGIN_PATCH_MARKER: &str = "*** Begin Patch";
/// Literal last line of every patch.
pub const END_PATCH_MARKER: &str = "*** End Patch";
/// Optional sentinel closing an update body.
pub const END_OF_FILE_MARKER: &str = "*** End of File";

const ADD_FILE_PREFIX: &str = "*** Add File: ";
const DELETE_FILE_PREFIX: &str = "*** Delete File: ";
const UPDATE_FILE_PREFIX: &str = "*** Update File: ";
const MOVE_TO_PREFIX: &str = "*** Move to: ";

/// Scan patch text into an ordered sequence of hunks.
///
/// The scanner makes a single forward pass with no backtracking. The only
/// fatal conditions are the missing begin/end markers; lines between
/// recognized headers that match nothing are skipped, and malformed update
/// bodies are deferred to reconciliation rather than rejected here. The
/// tolerance is intentional: patch text is typically authored by a model, and
/// stray prose around the hunks should not block an otherwise valid patch.
pub fn parse_patch(patch: &str) -> Result<Vec<Hunk>, ParseError> {
    let lines: Vec<&str> = patch.lines().collect();

    let first = lines
        .iter()
        .position(|line| !line.trim().is_empty())
        .ok_or(ParseError::MissingBeginMarker)?;
    if lines[first].trim() != BEGIN_PATCH_MARKER {
        return Err(ParseError::MissingBeginMarker);
    }

    let last = lines
        .iter()
        .rposition(|line| !line.trim().is_empty())
        .ok_or(ParseError::MissingEndMarker)?;
    if last == first || lines[last].trim() != END_PATCH_MARKER {
        return Err(ParseError::MissingEndMarker);
    }

    let mut hunks = Vec::new();
    let mut idx = first + 1;
    while idx < last {
        let line = lines[idx];

        if let Some(path) = line.strip_prefix(ADD_FILE_PREFIX) {
            idx += 1;
            let mut contents = Vec::new();
            while idx < last && !lines[idx].starts_with("***") {
                if let Some(added) = lines[idx].strip_prefix('+') {
                    contents.push(added);
                }
                idx += 1;
            }
            hunks.push(Hunk::AddFile {
                path: path.to_string(),
                contents: contents.join("\n"),
            });
            continue;
        }

        if let Some(path) = line.strip_prefix(DELETE_FILE_PREFIX) {
            hunks.push(Hunk::DeleteFile {
                path: path.to_string(),
            });
            idx += 1;
            continue;
        }

        if let Some(path) = line.strip_prefix(UPDATE_FILE_PREFIX) {
            idx += 1;

            let mut move_path = None;
            if idx < last {
                if let Some(target) = lines[idx].strip_prefix(MOVE_TO_PREFIX) {
                    move_path = Some(target.to_string());
                    idx += 1;
                }
            }

            let mut diff = Vec::new();
            while idx < last {
                let body_line = lines[idx];
                if body_line == END_OF_FILE_MARKER {
                    // The sentinel is retained as the last collected line.
                    diff.push(DiffLine::classify(body_line));
                    idx += 1;
                    break;
                }
                if body_line.starts_with("***") {
                    break;
                }
                diff.push(DiffLine::classify(body_line));
                idx += 1;
            }

            hunks.push(Hunk::UpdateFile {
                path: path.to_string(),
                move_path,
                diff,
            });
            continue;
        }

        // Unrecognized line between headers: tolerant scanning, never an error.
        idx += 1;
    }

    Ok(hunks)
}
