//! Line-oriented diff reconciliation.
//!
//! A single forward cursor walks the target's current lines while the diff
//! lines are processed in order. Mismatched deletions and context never fail
//! the hunk: patch bodies are authored by a model against a remembered
//! snapshot of the file, and minor context drift must not abort the whole
//! edit. The lenience is a documented contract with dedicated tests, not an
//! accident.

use crate::parser::DiffLine;

/// Apply one diff-line sequence against a file's current lines.
///
/// - `Insertion` appends to the output; the cursor does not move.
/// - `Deletion` consumes the cursor line only when it matches exactly;
///   a stale deletion is ignored with no cursor movement.
/// - `Context` copies the cursor line and advances when it matches exactly;
///   on a mismatch the cursor still advances and the drifted original line
///   is dropped, so the pass always makes forward progress.
/// - Every remaining original line past the cursor is appended verbatim.
pub fn reconcile(current: &[String], diff: &[DiffLine]) -> Vec<String> {
    let mut out = Vec::with_capacity(current.len() + diff.len());
    let mut cursor = 0usize;

    for line in diff {
        match line {
            DiffLine::Insertion(text) => out.push(text.clone()),
            DiffLine::Deletion(text) => {
                if current.get(cursor).is_some_and(|l| l == text) {
                    cursor += 1;
                }
            }
            DiffLine::Context(text) => match current.get(cursor) {
                Some(l) if l == text => {
                    out.push(current[cursor].clone());
                    cursor += 1;
                }
                Some(_) => cursor += 1,
                None => {}
            },
        }
    }

    // Tail preservation: anything the diff never reached survives untouched.
    out.extend(current[cursor..].iter().cloned());
    out
}
