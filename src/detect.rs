//! Invocation detection: recognizing an `apply_patch` call in an argument
//! vector and recovering the raw patch text.
//!
//! Detection never returns `Err`. Malformed input is a classified variant so
//! the command-dispatch layer can fall through to ordinary execution without
//! catching anything.

use std::path::Path;

use thiserror::Error;

use crate::action::{compile_patch, PatchAction};
use crate::parser::{parse_patch, ParseError};

/// Failure while recovering a patch body from a shell heredoc.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HeredocError {
    #[error("apply_patch shell call has no heredoc ('<<' not found)")]
    MissingHeredocStart,

    #[error("heredoc delimiter is not terminated by a newline")]
    UnterminatedDelimiter,

    #[error("heredoc body has no closing '{delimiter}' line")]
    MissingClosingDelimiter { delimiter: String },
}

/// Result of scanning an argument vector for an apply_patch invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MaybeApplyPatch {
    /// The recovered raw patch text.
    Body(String),
    /// It looked like an apply_patch shell call, but the heredoc was broken.
    ShellParseError(HeredocError),
    /// Not an apply_patch invocation at all.
    NotApplyPatch,
}

/// Result of [`maybe_parse_apply_patch_verified`]: detection plus parsing and
/// path resolution in one step.
#[derive(Debug)]
pub enum MaybeApplyPatchVerified {
    /// The fully compiled action, ready to execute.
    Body(PatchAction),
    ShellParseError(HeredocError),
    /// Detection succeeded but the patch text itself is invalid.
    CorrectnessError(ParseError),
    NotApplyPatch,
}

/// Scan an argument vector for one of the two recognized shapes:
/// `["apply_patch", <text>]`, or `["bash", "-lc", <script>]` where the
/// trimmed script starts with `apply_patch` and wraps the body in a heredoc.
pub fn maybe_parse_apply_patch(argv: &[String]) -> MaybeApplyPatch {
    match argv {
        [cmd, body] if cmd == "apply_patch" => MaybeApplyPatch::Body(body.clone()),
        [shell, flag, script]
            if shell == "bash"
                && flag == "-lc"
                && script.trim_start().starts_with("apply_patch") =>
        {
            match extract_heredoc_body(script) {
                Ok(body) => MaybeApplyPatch::Body(body),
                Err(e) => MaybeApplyPatch::ShellParseError(e),
            }
        }
        _ => MaybeApplyPatch::NotApplyPatch,
    }
}

/// Stricter detection: additionally parse the recovered text and resolve it
/// into a [`PatchAction`] against `cwd`, so the caller holds an
/// already-boundary-checked action when detection succeeds.
pub fn maybe_parse_apply_patch_verified(argv: &[String], cwd: &Path) -> MaybeApplyPatchVerified {
    match maybe_parse_apply_patch(argv) {
        MaybeApplyPatch::Body(text) => {
            match parse_patch(&text).and_then(|hunks| compile_patch(&hunks, cwd)) {
                Ok(action) => MaybeApplyPatchVerified::Body(action),
                Err(e) => MaybeApplyPatchVerified::CorrectnessError(e),
            }
        }
        MaybeApplyPatch::ShellParseError(e) => MaybeApplyPatchVerified::ShellParseError(e),
        MaybeApplyPatch::NotApplyPatch => MaybeApplyPatchVerified::NotApplyPatch,
    }
}

/// Recover the body of the first heredoc in a shell script.
///
/// Locates the first `<<`, reads the delimiter word up to the next newline
/// (surrounding spaces and quotes trimmed), then takes every line strictly
/// between the delimiter line and its closing twin.
fn extract_heredoc_body(script: &str) -> Result<String, HeredocError> {
    let start = script
        .find("<<")
        .ok_or(HeredocError::MissingHeredocStart)?;
    let after = &script[start + 2..];

    let newline = after
        .find('\n')
        .ok_or(HeredocError::UnterminatedDelimiter)?;
    let delimiter = after[..newline]
        .trim()
        .trim_matches(|c| c == '\'' || c == '"');
    if delimiter.is_empty() {
        return Err(HeredocError::UnterminatedDelimiter);
    }

    let mut body_lines = Vec::new();
    for line in after[newline + 1..].lines() {
        if line == delimiter {
            return Ok(body_lines.join("\n"));
        }
        body_lines.push(line);
    }

    Err(HeredocError::MissingClosingDelimiter {
        delimiter: delimiter.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|p| p.to_string()).collect()
    }

    const PATCH: &str = "*** Begin Patch\n*** Delete File: x\n*** End Patch";

    #[test]
    fn test_direct_invocation() {
        let result = maybe_parse_apply_patch(&argv(&["apply_patch", PATCH]));
        assert_eq!(result, MaybeApplyPatch::Body(PATCH.to_string()));
    }

    #[test]
    fn test_heredoc_invocation_recovers_exact_body() {
        let script = "apply_patch <<EOF\n*** Begin Patch\n*** Delete File: x\n*** End Patch\nEOF";
        let result = maybe_parse_apply_patch(&argv(&["bash", "-lc", script]));
        assert_eq!(result, MaybeApplyPatch::Body(PATCH.to_string()));
    }

    #[test]
    fn test_heredoc_quoted_delimiter() {
        let script = "apply_patch <<'EOF'\n*** Begin Patch\n*** Delete File: x\n*** End Patch\nEOF";
        let result = maybe_parse_apply_patch(&argv(&["bash", "-lc", script]));
        assert_eq!(result, MaybeApplyPatch::Body(PATCH.to_string()));
    }

    #[test]
    fn test_heredoc_spaced_delimiter() {
        let script = "apply_patch << EOF\n+x\nEOF";
        let result = maybe_parse_apply_patch(&argv(&["bash", "-lc", script]));
        assert_eq!(result, MaybeApplyPatch::Body("+x".to_string()));
    }

    #[test]
    fn test_missing_heredoc_start() {
        let script = "apply_patch '*** Begin Patch'";
        let result = maybe_parse_apply_patch(&argv(&["bash", "-lc", script]));
        assert_eq!(
            result,
            MaybeApplyPatch::ShellParseError(HeredocError::MissingHeredocStart)
        );
    }

    #[test]
    fn test_missing_newline_after_delimiter() {
        let script = "apply_patch <<EOF";
        let result = maybe_parse_apply_patch(&argv(&["bash", "-lc", script]));
        assert_eq!(
            result,
            MaybeApplyPatch::ShellParseError(HeredocError::UnterminatedDelimiter)
        );
    }

    #[test]
    fn test_missing_closing_delimiter() {
        let script = "apply_patch <<EOF\n*** Begin Patch\n*** End Patch";
        let result = maybe_parse_apply_patch(&argv(&["bash", "-lc", script]));
        assert_eq!(
            result,
            MaybeApplyPatch::ShellParseError(HeredocError::MissingClosingDelimiter {
                delimiter: "EOF".to_string()
            })
        );
    }

    #[test]
    fn test_other_commands_are_not_apply_patch() {
        assert_eq!(
            maybe_parse_apply_patch(&argv(&["ls", "-la"])),
            MaybeApplyPatch::NotApplyPatch
        );
        assert_eq!(
            maybe_parse_apply_patch(&argv(&["bash", "-lc", "echo hi"])),
            MaybeApplyPatch::NotApplyPatch
        );
        assert_eq!(
            maybe_parse_apply_patch(&argv(&["apply_patch"])),
            MaybeApplyPatch::NotApplyPatch
        );
        assert_eq!(
            maybe_parse_apply_patch(&argv(&[])),
            MaybeApplyPatch::NotApplyPatch
        );
    }

    #[test]
    fn test_verified_compiles_action() {
        let dir = tempfile::tempdir().unwrap();
        let result =
            maybe_parse_apply_patch_verified(&argv(&["apply_patch", PATCH]), dir.path());
        match result {
            MaybeApplyPatchVerified::Body(action) => {
                assert_eq!(action.len(), 1);
            }
            other => panic!("expected Body, got {:?}", other),
        }
    }

    #[test]
    fn test_verified_classifies_grammar_failure() {
        let dir = tempfile::tempdir().unwrap();
        let result =
            maybe_parse_apply_patch_verified(&argv(&["apply_patch", "not a patch"]), dir.path());
        assert!(matches!(
            result,
            MaybeApplyPatchVerified::CorrectnessError(_)
        ));
    }

    #[test]
    fn test_verified_classifies_boundary_failure() {
        let dir = tempfile::tempdir().unwrap();
        let patch = "*** Begin Patch\n*** Delete File: ../outside\n*** End Patch";
        let result =
            maybe_parse_apply_patch_verified(&argv(&["apply_patch", patch]), dir.path());
        assert!(matches!(
            result,
            MaybeApplyPatchVerified::CorrectnessError(_)
        ));
    }
}
