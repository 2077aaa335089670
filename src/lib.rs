//! Agent Patcher: sandboxed apply_patch engine for AI coding agents
//!
//! An agent proposes file-tree edits as structured patch text; this crate
//! recognizes the invocation, parses the text into typed hunks, reconciles
//! update diffs against current file content, enforces the working-directory
//! boundary, applies the mutations, and reports what changed.
//!
//! # Architecture
//!
//! The pipeline is strictly layered: invocation detection recovers raw patch
//! text, the grammar scanner turns it into [`Hunk`]s, the action compiler
//! resolves paths into a [`PatchAction`] behind the [`WorkspaceGuard`], and
//! the executor mutates the filesystem and returns [`AffectedPaths`].
//! The working directory and the raw text are explicit call parameters
//! throughout; the engine reads no ambient configuration, which keeps it
//! independently testable from its CLI and harness collaborators.
//!
//! # Safety
//!
//! - Every resolved write/move path must stay inside the working directory
//! - Atomic file writes (tempfile + fsync + rename)
//! - Reconciliation is deliberately lenient about context drift and never
//!   panics on malformed diff bodies
//! - No cross-hunk rollback: a mid-call failure leaves earlier hunks applied
//!
//! # Example
//!
//! ```no_run
//! use agent_patcher::apply_patch;
//! use std::path::Path;
//!
//! let patch = "*** Begin Patch\n*** Add File: hello.txt\n+hi\n*** End Patch";
//! let mut out = Vec::new();
//! let affected = apply_patch(patch, Path::new("/work"), &mut out)?;
//! assert_eq!(affected.added.len(), 1);
//! # Ok::<(), agent_patcher::ApplyError>(())
//! ```

pub mod action;
pub mod apply;
pub mod detect;
pub mod parser;
pub mod reconcile;
pub mod report;
pub mod safety;

// Re-exports
pub use action::{compile_patch, FileChange, PatchAction};
pub use apply::{apply_action, apply_action_and_report, apply_patch, ApplyError};
pub use detect::{
    maybe_parse_apply_patch, maybe_parse_apply_patch_verified, HeredocError, MaybeApplyPatch,
    MaybeApplyPatchVerified,
};
pub use parser::{parse_patch, DiffLine, Hunk, ParseError};
pub use reconcile::reconcile;
pub use report::{print_summary, render_summary, AffectedPaths, SUMMARY_HEADER};
pub use safety::{SafetyError, WorkspaceGuard};
