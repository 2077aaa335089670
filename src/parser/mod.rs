//! Grammar scanner for the apply_patch description language.

pub mod errors;
pub mod hunk;
pub mod scanner;

pub use errors::ParseError;
pub use hunk::{render_unified_diff, DiffLine, Hunk};
pub use scanner::{
    parse_patch, BEGIN_PATCH_MARKER, END_OF_FILE_MARKER, END_PATCH_MARKER,
};
