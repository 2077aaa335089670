use crate::safety::SafetyError;
use thiserror::Error;

/// Errors raised while turning patch text into hunks or resolving hunk paths.
///
/// Boundary violations are folded into this taxonomy deliberately: a patch
/// that names a path outside the working directory is malformed input, and
/// callers treat it exactly like a missing marker.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("patch text must begin with '*** Begin Patch'")]
    MissingBeginMarker,

    #[error("patch text must end with '*** End Patch'")]
    MissingEndMarker,

    #[error(transparent)]
    Boundary(#[from] SafetyError),
}
