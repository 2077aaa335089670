//! Deterministic summary of an apply call.

use std::io::{self, Write};
use std::path::PathBuf;

use serde::Serialize;

/// Fixed first line of every success summary.
pub const SUMMARY_HEADER: &str = "Success. Updated the following files:";

/// The externally observed result of one apply call: three ordered groups of
/// workdir-relative paths. Serializes to JSON for agent-facing callers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AffectedPaths {
    pub added: Vec<PathBuf>,
    pub modified: Vec<PathBuf>,
    pub deleted: Vec<PathBuf>,
}

impl AffectedPaths {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.modified.is_empty() && self.deleted.is_empty()
    }
}

/// Write the summary: the fixed header, then `A `, `M `, `D ` lines grouped
/// as Added, Modified, Deleted. Each group keeps recording order; the groups
/// never interleave, independent of hunk encounter order.
pub fn print_summary(affected: &AffectedPaths, out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "{}", SUMMARY_HEADER)?;
    for path in &affected.added {
        writeln!(out, "A {}", path.display())?;
    }
    for path in &affected.modified {
        writeln!(out, "M {}", path.display())?;
    }
    for path in &affected.deleted {
        writeln!(out, "D {}", path.display())?;
    }
    Ok(())
}

/// The summary as a string, for callers that hold no writer.
pub fn render_summary(affected: &AffectedPaths) -> String {
    let mut buf = Vec::new();
    // Writing into a Vec<u8> cannot fail.
    print_summary(affected, &mut buf).expect("in-memory write");
    String::from_utf8(buf).expect("summary is valid UTF-8")
}
