/// One typed unit of change parsed from patch text.
///
/// The variant set is closed so the executor's dispatch is exhaustive; adding
/// a new change kind is a compile error everywhere it matters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Hunk {
    /// Create (or overwrite) a file with the given full contents.
    AddFile { path: String, contents: String },
    /// Remove a file if it exists.
    DeleteFile { path: String },
    /// Rewrite a file by reconciling the diff against its current lines,
    /// optionally moving it to a new path afterwards.
    UpdateFile {
        path: String,
        move_path: Option<String>,
        diff: Vec<DiffLine>,
    },
}

impl Hunk {
    /// The path the hunk operates on (the source path for updates with a move).
    pub fn path(&self) -> &str {
        match self {
            Hunk::AddFile { path, .. } => path,
            Hunk::DeleteFile { path } => path,
            Hunk::UpdateFile { path, .. } => path,
        }
    }
}

/// One line of an update hunk's diff body, classified by its leading marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffLine {
    Insertion(String),
    Deletion(String),
    Context(String),
}

impl DiffLine {
    /// Classify a raw body line: `+` inserts, `-` deletes, everything else is
    /// context. Context keeps its indentation; only the single marker space is
    /// stripped, since the reconciler compares context against file lines
    /// verbatim.
    pub fn classify(line: &str) -> DiffLine {
        if let Some(rest) = line.strip_prefix('+') {
            DiffLine::Insertion(rest.to_string())
        } else if let Some(rest) = line.strip_prefix('-') {
            DiffLine::Deletion(rest.to_string())
        } else {
            let text = line.strip_prefix(' ').unwrap_or(line);
            DiffLine::Context(text.to_string())
        }
    }

    /// Adapt a conventional unified diff into the same diff-line sequence the
    /// patch grammar produces. The `---`, `+++`, and `@@` header kinds carry no
    /// content and are discarded; every other line classifies by marker.
    pub fn from_unified_diff(text: &str) -> Vec<DiffLine> {
        text.lines()
            .filter(|line| {
                !(line.starts_with("--- ")
                    || line.starts_with("+++ ")
                    || line.starts_with("@@"))
            })
            .map(DiffLine::classify)
            .collect()
    }
}

/// Render a diff-line sequence back into marker-prefixed unified-diff text.
///
/// Round-trips through [`DiffLine::from_unified_diff`]: the executor stores an
/// update as this text and re-derives the same sequence when applying.
pub fn render_unified_diff(diff: &[DiffLine]) -> String {
    let mut out = String::new();
    for line in diff {
        let (marker, text) = match line {
            DiffLine::Insertion(text) => ('+', text),
            DiffLine::Deletion(text) => ('-', text),
            DiffLine::Context(text) => (' ', text),
        };
        out.push(marker);
        out.push_str(text);
        out.push('\n');
    }
    out
}
