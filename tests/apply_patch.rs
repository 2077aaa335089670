//! End-to-end integration tests: invocation detection through apply and
//! summary, against a real scratch working directory.

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use agent_patcher::{
    apply_action_and_report, apply_patch, maybe_parse_apply_patch_verified,
    MaybeApplyPatchVerified, SUMMARY_HEADER,
};

fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|p| p.to_string()).collect()
}

#[test]
fn test_heredoc_invocation_applies_end_to_end() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("stale.txt"), "old\n").unwrap();

    let script = "\
apply_patch <<'EOF'
*** Begin Patch
*** Add File: docs/readme.md
+# Title
+body
*** Delete File: stale.txt
*** End Patch
EOF";

    let action = match maybe_parse_apply_patch_verified(&argv(&["bash", "-lc", script]), dir.path())
    {
        MaybeApplyPatchVerified::Body(action) => action,
        other => panic!("expected verified body, got {:?}", other),
    };

    let (mut out, mut err) = (Vec::new(), Vec::new());
    let affected = apply_action_and_report(&action, &mut out, &mut err).expect("apply succeeds");

    assert_eq!(affected.added, vec![PathBuf::from("docs/readme.md")]);
    assert_eq!(affected.deleted, vec![PathBuf::from("stale.txt")]);
    assert_eq!(
        fs::read_to_string(dir.path().join("docs/readme.md")).unwrap(),
        "# Title\nbody"
    );
    assert!(!dir.path().join("stale.txt").exists());

    let summary = String::from_utf8(out).unwrap();
    assert!(summary.starts_with(SUMMARY_HEADER));
    assert!(summary.contains("A docs/readme.md"));
    assert!(summary.contains("D stale.txt"));
    assert!(err.is_empty());
}

#[test]
fn test_summary_groups_never_interleave() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("update-me.txt"), "line\n").unwrap();
    fs::write(dir.path().join("delete-me.txt"), "x\n").unwrap();

    // Encounter order is add, update, delete; the summary must still group
    // Added, then Modified, then Deleted.
    let patch = "\
*** Begin Patch
*** Add File: added.txt
+new
*** Update File: update-me.txt
 line
+more
*** Delete File: delete-me.txt
*** End Patch";

    let mut out = Vec::new();
    apply_patch(patch, dir.path(), &mut out).unwrap();

    let summary = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = summary.lines().collect();
    assert_eq!(
        lines,
        vec![
            SUMMARY_HEADER,
            "A added.txt",
            "M update-me.txt",
            "D delete-me.txt",
        ]
    );
}

#[test]
fn test_drifted_update_with_move_applies_leniently() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("src")).unwrap();
    fs::write(
        dir.path().join("src/config.rs"),
        "pub const A: u8 = 1;\npub const B: u8 = 2;\n",
    )
    .unwrap();

    // The deletion names a line that no longer exists; the update must still
    // land, and the move must be reflected in the bookkeeping.
    let patch = "\
*** Begin Patch
*** Update File: src/config.rs
*** Move to: src/settings.rs
 pub const A: u8 = 1;
-pub const B: u8 = 99;
+pub const B: u8 = 3;
*** End Patch";

    let mut out = Vec::new();
    let affected = apply_patch(patch, dir.path(), &mut out).unwrap();

    assert_eq!(affected.deleted, vec![PathBuf::from("src/config.rs")]);
    assert_eq!(affected.modified, vec![PathBuf::from("src/settings.rs")]);
    assert!(!dir.path().join("src/config.rs").exists());

    let content = fs::read_to_string(dir.path().join("src/settings.rs")).unwrap();
    assert!(content.contains("pub const A: u8 = 1;"));
    assert!(content.contains("pub const B: u8 = 3;"));
}

#[test]
fn test_escape_attempt_leaves_workspace_untouched() {
    let dir = TempDir::new().unwrap();
    let outside = dir.path().parent().unwrap().join("escape-target.txt");

    let patch = "\
*** Begin Patch
*** Update File: ../escape-target.txt
+pwned
*** End Patch";

    let mut out = Vec::new();
    let result = apply_patch(patch, dir.path(), &mut out);

    assert!(result.is_err());
    assert!(!outside.exists());
    assert!(out.is_empty(), "no summary on failure");
}

#[test]
fn test_multiple_updates_in_one_call() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.txt"), "one\n").unwrap();
    fs::write(dir.path().join("b.txt"), "two\n").unwrap();

    let patch = "\
*** Begin Patch
*** Update File: a.txt
-one
+ONE
*** Update File: b.txt
-two
+TWO
*** End Patch";

    let mut out = Vec::new();
    let affected = apply_patch(patch, dir.path(), &mut out).unwrap();

    assert_eq!(
        affected.modified,
        vec![PathBuf::from("a.txt"), PathBuf::from("b.txt")]
    );
    assert_eq!(fs::read_to_string(dir.path().join("a.txt")).unwrap(), "ONE\n");
    assert_eq!(fs::read_to_string(dir.path().join("b.txt")).unwrap(), "TWO\n");
}

#[test]
fn test_unrelated_command_is_not_detected() {
    let dir = TempDir::new().unwrap();
    let result = maybe_parse_apply_patch_verified(&argv(&["ls", "-la"]), dir.path());
    assert!(matches!(result, MaybeApplyPatchVerified::NotApplyPatch));
}
