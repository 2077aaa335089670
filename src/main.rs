use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use similar::{ChangeTag, TextDiff};
use std::env;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use agent_patcher::{
    apply_patch, compile_patch, maybe_parse_apply_patch_verified, parse_patch, reconcile,
    DiffLine, FileChange, MaybeApplyPatchVerified, PatchAction,
};

#[derive(Parser)]
#[command(name = "agent-patcher")]
#[command(about = "Sandboxed apply_patch engine for AI coding agents", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply a patch to a working directory
    Apply {
        /// Working directory the patch is confined to (defaults to cwd)
        #[arg(short, long)]
        workspace: Option<PathBuf>,

        /// Patch file to apply ("-" or omitted reads stdin)
        patch: Option<PathBuf>,

        /// Dry run - show the proposed changes without modifying files
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Emit the affected paths as JSON instead of the text summary
        #[arg(long)]
        json: bool,
    },

    /// Parse and resolve a patch without applying it
    Verify {
        /// Working directory the patch is confined to (defaults to cwd)
        #[arg(short, long)]
        workspace: Option<PathBuf>,

        /// Patch file to verify ("-" or omitted reads stdin)
        patch: Option<PathBuf>,

        /// Emit the compiled action as JSON
        #[arg(long)]
        json: bool,
    },

    /// Classify an argument vector the way an agent harness would
    Detect {
        /// Working directory for verified detection (detection only if omitted)
        #[arg(short, long)]
        workspace: Option<PathBuf>,

        /// The argument vector, e.g. -- bash -lc 'apply_patch <<EOF ...'
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        argv: Vec<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Apply {
            workspace,
            patch,
            dry_run,
            json,
        } => cmd_apply(workspace, patch, dry_run, json),

        Commands::Verify {
            workspace,
            patch,
            json,
        } => cmd_verify(workspace, patch, json),

        Commands::Detect { workspace, argv } => cmd_detect(workspace, argv),
    }
}

/// Helper: resolve the working directory from the flag or the process cwd.
fn resolve_workspace(cli_workspace: Option<PathBuf>) -> Result<PathBuf> {
    let workspace = match cli_workspace {
        Some(path) => path,
        None => env::current_dir().context("could not determine current directory")?,
    };
    workspace
        .canonicalize()
        .with_context(|| format!("workspace does not exist: {}", workspace.display()))
}

/// Helper: read patch text from a file, or stdin for "-"/omitted.
fn read_patch_text(patch: Option<PathBuf>) -> Result<String> {
    match patch {
        Some(path) if path != Path::new("-") => fs::read_to_string(&path)
            .with_context(|| format!("failed to read patch from {}", path.display())),
        _ => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("failed to read patch from stdin")?;
            Ok(text)
        }
    }
}

/// Helper: show a unified diff between original and proposed content.
fn display_diff(original: &str, modified: &str) {
    let diff = TextDiff::from_lines(original, modified);

    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => format!("-{}", change).red(),
            ChangeTag::Insert => format!("+{}", change).green(),
            ChangeTag::Equal => format!(" {}", change).normal(),
        };
        print!("{}", sign);
    }
}

/// Helper: render every change in an action as a proposed diff.
fn display_proposed_changes(action: &PatchAction) -> Result<()> {
    let root = action.root();

    for (abs, change) in action.changes() {
        let rel = abs.strip_prefix(root).unwrap_or(abs);
        match change {
            FileChange::Add { content } => {
                println!("{} {}", "A".green().bold(), rel.display());
                display_diff("", content);
            }
            FileChange::Delete => {
                println!("{} {}", "D".red().bold(), rel.display());
            }
            FileChange::Update {
                unified_diff,
                move_path,
            } => {
                match move_path {
                    Some(target) => {
                        let target_rel = target.strip_prefix(root).unwrap_or(target);
                        println!(
                            "{} {} -> {}",
                            "M".yellow().bold(),
                            rel.display(),
                            target_rel.display()
                        );
                    }
                    None => println!("{} {}", "M".yellow().bold(), rel.display()),
                }
                let original = if abs.exists() {
                    fs::read_to_string(abs)
                        .with_context(|| format!("failed to read {}", abs.display()))?
                } else {
                    String::new()
                };
                let current: Vec<String> = original.lines().map(str::to_string).collect();
                let diff = DiffLine::from_unified_diff(unified_diff);
                let proposed = reconcile(&current, &diff).join("\n");
                display_diff(&original, &proposed);
            }
        }
        println!();
    }

    Ok(())
}

fn cmd_apply(
    workspace: Option<PathBuf>,
    patch: Option<PathBuf>,
    dry_run: bool,
    json: bool,
) -> Result<()> {
    let workspace = resolve_workspace(workspace)?;
    let text = read_patch_text(patch)?;

    if dry_run {
        println!("{}", "[DRY RUN - no files will be modified]".cyan());
        let hunks = parse_patch(&text)?;
        let action = compile_patch(&hunks, &workspace)?;
        display_proposed_changes(&action)?;
        println!(
            "{}",
            format!("Patch OK: {} change(s) would apply", action.len()).green()
        );
        return Ok(());
    }

    if json {
        let mut sink = Vec::new();
        let affected = apply_patch(&text, &workspace, &mut sink)?;
        println!("{}", serde_json::to_string_pretty(&affected)?);
    } else {
        let mut stdout = io::stdout();
        apply_patch(&text, &workspace, &mut stdout)?;
    }

    Ok(())
}

fn cmd_verify(workspace: Option<PathBuf>, patch: Option<PathBuf>, json: bool) -> Result<()> {
    let workspace = resolve_workspace(workspace)?;
    let text = read_patch_text(patch)?;

    let hunks = parse_patch(&text)?;
    let action = compile_patch(&hunks, &workspace)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&action)?);
        return Ok(());
    }

    display_proposed_changes(&action)?;
    println!(
        "{}",
        format!("Patch OK: {} change(s) resolved", action.len()).green()
    );
    Ok(())
}

fn cmd_detect(workspace: Option<PathBuf>, argv: Vec<String>) -> Result<()> {
    // Verified detection needs a real directory to resolve against; plain
    // detection classifies the argv shape alone.
    let workspace = resolve_workspace(workspace)?;

    match maybe_parse_apply_patch_verified(&argv, &workspace) {
        MaybeApplyPatchVerified::Body(action) => {
            println!(
                "{} apply_patch invocation ({} change(s))",
                "✓".green(),
                action.len()
            );
            display_proposed_changes(&action)?;
        }
        MaybeApplyPatchVerified::ShellParseError(e) => {
            println!("{} malformed heredoc: {}", "✗".red(), e);
            std::process::exit(1);
        }
        MaybeApplyPatchVerified::CorrectnessError(e) => {
            println!("{} invalid patch: {}", "✗".red(), e);
            std::process::exit(1);
        }
        MaybeApplyPatchVerified::NotApplyPatch => {
            println!("{}", "not an apply_patch invocation".dimmed());
        }
    }

    Ok(())
}
