//! Retitling: give timestamp-named notes a readable suffix.
//!
//! A note whose first line reads `# Standup with infra <Monday, 15 January 2024>`
//! and whose name is `2024-01-15_10-30-00.md` becomes
//! `2024-01-15_10-30-00 - Standup with infra.md`. The timestamp prefix is kept,
//! so series order is unaffected. Notes still titled `_MEETING_` are skipped.

use std::fs;
use std::path::{Path, PathBuf};

use quill_core::timestamp;

use crate::{io_err, SeriesError};

/// Title left in place by the meeting template until the user names it.
pub const UNTITLED: &str = "_MEETING_";

const STRIPPED_CHARS: &[char] = &['[', '{', '/', '<', ':', '?', '*', '|', '>', '\\', '}', ']', ',', '.'];
const TRIMMED_CHARS: &[char] = &[' ', '_', '*'];

/// A planned or applied rename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Retitle {
    pub from: PathBuf,
    pub to: PathBuf,
}

/// Title from the first line of `content`: the text between `# ` and the last ` <`.
pub fn title_of(content: &str) -> Option<&str> {
    let first = content.lines().next()?;
    let rest = first.strip_prefix("# ")?;
    let end = rest.rfind(" <")?;
    Some(&rest[..end])
}

/// Strip characters that do not belong in a file name.
pub fn sanitize(title: &str) -> String {
    let kept: String = title.chars().filter(|c| !STRIPPED_CHARS.contains(c)).collect();
    kept.trim_matches(TRIMMED_CHARS).to_string()
}

fn planned_name(path: &Path) -> Result<Option<String>, SeriesError> {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return Ok(None);
    };
    if !name.ends_with(".md") {
        return Ok(None);
    }
    let Some(ts) = timestamp::prefix_of(name) else {
        return Ok(None);
    };
    let content = fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    let Some(title) = title_of(&content) else {
        tracing::debug!("no title line: {}", path.display());
        return Ok(None);
    };
    if title == UNTITLED {
        return Ok(None);
    }
    let clean = sanitize(title);
    if clean.is_empty() {
        return Ok(None);
    }
    let target = format!("{ts} - {clean}.md");
    Ok((target != name).then_some(target))
}

fn walk(dir: &Path, out: &mut Vec<Retitle>) -> Result<(), SeriesError> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|e| io_err(dir, e))?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .collect();
    entries.sort();
    for path in entries {
        if path.is_dir() {
            let hidden = path
                .file_name()
                .map(|n| n.to_string_lossy().starts_with('.'))
                .unwrap_or(false);
            if !hidden {
                walk(&path, out)?;
            }
        } else if let Some(target) = planned_name(&path)? {
            out.push(Retitle {
                to: path.with_file_name(target),
                from: path,
            });
        }
    }
    Ok(())
}

/// Every rename that [`retitle`] would perform under `notes_dir`.
pub fn plan(notes_dir: &Path) -> Result<Vec<Retitle>, SeriesError> {
    let mut out = Vec::new();
    if notes_dir.exists() {
        walk(notes_dir, &mut out)?;
    }
    Ok(out)
}

/// Rename every titled note under `notes_dir`.
///
/// Targets that already exist are skipped with a warning. Returns the renames
/// actually performed (or, with `dry_run`, the ones that would be).
pub fn retitle(notes_dir: &Path, dry_run: bool) -> Result<Vec<Retitle>, SeriesError> {
    let planned = plan(notes_dir)?;
    if dry_run {
        return Ok(planned);
    }
    let mut done = Vec::with_capacity(planned.len());
    for r in planned {
        if r.to.exists() {
            tracing::warn!(target = %r.to.display(), "retitle target exists; skipping");
            continue;
        }
        fs::rename(&r.from, &r.to).map_err(|e| io_err(&r.from, e))?;
        tracing::info!("retitled: {} -> {}", r.from.display(), r.to.display());
        done.push(r);
    }
    Ok(done)
}
